//! Query parameters and pagination utilities

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Page used when the query omits it or provides a value below 1
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when the query omits it or provides a value outside `(0, MAX_LIMIT]`
pub const DEFAULT_LIMIT: u64 = 20;

/// Largest accepted page size
pub const MAX_LIMIT: u64 = 100;

/// Field used by the default "newest first" ordering
pub const DEFAULT_SORT_FIELD: &str = "created_at";

/// Direction of a single sort key
///
/// Serialized the way document databases expect it: `1` for ascending,
/// `-1` for descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Numeric form (`1` / `-1`)
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    pub fn is_descending(self) -> bool {
        matches!(self, SortDirection::Descending)
    }
}

impl Serialize for SortDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

impl<'de> Deserialize<'de> for SortDirection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i32::deserialize(deserializer)? {
            1 => Ok(SortDirection::Ascending),
            -1 => Ok(SortDirection::Descending),
            other => Err(serde::de::Error::custom(format!(
                "sort direction must be 1 or -1, got {}",
                other
            ))),
        }
    }
}

/// Ordered mapping of field name to sort direction
///
/// Order matters: the first key is the primary sort key. Insertion order is
/// preserved and a field that appears twice keeps its first direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec(IndexMap<String, SortDirection>);

impl SortSpec {
    /// Create an empty sort specification
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Default ordering: most recently created first
    pub fn newest_first() -> Self {
        let mut spec = Self::new();
        spec.push(DEFAULT_SORT_FIELD, SortDirection::Descending);
        spec
    }

    /// Parse a comma-separated sort expression
    ///
    /// # Format
    /// - `field` or `+field` (ascending)
    /// - `-field` (descending)
    ///
    /// # Example
    /// ```text
    /// sort=-created_at,name
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut spec = Self::new();

        for part in raw.split(',') {
            let part = part.trim();
            let (field, direction) = if let Some(field) = part.strip_prefix('-') {
                (field.trim(), SortDirection::Descending)
            } else if let Some(field) = part.strip_prefix('+') {
                (field.trim(), SortDirection::Ascending)
            } else {
                (part, SortDirection::Ascending)
            };

            if !field.is_empty() {
                spec.push(field, direction);
            }
        }

        spec
    }

    /// Append a sort key; returns `false` if the field was already present
    pub fn push(&mut self, field: impl Into<String>, direction: SortDirection) -> bool {
        let field = field.into();
        if self.0.contains_key(&field) {
            return false;
        }
        self.0.insert(field, direction);
        true
    }

    pub fn get(&self, field: &str) -> Option<SortDirection> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate sort keys in priority order
    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.0.iter().map(|(field, dir)| (field.as_str(), *dir))
    }

    /// This specification, or [`SortSpec::newest_first`] when empty
    pub fn or_newest_first(&self) -> Self {
        if self.is_empty() {
            Self::newest_first()
        } else {
            self.clone()
        }
    }
}

/// Pagination and ordering requested by a caller
///
/// Built from untyped query input with [`create_pagination_options`]; all
/// fields have sensible defaults.
///
/// # Example
/// ```rust,ignore
/// // GET /items?page=2&limit=10&sort=-created_at,name
/// let options = PaginationOptions::from_query(&query);
/// assert_eq!(options.skip(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationOptions {
    /// Page number (starts at 1)
    pub page: u64,

    /// Number of items per page, within `(0, MAX_LIMIT]`
    pub limit: u64,

    /// Ordered sort keys; empty means "store default"
    #[serde(default)]
    pub sort: SortSpec,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort: SortSpec::new(),
        }
    }
}

impl PaginationOptions {
    /// Build options from raw numbers, applying the fallback rules
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: normalize_page(Some(page)),
            limit: normalize_limit(Some(limit)),
            sort: SortSpec::new(),
        }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    /// Parse `page`, `limit` and `sort` out of untyped key/value pairs
    ///
    /// Unknown keys are ignored. When a key is repeated the first occurrence
    /// is used.
    pub fn from_query<I, K, V>(query: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut page = None;
        let mut limit = None;
        let mut sort = None;

        for (key, value) in query {
            let value = value.as_ref();
            match key.as_ref() {
                "page" if page.is_none() => page = Some(parse_int(value)),
                "limit" if limit.is_none() => limit = Some(parse_int(value)),
                "sort" if sort.is_none() => sort = Some(SortSpec::parse(value)),
                _ => {}
            }
        }

        Self {
            page: normalize_page(page.flatten()),
            limit: normalize_limit(limit.flatten()),
            sort: sort.unwrap_or_default(),
        }
    }

    /// Number of documents to skip before the requested page
    pub fn skip(&self) -> u64 {
        self.page.max(1).saturating_sub(1).saturating_mul(self.limit)
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn normalize_page(page: Option<i64>) -> u64 {
    match page {
        Some(p) if p >= 1 => p as u64,
        _ => DEFAULT_PAGE,
    }
}

fn normalize_limit(limit: Option<i64>) -> u64 {
    match limit {
        Some(l) if (1..=MAX_LIMIT as i64).contains(&l) => l as u64,
        _ => DEFAULT_LIMIT,
    }
}

/// Parse pagination options from untyped query input
///
/// Shorthand for [`PaginationOptions::from_query`].
pub fn create_pagination_options<I, K, V>(query: I) -> PaginationOptions
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    PaginationOptions::from_query(query)
}

/// Paginated response envelope
///
/// This structure wraps paginated data with metadata about pagination state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub meta: PaginationMeta,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, total: u64, options: &PaginationOptions) -> Self {
        Self {
            data,
            meta: PaginationMeta::new(options.page, options.limit, total),
        }
    }

    /// Convert every item while keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Wrap a page of results and the total count into an envelope
pub fn create_paginated_result<T>(
    data: Vec<T>,
    total: u64,
    options: &PaginationOptions,
) -> PaginatedResult<T> {
    PaginatedResult::new(data, total, options)
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Total number of items (after filters)
    pub total: u64,

    /// Current page number (starts at 1)
    pub page: u64,

    /// Number of items per page
    pub limit: u64,

    /// Total number of pages
    pub pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        // Hand-built options may carry a zero limit
        let limit = limit.max(1);

        Self {
            total,
            page,
            limit,
            pages: total.div_ceil(limit),
        }
    }

    /// Whether there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    /// Whether there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}
