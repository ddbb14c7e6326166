//! In-memory implementation of DocumentStore for testing and development
//!
//! Documents are kept as JSON values in insertion order, so filters, sorts
//! and partial updates behave like a document database without one running:
//!
//! - filters use the `$eq`/`$ne`/`$gt`/`$gte`/`$lt`/`$lte`/`$in`/`$nin`
//!   operators, plain values mean equality, dotted keys reach nested fields
//! - sorting follows the document-database type order
//!   (missing/null < numbers < strings < objects < arrays < booleans)
//! - RFC 3339 timestamps are compared as instants, not as text; when sorting,
//!   they come before every other string

use crate::core::query::SortSpec;
use crate::core::store::{DocumentStore, Filter, strip_immutable_fields};
use crate::core::Entity;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory document store
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// clones share the same documents.
pub struct InMemoryStore<T> {
    documents: Arc<RwLock<IndexMap<Uuid, Value>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            documents: self.documents.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> InMemoryStore<T> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(IndexMap::new())),
            _marker: PhantomData,
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> Result<usize> {
        let docs = self
            .documents
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(docs.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryStore<T> {
    fn to_document(entity: &T) -> Result<Value> {
        serde_json::to_value(entity)
            .with_context(|| format!("Failed to serialize {}", T::resource_name_singular()))
    }

    fn from_document(doc: Value) -> Result<T> {
        serde_json::from_value(doc)
            .with_context(|| format!("Failed to deserialize {}", T::resource_name_singular()))
    }

    /// Matching documents, in insertion order
    fn matching(&self, filter: &Filter) -> Result<Vec<Value>> {
        let docs = self
            .documents
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut matched = Vec::new();
        for doc in docs.values() {
            if matches_filter(doc, filter)? {
                matched.push(doc.clone());
            }
        }
        Ok(matched)
    }
}

#[async_trait]
impl<T: Entity> DocumentStore<T> for InMemoryStore<T> {
    async fn insert(&self, entity: T) -> Result<T> {
        let doc = Self::to_document(&entity)?;
        let id = entity.id();

        let mut docs = self
            .documents
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if docs.contains_key(&id) {
            return Err(anyhow!(
                "{} with id '{}' already exists",
                T::resource_name_singular(),
                id
            ));
        }
        docs.insert(id, doc.clone());
        drop(docs);

        Self::from_document(doc)
    }

    async fn find_many(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>> {
        let mut docs = self.matching(filter)?;

        if !sort.is_empty() {
            docs.sort_by(|a, b| compare_documents(a, b, sort));
        }

        docs.into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(Self::from_document)
            .collect()
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        Ok(self.matching(filter)?.len() as u64)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        self.matching(filter)?
            .into_iter()
            .next()
            .map(Self::from_document)
            .transpose()
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>> {
        let docs = self
            .documents
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        docs.get(id).cloned().map(Self::from_document).transpose()
    }

    async fn update_and_return(&self, id: &Uuid, patch: Map<String, Value>) -> Result<Option<T>> {
        let patch = strip_immutable_fields(patch);

        let mut docs = self
            .documents
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(current) = docs.get(id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        let Value::Object(fields) = &mut updated else {
            return Err(anyhow!("Stored document '{}' is not an object", id));
        };
        fields.extend(patch);
        fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);

        // Validate before committing so a bad patch leaves the document untouched
        let entity = Self::from_document(updated.clone())?;
        docs.insert(*id, updated);

        Ok(Some(entity))
    }

    async fn delete_and_return(&self, id: &Uuid) -> Result<Option<T>> {
        let removed = self
            .documents
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?
            .shift_remove(id);

        removed.map(Self::from_document).transpose()
    }
}

// ---------------------------------------------------------------------------
// Filter evaluation
// ---------------------------------------------------------------------------

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, segment| value.get(segment))
}

fn matches_filter(doc: &Value, filter: &Filter) -> Result<bool> {
    for (path, condition) in filter {
        if !matches_condition(lookup(doc, path), condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_operator_object(condition: &Value) -> bool {
    match condition {
        Value::Object(ops) => !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn matches_condition(value: Option<&Value>, condition: &Value) -> Result<bool> {
    let Value::Object(ops) = condition else {
        return Ok(equals(value, condition));
    };
    if !is_operator_object(condition) {
        return Ok(equals(value, condition));
    }

    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => compare(value, operand) == Some(Ordering::Greater),
            "$gte" => matches!(compare(value, operand), Some(Ordering::Greater | Ordering::Equal)),
            "$lt" => compare(value, operand) == Some(Ordering::Less),
            "$lte" => matches!(compare(value, operand), Some(Ordering::Less | Ordering::Equal)),
            "$in" => in_list(value, operand, op)?,
            "$nin" => !in_list(value, operand, op)?,
            other => return Err(anyhow!("Unsupported filter operator: {}", other)),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn in_list(value: Option<&Value>, operand: &Value, op: &str) -> Result<bool> {
    let Value::Array(candidates) = operand else {
        return Err(anyhow!("{} expects an array", op));
    };
    Ok(candidates.iter().any(|candidate| equals(value, candidate)))
}

/// Equality with document-database semantics: a missing field equals `null`
/// and an array field matches when any element matches.
fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match value {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| scalar_equals(item, expected))
        }
        Some(actual) => scalar_equals(actual, expected),
    }
}

fn scalar_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering between two values of the same kind; `None` across kinds
fn compare(value: Option<&Value>, operand: &Value) -> Option<Ordering> {
    match (value?, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(compare_strings(a, b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn compare_strings(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    type_rank(a)
        .cmp(&type_rank(b))
        .then_with(|| match (a, b) {
            (Some(Value::String(x)), Some(Value::String(y))) => sort_strings(x, y),
            (Some(x), Some(y)) => compare(Some(x), y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        })
}

/// Total order on strings: timestamps by instant, then everything else as text
fn sort_strings(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn compare_documents(a: &Value, b: &Value, sort: &SortSpec) -> Ordering {
    for (field, direction) in sort.iter() {
        let ordering = compare_for_sort(lookup(a, field), lookup(b, field));
        let ordering = if direction.is_descending() {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
