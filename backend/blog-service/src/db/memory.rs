//! In-memory [`DocumentStore`] used by tests and `DATABASE_BACKEND=memory`.
//!
//! Supports the subset of the query language the service emits: equality
//! filters, inclusion/exclusion projections (dotted paths included) and the
//! `$match`, `$sort`, `$project`, `$skip`, `$limit`, `$lookup` and `$count`
//! aggregation stages. Unique indexes are enforced on insert and update.

use super::{DocumentStore, StoreError, StoreResult};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    unique_fields: HashMap<String, Vec<String>>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`
    pub async fn len(&self, collection: &str) -> usize {
        let inner = self.inner.read().await;
        inner.collections.get(collection).map_or(0, Vec::len)
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) => Some(*v as i64),
        _ => None,
    }
}

fn values_equal(left: &Bson, right: &Bson) -> bool {
    match (as_f64(left), as_f64(right)) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match document.get(key) {
        Some(actual) => values_equal(actual, expected),
        None => matches!(expected, Bson::Null),
    })
}

/// Type order for mixed comparisons: missing/null < numbers < strings < others
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 0,
        Some(Bson::Int32(_)) | Some(Bson::Int64(_)) | Some(Bson::Double(_)) => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::ObjectId(_)) => 3,
        Some(Bson::Boolean(_)) => 4,
        Some(Bson::DateTime(_)) => 5,
        Some(_) => 6,
    }
}

fn compare_values(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    let rank = type_rank(left).cmp(&type_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (Some(l), Some(r)) => match (l, r) {
            (Bson::String(a), Bson::String(b)) => a.cmp(b),
            (Bson::ObjectId(a), Bson::ObjectId(b)) => a.bytes().cmp(&b.bytes()),
            (Bson::Boolean(a), Bson::Boolean(b)) => a.cmp(b),
            (Bson::DateTime(a), Bson::DateTime(b)) => a.cmp(b),
            _ => match (as_f64(l), as_f64(r)) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
        },
        _ => Ordering::Equal,
    }
}

#[derive(Debug, Default)]
struct PathTree(BTreeMap<String, PathTree>);

impl PathTree {
    fn insert(&mut self, path: &str) {
        let mut node = self;
        for segment in path.split('.') {
            node = node.0.entry(segment.to_string()).or_default();
        }
    }

    fn is_leaf(&self) -> bool {
        self.0.is_empty()
    }
}

fn include_value(value: &Bson, tree: &PathTree) -> Option<Bson> {
    if tree.is_leaf() {
        return Some(value.clone());
    }
    match value {
        Bson::Document(inner) => Some(Bson::Document(include_paths(inner, tree))),
        Bson::Array(items) => Some(Bson::Array(
            items
                .iter()
                .filter_map(|item| match item {
                    Bson::Document(inner) => Some(Bson::Document(include_paths(inner, tree))),
                    _ => None,
                })
                .collect(),
        )),
        _ => None,
    }
}

/// Keep only the paths in `tree`, preserving document order
fn include_paths(document: &Document, tree: &PathTree) -> Document {
    let mut output = Document::new();
    for (key, value) in document {
        if let Some(subtree) = tree.0.get(key) {
            if let Some(projected) = include_value(value, subtree) {
                output.insert(key.clone(), projected);
            }
        }
    }
    output
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        other => as_f64(other).map_or(true, |n| n != 0.0),
    }
}

fn project(document: &Document, projection: &Document) -> Document {
    let exclude_id = projection.get("_id").map_or(false, |v| !truthy(v));
    let inclusion: Vec<&str> = projection
        .iter()
        .filter(|(key, value)| key.as_str() != "_id" && truthy(value))
        .map(|(key, _)| key.as_str())
        .collect();

    if inclusion.is_empty() {
        let mut output = document.clone();
        for (key, value) in projection {
            if !truthy(value) {
                output.remove(key);
            }
        }
        return output;
    }

    let mut tree = PathTree::default();
    for path in inclusion {
        tree.insert(path);
    }
    if !exclude_id {
        tree.insert("_id");
    }
    include_paths(document, &tree)
}

fn stage_number(stage: &str, value: &Bson) -> StoreResult<usize> {
    as_i64(value)
        .filter(|n| *n >= 0)
        .map(|n| n as usize)
        .ok_or_else(|| StoreError::Malformed(format!("{} expects a non-negative number", stage)))
}

fn stage_str<'a>(args: &'a Document, key: &str) -> StoreResult<&'a str> {
    args.get_str(key)
        .map_err(|_| StoreError::Malformed(format!("$lookup requires {}", key)))
}

fn run_stage(
    collections: &HashMap<String, Vec<Document>>,
    documents: Vec<Document>,
    stage: &Document,
) -> StoreResult<Vec<Document>> {
    let (name, args) = stage
        .iter()
        .next()
        .ok_or_else(|| StoreError::Malformed("empty pipeline stage".to_string()))?;

    let as_document = |value: &Bson| -> StoreResult<Document> {
        value
            .as_document()
            .cloned()
            .ok_or_else(|| StoreError::Malformed(format!("{} expects a document", name)))
    };

    match name.as_str() {
        "$match" => {
            let filter = as_document(args)?;
            Ok(documents.into_iter().filter(|d| matches(d, &filter)).collect())
        }
        "$project" => {
            let projection = as_document(args)?;
            Ok(documents.iter().map(|d| project(d, &projection)).collect())
        }
        "$sort" => {
            let keys = as_document(args)?;
            let mut sorted = documents;
            sorted.sort_by(|a, b| {
                keys.iter()
                    .map(|(key, direction)| {
                        let ordering = compare_values(a.get(key), b.get(key));
                        if as_f64(direction).map_or(false, |d| d < 0.0) {
                            ordering.reverse()
                        } else {
                            ordering
                        }
                    })
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
            Ok(sorted)
        }
        "$skip" => {
            let skip = stage_number(name, args)?;
            Ok(documents.into_iter().skip(skip).collect())
        }
        "$limit" => {
            let limit = stage_number(name, args)?;
            Ok(documents.into_iter().take(limit).collect())
        }
        "$count" => {
            let field = args
                .as_str()
                .ok_or_else(|| StoreError::Malformed("$count expects a field name".into()))?;
            if documents.is_empty() {
                return Ok(Vec::new());
            }
            let mut counted = Document::new();
            counted.insert(field, documents.len() as i32);
            Ok(vec![counted])
        }
        "$lookup" => {
            let args = as_document(args)?;
            let from = stage_str(&args, "from")?;
            let local_field = stage_str(&args, "localField")?;
            let foreign_field = stage_str(&args, "foreignField")?;
            let as_field = stage_str(&args, "as")?;
            let foreign = collections.get(from).map(Vec::as_slice).unwrap_or(&[]);

            Ok(documents
                .into_iter()
                .map(|mut document| {
                    let local = document.get(local_field).cloned().unwrap_or(Bson::Null);
                    let joined: Vec<Bson> = foreign
                        .iter()
                        .filter(|candidate| {
                            let value = candidate.get(foreign_field).unwrap_or(&Bson::Null);
                            values_equal(value, &local)
                        })
                        .map(|candidate| Bson::Document(candidate.clone()))
                        .collect();
                    document.insert(as_field, joined);
                    document
                })
                .collect())
        }
        other => Err(StoreError::Malformed(format!(
            "unsupported pipeline stage {}",
            other
        ))),
    }
}

impl Inner {
    /// Reject `candidate` if it collides with another document on a unique field.
    /// `skip` is the index of the document being replaced, if any.
    fn check_unique(
        &self,
        collection: &str,
        candidate: &Document,
        skip: Option<usize>,
    ) -> StoreResult<()> {
        let Some(fields) = self.unique_fields.get(collection) else {
            return Ok(());
        };
        let documents = self.collections.get(collection).map(Vec::as_slice).unwrap_or(&[]);

        for field in fields {
            let Some(value) = candidate.get(field) else {
                continue;
            };
            let collision = documents.iter().enumerate().any(|(index, existing)| {
                Some(index) != skip
                    && existing
                        .get(field)
                        .map_or(false, |other| values_equal(other, value))
            });
            if collision {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_one(&self, collection: &str, mut document: Document) -> StoreResult<Bson> {
        let mut inner = self.inner.write().await;

        if !document.contains_key("_id") {
            let mut with_id = Document::new();
            with_id.insert("_id", ObjectId::new());
            for (key, value) in document {
                with_id.insert(key, value);
            }
            document = with_id;
        }
        let id = document.get("_id").cloned().unwrap_or(Bson::Null);

        let duplicate_id = inner
            .collections
            .get(collection)
            .map_or(false, |docs| docs.iter().any(|d| d.get("_id") == Some(&id)));
        if duplicate_id {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                field: "_id".to_string(),
            });
        }
        inner.check_unique(collection, &document, None)?;

        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> StoreResult<Option<Document>> {
        let inner = self.inner.read().await;
        let found = inner
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, &filter)));

        Ok(found.map(|document| match &projection {
            Some(projection) => project(document, projection),
            None => document.clone(),
        }))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        fields: Document,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let position = inner
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().position(|d| matches(d, &filter)));

        let Some(index) = position else {
            return Ok(0);
        };

        let mut updated = inner.collections[collection][index].clone();
        for (key, value) in fields {
            updated.insert(key, value);
        }
        inner.check_unique(collection, &updated, Some(index))?;

        if let Some(docs) = inner.collections.get_mut(collection) {
            docs[index] = updated;
        }
        Ok(1)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let Some(docs) = inner.collections.get_mut(collection) else {
            return Ok(0);
        };

        match docs.iter().position(|d| matches(d, &filter)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> StoreResult<Vec<Document>> {
        let inner = self.inner.read().await;
        let mut documents = inner.collections.get(collection).cloned().unwrap_or_default();

        for stage in &pipeline {
            documents = run_stage(&inner.collections, documents, stage)?;
        }
        Ok(documents)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let fields = inner.unique_fields.entry(collection.to_string()).or_default();
        if !fields.iter().any(|existing| existing == field) {
            fields.push(field.to_string());
        }
        Ok(())
    }
}
