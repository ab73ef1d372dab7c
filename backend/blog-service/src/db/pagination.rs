//! Generic paginated listing over any collection.
//!
//! Two aggregations run per request: one counting every document that
//! matches the filter, one fetching a single page of [`PAGE_SIZE`]
//! documents. The count drives the page metadata.

use super::{field_projector, DocumentStore, StoreResult};
use crate::limits::PAGE_SIZE;
use mongodb::bson::{doc, Bson, Document};
use serde::de::DeserializeOwned;
use serde::Serialize;

const COUNT_FIELD: &str = "recordCounts";

/// Join another collection into each page item
#[derive(Debug, Clone)]
pub struct Lookup {
    pub from: &'static str,
    pub local_field: &'static str,
    pub foreign_field: &'static str,
    pub as_field: &'static str,
    /// Fields of the joined documents kept in the output
    pub fields: &'static [&'static str],
}

#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub filter: Option<Document>,
    pub sort: Option<Document>,
    pub lookup: Option<Lookup>,
    /// Merged over the field projection
    pub project: Option<Document>,
}

impl PageOptions {
    pub fn filter(filter: Document) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    /// Sort keys, with `_id` appended in the last key's direction so tied
    /// keys still page in one total order
    pub fn sorted_by(mut self, mut sort: Document) -> Self {
        if !sort.contains_key("_id") {
            let direction = sort.iter().last().map_or(Bson::Int32(1), |(_, d)| d.clone());
            sort.insert("_id", direction);
        }
        self.sort = Some(sort);
        self
    }

    pub fn with_lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = Some(lookup);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: u64,
    pub total_count: u64,
    pub items_per_page: u64,
    pub previous_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl PageMeta {
    pub fn compute(current_page: u64, total_count: u64) -> Self {
        let last_page = total_count.div_ceil(PAGE_SIZE);

        Self {
            current_page,
            total_count,
            items_per_page: PAGE_SIZE,
            previous_page: current_page.checked_sub(1),
            next_page: current_page.checked_add(1).filter(|next| *next < last_page),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

pub fn count_pipeline(options: &PageOptions) -> Vec<Document> {
    vec![
        doc! { "$match": options.filter.clone().unwrap_or_default() },
        doc! { "$count": COUNT_FIELD },
    ]
}

fn main_projection(fields: &[&str], options: &PageOptions) -> Document {
    let mut projection = doc! { "_id": 0 };
    for (field, flag) in field_projector(fields) {
        projection.insert(field, flag);
    }
    if let Some(overrides) = &options.project {
        for (field, flag) in overrides {
            projection.insert(field.clone(), flag.clone());
        }
    }
    projection
}

pub fn page_pipeline(fields: &[&str], page: u64, options: &PageOptions) -> Vec<Document> {
    let projection = main_projection(fields, options);
    let skip = page.saturating_mul(PAGE_SIZE).min(i64::MAX as u64) as i64;

    let mut pipeline = vec![doc! { "$match": options.filter.clone().unwrap_or_default() }];
    // Sorting after $skip would order only the current page
    if let Some(sort) = &options.sort {
        pipeline.push(doc! { "$sort": sort.clone() });
    }
    pipeline.push(doc! { "$project": projection.clone() });
    pipeline.push(doc! { "$skip": skip });
    pipeline.push(doc! { "$limit": PAGE_SIZE as i64 });

    if let Some(lookup) = &options.lookup {
        pipeline.push(doc! {
            "$lookup": {
                "from": lookup.from,
                "localField": lookup.local_field,
                "foreignField": lookup.foreign_field,
                "as": lookup.as_field,
            }
        });

        let mut narrowed = projection;
        for field in lookup.fields {
            narrowed.insert(format!("{}.{}", lookup.as_field, field), 1);
        }
        pipeline.push(doc! { "$project": narrowed });
    }

    pipeline
}

fn read_count(counted: &[Document]) -> u64 {
    match counted.first().and_then(|d| d.get(COUNT_FIELD)) {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        _ => 0,
    }
}

/// Fetch page `page` (zero-based) of `collection`, projected to `fields`
pub async fn paginate<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    fields: &[&str],
    page: u64,
    options: &PageOptions,
) -> StoreResult<Page<T>> {
    let counted = store.aggregate(collection, count_pipeline(options)).await?;
    let total_count = read_count(&counted);

    let documents = store
        .aggregate(collection, page_pipeline(fields, page, options))
        .await?;

    let data = documents
        .into_iter()
        .map(mongodb::bson::from_document::<T>)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(collection, page, total_count, returned = data.len(), "page fetched");

    Ok(Page {
        data,
        meta: PageMeta::compute(page, total_count),
    })
}
