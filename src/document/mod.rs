//! The response document: primary data, included resources, pagination
//! links and meta.
//!
//! A [`Document`] is built once per request by the
//! [`DocumentAssembler`](assembler::DocumentAssembler) and serialized
//! immediately; nothing is cached across requests.

pub mod assembler;
pub mod errors;
pub mod links;
mod relation;
pub mod serializer;
pub mod value;

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

pub use assembler::{DocumentAssembler, IncludedResources, INCLUSION_DEPTH_LIMIT};
pub use errors::SerializationError;
pub use links::pagination_links;
pub use serializer::ResourceObjectSerializer;
pub use value::serialize_field_value;

use crate::request::{Cardinality, PaginationRequest, RequestContext};

/// The top-level `data` member: one resource object or a collection.
///
/// Whether a document is singular is decided by the request's
/// cardinality, not by how many records happened to match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrimaryData {
    /// A single resource object, or null when nothing matched.
    Single(Option<Value>),
    /// An ordered collection of resource objects.
    Collection(Vec<Value>),
}

/// Pagination state carried into link generation and document meta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentPagination {
    /// The total record count across all pages.
    pub total: u64,
    /// The 1-based page number.
    pub page: u64,
    /// The page size.
    pub size: u32,
    /// The storage offset of the first record on this page.
    pub offset: u64,
    /// The request URL stripped of `page` and `size`.
    pub paginationless_url: String,
}

impl DocumentPagination {
    /// Combines a parsed pagination request with the total count reported
    /// by the store.
    #[must_use]
    pub fn from_request(request: &PaginationRequest, total: u64) -> Self {
        Self {
            total,
            page: request.page,
            size: request.size,
            offset: request.offset,
            paginationless_url: request.paginationless_url.clone(),
        }
    }

    /// Returns the pagination facts as a meta value.
    #[must_use]
    pub fn to_meta(&self) -> Value {
        json!({
            "total": self.total,
            "page": self.page,
            "size": self.size,
            "offset": self.offset,
        })
    }
}

/// Inputs steering one document assembly.
#[derive(Clone, Debug, Default)]
pub struct AssemblyOptions {
    /// Emit `data` as a single object instead of a collection.
    pub singular: bool,
    /// The include chains to walk.
    pub include: Vec<Vec<String>>,
    /// Sparse fieldsets per resource type.
    pub sparse_fields: BTreeMap<String, Vec<String>>,
    /// Pagination, when the request was paginated and the store reported
    /// a total.
    pub pagination: Option<DocumentPagination>,
    /// Extra top-level meta members.
    pub meta: Map<String, Value>,
}

impl AssemblyOptions {
    /// Creates empty options: a collection document with no inclusions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives options from an interpreted request.
    ///
    /// `total` is the count reported by the store for paginated listing
    /// fetches; pagination links are only generated when both the request
    /// asked for a page and the store provided a total.
    #[must_use]
    pub fn from_context(context: &RequestContext, total: Option<u64>) -> Self {
        let pagination = match (&context.pagination, total) {
            (Some(request), Some(total)) => Some(DocumentPagination::from_request(request, total)),
            _ => None,
        };

        Self {
            singular: context.action.cardinality == Cardinality::Single,
            include: context.include.clone(),
            sparse_fields: context.sparse_fields.clone(),
            pagination,
            meta: Map::new(),
        }
    }
}

/// One assembled response document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// The primary data.
    pub data: PrimaryData,
    /// Included resource objects, de-duplicated, in first-seen order.
    pub included: Vec<Value>,
    /// Top-level links (pagination).
    pub links: BTreeMap<String, String>,
    /// Top-level meta.
    pub meta: Map<String, Value>,
}

impl Document {
    /// Returns how many primary resource objects the document holds.
    #[must_use]
    pub fn primary_len(&self) -> usize {
        match &self.data {
            PrimaryData::Single(single) => usize::from(single.is_some()),
            PrimaryData::Collection(collection) => collection.len(),
        }
    }

    /// Serializes the document to its top-level JSON value.
    ///
    /// `included`, `links` and `meta` are omitted when empty; `data` is
    /// always present.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut top = Map::new();

        let data = match &self.data {
            PrimaryData::Single(None) => Value::Null,
            PrimaryData::Single(Some(object)) => object.clone(),
            PrimaryData::Collection(objects) => Value::Array(objects.clone()),
        };
        top.insert("data".to_string(), data);

        if !self.included.is_empty() {
            top.insert("included".to_string(), Value::Array(self.included.clone()));
        }

        if !self.links.is_empty() {
            let links: Map<String, Value> = self
                .links
                .iter()
                .map(|(name, href)| (name.clone(), Value::String(href.clone())))
                .collect();
            top.insert("links".to_string(), Value::Object(links));
        }

        if !self.meta.is_empty() {
            top.insert("meta".to_string(), Value::Object(self.meta.clone()));
        }

        Value::Object(top)
    }
}

// Verify document types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Document>();
    assert_send_sync::<AssemblyOptions>();
};
