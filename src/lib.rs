//! # JSON-API Pipeline
//!
//! A JSON-API request interpreter and response-document assembler. The
//! crate turns an inbound HTTP request (path, query string, body) into a
//! validated [`RequestContext`] with a classified [`ActionDescriptor`],
//! and turns a set of domain records into a spec-compliant document graph:
//! primary resources, de-duplicated included resources, sparse fieldsets
//! and pagination links.
//!
//! ## Overview
//!
//! The pipeline runs once per request, in a fixed stage order:
//!
//! 1. Path interpretation and route validation ([`request::path`])
//! 2. Catalog and metadata resolution ([`catalog`], [`metadata`])
//! 3. Query-parameter parsing: sort, filter, include, sparse fields,
//!    pagination ([`request::query`], [`request::pagination`])
//! 4. Action classification ([`request::action`])
//! 5. Body parsing and schema validation for writes ([`request::body`])
//! 6. Document assembly with a bounded, de-duplicated inclusion walk
//!    ([`document::assembler`])
//! 7. Per-record serialization ([`document::serializer`])
//!
//! Storage, authorization, routing tables and schemas are consumed
//! through the trait contracts in [`contracts`]; the crate ships small
//! in-memory implementations of each for tests and single-process use.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use jsonapi_pipeline::catalog::CatalogBuilder;
//! use jsonapi_pipeline::contracts::{InMemoryRepository, StaticRoutes, StaticSchemas};
//! use jsonapi_pipeline::metadata::{MetadataIndex, ResourceMetadata};
//! use jsonapi_pipeline::{
//!     ApiBasePath, ApiRequest, HttpMethod, JsonApiConfig, RequestInterpreter,
//! };
//!
//! // Describe the record kinds.
//! let mut metadata = MetadataIndex::new();
//! metadata.insert(
//!     "User",
//!     ResourceMetadata::builder("users")
//!         .fields(["name", "surname"])
//!         .build()
//!         .unwrap(),
//! );
//!
//! // Map resource types to record kinds.
//! let catalog = CatalogBuilder::new()
//!     .declare("users", "User")
//!     .build(&["users"])
//!     .unwrap();
//!
//! // Declare the routes of the API contract.
//! let mut routes = StaticRoutes::new();
//! routes.declare("/users", &[HttpMethod::Get]);
//!
//! let interpreter = RequestInterpreter::builder()
//!     .config(
//!         JsonApiConfig::builder()
//!             .api_base_path(ApiBasePath::new("/api/v1").unwrap())
//!             .build(),
//!     )
//!     .catalog(Arc::new(catalog))
//!     .metadata(Arc::new(metadata))
//!     .routes(Arc::new(routes))
//!     .schemas(Arc::new(StaticSchemas::new()))
//!     .repository(Arc::new(InMemoryRepository::new()))
//!     .build()
//!     .unwrap();
//!
//! let request = ApiRequest::builder(HttpMethod::Get, "/api/v1/users")
//!     .query_str("sort=name&fields=name,surname")
//!     .build();
//!
//! let context = interpreter.interpret(&request).unwrap();
//! assert_eq!(context.primary_type, "users");
//! ```
//!
//! ## Assembling a document
//!
//! ```rust,ignore
//! let assembler = DocumentAssembler::new(&metadata, &authorizer);
//! let options = AssemblyOptions::from_context(&context, Some(total));
//! let document = assembler.assemble(&primary, &options)?;
//! let body = document.to_value();
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration, blacklists and catalogs are
//!   instance values passed explicitly
//! - **One pass per request**: all per-request state lives in values
//!   created for that request; components hold only read-only shared data
//! - **Classify precisely, propagate once**: every failure is a typed
//!   error; nothing is retried and no partial documents are emitted
//! - **Thread-safe**: shared types are `Send + Sync`

pub mod catalog;
pub mod config;
pub mod contracts;
pub mod document;
pub mod error;
pub mod http;
pub mod metadata;
pub mod record;
pub mod request;
pub mod util;

// Re-export the common surface at the crate root for convenience
pub use config::{ApiBasePath, JsonApiConfig, JsonApiConfigBuilder, PageSize};
pub use error::ConfigError;
pub use http::{ApiRequest, ApiRequestBuilder, HttpMethod, QueryParams};

pub use request::{
    ActionDescriptor, ActionName, ActionTarget, BodyPayload, Cardinality, ParseError,
    RepositoryError, RequestContext, RequestError, RequestInterpreter, RequestInterpreterBuilder,
    JSON_API_CONTENT_TYPE,
};

pub use document::{
    AssemblyOptions, Document, DocumentAssembler, DocumentPagination, PrimaryData,
    ResourceObjectSerializer, SerializationError, INCLUSION_DEPTH_LIMIT,
};

pub use record::{AccessError, FieldValue, RecordRef, RecordSet, Related, ResourceRecord};
