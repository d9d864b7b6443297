//! Error types for request interpretation.
//!
//! Two layers: [`ParseError`] covers request-shape problems (client
//! errors), while [`RequestError`] is the unified type every pipeline
//! stage returns, also covering routing failures, contract
//! misconfiguration and record resolution.
//!
//! Nothing here is recovered or retried inside the crate; each failure is
//! classified once and propagated.

use thiserror::Error;

use crate::http::HttpMethod;
use crate::metadata::MetadataError;

/// Request-shape problems: the request is structurally not what JSON-API
/// expects. Always a client error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A DELETE request carried a body.
    #[error("JSON-API expects DELETE requests not to have a body.")]
    ContentOnDelete,

    /// Several primary ids were combined with a field or relationship
    /// segment.
    #[error("Multiple Ids are not supported when requesting a resource field or link.")]
    MultipleIdsWithRelationship,

    /// More ids were addressed than a single document may hold.
    #[error("The request addresses {count} resources; at most {limit} are allowed per document.")]
    DocumentTooLarge {
        /// How many ids the request addressed.
        count: usize,
        /// The configured bound.
        limit: usize,
    },

    /// The body is not valid JSON.
    #[error("The request body is not valid JSON: {message}")]
    InvalidJson {
        /// The decoder's message.
        message: String,
    },

    /// The primary-type key is missing from the body.
    #[error("The resource type key \"{resource_type}\" is missing from the body.")]
    MissingPrimaryTypeKey {
        /// The expected key.
        resource_type: String,
    },

    /// The value under the primary-type key is neither an object nor an
    /// array of objects.
    #[error("The value under the \"{resource_type}\" key must be a resource object or an array of resource objects.")]
    ExpectedResourceObject {
        /// The primary-type key.
        resource_type: String,
    },

    /// A relationship payload has no `links` object.
    #[error("The relationship payload is missing its \"links\" object.")]
    MissingLinksObject,

    /// An update payload omits the record id and the URL does not pin one.
    #[error("An update payload is missing its \"id\" member.")]
    MissingRecordId,

    /// A payload does not match its schema.
    #[error("The body does not match the expected schema: {message}")]
    SchemaMismatch {
        /// The validator's message.
        message: String,
    },

    /// A query parameter holds an unusable value.
    #[error("The query parameter \"{name}\" has an invalid value: \"{value}\".")]
    InvalidQueryParameter {
        /// The parameter name.
        name: String,
        /// The offending value.
        value: String,
    },
}

/// Unified error type for request interpretation.
///
/// Variants map onto HTTP status families (routing → 404/405, parse →
/// 400, media type → 415, schema configuration → 5xx); the exact wiring
/// is the embedding server's concern.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The API base path is not configured. A deployment error, not a
    /// request error.
    #[error("The API base path is not configured.")]
    MissingBasePath,

    /// The path matches no declared route at all.
    #[error("The requested path \"{path}\" does not match any declared route.")]
    RouteNotFound {
        /// The normalized request path.
        path: String,
    },

    /// The path is declared, but not for this verb.
    #[error("The attempted action is not allowed on the requested resource. Supported HTTP methods are [{}].", .allowed.iter().map(HttpMethod::as_str).collect::<Vec<_>>().join(", "))]
    ActionNotAllowed {
        /// The normalized request path.
        path: String,
        /// The verbs that are declared for the path.
        allowed: Vec<HttpMethod>,
    },

    /// The resource type has no record kind in the catalog.
    #[error("The requested resource was not found.")]
    ResourceTypeUnknown {
        /// The resource type from the path.
        resource_type: String,
    },

    /// The relationship segment names no inlinable relationship.
    #[error("The requested relationship is undefined or can only be accessed through its own URL, filtering by its relationship with the current resource.")]
    RelationshipNotFound {
        /// The relationship name from the path.
        relationship: String,
    },

    /// The request shape is invalid.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A write carried the wrong content type.
    #[error("The expected content type is \"{expected}\". The content type \"{actual}\" is not supported.")]
    UnsupportedMediaType {
        /// The content type this API accepts.
        expected: &'static str,
        /// What the request carried.
        actual: String,
    },

    /// No request schema is configured for the current action. Fatal
    /// contract misconfiguration.
    #[error("A request schema was expected for the current action upon the resource \"{resource_type}\".")]
    MissingSchema {
        /// The primary resource type.
        resource_type: String,
    },

    /// The configured request schema lacks the primary-type key. Fatal
    /// contract misconfiguration.
    #[error("The request schema for the current action is missing the primary type key, \"{resource_type}\".")]
    MalformedSchema {
        /// The primary resource type.
        resource_type: String,
    },

    /// A supplied translation map does not cover a record in the request.
    #[error("A translation is missing for the entity with the Id \"{id}\".")]
    MissingTranslation {
        /// The uncovered record id.
        id: String,
    },

    /// A primary id resolved to no record.
    #[error("No entity was found for the Id \"{id}\".")]
    EntityNotFound {
        /// The unresolved id.
        id: String,
    },

    /// A primary id resolved to a record the subject may not view.
    #[error("Access to the entity with the Id \"{id}\" is denied.")]
    EntityAccessDenied {
        /// The denied id.
        id: String,
    },

    /// The repository collaborator failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A metadata lookup failed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// A typed failure surfaced by the repository collaborator.
///
/// Timeouts and retries are the collaborator's responsibility; by the time
/// a failure reaches this crate it is final.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RepositoryError {
    /// A human-readable description of the failure.
    pub message: String,
}

impl RepositoryError {
    /// Creates a new repository error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RequestError>();
    assert_send_sync::<ParseError>();
};
