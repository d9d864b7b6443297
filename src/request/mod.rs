//! Request interpretation: one HTTP request in, one validated
//! [`RequestContext`] out.
//!
//! The [`RequestInterpreter`] drives the stages in a fixed order: path
//! interpretation and route validation, catalog and metadata resolution,
//! relationship validation, locale negotiation, query-parameter parsing,
//! body decoding, action classification, primary-record resolution, and
//! finally body parsing. A failure at any stage aborts the rest; nothing
//! is partially committed.
//!
//! # Example
//!
//! ```rust,ignore
//! let interpreter = RequestInterpreter::builder()
//!     .config(config)
//!     .catalog(catalog)
//!     .metadata(metadata)
//!     .routes(routes)
//!     .schemas(schemas)
//!     .repository(repository)
//!     .build()?;
//!
//! let context = interpreter.interpret(&request)?;
//! println!("{} {:?}", context.primary_type, context.action);
//! ```

pub mod action;
pub mod body;
pub mod errors;
pub mod pagination;
pub mod path;
pub mod query;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::catalog::ResourceTypeCatalog;
use crate::config::JsonApiConfig;
use crate::contracts::{
    AllowAll, Authorizer, CanonicalLinksHydrant, LinksHydrant, LocaleNegotiator,
    QueryLocaleNegotiator, Repository, RouteIndex, SchemaIndex,
};
use crate::error::ConfigError;
use crate::http::{ApiRequest, HttpMethod};
use crate::metadata::{MetadataProvider, ResourceMetadata};
use crate::record::RecordRef;

pub use action::{ActionClassifier, ActionDescriptor, ActionName, ActionTarget, Cardinality};
pub use body::{BodyParser, BodyPayload, FieldBag, JSON_API_CONTENT_TYPE};
pub use errors::{ParseError, RepositoryError, RequestError};
pub use pagination::{PaginationParser, PaginationRequest};
pub use path::{PathInterpreter, RequestPath};
pub use query::{
    FilterParser, Filters, SortDirective, SortKind, SortOrder, Sorting, SortingParser,
};

/// Everything the pipeline knows about one request after interpretation.
///
/// Built fresh per request and discarded after the response is produced.
/// The [`ActionDescriptor`] is derived solely from the request shape and
/// never mutated afterwards.
#[derive(Clone)]
pub struct RequestContext {
    /// The primary resource type from the path.
    pub primary_type: String,
    /// The record kind the primary type resolved to.
    pub primary_kind: String,
    /// The metadata describing the primary kind.
    pub primary_metadata: Arc<ResourceMetadata>,
    /// The primary ids; empty for listing fetches.
    pub primary_ids: Vec<String>,
    /// The relationship segment, when the request targets one.
    pub relationship: Option<String>,
    /// The relationship ids, for multi-link deletes.
    pub relationship_ids: Vec<String>,
    /// The negotiated locale, if any.
    pub locale: Option<String>,
    /// Whether the request asked for i18n metadata (`meta=i18n`).
    pub i18n: bool,
    /// The include chains, each an ordered list of relationship names.
    pub include: Vec<Vec<String>>,
    /// Sparse fieldsets per resource type.
    pub sparse_fields: BTreeMap<String, Vec<String>>,
    /// The normalized sort directives.
    pub sorting: Sorting,
    /// The bucketed filter directives.
    pub filters: Filters,
    /// The pagination request, when `page` was given.
    pub pagination: Option<PaginationRequest>,
    /// The classified action.
    pub action: ActionDescriptor,
    /// The records the primary ids resolved to.
    pub records: Vec<RecordRef>,
    /// The parsed and validated body payload.
    pub payload: BodyPayload,
    /// The body decoded as JSON, for stages that need to peek at it.
    pub decoded_body: Option<Value>,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("primary_type", &self.primary_type)
            .field("primary_ids", &self.primary_ids)
            .field("relationship", &self.relationship)
            .field("action", &self.action)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

/// The request-interpretation pipeline.
///
/// Holds only shared, read-only collaborators; all per-request state lives
/// in the [`RequestContext`] it returns, so one interpreter serves
/// concurrent requests.
pub struct RequestInterpreter {
    config: JsonApiConfig,
    catalog: Arc<ResourceTypeCatalog>,
    metadata: Arc<dyn MetadataProvider>,
    routes: Arc<dyn RouteIndex>,
    schemas: Arc<dyn SchemaIndex>,
    repository: Arc<dyn Repository>,
    authorizer: Arc<dyn Authorizer>,
    hydrant: Arc<dyn LinksHydrant>,
    locales: Arc<dyn LocaleNegotiator>,
}

impl RequestInterpreter {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> RequestInterpreterBuilder {
        RequestInterpreterBuilder::default()
    }

    /// Interprets one request into a [`RequestContext`].
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] as classified by the failing stage; see
    /// [`errors`](crate::request::errors) for the taxonomy.
    pub fn interpret(&self, request: &ApiRequest) -> Result<RequestContext, RequestError> {
        if request.has_body() && request.method == HttpMethod::Delete {
            return Err(ParseError::ContentOnDelete.into());
        }

        let path = PathInterpreter::new(&self.config, self.routes.as_ref()).interpret(request)?;

        let primary_type = path.resource_type.clone();
        let primary_kind = self
            .catalog
            .resolve(&primary_type)
            .ok_or_else(|| RequestError::ResourceTypeUnknown {
                resource_type: primary_type.clone(),
            })?
            .to_string();
        let primary_metadata = self.metadata.describe(&primary_kind)?;

        if let Some(relationship) = path.relationship.as_deref() {
            if !primary_metadata.is_relationship(relationship)
                || primary_metadata.is_link_only_relationship(relationship)
            {
                return Err(RequestError::RelationshipNotFound {
                    relationship: relationship.to_string(),
                });
            }
        }

        let locale = self.locales.negotiate(request);
        let include = query::parse_include(&request.query);
        let sparse_fields = query::parse_sparse_fields(&request.query, &primary_type);
        let pagination = PaginationParser::new(&primary_metadata).parse(request)?;
        let sorting = SortingParser::new(&primary_metadata).parse(&request.query, &primary_type);
        let filters = FilterParser::new(&primary_metadata).parse(&request.query);

        let decoded_body = match &request.body {
            Some(raw) if !raw.is_empty() => {
                Some(
                    serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson {
                        message: e.to_string(),
                    })?,
                )
            }
            _ => None,
        };

        let action = ActionClassifier::new(&primary_metadata).classify(
            request.method,
            &path,
            decoded_body.as_ref(),
        )?;

        let records =
            self.resolve_primary_records(&primary_kind, &path.primary_ids, locale.as_deref())?;

        let mut context = RequestContext {
            primary_type,
            primary_kind,
            primary_metadata,
            primary_ids: path.primary_ids,
            relationship: path.relationship,
            relationship_ids: path.relationship_ids,
            locale,
            i18n: query::parse_i18n(&request.query),
            include,
            sparse_fields,
            sorting,
            filters,
            pagination,
            action,
            records,
            payload: BodyPayload::None,
            decoded_body,
        };

        context.payload =
            BodyParser::new(self.schemas.as_ref(), self.hydrant.as_ref())
                .parse(request, &context)?;

        tracing::debug!(
            primary_type = %context.primary_type,
            action = ?context.action.name,
            target = ?context.action.target,
            cardinality = ?context.action.cardinality,
            ids = context.primary_ids.len(),
            "request interpreted"
        );

        Ok(context)
    }

    fn resolve_primary_records(
        &self,
        kind: &str,
        ids: &[String],
        locale: Option<&str>,
    ) -> Result<Vec<RecordRef>, RequestError> {
        let mut records = Vec::with_capacity(ids.len());

        for id in ids {
            let record = self
                .repository
                .find_by_id(kind, id, locale)?
                .ok_or_else(|| RequestError::EntityNotFound { id: id.clone() })?;

            if !self.authorizer.can_view(record.as_ref()) {
                return Err(RequestError::EntityAccessDenied { id: id.clone() });
            }

            records.push(record);
        }

        Ok(records)
    }
}

/// Builder for [`RequestInterpreter`].
///
/// Required: `catalog`, `metadata`, `routes`, `schemas`, `repository`.
/// Optional, with defaults: `config` (all defaults), `authorizer`
/// (allow-all), `hydrant` (canonical links), `locales` (query parameter).
#[derive(Default)]
pub struct RequestInterpreterBuilder {
    config: Option<JsonApiConfig>,
    catalog: Option<Arc<ResourceTypeCatalog>>,
    metadata: Option<Arc<dyn MetadataProvider>>,
    routes: Option<Arc<dyn RouteIndex>>,
    schemas: Option<Arc<dyn SchemaIndex>>,
    repository: Option<Arc<dyn Repository>>,
    authorizer: Option<Arc<dyn Authorizer>>,
    hydrant: Option<Arc<dyn LinksHydrant>>,
    locales: Option<Arc<dyn LocaleNegotiator>>,
}

impl RequestInterpreterBuilder {
    /// Sets the pipeline configuration.
    #[must_use]
    pub fn config(mut self, config: JsonApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the resource-type catalog (required).
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<ResourceTypeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the metadata provider (required).
    #[must_use]
    pub fn metadata(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the route index (required).
    #[must_use]
    pub fn routes(mut self, routes: Arc<dyn RouteIndex>) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Sets the schema index (required).
    #[must_use]
    pub fn schemas(mut self, schemas: Arc<dyn SchemaIndex>) -> Self {
        self.schemas = Some(schemas);
        self
    }

    /// Sets the repository (required).
    #[must_use]
    pub fn repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Sets the authorizer. Defaults to allow-all.
    #[must_use]
    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Sets the links hydrant. Defaults to the canonicalizing hydrant.
    #[must_use]
    pub fn hydrant(mut self, hydrant: Arc<dyn LinksHydrant>) -> Self {
        self.hydrant = Some(hydrant);
        self
    }

    /// Sets the locale negotiator. Defaults to the `locale` query
    /// parameter.
    #[must_use]
    pub fn locales(mut self, locales: Arc<dyn LocaleNegotiator>) -> Self {
        self.locales = Some(locales);
        self
    }

    /// Builds the interpreter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] when a required
    /// collaborator was not set.
    pub fn build(self) -> Result<RequestInterpreter, ConfigError> {
        Ok(RequestInterpreter {
            config: self.config.unwrap_or_default(),
            catalog: self
                .catalog
                .ok_or(ConfigError::MissingRequiredField { field: "catalog" })?,
            metadata: self
                .metadata
                .ok_or(ConfigError::MissingRequiredField { field: "metadata" })?,
            routes: self
                .routes
                .ok_or(ConfigError::MissingRequiredField { field: "routes" })?,
            schemas: self
                .schemas
                .ok_or(ConfigError::MissingRequiredField { field: "schemas" })?,
            repository: self
                .repository
                .ok_or(ConfigError::MissingRequiredField {
                    field: "repository",
                })?,
            authorizer: self.authorizer.unwrap_or_else(|| Arc::new(AllowAll)),
            hydrant: self
                .hydrant
                .unwrap_or_else(|| Arc::new(CanonicalLinksHydrant)),
            locales: self
                .locales
                .unwrap_or_else(|| Arc::new(QueryLocaleNegotiator)),
        })
    }
}

// Verify the interpreter is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RequestInterpreter>();
    assert_send_sync::<RequestContext>();
};
