//! Contracts for the pipeline's external collaborators.
//!
//! The pipeline consumes storage, authorization, routing, schemas, link
//! hydration and locale negotiation through the narrow traits defined
//! here. Each trait ships with a small in-memory implementation, enough
//! for tests and single-process deployments; production embedders supply
//! their own.
//!
//! All collaborator calls are synchronous from the pipeline's point of
//! view: timeouts and retries are the collaborator's responsibility, and
//! failures arrive as typed errors.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::http::{ApiRequest, HttpMethod};
use crate::metadata::ResourceMetadata;
use crate::record::RecordRef;
use crate::request::errors::{ParseError, RepositoryError, RequestError};
use crate::request::query::{Filters, Sorting};

/// Route lookup: which (path, verb) pairs the API contract declares.
pub trait RouteIndex: Send + Sync {
    /// Returns `true` if the verb is declared for the path.
    fn is_defined(&self, method: HttpMethod, path: &str) -> bool;

    /// Returns every verb declared for the path, in declaration order.
    fn allowed_methods(&self, path: &str) -> Vec<HttpMethod>;
}

/// An in-memory [`RouteIndex`] over path patterns.
///
/// Pattern segments are matched literally, except `{name}` segments,
/// which match any single path segment.
///
/// # Example
///
/// ```rust
/// use jsonapi_pipeline::contracts::{RouteIndex, StaticRoutes};
/// use jsonapi_pipeline::HttpMethod;
///
/// let mut routes = StaticRoutes::new();
/// routes.declare("/users", &[HttpMethod::Get, HttpMethod::Post]);
/// routes.declare("/users/{ids}", &[HttpMethod::Get]);
///
/// assert!(routes.is_defined(HttpMethod::Get, "/users/1,2"));
/// assert!(!routes.is_defined(HttpMethod::Delete, "/users/1"));
/// assert_eq!(routes.allowed_methods("/users").len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct StaticRoutes {
    routes: Vec<(Vec<String>, Vec<HttpMethod>)>,
}

impl StaticRoutes {
    /// Creates an empty route index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a path pattern and the verbs allowed on it.
    pub fn declare(&mut self, pattern: &str, methods: &[HttpMethod]) {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
        self.routes.push((segments, methods.to_vec()));
    }

    fn matches(pattern: &[String], path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        segments.len() == pattern.len()
            && pattern
                .iter()
                .zip(&segments)
                .all(|(p, s)| p.starts_with('{') || p == s)
    }
}

impl RouteIndex for StaticRoutes {
    fn is_defined(&self, method: HttpMethod, path: &str) -> bool {
        self.routes
            .iter()
            .any(|(pattern, methods)| Self::matches(pattern, path) && methods.contains(&method))
    }

    fn allowed_methods(&self, path: &str) -> Vec<HttpMethod> {
        let mut allowed = Vec::new();

        for (pattern, methods) in &self.routes {
            if Self::matches(pattern, path) {
                for method in methods {
                    if !allowed.contains(method) {
                        allowed.push(*method);
                    }
                }
            }
        }

        allowed
    }
}

/// Schema lookup and validation for write payloads.
///
/// Schemas are JSON values in JSON-Schema style; how they are authored and
/// loaded is outside this crate.
pub trait SchemaIndex: Send + Sync {
    /// Returns the request schema declared for the verb and path, if any.
    fn find_request_schema(&self, method: HttpMethod, path: &str) -> Option<Value>;

    /// Validates a payload against a schema.
    ///
    /// # Errors
    ///
    /// Returns the validator's message when the payload does not match.
    fn validate(&self, payload: &Value, schema: &Value) -> Result<(), String>;
}

/// An in-memory [`SchemaIndex`] with a minimal structural validator.
///
/// The validator understands `type`, `properties`, `required` and `items`;
/// it stands in for whatever JSON-schema engine the embedder's contract
/// tooling provides.
#[derive(Debug, Default)]
pub struct StaticSchemas {
    schemas: HashMap<(HttpMethod, String), Value>,
}

impl StaticSchemas {
    /// Creates an empty schema index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the request schema for a verb and path.
    pub fn declare(&mut self, method: HttpMethod, path: &str, schema: Value) {
        self.schemas.insert((method, path.to_string()), schema);
    }

    fn check(payload: &Value, schema: &Value, at: &str) -> Result<(), String> {
        let Some(schema) = schema.as_object() else {
            return Ok(());
        };

        if let Some(expected) = schema.get("type").and_then(Value::as_str) {
            let ok = match expected {
                "object" => payload.is_object(),
                "array" => payload.is_array(),
                "string" => payload.is_string(),
                "number" => payload.is_number(),
                "integer" => payload.is_i64() || payload.is_u64(),
                "boolean" => payload.is_boolean(),
                "null" => payload.is_null(),
                _ => true,
            };
            if !ok {
                return Err(format!("expected type \"{expected}\" at \"{at}\""));
            }
        }

        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if payload.get(name).is_none() {
                    return Err(format!("missing required member \"{name}\" at \"{at}\""));
                }
            }
        }

        if let (Some(properties), Some(object)) = (
            schema.get("properties").and_then(Value::as_object),
            payload.as_object(),
        ) {
            for (name, subschema) in properties {
                if let Some(member) = object.get(name) {
                    Self::check(member, subschema, &format!("{at}/{name}"))?;
                }
            }
        }

        if let (Some(items), Some(array)) = (schema.get("items"), payload.as_array()) {
            for (index, member) in array.iter().enumerate() {
                Self::check(member, items, &format!("{at}/{index}"))?;
            }
        }

        Ok(())
    }
}

impl SchemaIndex for StaticSchemas {
    fn find_request_schema(&self, method: HttpMethod, path: &str) -> Option<Value> {
        self.schemas.get(&(method, path.to_string())).cloned()
    }

    fn validate(&self, payload: &Value, schema: &Value) -> Result<(), String> {
        Self::check(payload, schema, "")
    }
}

/// One page of records from the repository.
#[derive(Clone)]
pub struct RecordPage {
    /// The records, in storage order.
    pub records: Vec<RecordRef>,
    /// The total count across all pages, when the store provides it.
    pub total: Option<u64>,
}

/// Storage lookup: the only way the pipeline reaches records.
///
/// Filtering and sorting translation into storage-native operations is
/// the implementation's concern; `custom` directives in particular carry
/// no meaning to this crate.
pub trait Repository: Send + Sync {
    /// Finds records of a kind with filtering, sorting and pagination.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when the store fails.
    fn find(
        &self,
        kind: &str,
        filters: &Filters,
        sorting: &Sorting,
        offset: u64,
        limit: u32,
        locale: Option<&str>,
    ) -> Result<RecordPage, RepositoryError>;

    /// Finds one record by id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when the store fails.
    fn find_by_id(
        &self,
        kind: &str,
        id: &str,
        locale: Option<&str>,
    ) -> Result<Option<RecordRef>, RepositoryError>;
}

/// An in-memory [`Repository`] over registered records.
///
/// Returns records in insertion order and ignores filter and sort
/// directives — translating those is a real store's concern.
#[derive(Default)]
pub struct InMemoryRepository {
    by_kind: Mutex<HashMap<String, Vec<RecordRef>>>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record under its kind.
    pub fn insert(&self, record: RecordRef) {
        if let Ok(mut guard) = self.by_kind.lock() {
            guard.entry(record.kind().to_string()).or_default().push(record);
        }
    }
}

impl Repository for InMemoryRepository {
    fn find(
        &self,
        kind: &str,
        _filters: &Filters,
        _sorting: &Sorting,
        offset: u64,
        limit: u32,
        _locale: Option<&str>,
    ) -> Result<RecordPage, RepositoryError> {
        let guard = self
            .by_kind
            .lock()
            .map_err(|_| RepositoryError::new("record store poisoned"))?;
        let all = guard.get(kind).cloned().unwrap_or_default();
        let total = Some(all.len() as u64);
        let records = all
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect();

        Ok(RecordPage { records, total })
    }

    fn find_by_id(
        &self,
        kind: &str,
        id: &str,
        _locale: Option<&str>,
    ) -> Result<Option<RecordRef>, RepositoryError> {
        let guard = self
            .by_kind
            .lock()
            .map_err(|_| RepositoryError::new("record store poisoned"))?;

        Ok(guard
            .get(kind)
            .and_then(|records| records.iter().find(|r| r.id() == id).cloned()))
    }
}

/// Authorization check: may the current subject view a record?
///
/// The subject is bound when the implementation is constructed, typically
/// per request.
pub trait Authorizer: Send + Sync {
    /// Returns `true` if the record may be viewed.
    fn can_view(&self, record: &dyn crate::record::ResourceRecord) -> bool;
}

/// An [`Authorizer`] that grants everything. The default.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn can_view(&self, _record: &dyn crate::record::ResourceRecord) -> bool {
        true
    }
}

/// Rewrites relationship-link shorthand into canonical form.
///
/// Runs on every normalized per-record payload *before* schema validation,
/// so schemas only ever see the canonical shape.
pub trait LinksHydrant: Send + Sync {
    /// Canonicalizes the `links` member of one record payload in place.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the shorthand cannot be
    /// canonicalized.
    fn hydrate(
        &self,
        metadata: &ResourceMetadata,
        payload: &mut serde_json::Map<String, Value>,
    ) -> Result<(), RequestError>;
}

/// The default [`LinksHydrant`].
///
/// To-many link values given as a bare scalar become a one-element array;
/// numeric ids become strings in both groups. Unknown link names are left
/// untouched for schema validation to judge.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalLinksHydrant;

impl CanonicalLinksHydrant {
    fn canonical_id(value: &Value) -> Option<Value> {
        match value {
            Value::Number(n) => Some(Value::String(n.to_string())),
            _ => None,
        }
    }
}

impl LinksHydrant for CanonicalLinksHydrant {
    fn hydrate(
        &self,
        metadata: &ResourceMetadata,
        payload: &mut serde_json::Map<String, Value>,
    ) -> Result<(), RequestError> {
        let Some(links) = payload.get_mut("links").and_then(Value::as_object_mut) else {
            return Ok(());
        };

        for (name, value) in links.iter_mut() {
            if metadata.is_to_many_relationship(name) {
                match value {
                    Value::String(_) | Value::Number(_) => {
                        let id = Self::canonical_id(value).unwrap_or_else(|| value.clone());
                        *value = Value::Array(vec![id]);
                    }
                    Value::Array(items) => {
                        for item in items.iter_mut() {
                            if let Some(id) = Self::canonical_id(item) {
                                *item = id;
                            }
                        }
                    }
                    _ => {
                        return Err(ParseError::MissingLinksObject.into());
                    }
                }
            } else if metadata.is_to_one_relationship(name) {
                if let Some(id) = Self::canonical_id(value) {
                    *value = id;
                }
            }
        }

        Ok(())
    }
}

/// Decides the locale a request should be served in.
pub trait LocaleNegotiator: Send + Sync {
    /// Returns the negotiated locale, if any.
    fn negotiate(&self, request: &ApiRequest) -> Option<String>;
}

/// A [`LocaleNegotiator`] that reads the `locale` query parameter. The
/// default.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryLocaleNegotiator;

impl LocaleNegotiator for QueryLocaleNegotiator {
    fn negotiate(&self, request: &ApiRequest) -> Option<String> {
        request
            .query
            .get("locale")
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
    }
}

// Verify contract implementations are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StaticRoutes>();
    assert_send_sync::<StaticSchemas>();
    assert_send_sync::<InMemoryRepository>();
    assert_send_sync::<AllowAll>();
    assert_send_sync::<CanonicalLinksHydrant>();
    assert_send_sync::<QueryLocaleNegotiator>();
};
