//! Positional path interpretation and route validation.
//!
//! A JSON-API path under the configured base path has up to five
//! positional segments:
//!
//! ```text
//! /{type}/{ids}/{field-or-links}/{relationship}/{relationship-ids}
//! ```
//!
//! Ids are comma-separated. The interpreter splits the segments, checks
//! the (path, verb) pair against the declared routes, and enforces the id
//! bounds; it knows nothing about metadata — relationship names are
//! validated later, once the primary kind is known.

use crate::config::JsonApiConfig;
use crate::contracts::RouteIndex;
use crate::http::ApiRequest;
use crate::request::errors::{ParseError, RequestError};

/// Positions of the path parts under the base path.
const PRIMARY_RESOURCE_TYPE: usize = 0;
const PRIMARY_RESOURCE_IDS: usize = 1;
const PRIMARY_RESOURCE_FIELD: usize = 2;
const PRIMARY_RESOURCE_RELATIONSHIP: usize = 3;
// For multiple relationship deletes.
const RELATIONSHIP_RESOURCE_IDS: usize = 4;

/// The positional parts of one request path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestPath {
    /// The normalized path under the base path, with a leading slash.
    pub normalized: String,
    /// The primary resource type segment.
    pub resource_type: String,
    /// The primary ids, split on commas. Empty for listing fetches.
    pub primary_ids: Vec<String>,
    /// The field-or-links segment, when present.
    pub field: Option<String>,
    /// The relationship name segment, when present.
    pub relationship: Option<String>,
    /// The relationship ids, split on commas.
    pub relationship_ids: Vec<String>,
}

/// Splits request paths positionally and validates them against the
/// declared routes.
pub struct PathInterpreter<'a> {
    config: &'a JsonApiConfig,
    routes: &'a dyn RouteIndex,
}

impl<'a> PathInterpreter<'a> {
    /// Creates an interpreter over the given configuration and routes.
    #[must_use]
    pub const fn new(config: &'a JsonApiConfig, routes: &'a dyn RouteIndex) -> Self {
        Self { config, routes }
    }

    /// Interprets the request path.
    ///
    /// # Errors
    ///
    /// - [`RequestError::MissingBasePath`] when no base path is
    ///   configured.
    /// - [`RequestError::RouteNotFound`] when the path matches no route.
    /// - [`RequestError::ActionNotAllowed`] when the path is declared but
    ///   not for this verb; carries the verbs that are.
    /// - [`ParseError::MultipleIdsWithRelationship`] and
    ///   [`ParseError::DocumentTooLarge`] for id-bound violations.
    pub fn interpret(&self, request: &ApiRequest) -> Result<RequestPath, RequestError> {
        let segments = self.path_segments(request)?;
        let normalized = format!("/{}", segments.join("/"));

        if !self.routes.is_defined(request.method, &normalized) {
            let allowed = self.routes.allowed_methods(&normalized);

            if allowed.is_empty() {
                return Err(RequestError::RouteNotFound { path: normalized });
            }

            return Err(RequestError::ActionNotAllowed {
                path: normalized,
                allowed,
            });
        }

        let part = |index: usize| segments.get(index).cloned();

        let resource_type = part(PRIMARY_RESOURCE_TYPE)
            .ok_or_else(|| RequestError::RouteNotFound {
                path: normalized.clone(),
            })?;
        let primary_ids = split_ids(part(PRIMARY_RESOURCE_IDS));
        let field = part(PRIMARY_RESOURCE_FIELD);
        let relationship = part(PRIMARY_RESOURCE_RELATIONSHIP);
        let relationship_ids = split_ids(part(RELATIONSHIP_RESOURCE_IDS));

        if primary_ids.len() > 1 && (field.is_some() || relationship.is_some()) {
            return Err(ParseError::MultipleIdsWithRelationship.into());
        }

        let limit = self.config.max_document_resources();
        for ids in [&primary_ids, &relationship_ids] {
            if ids.len() > limit {
                return Err(ParseError::DocumentTooLarge {
                    count: ids.len(),
                    limit,
                }
                .into());
            }
        }

        Ok(RequestPath {
            normalized,
            resource_type,
            primary_ids,
            field,
            relationship,
            relationship_ids,
        })
    }

    fn path_segments(&self, request: &ApiRequest) -> Result<Vec<String>, RequestError> {
        let base = self
            .config
            .api_base_path()
            .ok_or(RequestError::MissingBasePath)?;

        let remainder = request
            .path
            .strip_prefix(base.as_str())
            .ok_or_else(|| RequestError::RouteNotFound {
                path: request.path.clone(),
            })?;

        Ok(remainder
            .split('/')
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect())
    }
}

fn split_ids(segment: Option<String>) -> Vec<String> {
    segment
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').map(ToString::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiBasePath;
    use crate::contracts::StaticRoutes;
    use crate::http::HttpMethod;

    fn config() -> JsonApiConfig {
        JsonApiConfig::builder()
            .api_base_path(ApiBasePath::new("/api/v1").unwrap())
            .max_document_resources(3)
            .build()
    }

    fn routes() -> StaticRoutes {
        let mut routes = StaticRoutes::new();
        routes.declare("/users", &[HttpMethod::Get, HttpMethod::Post]);
        routes.declare("/users/{ids}", &[HttpMethod::Get, HttpMethod::Put]);
        routes.declare("/users/{ids}/linked/{relationship}", &[HttpMethod::Get]);
        routes.declare(
            "/users/{ids}/links/{relationship}",
            &[HttpMethod::Post, HttpMethod::Delete],
        );
        routes.declare(
            "/users/{ids}/links/{relationship}/{ids}",
            &[HttpMethod::Delete],
        );
        routes
    }

    fn interpret(method: HttpMethod, path: &str) -> Result<RequestPath, RequestError> {
        let config = config();
        let routes = routes();
        let request = ApiRequest::builder(method, path).build();
        PathInterpreter::new(&config, &routes).interpret(&request)
    }

    #[test]
    fn test_splits_type_ids_and_relationship_positionally() {
        let path = interpret(HttpMethod::Get, "/api/v1/users/1/linked/groups").unwrap();

        assert_eq!(path.resource_type, "users");
        assert_eq!(path.primary_ids, vec!["1"]);
        assert_eq!(path.field.as_deref(), Some("linked"));
        assert_eq!(path.relationship.as_deref(), Some("groups"));
        assert!(path.relationship_ids.is_empty());
    }

    #[test]
    fn test_listing_fetch_has_no_ids() {
        let path = interpret(HttpMethod::Get, "/api/v1/users").unwrap();

        assert_eq!(path.resource_type, "users");
        assert!(path.primary_ids.is_empty());
        assert!(path.relationship.is_none());
    }

    #[test]
    fn test_comma_separated_ids_are_split() {
        let path = interpret(HttpMethod::Get, "/api/v1/users/1,2,3").unwrap();
        assert_eq!(path.primary_ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_relationship_delete_collects_relationship_ids() {
        let path = interpret(HttpMethod::Delete, "/api/v1/users/1/links/groups/2,3").unwrap();
        assert_eq!(path.relationship.as_deref(), Some("groups"));
        assert_eq!(path.relationship_ids, vec!["2", "3"]);
    }

    #[test]
    fn test_undeclared_verb_reports_allowed_methods() {
        let error = interpret(HttpMethod::Delete, "/api/v1/users/1").unwrap_err();

        match error {
            RequestError::ActionNotAllowed { allowed, .. } => {
                assert_eq!(allowed, vec![HttpMethod::Get, HttpMethod::Put]);
            }
            other => panic!("expected ActionNotAllowed, got {other:?}"),
        }
    }

    #[test]
    fn test_undeclared_path_is_route_not_found() {
        let error = interpret(HttpMethod::Get, "/api/v1/unknown/1/2/3/4/5").unwrap_err();
        assert!(matches!(error, RequestError::RouteNotFound { .. }));
    }

    #[test]
    fn test_path_outside_base_is_route_not_found() {
        let error = interpret(HttpMethod::Get, "/other/users").unwrap_err();
        assert!(matches!(error, RequestError::RouteNotFound { .. }));
    }

    #[test]
    fn test_missing_base_path_is_a_config_error() {
        let config = JsonApiConfig::builder().build();
        let routes = routes();
        let request = ApiRequest::builder(HttpMethod::Get, "/api/v1/users").build();
        let error = PathInterpreter::new(&config, &routes)
            .interpret(&request)
            .unwrap_err();

        assert!(matches!(error, RequestError::MissingBasePath));
    }

    #[test]
    fn test_multiple_ids_with_relationship_is_rejected() {
        let error = interpret(HttpMethod::Get, "/api/v1/users/1,2/linked/groups").unwrap_err();
        assert!(matches!(
            error,
            RequestError::Parse(ParseError::MultipleIdsWithRelationship)
        ));
    }

    #[test]
    fn test_too_many_ids_is_document_too_large() {
        let error = interpret(HttpMethod::Get, "/api/v1/users/1,2,3,4").unwrap_err();
        assert!(matches!(
            error,
            RequestError::Parse(ParseError::DocumentTooLarge { count: 4, limit: 3 })
        ));
    }
}
