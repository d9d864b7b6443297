//! Request action classification.
//!
//! Classifies each request into an [`ActionDescriptor`]: what it does
//! (fetch, create, update, delete), what it targets (a resource or a
//! relationship), and its cardinality (one record or many).
//!
//! Classifying batch writes requires a peek at the decoded body: a JSON
//! array under the primary-type key marks a batch payload. That coupling
//! is deliberate — cardinality is part of the action, and the body is the
//! only place it shows for writes.

use serde_json::Value;

use crate::http::HttpMethod;
use crate::metadata::ResourceMetadata;
use crate::request::errors::{ParseError, RequestError};
use crate::request::path::RequestPath;

/// What a request does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionName {
    /// Read one or more records.
    Fetch,
    /// Create one or more records.
    Create,
    /// Update one or more records.
    Update,
    /// Delete records or relationship links.
    Delete,
}

/// What a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionTarget {
    /// The records themselves.
    Resource,
    /// A relationship between records.
    Relationship,
}

/// How many records a request affects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one.
    Single,
    /// Zero or more.
    Multiple,
}

/// The classified shape of one request.
///
/// Derived solely from the request shape and never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionDescriptor {
    /// What the request does.
    pub name: ActionName,
    /// What it targets.
    pub target: ActionTarget,
    /// How many records it affects.
    pub cardinality: Cardinality,
}

/// Classifies requests into [`ActionDescriptor`] values.
pub struct ActionClassifier<'a> {
    primary_metadata: &'a ResourceMetadata,
}

impl<'a> ActionClassifier<'a> {
    /// Creates a classifier over the primary type's metadata.
    #[must_use]
    pub const fn new(primary_metadata: &'a ResourceMetadata) -> Self {
        Self { primary_metadata }
    }

    /// Classifies a request.
    ///
    /// `decoded_body` is the request body decoded as JSON, when one was
    /// sent; it is only consulted for resource-target create and update
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingPrimaryTypeKey`] when a resource
    /// create or update body lacks the primary-type key — its absence is
    /// a parse error, never a cardinality default.
    pub fn classify(
        &self,
        method: HttpMethod,
        path: &RequestPath,
        decoded_body: Option<&Value>,
    ) -> Result<ActionDescriptor, RequestError> {
        let name = action_name(method);
        let target = if path.relationship.is_some() {
            ActionTarget::Relationship
        } else {
            ActionTarget::Resource
        };

        let multiple = self.is_filtered_fetch(name, path)
            || self.is_id_param_a_list(name, path)
            || self.is_primary_resource_a_list(name, target, path, decoded_body)?
            || self.is_relationship_to_many(target, path);

        Ok(ActionDescriptor {
            name,
            target,
            cardinality: if multiple {
                Cardinality::Multiple
            } else {
                Cardinality::Single
            },
        })
    }

    fn is_filtered_fetch(&self, name: ActionName, path: &RequestPath) -> bool {
        name == ActionName::Fetch && path.primary_ids.is_empty()
    }

    fn is_id_param_a_list(&self, name: ActionName, path: &RequestPath) -> bool {
        matches!(
            name,
            ActionName::Fetch | ActionName::Update | ActionName::Delete
        ) && path.primary_ids.len() > 1
    }

    fn is_primary_resource_a_list(
        &self,
        name: ActionName,
        target: ActionTarget,
        path: &RequestPath,
        decoded_body: Option<&Value>,
    ) -> Result<bool, RequestError> {
        if target != ActionTarget::Resource
            || !matches!(name, ActionName::Create | ActionName::Update)
        {
            return Ok(false);
        }

        let primary = decoded_body
            .and_then(|body| body.get(&path.resource_type))
            .ok_or_else(|| ParseError::MissingPrimaryTypeKey {
                resource_type: path.resource_type.clone(),
            })?;

        Ok(primary.is_array())
    }

    fn is_relationship_to_many(&self, target: ActionTarget, path: &RequestPath) -> bool {
        target == ActionTarget::Relationship
            && path
                .relationship
                .as_deref()
                .is_some_and(|r| self.primary_metadata.is_to_many_relationship(r))
    }
}

/// The fixed verb-to-action mapping.
const fn action_name(method: HttpMethod) -> ActionName {
    match method {
        HttpMethod::Get => ActionName::Fetch,
        HttpMethod::Post => ActionName::Create,
        HttpMethod::Put | HttpMethod::Patch => ActionName::Update,
        HttpMethod::Delete => ActionName::Delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> ResourceMetadata {
        ResourceMetadata::builder("users")
            .fields(["name", "surname"])
            .to_one("platform", "platforms")
            .to_many("groups", "user-groups")
            .build()
            .unwrap()
    }

    fn path(ids: &[&str], relationship: Option<&str>) -> RequestPath {
        RequestPath {
            normalized: "/users".to_string(),
            resource_type: "users".to_string(),
            primary_ids: ids.iter().map(ToString::to_string).collect(),
            field: relationship.map(|_| "links".to_string()),
            relationship: relationship.map(ToString::to_string),
            relationship_ids: Vec::new(),
        }
    }

    fn classify(
        method: HttpMethod,
        path: &RequestPath,
        body: Option<&Value>,
    ) -> Result<ActionDescriptor, RequestError> {
        let metadata = metadata();
        ActionClassifier::new(&metadata).classify(method, path, body)
    }

    #[test]
    fn test_fetch_without_ids_is_multiple() {
        let action = classify(HttpMethod::Get, &path(&[], None), None).unwrap();
        assert_eq!(action.name, ActionName::Fetch);
        assert_eq!(action.target, ActionTarget::Resource);
        assert_eq!(action.cardinality, Cardinality::Multiple);
    }

    #[test]
    fn test_fetch_with_one_id_is_single() {
        let action = classify(HttpMethod::Get, &path(&["1"], None), None).unwrap();
        assert_eq!(action.cardinality, Cardinality::Single);
    }

    #[test]
    fn test_fetch_with_several_ids_is_multiple() {
        let action = classify(HttpMethod::Get, &path(&["1", "2"], None), None).unwrap();
        assert_eq!(action.cardinality, Cardinality::Multiple);
    }

    #[test]
    fn test_delete_with_one_id_is_single() {
        let action = classify(HttpMethod::Delete, &path(&["1"], None), None).unwrap();
        assert_eq!(action.name, ActionName::Delete);
        assert_eq!(action.cardinality, Cardinality::Single);
    }

    #[test]
    fn test_create_with_object_body_is_single() {
        let body = json!({"users": {"name": "John"}});
        let action = classify(HttpMethod::Post, &path(&[], None), Some(&body)).unwrap();
        assert_eq!(action.name, ActionName::Create);
        assert_eq!(action.cardinality, Cardinality::Single);
    }

    #[test]
    fn test_create_with_array_body_is_multiple() {
        let body = json!({"users": [{"name": "John"}, {"name": "Sarah"}]});
        let action = classify(HttpMethod::Post, &path(&[], None), Some(&body)).unwrap();
        assert_eq!(action.cardinality, Cardinality::Multiple);
    }

    #[test]
    fn test_update_with_array_body_is_multiple() {
        let body = json!({"users": [{"id": "1"}, {"id": "2"}]});
        let action = classify(HttpMethod::Put, &path(&["1", "2"], None), Some(&body)).unwrap();
        assert_eq!(action.name, ActionName::Update);
        assert_eq!(action.cardinality, Cardinality::Multiple);
    }

    #[test]
    fn test_patch_maps_to_update() {
        let body = json!({"users": {"id": "1"}});
        let action = classify(HttpMethod::Patch, &path(&["1"], None), Some(&body)).unwrap();
        assert_eq!(action.name, ActionName::Update);
    }

    #[test]
    fn test_create_without_primary_type_key_is_a_parse_error() {
        let body = json!({"people": {}});
        let error = classify(HttpMethod::Post, &path(&[], None), Some(&body)).unwrap_err();
        assert!(matches!(
            error,
            RequestError::Parse(ParseError::MissingPrimaryTypeKey { .. })
        ));
    }

    #[test]
    fn test_create_without_body_is_a_parse_error() {
        let error = classify(HttpMethod::Post, &path(&[], None), None).unwrap_err();
        assert!(matches!(
            error,
            RequestError::Parse(ParseError::MissingPrimaryTypeKey { .. })
        ));
    }

    #[test]
    fn test_to_many_relationship_target_is_multiple() {
        let action = classify(HttpMethod::Get, &path(&["1"], Some("groups")), None).unwrap();
        assert_eq!(action.target, ActionTarget::Relationship);
        assert_eq!(action.cardinality, Cardinality::Multiple);
    }

    #[test]
    fn test_to_one_relationship_target_is_single() {
        let action = classify(HttpMethod::Get, &path(&["1"], Some("platform")), None).unwrap();
        assert_eq!(action.target, ActionTarget::Relationship);
        assert_eq!(action.cardinality, Cardinality::Single);
    }

    #[test]
    fn test_relationship_update_does_not_peek_at_body() {
        // A relationship-target update never consults the primary-type key.
        let action = classify(HttpMethod::Post, &path(&["1"], Some("groups")), None).unwrap();
        assert_eq!(action.target, ActionTarget::Relationship);
        assert_eq!(action.cardinality, Cardinality::Multiple);
    }
}
