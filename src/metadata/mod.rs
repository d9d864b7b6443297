//! Resource metadata: the per-record-kind description driving the
//! pipeline.
//!
//! A [`ResourceMetadata`] describes one record kind: its resource type
//! name, declared fields, and relationships, split into to-one, to-many,
//! and link-only groups. A relationship name belongs to at most one group;
//! the builder rejects duplicates.
//!
//! Field and relationship blacklists live on the metadata itself and are
//! threaded explicitly through serialization, never held as process-wide
//! state.
//!
//! # Example
//!
//! ```rust
//! use jsonapi_pipeline::metadata::ResourceMetadata;
//!
//! let users = ResourceMetadata::builder("users")
//!     .fields(["name", "surname"])
//!     .to_one("platform", "platforms")
//!     .to_many("groups", "user-groups")
//!     .build()
//!     .unwrap();
//!
//! assert!(users.is_field("name"));
//! assert!(users.is_to_many_relationship("groups"));
//! assert!(!users.is_relationship("name"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::PageSize;

/// Errors raised while building or looking up resource metadata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// No metadata is registered for the record kind.
    #[error("No resource metadata is registered for the record kind \"{kind}\".")]
    UnknownKind {
        /// The record kind that was requested.
        kind: String,
    },

    /// A relationship name was declared in more than one group, or twice.
    #[error("The relationship \"{name}\" is declared more than once; a relationship belongs to exactly one of the to-one, to-many and link-only groups.")]
    DuplicateRelationship {
        /// The offending relationship name.
        name: String,
    },

    /// A field name was declared twice.
    #[error("The field \"{name}\" is declared more than once.")]
    DuplicateField {
        /// The offending field name.
        name: String,
    },
}

/// Descriptor for a to-one or to-many relationship.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationshipDescriptor {
    /// The relationship name as declared on the record kind.
    pub name: String,
    /// The resource type of the related records.
    pub target_type: String,
}

/// Descriptor for a relationship that is never inlined.
///
/// Link-only relationships are typically too large to embed; clients must
/// fetch them through their own URL instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkOnlyRelationship {
    /// The relationship name as declared on the record kind.
    pub name: String,
    /// The resource type of the related records.
    pub target_type: String,
    /// The URL template clients should fetch instead.
    pub by_primary_url: String,
}

/// The description of one record kind as a JSON-API resource.
///
/// Instances are immutable once built and are shared through `Arc` for the
/// lifetime of the process. Use [`ResourceMetadata::builder`] to construct
/// one.
#[derive(Clone, Debug)]
pub struct ResourceMetadata {
    resource_type: String,
    subtype: String,
    fields: Vec<String>,
    to_one: Vec<RelationshipDescriptor>,
    to_many: Vec<RelationshipDescriptor>,
    link_only: Vec<LinkOnlyRelationship>,
    page_size: PageSize,
    field_blacklist: Vec<String>,
    relationship_blacklist: Vec<String>,
}

impl ResourceMetadata {
    /// Creates a new builder for the given resource type.
    ///
    /// The subtype defaults to the resource type itself; set it for
    /// kinds participating in inheritance.
    #[must_use]
    pub fn builder(resource_type: impl Into<String>) -> ResourceMetadataBuilder {
        ResourceMetadataBuilder::new(resource_type)
    }

    /// Returns the resource type name (e.g., `users`).
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Returns the subtype name; equal to the type for non-inheriting
    /// kinds.
    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Returns the declared field names in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the to-one relationship descriptors in declaration order.
    #[must_use]
    pub fn to_one_relationships(&self) -> &[RelationshipDescriptor] {
        &self.to_one
    }

    /// Returns the to-many relationship descriptors in declaration order.
    #[must_use]
    pub fn to_many_relationships(&self) -> &[RelationshipDescriptor] {
        &self.to_many
    }

    /// Returns the link-only relationship descriptors in declaration
    /// order.
    #[must_use]
    pub fn link_only_relationships(&self) -> &[LinkOnlyRelationship] {
        &self.link_only
    }

    /// Returns the page size used for paginated fetches of this type.
    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Returns `true` if `name` is a declared field.
    #[must_use]
    pub fn is_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Returns `true` if `name` is a relationship of any group.
    #[must_use]
    pub fn is_relationship(&self, name: &str) -> bool {
        self.is_to_one_relationship(name)
            || self.is_to_many_relationship(name)
            || self.is_link_only_relationship(name)
    }

    /// Returns `true` if `name` is a to-one relationship.
    #[must_use]
    pub fn is_to_one_relationship(&self, name: &str) -> bool {
        self.to_one.iter().any(|r| r.name == name)
    }

    /// Returns `true` if `name` is a to-many relationship.
    #[must_use]
    pub fn is_to_many_relationship(&self, name: &str) -> bool {
        self.to_many.iter().any(|r| r.name == name)
    }

    /// Returns `true` if `name` is a link-only relationship.
    #[must_use]
    pub fn is_link_only_relationship(&self, name: &str) -> bool {
        self.link_only.iter().any(|r| r.name == name)
    }

    /// Returns the to-one descriptor for `name`, if declared.
    #[must_use]
    pub fn to_one(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.to_one.iter().find(|r| r.name == name)
    }

    /// Returns the to-many descriptor for `name`, if declared.
    #[must_use]
    pub fn to_many(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.to_many.iter().find(|r| r.name == name)
    }

    /// Returns the link-only descriptor for `name`, if declared.
    #[must_use]
    pub fn link_only(&self, name: &str) -> Option<&LinkOnlyRelationship> {
        self.link_only.iter().find(|r| r.name == name)
    }

    /// Returns `true` if the kind declares any relationship at all.
    #[must_use]
    pub fn has_relationships(&self) -> bool {
        !self.to_one.is_empty() || !self.to_many.is_empty() || !self.link_only.is_empty()
    }

    /// Returns `true` if the field is blacklisted from serialization.
    #[must_use]
    pub fn is_field_blacklisted(&self, name: &str) -> bool {
        self.field_blacklist.iter().any(|f| f == name)
    }

    /// Returns `true` if the relationship is blacklisted from inclusion.
    #[must_use]
    pub fn is_relationship_blacklisted(&self, name: &str) -> bool {
        self.relationship_blacklist.iter().any(|r| r == name)
    }
}

/// Builder for [`ResourceMetadata`].
///
/// `build()` enforces the structural invariants: unique field names, and
/// each relationship name in exactly one group.
#[derive(Debug)]
pub struct ResourceMetadataBuilder {
    resource_type: String,
    subtype: Option<String>,
    fields: Vec<String>,
    to_one: Vec<RelationshipDescriptor>,
    to_many: Vec<RelationshipDescriptor>,
    link_only: Vec<LinkOnlyRelationship>,
    page_size: Option<PageSize>,
    field_blacklist: Vec<String>,
    relationship_blacklist: Vec<String>,
}

impl ResourceMetadataBuilder {
    fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            subtype: None,
            fields: Vec::new(),
            to_one: Vec::new(),
            to_many: Vec::new(),
            link_only: Vec::new(),
            page_size: None,
            field_blacklist: Vec::new(),
            relationship_blacklist: Vec::new(),
        }
    }

    /// Sets the subtype name for kinds participating in inheritance.
    #[must_use]
    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Declares a single field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Declares several fields at once.
    #[must_use]
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares a to-one relationship.
    #[must_use]
    pub fn to_one(mut self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.to_one.push(RelationshipDescriptor {
            name: name.into(),
            target_type: target_type.into(),
        });
        self
    }

    /// Declares a to-many relationship.
    #[must_use]
    pub fn to_many(mut self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.to_many.push(RelationshipDescriptor {
            name: name.into(),
            target_type: target_type.into(),
        });
        self
    }

    /// Declares a link-only relationship and the URL to fetch it through.
    #[must_use]
    pub fn link_only(
        mut self,
        name: impl Into<String>,
        target_type: impl Into<String>,
        by_primary_url: impl Into<String>,
    ) -> Self {
        self.link_only.push(LinkOnlyRelationship {
            name: name.into(),
            target_type: target_type.into(),
            by_primary_url: by_primary_url.into(),
        });
        self
    }

    /// Sets the page size for paginated fetches of this type.
    #[must_use]
    pub const fn page_size(mut self, size: PageSize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Blacklists a field from serialization.
    #[must_use]
    pub fn blacklist_field(mut self, name: impl Into<String>) -> Self {
        self.field_blacklist.push(name.into());
        self
    }

    /// Blacklists a relationship from inclusion and link serialization.
    #[must_use]
    pub fn blacklist_relationship(mut self, name: impl Into<String>) -> Self {
        self.relationship_blacklist.push(name.into());
        self
    }

    /// Builds the metadata, validating structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::DuplicateField`] or
    /// [`MetadataError::DuplicateRelationship`] when a name is declared
    /// twice.
    pub fn build(self) -> Result<ResourceMetadata, MetadataError> {
        let mut seen_fields = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if seen_fields.contains(&field.as_str()) {
                return Err(MetadataError::DuplicateField {
                    name: field.clone(),
                });
            }
            seen_fields.push(field.as_str());
        }

        let mut seen_relationships: Vec<&str> = Vec::new();
        let names = self
            .to_one
            .iter()
            .map(|r| r.name.as_str())
            .chain(self.to_many.iter().map(|r| r.name.as_str()))
            .chain(self.link_only.iter().map(|r| r.name.as_str()));
        for name in names {
            if seen_relationships.contains(&name) {
                return Err(MetadataError::DuplicateRelationship {
                    name: name.to_string(),
                });
            }
            seen_relationships.push(name);
        }

        let subtype = self.subtype.unwrap_or_else(|| self.resource_type.clone());

        Ok(ResourceMetadata {
            resource_type: self.resource_type,
            subtype,
            fields: self.fields,
            to_one: self.to_one,
            to_many: self.to_many,
            link_only: self.link_only,
            page_size: self.page_size.unwrap_or_default(),
            field_blacklist: self.field_blacklist,
            relationship_blacklist: self.relationship_blacklist,
        })
    }
}

/// Lookup contract for resource metadata by record kind.
///
/// The index is expected to be populated once at startup and stay
/// read-only for the lifetime of a request.
pub trait MetadataProvider: Send + Sync {
    /// Returns the metadata describing `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::UnknownKind`] when no metadata is
    /// registered for the kind.
    fn describe(&self, kind: &str) -> Result<Arc<ResourceMetadata>, MetadataError>;
}

/// In-memory [`MetadataProvider`] keyed by record kind.
///
/// # Example
///
/// ```rust
/// use jsonapi_pipeline::metadata::{MetadataIndex, MetadataProvider, ResourceMetadata};
///
/// let mut index = MetadataIndex::new();
/// index.insert(
///     "User",
///     ResourceMetadata::builder("users").field("name").build().unwrap(),
/// );
///
/// assert!(index.describe("User").is_ok());
/// assert!(index.describe("Post").is_err());
/// ```
#[derive(Debug, Default)]
pub struct MetadataIndex {
    by_kind: HashMap<String, Arc<ResourceMetadata>>,
}

impl MetadataIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers metadata for a record kind, replacing any previous entry.
    pub fn insert(&mut self, kind: impl Into<String>, metadata: ResourceMetadata) {
        self.by_kind.insert(kind.into(), Arc::new(metadata));
    }

    /// Returns the number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    /// Returns `true` if no kinds are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

impl MetadataProvider for MetadataIndex {
    fn describe(&self, kind: &str) -> Result<Arc<ResourceMetadata>, MetadataError> {
        self.by_kind
            .get(kind)
            .cloned()
            .ok_or_else(|| MetadataError::UnknownKind {
                kind: kind.to_string(),
            })
    }
}

// Verify metadata types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceMetadata>();
    assert_send_sync::<MetadataIndex>();
};

#[cfg(test)]
mod tests {
    use super::*;

    fn users_metadata() -> ResourceMetadata {
        ResourceMetadata::builder("users")
            .fields(["name", "surname"])
            .to_one("platform", "platforms")
            .to_many("groups", "user-groups")
            .link_only("followers", "users", "/users/{id}/links/followers")
            .build()
            .unwrap()
    }

    #[test]
    fn test_classification_of_fields_and_relationships() {
        let metadata = users_metadata();

        assert!(metadata.is_field("name"));
        assert!(!metadata.is_field("platform"));
        assert!(metadata.is_to_one_relationship("platform"));
        assert!(metadata.is_to_many_relationship("groups"));
        assert!(metadata.is_link_only_relationship("followers"));
        assert!(metadata.is_relationship("followers"));
        assert!(!metadata.is_relationship("name"));
    }

    #[test]
    fn test_subtype_defaults_to_type() {
        let metadata = users_metadata();
        assert_eq!(metadata.subtype(), "users");

        let admin = ResourceMetadata::builder("users")
            .subtype("admin-users")
            .build()
            .unwrap();
        assert_eq!(admin.subtype(), "admin-users");
    }

    #[test]
    fn test_relationship_in_two_groups_is_rejected() {
        let result = ResourceMetadata::builder("users")
            .to_one("groups", "user-groups")
            .to_many("groups", "user-groups")
            .build();

        assert!(matches!(
            result,
            Err(MetadataError::DuplicateRelationship { name }) if name == "groups"
        ));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let result = ResourceMetadata::builder("users")
            .field("name")
            .field("name")
            .build();

        assert!(matches!(
            result,
            Err(MetadataError::DuplicateField { name }) if name == "name"
        ));
    }

    #[test]
    fn test_has_relationships_reflects_declarations() {
        let bare = ResourceMetadata::builder("tags").field("label").build().unwrap();
        assert!(!bare.has_relationships());
        assert!(users_metadata().has_relationships());
    }

    #[test]
    fn test_blacklists_are_per_metadata() {
        let metadata = ResourceMetadata::builder("users")
            .fields(["name", "password-hash"])
            .blacklist_field("password-hash")
            .to_many("groups", "user-groups")
            .blacklist_relationship("groups")
            .build()
            .unwrap();

        assert!(metadata.is_field_blacklisted("password-hash"));
        assert!(!metadata.is_field_blacklisted("name"));
        assert!(metadata.is_relationship_blacklisted("groups"));
    }

    #[test]
    fn test_index_lookup_by_kind() {
        let mut index = MetadataIndex::new();
        index.insert("User", users_metadata());

        let metadata = index.describe("User").unwrap();
        assert_eq!(metadata.resource_type(), "users");

        assert!(matches!(
            index.describe("Missing"),
            Err(MetadataError::UnknownKind { kind }) if kind == "Missing"
        ));
    }
}
