//! Serialization of one record into a flat resource object.
//!
//! The resource object carries `id`, `type`, `subtype` (only when it
//! differs from the type), the chosen attribute fields, and — whenever the
//! record kind declares any relationship — a `links` map of related ids.
//!
//! Field selection honors sparse fieldsets. Any field that cannot be
//! produced fails with the same [`SerializationError::UnknownField`],
//! whether it is undeclared, blacklisted or simply broken; callers cannot
//! tell the cases apart, by design.

use serde_json::{Map, Value};

use crate::contracts::Authorizer;
use crate::document::errors::SerializationError;
use crate::document::relation::{expect_to_one, expect_to_many};
use crate::document::value::serialize_field_value;
use crate::metadata::ResourceMetadata;
use crate::record::ResourceRecord;

/// Serializes one record into a flat resource object.
pub struct ResourceObjectSerializer<'a> {
    record: &'a dyn ResourceRecord,
    metadata: &'a ResourceMetadata,
    fields: Vec<String>,
    authorizer: &'a dyn Authorizer,
}

impl<'a> ResourceObjectSerializer<'a> {
    /// Creates a serializer for one record.
    ///
    /// When `sparse_fields` is given and non-empty it overrides the full
    /// declared field list.
    #[must_use]
    pub fn new(
        record: &'a dyn ResourceRecord,
        metadata: &'a ResourceMetadata,
        sparse_fields: Option<&[String]>,
        authorizer: &'a dyn Authorizer,
    ) -> Self {
        let fields = match sparse_fields {
            Some(sparse) if !sparse.is_empty() => sparse.to_vec(),
            _ => metadata.fields().to_vec(),
        };

        Self {
            record,
            metadata,
            fields,
            authorizer,
        }
    }

    /// Serializes the record.
    ///
    /// # Errors
    ///
    /// - [`SerializationError::FieldIsRelationship`] when a chosen field
    ///   names a relationship.
    /// - [`SerializationError::UnknownField`] when a chosen field is
    ///   blacklisted, undeclared, or its accessor fails.
    /// - Relation-contract errors from `links` serialization.
    pub fn serialize(&self) -> Result<Value, SerializationError> {
        let mut json = Map::new();
        json.insert("id".to_string(), Value::String(self.record.id()));
        json.insert(
            "type".to_string(),
            Value::String(self.metadata.resource_type().to_string()),
        );

        if self.metadata.subtype() != self.metadata.resource_type() {
            json.insert(
                "subtype".to_string(),
                Value::String(self.metadata.subtype().to_string()),
            );
        }

        for field in &self.fields {
            if self.metadata.is_relationship(field) {
                return Err(SerializationError::FieldIsRelationship {
                    field: field.clone(),
                });
            }

            if self.metadata.is_field_blacklisted(field) {
                return Err(SerializationError::UnknownField {
                    field: field.clone(),
                });
            }

            let value = self.record.attribute(field).map_err(|_| {
                SerializationError::UnknownField {
                    field: field.clone(),
                }
            })?;

            json.insert(field.clone(), serialize_field_value(&value));
        }

        if self.metadata.has_relationships() {
            json.insert("links".to_string(), self.resource_links()?);
        }

        Ok(Value::Object(json))
    }

    /// Builds the `links` map: related id strings, authorization-filtered.
    ///
    /// To-one entries resolve to the related id or `null` when the
    /// relation is absent or denied; denied to-many members are dropped
    /// silently. Link-only relationships never appear here.
    fn resource_links(&self) -> Result<Value, SerializationError> {
        let mut links = Map::new();

        for relationship in self.metadata.to_one_relationships() {
            let related = self.record.related(&relationship.name).map_err(|_| {
                SerializationError::UnknownField {
                    field: relationship.name.clone(),
                }
            })?;
            let entity = expect_to_one(related, &relationship.name)?;

            let value = entity
                .filter(|e| self.authorizer.can_view(e.as_ref()))
                .map_or(Value::Null, |e| Value::String(e.id()));
            links.insert(relationship.name.clone(), value);
        }

        for relationship in self.metadata.to_many_relationships() {
            let related = self.record.related(&relationship.name).map_err(|_| {
                SerializationError::UnknownField {
                    field: relationship.name.clone(),
                }
            })?;
            let collection = expect_to_many(related, &relationship.name)?;

            let ids: Vec<Value> = collection
                .iter()
                .filter(|e| self.authorizer.can_view(e.as_ref()))
                .map(|e| Value::String(e.id()))
                .collect();
            links.insert(relationship.name.clone(), Value::Array(ids));
        }

        Ok(Value::Object(links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::contracts::AllowAll;
    use crate::record::{AccessError, FieldValue, RecordRef, Related};

    struct Group {
        id: u64,
    }

    impl ResourceRecord for Group {
        fn kind(&self) -> &str {
            "UserGroup"
        }

        fn id(&self) -> String {
            self.id.to_string()
        }

        fn attribute(&self, field: &str) -> Result<FieldValue, AccessError> {
            Err(AccessError::UncallableGetter {
                name: field.to_string(),
            })
        }

        fn related(&self, relationship: &str) -> Result<Related, AccessError> {
            Err(AccessError::UncallableGetter {
                name: relationship.to_string(),
            })
        }
    }

    struct User {
        id: u64,
        name: String,
        surname: String,
        groups: Vec<RecordRef>,
    }

    impl ResourceRecord for User {
        fn kind(&self) -> &str {
            "User"
        }

        fn id(&self) -> String {
            self.id.to_string()
        }

        fn attribute(&self, field: &str) -> Result<FieldValue, AccessError> {
            match field {
                "name" => Ok(FieldValue::from(self.name.as_str())),
                "surname" => Ok(FieldValue::from(self.surname.as_str())),
                "broken" => Err(AccessError::InaccessibleMember),
                other => Err(AccessError::UncallableGetter {
                    name: other.to_string(),
                }),
            }
        }

        fn related(&self, relationship: &str) -> Result<Related, AccessError> {
            match relationship {
                "platform" => Ok(Related::Absent),
                "groups" => Ok(Related::List(self.groups.clone())),
                other => Err(AccessError::UncallableGetter {
                    name: other.to_string(),
                }),
            }
        }
    }

    fn metadata() -> ResourceMetadata {
        ResourceMetadata::builder("users")
            .fields(["name", "surname"])
            .to_one("platform", "platforms")
            .to_many("groups", "user-groups")
            .build()
            .unwrap()
    }

    fn john() -> User {
        User {
            id: 7,
            name: "John".to_string(),
            surname: "Connor".to_string(),
            groups: vec![Arc::new(Group { id: 2 }), Arc::new(Group { id: 3 })],
        }
    }

    #[test]
    fn test_serializes_id_type_fields_and_links() {
        let metadata = metadata();
        let user = john();
        let object = ResourceObjectSerializer::new(&user, &metadata, None, &AllowAll)
            .serialize()
            .unwrap();

        assert_eq!(
            object,
            json!({
                "id": "7",
                "type": "users",
                "name": "John",
                "surname": "Connor",
                "links": {
                    "platform": null,
                    "groups": ["2", "3"]
                }
            })
        );
    }

    #[test]
    fn test_sparse_fields_restrict_the_attribute_set() {
        let metadata = metadata();
        let user = john();
        let sparse = vec!["name".to_string()];
        let object = ResourceObjectSerializer::new(&user, &metadata, Some(&sparse), &AllowAll)
            .serialize()
            .unwrap();

        let object = object.as_object().unwrap();
        assert!(object.contains_key("name"));
        assert!(!object.contains_key("surname"));
        assert!(object.contains_key("links"));
    }

    #[test]
    fn test_subtype_is_emitted_only_when_it_differs() {
        let metadata = ResourceMetadata::builder("users")
            .subtype("admin-users")
            .field("name")
            .build()
            .unwrap();
        let user = john();
        let object = ResourceObjectSerializer::new(&user, &metadata, None, &AllowAll)
            .serialize()
            .unwrap();

        assert_eq!(object["subtype"], "admin-users");
    }

    #[test]
    fn test_relationship_name_in_field_list_is_rejected() {
        let metadata = metadata();
        let user = john();
        let sparse = vec!["groups".to_string()];
        let error = ResourceObjectSerializer::new(&user, &metadata, Some(&sparse), &AllowAll)
            .serialize()
            .unwrap_err();

        assert!(matches!(
            error,
            SerializationError::FieldIsRelationship { field } if field == "groups"
        ));
    }

    #[test]
    fn test_blacklisted_and_unknown_fields_fail_the_same_way() {
        let metadata = ResourceMetadata::builder("users")
            .fields(["name", "surname"])
            .blacklist_field("surname")
            .build()
            .unwrap();
        let user = john();

        let blacklisted = vec!["surname".to_string()];
        let error = ResourceObjectSerializer::new(&user, &metadata, Some(&blacklisted), &AllowAll)
            .serialize()
            .unwrap_err();
        assert!(matches!(error, SerializationError::UnknownField { .. }));

        let unknown = vec!["email".to_string()];
        let error = ResourceObjectSerializer::new(&user, &metadata, Some(&unknown), &AllowAll)
            .serialize()
            .unwrap_err();
        assert!(matches!(error, SerializationError::UnknownField { .. }));
    }

    #[test]
    fn test_accessor_failure_collapses_to_unknown_field() {
        let metadata = ResourceMetadata::builder("users")
            .fields(["name", "broken"])
            .build()
            .unwrap();
        let user = john();
        let error = ResourceObjectSerializer::new(&user, &metadata, None, &AllowAll)
            .serialize()
            .unwrap_err();

        assert!(matches!(
            error,
            SerializationError::UnknownField { field } if field == "broken"
        ));
    }

    #[test]
    fn test_denied_to_many_members_are_dropped_silently() {
        struct DenyGroups;

        impl Authorizer for DenyGroups {
            fn can_view(&self, record: &dyn ResourceRecord) -> bool {
                !(record.kind() == "UserGroup" && record.id() == "2")
            }
        }

        let metadata = metadata();
        let user = john();
        let object = ResourceObjectSerializer::new(&user, &metadata, None, &DenyGroups)
            .serialize()
            .unwrap();

        assert_eq!(object["links"]["groups"], json!(["3"]));
    }

    #[test]
    fn test_no_links_member_without_declared_relationships() {
        let metadata = ResourceMetadata::builder("users")
            .fields(["name"])
            .build()
            .unwrap();
        let user = john();
        let object = ResourceObjectSerializer::new(&user, &metadata, None, &AllowAll)
            .serialize()
            .unwrap();

        assert!(!object.as_object().unwrap().contains_key("links"));
    }
}
