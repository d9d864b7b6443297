//! The record contract: how domain records expose themselves to the
//! pipeline.
//!
//! A [`ResourceRecord`] is the capability surface a record kind offers for
//! its declared field and relationship names. The mapping from declared
//! name to accessor is fixed when the implementation is written, so an
//! undeclared name fails with a typed [`AccessError`] instead of being
//! resolved at runtime by name mangling.
//!
//! Relationship accessors return a loosely-shaped [`Related`] value on
//! purpose: the traversal layer validates it against the record contract
//! and surfaces data-model inconsistencies (a to-one slot holding a
//! collection, an uninitialized to-many slot) as typed server errors.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::metadata::ResourceMetadata;

/// A shared handle to a domain record.
pub type RecordRef = Arc<dyn ResourceRecord>;

/// Errors raised by record accessors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The name does not map to any accessor on this record kind.
    #[error("The \"{name}\" getter cannot be invoked.")]
    UncallableGetter {
        /// The field or relationship name that was requested.
        name: String,
    },

    /// The name is declared, but its value cannot be produced.
    #[error("For some reason the field is known or is a relationship, but its value can't be accessed.")]
    InaccessibleMember,
}

/// The value of one record field.
///
/// Scalar variants cover the common storage types; [`FieldValue::Map`] and
/// [`FieldValue::List`] values are serialized recursively by the
/// field-value serializer.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// An absent or null value.
    Null,
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Float(f64),
    /// A string value.
    String(String),
    /// A timestamp, serialized as RFC 3339.
    DateTime(DateTime<Utc>),
    /// An ordered list of values.
    List(Vec<FieldValue>),
    /// A string-keyed map of values.
    Map(BTreeMap<String, FieldValue>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

/// The raw result of a relationship accessor, before contract validation.
///
/// `Null` models a to-many slot that was never initialized — a hard data
/// error, distinct from `Absent`, which is a legitimately empty to-one
/// slot.
#[derive(Clone)]
pub enum Related {
    /// An empty to-one slot.
    Absent,
    /// A populated to-one slot.
    Record(RecordRef),
    /// A to-many slot holding an ordered list.
    List(Vec<RecordRef>),
    /// A to-many slot holding a set-like collection.
    Set(Vec<RecordRef>),
    /// An uninitialized to-many slot.
    Null,
    /// A value that satisfies no part of the record contract.
    Unexpected {
        /// The type name of the unexpected value, for diagnostics.
        type_name: String,
    },
}

impl fmt::Debug for Related {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "Absent"),
            Self::Record(r) => write!(f, "Record({}/{})", r.kind(), r.id()),
            Self::List(rs) => write!(f, "List(len={})", rs.len()),
            Self::Set(rs) => write!(f, "Set(len={})", rs.len()),
            Self::Null => write!(f, "Null"),
            Self::Unexpected { type_name } => write!(f, "Unexpected({type_name})"),
        }
    }
}

/// The capability surface one domain record exposes to the pipeline.
///
/// Implementations dispatch on the declared names of their kind; the
/// pipeline never reflects into the record. Ids are always strings on the
/// wire, whatever they are in storage.
///
/// # Example
///
/// ```rust
/// use jsonapi_pipeline::record::{AccessError, FieldValue, Related, ResourceRecord};
///
/// struct Tag { id: u64, label: String }
///
/// impl ResourceRecord for Tag {
///     fn kind(&self) -> &str {
///         "Tag"
///     }
///
///     fn id(&self) -> String {
///         self.id.to_string()
///     }
///
///     fn attribute(&self, field: &str) -> Result<FieldValue, AccessError> {
///         match field {
///             "label" => Ok(FieldValue::String(self.label.clone())),
///             other => Err(AccessError::UncallableGetter { name: other.to_string() }),
///         }
///     }
///
///     fn related(&self, relationship: &str) -> Result<Related, AccessError> {
///         Err(AccessError::UncallableGetter { name: relationship.to_string() })
///     }
/// }
/// ```
pub trait ResourceRecord: Send + Sync {
    /// Returns the record-kind name used for catalog and metadata lookups.
    fn kind(&self) -> &str;

    /// Returns the record id as a string.
    fn id(&self) -> String;

    /// Returns the value of a declared field.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError`] for undeclared names or values that cannot
    /// be produced.
    fn attribute(&self, field: &str) -> Result<FieldValue, AccessError>;

    /// Returns the raw content of a declared relationship.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError`] for undeclared names.
    fn related(&self, relationship: &str) -> Result<Related, AccessError>;
}

impl fmt::Debug for dyn ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRecord")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .finish()
    }
}

/// An ordered set of records sharing one metadata description.
///
/// The inclusion walk operates on frontiers of records; every record in a
/// frontier is of the same kind, so the frontier carries the metadata
/// once.
#[derive(Clone)]
pub struct RecordSet {
    metadata: Arc<ResourceMetadata>,
    records: Vec<RecordRef>,
}

impl RecordSet {
    /// Creates a record set from shared metadata and records.
    #[must_use]
    pub const fn new(metadata: Arc<ResourceMetadata>, records: Vec<RecordRef>) -> Self {
        Self { metadata, records }
    }

    /// Returns the metadata shared by every record in the set.
    #[must_use]
    pub fn metadata(&self) -> &Arc<ResourceMetadata> {
        &self.metadata
    }

    /// Returns the records in order.
    #[must_use]
    pub fn records(&self) -> &[RecordRef] {
        &self.records
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, RecordRef> {
        self.records.iter()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Debug for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSet")
            .field("type", &self.metadata.resource_type())
            .field("len", &self.records.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a RecordRef;
    type IntoIter = std::slice::Iter<'a, RecordRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// Verify record types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RecordRef>();
    assert_send_sync::<RecordSet>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ResourceMetadata;

    struct Tag {
        id: u64,
        label: String,
    }

    impl ResourceRecord for Tag {
        fn kind(&self) -> &str {
            "Tag"
        }

        fn id(&self) -> String {
            self.id.to_string()
        }

        fn attribute(&self, field: &str) -> Result<FieldValue, AccessError> {
            match field {
                "label" => Ok(FieldValue::String(self.label.clone())),
                other => Err(AccessError::UncallableGetter {
                    name: other.to_string(),
                }),
            }
        }

        fn related(&self, relationship: &str) -> Result<Related, AccessError> {
            Err(AccessError::UncallableGetter {
                name: relationship.to_string(),
            })
        }
    }

    #[test]
    fn test_record_exposes_string_id() {
        let tag = Tag {
            id: 42,
            label: "blue".to_string(),
        };
        assert_eq!(tag.id(), "42");
    }

    #[test]
    fn test_undeclared_accessor_fails_typed() {
        let tag = Tag {
            id: 1,
            label: "red".to_string(),
        };
        let error = tag.attribute("color").unwrap_err();
        assert!(error.to_string().contains("color"));
    }

    #[test]
    fn test_record_set_shares_metadata() {
        let metadata = Arc::new(
            ResourceMetadata::builder("tags")
                .field("label")
                .build()
                .unwrap(),
        );
        let records: Vec<RecordRef> = vec![
            Arc::new(Tag {
                id: 1,
                label: "a".to_string(),
            }),
            Arc::new(Tag {
                id: 2,
                label: "b".to_string(),
            }),
        ];

        let set = RecordSet::new(metadata, records);
        assert_eq!(set.len(), 2);
        assert_eq!(set.metadata().resource_type(), "tags");
        let ids: Vec<String> = set.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
