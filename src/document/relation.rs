//! Validation of raw relationship values against the record contract.
//!
//! Relationship accessors return loosely-shaped [`Related`] values; the
//! helpers here pin them down. A to-one slot must hold a record or be
//! absent. A to-many slot must hold an ordered list or a set-like
//! collection — never null, which means the owning entity was constructed
//! without initializing it.

use crate::document::errors::SerializationError;
use crate::record::{RecordRef, Related};

/// Validates the content of a to-one relationship.
///
/// # Errors
///
/// Returns [`SerializationError::NotAResourceEntity`] when the slot holds
/// anything but a record or nothing.
pub(crate) fn expect_to_one(
    related: Related,
    relationship: &str,
) -> Result<Option<RecordRef>, SerializationError> {
    match related {
        Related::Absent | Related::Null => Ok(None),
        Related::Record(record) => Ok(Some(record)),
        Related::List(_) | Related::Set(_) => Err(SerializationError::NotAResourceEntity {
            relationship: relationship.to_string(),
            type_name: "collection".to_string(),
        }),
        Related::Unexpected { type_name } => Err(SerializationError::NotAResourceEntity {
            relationship: relationship.to_string(),
            type_name,
        }),
    }
}

/// Normalizes the content of a to-many relationship into an ordered list.
///
/// # Errors
///
/// - [`SerializationError::ToManyRelationNull`] when the slot was never
///   initialized.
/// - [`SerializationError::NotAnEntityCollection`] when it holds anything
///   but a list or set of records.
pub(crate) fn expect_to_many(
    related: Related,
    relationship: &str,
) -> Result<Vec<RecordRef>, SerializationError> {
    match related {
        Related::List(records) | Related::Set(records) => Ok(records),
        Related::Null | Related::Absent => Err(SerializationError::ToManyRelationNull {
            relationship: relationship.to_string(),
        }),
        Related::Record(record) => Err(SerializationError::NotAnEntityCollection {
            relationship: relationship.to_string(),
            type_name: record.kind().to_string(),
        }),
        Related::Unexpected { type_name } => Err(SerializationError::NotAnEntityCollection {
            relationship: relationship.to_string(),
            type_name,
        }),
    }
}
