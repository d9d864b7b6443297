//! Error types for document assembly and serialization.
//!
//! Client-caused failures (impossible or too-deep inclusions, bad field
//! selections) and data-model inconsistencies (a stored graph violating
//! the record contract) share this taxonomy; the embedding server maps
//! them onto status families.

use thiserror::Error;

use crate::metadata::MetadataError;

/// Errors raised while assembling or serializing a document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// The include directive names a relationship that does not exist.
    #[error("The relationship \"{relationship}\" does not exist.")]
    InvalidRelationship {
        /// The unknown relationship name.
        relationship: String,
    },

    /// The include directive names a relationship that can never be
    /// inlined.
    #[error("The relationship \"{relationship}\" cannot be included, possibly because of its size. You must fetch this resource by getting {url}.")]
    LinkOnlyRelationship {
        /// The link-only relationship name.
        relationship: String,
        /// The dedicated URL clients must fetch instead.
        url: String,
    },

    /// An include chain descends deeper than the traversal allows.
    #[error("The recursion level is too deep.")]
    InclusionDepthLimitExceeded {
        /// The configured depth bound.
        limit: usize,
    },

    /// A to-one slot holds something that is not a record.
    #[error("The relationship \"{relationship}\" contains a \"{type_name}\"; an entity implementing the resource record contract was expected.")]
    NotAResourceEntity {
        /// The relationship that misbehaved.
        relationship: String,
        /// What was found instead.
        type_name: String,
    },

    /// A to-many slot holds something that is not a collection.
    #[error("The relationship \"{relationship}\" contains a \"{type_name}\"; a collection of resource records was expected.")]
    NotAnEntityCollection {
        /// The relationship that misbehaved.
        relationship: String,
        /// What was found instead.
        type_name: String,
    },

    /// A to-many slot was never initialized.
    #[error("The to-many relationship \"{relationship}\" returns neither a list nor a collection. The corresponding property needs to be initialized during the construction of the entity.")]
    ToManyRelationNull {
        /// The uninitialized relationship.
        relationship: String,
    },

    /// A requested field is itself a relationship.
    #[error("The field \"{field}\" is itself a linked resource.")]
    FieldIsRelationship {
        /// The offending field name.
        field: String,
    },

    /// A requested field does not exist, is blacklisted, or cannot be
    /// produced. Deliberately one error kind for all three.
    #[error("The field \"{field}\" does not exist.")]
    UnknownField {
        /// The field that could not be serialized.
        field: String,
    },

    /// A metadata lookup failed mid-traversal.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

// Verify the error type is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SerializationError>();
};
