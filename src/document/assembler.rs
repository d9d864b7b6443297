//! Document assembly: the bounded inclusion walk.
//!
//! For each include chain, the assembler resolves the relationship at the
//! current depth against the frontier's shared metadata, serializes every
//! newly reached record, and descends with the newly added records as the
//! next frontier. A record reachable through several chains is serialized
//! once; membership in the seen-index is checked before insertion.
//! Records the subject may not view are omitted silently and never
//! traversed further.
//!
//! The walk is bounded by [`INCLUSION_DEPTH_LIMIT`]; an include chain
//! that would descend past it fails the whole request — no partial
//! documents.

use std::collections::HashSet;

use serde_json::Value;

use crate::contracts::Authorizer;
use crate::metadata::MetadataProvider;
use crate::document::errors::SerializationError;
use crate::document::relation::{expect_to_one, expect_to_many};
use crate::document::serializer::ResourceObjectSerializer;
use crate::document::{AssemblyOptions, Document, PrimaryData};
use crate::record::{RecordRef, RecordSet};

/// How deep an include chain may descend.
pub const INCLUSION_DEPTH_LIMIT: usize = 3;

/// The de-duplicating accumulator of included resource objects.
///
/// Guarantees at-most-one serialization per `(type, id)` across the whole
/// inclusion walk, whatever path reached the record, while preserving
/// first-seen order.
#[derive(Debug, Default)]
pub struct IncludedResources {
    seen: HashSet<(String, String)>,
    ordered: Vec<Value>,
}

impl IncludedResources {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a resource with this type and id was already
    /// added.
    #[must_use]
    pub fn contains(&self, resource_type: &str, id: &str) -> bool {
        self.seen
            .contains(&(resource_type.to_string(), id.to_string()))
    }

    /// Adds a serialized resource object under its type and id.
    pub fn insert(&mut self, resource_type: &str, id: &str, object: Value) {
        if self
            .seen
            .insert((resource_type.to_string(), id.to_string()))
        {
            self.ordered.push(object);
        }
    }

    /// Returns the number of included resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Returns `true` if nothing was included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Consumes the accumulator, yielding the objects in first-seen order.
    #[must_use]
    pub fn into_objects(self) -> Vec<Value> {
        self.ordered
    }
}

/// Assembles the response document from primary records and an include
/// directive.
pub struct DocumentAssembler<'a> {
    metadata: &'a dyn MetadataProvider,
    authorizer: &'a dyn Authorizer,
}

impl<'a> DocumentAssembler<'a> {
    /// Creates an assembler over the metadata and authorization
    /// collaborators.
    #[must_use]
    pub const fn new(metadata: &'a dyn MetadataProvider, authorizer: &'a dyn Authorizer) -> Self {
        Self {
            metadata,
            authorizer,
        }
    }

    /// Assembles the document.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError`] for invalid or too-deep inclusions,
    /// record-contract violations, and field-serialization failures. No
    /// partial document is returned on failure.
    pub fn assemble(
        &self,
        primary: &RecordSet,
        options: &AssemblyOptions,
    ) -> Result<Document, SerializationError> {
        let sparse_primary = options
            .sparse_fields
            .get(primary.metadata().resource_type())
            .map(Vec::as_slice);

        let mut data = Vec::with_capacity(primary.len());
        for record in primary {
            let object = ResourceObjectSerializer::new(
                record.as_ref(),
                primary.metadata(),
                sparse_primary,
                self.authorizer,
            )
            .serialize()?;
            data.push(object);
        }

        let mut included = IncludedResources::new();
        if !options.include.is_empty() && !primary.is_empty() {
            self.process_linked(primary, &options.include, 0, &mut included, options)?;
        }

        let document = Document::build(data, included.into_objects(), options);

        tracing::debug!(
            primary = document.primary_len(),
            included = document.included.len(),
            "document assembled"
        );

        Ok(document)
    }

    fn process_linked(
        &self,
        frontier: &RecordSet,
        chains: &[Vec<String>],
        depth: usize,
        included: &mut IncludedResources,
        options: &AssemblyOptions,
    ) -> Result<(), SerializationError> {
        if depth >= INCLUSION_DEPTH_LIMIT {
            return Err(SerializationError::InclusionDepthLimitExceeded {
                limit: INCLUSION_DEPTH_LIMIT,
            });
        }

        for chain in chains {
            let Some(name) = chain.get(depth) else {
                continue;
            };
            let metadata = frontier.metadata();

            // Blacklisted relationships are indistinguishable from unknown ones.
            if metadata.is_relationship_blacklisted(name) {
                return Err(SerializationError::InvalidRelationship {
                    relationship: name.clone(),
                });
            }

            let mut newly_added: Vec<RecordRef> = Vec::new();

            if let Some(descriptor) = metadata.to_one(name) {
                for record in frontier {
                    let related = record.related(name).map_err(|_| {
                        SerializationError::UnknownField {
                            field: name.clone(),
                        }
                    })?;

                    if let Some(entity) = expect_to_one(related, name)? {
                        self.add_linked(
                            &descriptor.target_type,
                            entity,
                            included,
                            &mut newly_added,
                            options,
                        )?;
                    }
                }
            } else if let Some(descriptor) = metadata.to_many(name) {
                for record in frontier {
                    let related = record.related(name).map_err(|_| {
                        SerializationError::UnknownField {
                            field: name.clone(),
                        }
                    })?;

                    for entity in expect_to_many(related, name)? {
                        self.add_linked(
                            &descriptor.target_type,
                            entity,
                            included,
                            &mut newly_added,
                            options,
                        )?;
                    }
                }
            } else if let Some(link_only) = metadata.link_only(name) {
                return Err(SerializationError::LinkOnlyRelationship {
                    relationship: name.clone(),
                    url: link_only.by_primary_url.clone(),
                });
            } else {
                return Err(SerializationError::InvalidRelationship {
                    relationship: name.clone(),
                });
            }

            // Descend with the newly added records only; an empty frontier
            // ends this chain without error.
            if chain.len() > depth + 1 && !newly_added.is_empty() {
                let next_metadata = self.metadata.describe(newly_added[0].kind())?;
                let next_frontier = RecordSet::new(next_metadata, newly_added);
                self.process_linked(
                    &next_frontier,
                    std::slice::from_ref(chain),
                    depth + 1,
                    included,
                    options,
                )?;
            }
        }

        Ok(())
    }

    /// Serializes one related record into the accumulator, unless it was
    /// already seen or the subject may not view it.
    fn add_linked(
        &self,
        target_type: &str,
        entity: RecordRef,
        included: &mut IncludedResources,
        newly_added: &mut Vec<RecordRef>,
        options: &AssemblyOptions,
    ) -> Result<(), SerializationError> {
        if !self.authorizer.can_view(entity.as_ref()) {
            return Ok(());
        }

        let id = entity.id();
        if included.contains(target_type, &id) {
            return Ok(());
        }

        let entity_metadata = self.metadata.describe(entity.kind())?;
        let sparse = options
            .sparse_fields
            .get(entity_metadata.resource_type())
            .map(Vec::as_slice);

        let object = ResourceObjectSerializer::new(
            entity.as_ref(),
            &entity_metadata,
            sparse,
            self.authorizer,
        )
        .serialize()?;

        included.insert(target_type, &id, object);
        newly_added.push(entity);

        Ok(())
    }
}

impl Document {
    fn build(data: Vec<Value>, included: Vec<Value>, options: &AssemblyOptions) -> Self {
        let links = options
            .pagination
            .as_ref()
            .map(crate::document::links::pagination_links)
            .unwrap_or_default();

        let mut meta = options.meta.clone();
        if let Some(pagination) = &options.pagination {
            meta.insert("pagination".to_string(), pagination.to_meta());
        }

        let data = if options.singular {
            PrimaryData::Single(data.into_iter().next())
        } else {
            PrimaryData::Collection(data)
        };

        Self {
            data,
            included,
            links,
            meta,
        }
    }
}
