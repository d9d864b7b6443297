//! The resource-type catalog: resource type names to record kinds.
//!
//! The catalog maps each resource type declared by the API contract
//! (`users`, `user-groups`, …) to exactly one record kind. Derived
//! declarations come from the record kinds themselves; explicit per-type
//! overrides always win over the derived mapping. A type with no matching
//! kind, or with several and no override, fails catalog construction —
//! ambiguity is a deployment error, never resolved by picking one.
//!
//! # Example
//!
//! ```rust
//! use jsonapi_pipeline::catalog::CatalogBuilder;
//!
//! let catalog = CatalogBuilder::new()
//!     .declare("users", "User")
//!     .declare("user-groups", "UserGroup")
//!     .build(&["users", "user-groups"])
//!     .unwrap();
//!
//! assert_eq!(catalog.resolve("users"), Some("User"));
//! assert_eq!(catalog.resolve("posts"), None);
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;

/// Errors raised while building the catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A declared resource type matches no record kind.
    #[error("No entity matches the resource \"{resource_type}\".")]
    MissingEntity {
        /// The resource type without a match.
        resource_type: String,
    },

    /// A declared resource type matches more than one record kind.
    #[error("The resource \"{resource_type}\" matches the following record kinds: \"{}\". Map all but one of them to other resource types with an explicit override.", .candidates.join(", "))]
    AmbiguousEntity {
        /// The resource type with several matches.
        resource_type: String,
        /// The competing record kinds.
        candidates: Vec<String>,
    },
}

/// An immutable resource-type to record-kind mapping.
///
/// Built once at startup through [`CatalogBuilder`] and read-only
/// afterwards; a lookup started during a request always sees a consistent
/// snapshot.
#[derive(Clone, Debug)]
pub struct ResourceTypeCatalog {
    map: BTreeMap<String, String>,
}

impl ResourceTypeCatalog {
    /// Resolves a resource type to its record kind.
    #[must_use]
    pub fn resolve(&self, resource_type: &str) -> Option<&str> {
        self.map.get(resource_type).map(String::as_str)
    }

    /// Returns the full mapping.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, String> {
        &self.map
    }
}

/// A cache that may front catalog construction.
///
/// Freshness policy is the embedder's concern; the catalog only requires
/// that a cached mapping, once read, is consistent for the duration of
/// one request.
pub trait MapCache: Send + Sync {
    /// Returns `true` if the cached mapping may be used.
    fn is_fresh(&self) -> bool;

    /// Reads the cached mapping, if any.
    fn read(&self) -> Option<BTreeMap<String, String>>;

    /// Stores a freshly derived mapping.
    fn keep(&self, map: &BTreeMap<String, String>);
}

/// A trivial in-process [`MapCache`].
#[derive(Debug, Default)]
pub struct InMemoryMapCache {
    inner: Mutex<Option<BTreeMap<String, String>>>,
}

impl InMemoryMapCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MapCache for InMemoryMapCache {
    fn is_fresh(&self) -> bool {
        self.inner.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    fn read(&self) -> Option<BTreeMap<String, String>> {
        self.inner.lock().ok().and_then(|g| g.clone())
    }

    fn keep(&self, map: &BTreeMap<String, String>) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(map.clone());
        }
    }
}

/// Builder for [`ResourceTypeCatalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    derived: BTreeMap<String, Vec<String>>,
    overrides: BTreeMap<String, String>,
}

impl CatalogBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a derived mapping from a record kind.
    ///
    /// Several kinds may declare the same resource type; the ambiguity is
    /// detected at build time unless an override settles it.
    #[must_use]
    pub fn declare(mut self, resource_type: impl Into<String>, kind: impl Into<String>) -> Self {
        self.derived
            .entry(resource_type.into())
            .or_default()
            .push(kind.into());
        self
    }

    /// Sets an explicit override for a resource type.
    ///
    /// An override wins over any derived declarations for the same type.
    #[must_use]
    pub fn override_type(
        mut self,
        resource_type: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        self.overrides.insert(resource_type.into(), kind.into());
        self
    }

    /// Builds the catalog for the resource types declared by the API
    /// contract.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingEntity`] for a type with no match
    /// and [`CatalogError::AmbiguousEntity`] for a type with several
    /// matches and no override.
    pub fn build(&self, declared_types: &[&str]) -> Result<ResourceTypeCatalog, CatalogError> {
        let mut map = BTreeMap::new();

        for &resource_type in declared_types {
            let kind = self.kind_for(resource_type)?;
            map.insert(resource_type.to_string(), kind);
        }

        tracing::debug!(types = map.len(), "resource type catalog built");

        Ok(ResourceTypeCatalog { map })
    }

    /// Builds the catalog, consulting `cache` first and keeping the result
    /// in it.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_cached(
        &self,
        declared_types: &[&str],
        cache: &dyn MapCache,
    ) -> Result<ResourceTypeCatalog, CatalogError> {
        if cache.is_fresh() {
            if let Some(map) = cache.read() {
                return Ok(ResourceTypeCatalog { map });
            }
        }

        let catalog = self.build(declared_types)?;
        cache.keep(&catalog.map);

        Ok(catalog)
    }

    fn kind_for(&self, resource_type: &str) -> Result<String, CatalogError> {
        if let Some(kind) = self.overrides.get(resource_type) {
            return Ok(kind.clone());
        }

        let candidates = self
            .derived
            .get(resource_type)
            .map(Vec::as_slice)
            .unwrap_or_default();

        match candidates {
            [] => Err(CatalogError::MissingEntity {
                resource_type: resource_type.to_string(),
            }),
            [kind] => Ok(kind.clone()),
            many => Err(CatalogError::AmbiguousEntity {
                resource_type: resource_type.to_string(),
                candidates: many.to_vec(),
            }),
        }
    }
}

// Verify catalog types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceTypeCatalog>();
    assert_send_sync::<InMemoryMapCache>();
};
