//! Configuration types for the JSON-API pipeline.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`JsonApiConfig`]: The configuration struct consumed by the request
//!   interpreter
//! - [`JsonApiConfigBuilder`]: A builder for constructing [`JsonApiConfig`]
//!   instances
//! - [`ApiBasePath`]: A validated base-path newtype
//! - [`PageSize`]: A validated, non-zero page size
//!
//! # Example
//!
//! ```rust
//! use jsonapi_pipeline::{ApiBasePath, JsonApiConfig, PageSize};
//!
//! let config = JsonApiConfig::builder()
//!     .api_base_path(ApiBasePath::new("/api/v1").unwrap())
//!     .default_page_size(PageSize::new(25).unwrap())
//!     .max_document_resources(100)
//!     .build();
//!
//! assert_eq!(config.api_base_path().unwrap().as_str(), "/api/v1");
//! ```

mod newtypes;

pub use newtypes::{ApiBasePath, PageSize};

/// Configuration for the JSON-API request pipeline.
///
/// All values are instance-based and passed explicitly; the pipeline keeps
/// no process-wide mutable configuration.
///
/// The API base path is optional at construction time: a config without
/// one can be built (e.g., in environments where the path is injected
/// late), but interpreting a request against it fails with a
/// configuration error rather than a client error.
///
/// # Thread Safety
///
/// `JsonApiConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads.
#[derive(Clone, Debug)]
pub struct JsonApiConfig {
    api_base_path: Option<ApiBasePath>,
    default_page_size: PageSize,
    max_document_resources: usize,
}

impl JsonApiConfig {
    /// The default bound on ids addressed by a single document.
    pub const DEFAULT_RESOURCE_LIMIT: usize = 50;

    /// Creates a new builder for constructing a `JsonApiConfig`.
    #[must_use]
    pub fn builder() -> JsonApiConfigBuilder {
        JsonApiConfigBuilder::new()
    }

    /// Returns the API base path, if configured.
    #[must_use]
    pub const fn api_base_path(&self) -> Option<&ApiBasePath> {
        self.api_base_path.as_ref()
    }

    /// Returns the page size used when a resource declares none.
    #[must_use]
    pub const fn default_page_size(&self) -> PageSize {
        self.default_page_size
    }

    /// Returns the maximum number of ids a single request may address.
    #[must_use]
    pub const fn max_document_resources(&self) -> usize {
        self.max_document_resources
    }
}

impl Default for JsonApiConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

// Verify JsonApiConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<JsonApiConfig>();
};

/// Builder for constructing [`JsonApiConfig`] instances.
///
/// Every field has a default, so `build()` is infallible.
///
/// # Defaults
///
/// - `api_base_path`: `None` (requests fail until one is configured)
/// - `default_page_size`: 10
/// - `max_document_resources`: [`JsonApiConfig::DEFAULT_RESOURCE_LIMIT`]
#[derive(Debug, Default)]
pub struct JsonApiConfigBuilder {
    api_base_path: Option<ApiBasePath>,
    default_page_size: Option<PageSize>,
    max_document_resources: Option<usize>,
}

impl JsonApiConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base path.
    #[must_use]
    pub fn api_base_path(mut self, path: ApiBasePath) -> Self {
        self.api_base_path = Some(path);
        self
    }

    /// Sets the default page size.
    #[must_use]
    pub const fn default_page_size(mut self, size: PageSize) -> Self {
        self.default_page_size = Some(size);
        self
    }

    /// Sets the maximum number of ids a single request may address.
    #[must_use]
    pub const fn max_document_resources(mut self, limit: usize) -> Self {
        self.max_document_resources = Some(limit);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> JsonApiConfig {
        JsonApiConfig {
            api_base_path: self.api_base_path,
            default_page_size: self.default_page_size.unwrap_or_default(),
            max_document_resources: self
                .max_document_resources
                .unwrap_or(JsonApiConfig::DEFAULT_RESOURCE_LIMIT),
        }
    }
}
