//! The inbound HTTP request value consumed by the pipeline.
//!
//! This module provides [`ApiRequest`] and its builder, plus the ordered
//! [`QueryParams`] multimap. The pipeline never talks to a socket; the
//! embedding server hands it one `ApiRequest` per invocation.

use std::borrow::Cow;
use std::fmt;

/// HTTP methods understood by the pipeline.
///
/// Any other method fails route validation, since no JSON-API action maps
/// to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method for fetching resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for updating resources.
    Put,
    /// HTTP PATCH method for updating resources.
    Patch,
    /// HTTP DELETE method for removing resources or relationship links.
    Delete,
}

impl HttpMethod {
    /// Returns the method as an uppercase string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An ordered collection of decoded query-string pairs.
///
/// Order is preserved because it matters twice: stable multi-key sorting
/// and rebuilding pagination-less URLs.
///
/// Keys may be scoped with bracket syntax (`sort[users]=name`); use
/// [`scoped`](Self::scoped) to read those.
///
/// # Example
///
/// ```rust
/// use jsonapi_pipeline::QueryParams;
///
/// let query = QueryParams::parse("sort=-name&fields%5Busers%5D=name,surname");
/// assert_eq!(query.get("sort"), Some("-name"));
/// assert!(query.has("fields"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty query.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Parses a raw query string into ordered, percent-decoded pairs.
    ///
    /// Pairs without a `=` get an empty value. Sequences that fail to
    /// decode are kept literally rather than dropped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut pairs = Vec::new();

        for part in raw.split('&') {
            if part.is_empty() {
                continue;
            }

            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            pairs.push((decode(key), decode(value)));
        }

        Self { pairs }
    }

    /// Creates a query from already-decoded pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Returns the first value for an exact key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the key is present, either exactly or in
    /// bracket-scoped form (`key[sub]`).
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        let scoped_prefix = format!("{key}[");
        self.pairs
            .iter()
            .any(|(k, _)| k == key || k.starts_with(&scoped_prefix))
    }

    /// Iterates over all pairs in input order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Collects values for a key and its bracket-scoped variants.
    ///
    /// `name=x` yields `(None, "x")`; `name[sub]=x` yields
    /// `(Some("sub"), "x")`. Input order is preserved.
    #[must_use]
    pub fn scoped(&self, name: &str) -> Vec<(Option<&str>, &str)> {
        let mut out = Vec::new();

        for (key, value) in &self.pairs {
            if key == name {
                out.push((None, value.as_str()));
            } else if let Some(rest) = key.strip_prefix(name) {
                if let Some(sub) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                    out.push((Some(sub), value.as_str()));
                }
            }
        }

        out
    }

    /// Returns `true` if no pairs are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn decode(part: &str) -> String {
    match urlencoding::decode(part) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => part.to_string(),
    }
}

/// One inbound HTTP request, as seen by the pipeline.
///
/// Use [`ApiRequest::builder`] to construct requests with the builder
/// pattern.
///
/// # Example
///
/// ```rust
/// use jsonapi_pipeline::{ApiRequest, HttpMethod};
///
/// let request = ApiRequest::builder(HttpMethod::Get, "/api/v1/users/1")
///     .query_str("include=groups")
///     .build();
///
/// assert_eq!(request.path, "/api/v1/users/1");
/// assert_eq!(request.query.get("include"), Some("groups"));
/// ```
#[derive(Clone, Debug)]
pub struct ApiRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The request path, including the API base path.
    pub path: String,
    /// Decoded query parameters in input order.
    pub query: QueryParams,
    /// The `Content-Type` header value, if any.
    pub content_type: Option<String>,
    /// The raw request body, if any.
    pub body: Option<String>,
}

impl ApiRequest {
    /// Creates a new builder with the required method and path.
    #[must_use]
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> ApiRequestBuilder {
        ApiRequestBuilder::new(method, path)
    }

    /// Returns `true` if the request carries a non-empty body.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|b| !b.is_empty())
    }
}

/// Builder for constructing [`ApiRequest`] instances.
#[derive(Debug)]
pub struct ApiRequestBuilder {
    method: HttpMethod,
    path: String,
    query: QueryParams,
    content_type: Option<String>,
    body: Option<String>,
}

impl ApiRequestBuilder {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            content_type: None,
            body: None,
        }
    }

    /// Parses and sets the query from a raw query string.
    #[must_use]
    pub fn query_str(mut self, raw: &str) -> Self {
        self.query = QueryParams::parse(raw);
        self
    }

    /// Sets all query parameters at once.
    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Appends a single, already-decoded query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.pairs.push((key.into(), value.into()));
        self
    }

    /// Sets the `Content-Type` header value.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> ApiRequest {
        ApiRequest {
            method: self.method,
            path: self.path,
            query: self.query,
            content_type: self.content_type,
            body: self.body,
        }
    }
}

// Verify request types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiRequest>();
    assert_send_sync::<QueryParams>();
};
