//! Pagination parsing.
//!
//! `page` is 1-based; `size` defaults to the primary type's configured
//! page size. The offset is computed here so the storage collaborator
//! only ever sees offset/limit. A pagination-less canonical URL — the
//! request path plus every query pair except `page` and `size` — is
//! derived for building the top-level first/prev/next/last links later.

use crate::http::ApiRequest;
use crate::metadata::ResourceMetadata;
use crate::request::errors::{ParseError, RequestError};

/// The parsed pagination request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationRequest {
    /// The 1-based page number.
    pub page: u64,
    /// The page size.
    pub size: u32,
    /// The storage offset: `(page - 1) * size`.
    pub offset: u64,
    /// The request URL with `page` and `size` stripped.
    pub paginationless_url: String,
}

/// Parses `page`/`size` into a [`PaginationRequest`].
pub struct PaginationParser<'a> {
    primary_metadata: &'a ResourceMetadata,
}

impl<'a> PaginationParser<'a> {
    /// Creates a parser over the primary type's metadata.
    #[must_use]
    pub const fn new(primary_metadata: &'a ResourceMetadata) -> Self {
        Self { primary_metadata }
    }

    /// Parses the pagination parameters.
    ///
    /// Returns `None` when the request has no `page` parameter —
    /// pagination is opt-in per request.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidQueryParameter`] when `page` or
    /// `size` is not a positive integer.
    pub fn parse(&self, request: &ApiRequest) -> Result<Option<PaginationRequest>, RequestError> {
        let Some(raw_page) = request.query.get("page") else {
            return Ok(None);
        };

        let page = parse_positive(raw_page).ok_or_else(|| ParseError::InvalidQueryParameter {
            name: "page".to_string(),
            value: raw_page.to_string(),
        })?;

        let size = match request.query.get("size") {
            Some(raw_size) => {
                let size =
                    parse_positive(raw_size).ok_or_else(|| ParseError::InvalidQueryParameter {
                        name: "size".to_string(),
                        value: raw_size.to_string(),
                    })?;
                u32::try_from(size).map_err(|_| ParseError::InvalidQueryParameter {
                    name: "size".to_string(),
                    value: raw_size.to_string(),
                })?
            }
            None => self.primary_metadata.page_size().get(),
        };

        Ok(Some(PaginationRequest {
            page,
            size,
            offset: (page - 1) * u64::from(size),
            paginationless_url: paginationless_url(request),
        }))
    }
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|n| *n > 0)
}

/// Rebuilds the request URL without its `page` and `size` parameters,
/// preserving the order of everything else.
fn paginationless_url(request: &ApiRequest) -> String {
    let rest: Vec<String> = request
        .query
        .entries()
        .filter(|(key, _)| *key != "page" && *key != "size")
        .map(|(key, value)| {
            if value.is_empty() {
                urlencoding::encode(key).into_owned()
            } else {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            }
        })
        .collect();

    if rest.is_empty() {
        request.path.clone()
    } else {
        format!("{}?{}", request.path, rest.join("&"))
    }
}
