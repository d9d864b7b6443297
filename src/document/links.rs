//! Top-level pagination link generation.
//!
//! Links are built on the pagination-less canonical URL, so every query
//! parameter except `page` and `size` survives, and `size` is written
//! back explicitly on each link.

use std::collections::BTreeMap;

use crate::document::DocumentPagination;

/// Builds the `first`/`prev`/`next`/`last` links for a paginated
/// collection.
///
/// `last` is `ceil(total / size)`; `prev` and `next` are omitted at the
/// edges.
#[must_use]
pub fn pagination_links(pagination: &DocumentPagination) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();
    let size = u64::from(pagination.size);
    let last_page = (pagination.total + size - 1) / size;

    let mut link = |name: &str, page: u64| {
        links.insert(name.to_string(), page_url(pagination, page));
    };

    link("first", 1);
    if pagination.page > 1 {
        link("prev", pagination.page - 1);
    }
    if pagination.page < last_page {
        link("next", pagination.page + 1);
    }
    link("last", last_page);

    links
}

fn page_url(pagination: &DocumentPagination, page: u64) -> String {
    let separator = if pagination.paginationless_url.contains('?') {
        '&'
    } else {
        '?'
    };

    format!(
        "{}{}page={}&size={}",
        pagination.paginationless_url, separator, page, pagination.size
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination(total: u64, page: u64, size: u32, url: &str) -> DocumentPagination {
        DocumentPagination {
            total,
            page,
            size,
            offset: (page - 1) * u64::from(size),
            paginationless_url: url.to_string(),
        }
    }

    #[test]
    fn test_middle_page_emits_all_four_links() {
        let links = pagination_links(&pagination(1000, 5, 3, ""));

        assert_eq!(links["first"], "?page=1&size=3");
        assert_eq!(links["prev"], "?page=4&size=3");
        assert_eq!(links["next"], "?page=6&size=3");
        assert_eq!(links["last"], "?page=334&size=3");
    }

    #[test]
    fn test_first_page_has_no_prev_link() {
        let links = pagination_links(&pagination(100, 1, 10, "/users"));

        assert!(!links.contains_key("prev"));
        assert_eq!(links["next"], "/users?page=2&size=10");
    }

    #[test]
    fn test_last_page_has_no_next_link() {
        let links = pagination_links(&pagination(100, 10, 10, "/users"));

        assert!(!links.contains_key("next"));
        assert_eq!(links["prev"], "/users?page=9&size=10");
    }

    #[test]
    fn test_existing_query_parameters_are_preserved() {
        let links = pagination_links(&pagination(30, 2, 10, "/users?include=groups"));

        assert_eq!(links["first"], "/users?include=groups&page=1&size=10");
        assert_eq!(links["last"], "/users?include=groups&page=3&size=10");
    }

    #[test]
    fn test_partial_final_page_rounds_up() {
        let links = pagination_links(&pagination(11, 1, 5, ""));
        assert_eq!(links["last"], "?page=3&size=5");
    }
}
