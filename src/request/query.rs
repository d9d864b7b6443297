//! Query-string constructs: sorting, filters, include chains, sparse
//! fieldsets and the i18n flag.
//!
//! Sorting and filter directives are normalized here and handed to the
//! storage collaborator; this crate never interprets `custom` entries
//! itself.

use std::collections::BTreeMap;

use crate::http::QueryParams;
use crate::metadata::ResourceMetadata;
use crate::util::inflect::camelize;

/// Query keys with reserved meaning, never treated as filters.
const RESERVED_KEYS: &[&str] = &["sort", "page", "size", "include", "fields", "meta", "locale"];

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order.
    Ascending,
    /// Descending order, marked by a leading `-` on the wire.
    Descending,
}

impl SortOrder {
    /// Returns the conventional SQL-ish spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// How a sort entry was classified against the primary type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKind {
    /// One of the primary type's own fields.
    Field,
    /// A to-one relationship of the primary type; sorts by a related
    /// record's field.
    Association,
    /// Anything else; passed through for external handling.
    Custom,
}

/// One normalized sort directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortDirective {
    /// The classification of this directive.
    pub kind: SortKind,
    /// The resource the directive is qualified with, camelized.
    pub resource: String,
    /// The field to sort by, camelized.
    pub field: String,
    /// The direction.
    pub order: SortOrder,
}

/// The parsed `sort` parameter: directives in input order.
///
/// Input order is the tie-break for stable multi-key sorting, so it is
/// preserved exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sorting {
    directives: Vec<SortDirective>,
}

impl Sorting {
    /// Returns `true` if no directives were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Returns all directives in input order.
    #[must_use]
    pub fn directives(&self) -> &[SortDirective] {
        &self.directives
    }

    /// Returns the directives of one kind, in input order.
    pub fn of_kind(&self, kind: SortKind) -> impl Iterator<Item = &SortDirective> {
        self.directives.iter().filter(move |d| d.kind == kind)
    }
}

/// Parses the `sort` query parameter.
pub struct SortingParser<'a> {
    primary_metadata: &'a ResourceMetadata,
}

impl<'a> SortingParser<'a> {
    /// Creates a parser over the primary type's metadata.
    #[must_use]
    pub const fn new(primary_metadata: &'a ResourceMetadata) -> Self {
        Self { primary_metadata }
    }

    /// Parses `sort` entries into normalized directives.
    ///
    /// A flat `sort=a,b` applies to the primary type; `sort[type]=a`
    /// qualifies another resource. A leading `-` marks descending order
    /// and is stripped before the name is camelized. Entries are
    /// classified as `field` when they name one of the primary type's own
    /// fields, `association` when the qualifying resource is a to-one
    /// relationship of the primary type, and `custom` otherwise.
    #[must_use]
    pub fn parse(&self, query: &QueryParams, primary_type: &str) -> Sorting {
        let mut directives = Vec::new();

        for (scope, list) in query.scoped("sort") {
            let resource = scope.unwrap_or(primary_type);

            for raw in list.split(',').filter(|f| !f.is_empty()) {
                let (order, name) = raw.strip_prefix('-').map_or(
                    (SortOrder::Ascending, raw),
                    |stripped| (SortOrder::Descending, stripped),
                );

                let field = camelize(name);
                let kind = if resource == primary_type && self.primary_metadata.is_field(&field) {
                    SortKind::Field
                } else if self
                    .primary_metadata
                    .is_to_one_relationship(&camelize(resource))
                {
                    SortKind::Association
                } else {
                    SortKind::Custom
                };

                directives.push(SortDirective {
                    kind,
                    resource: camelize(resource),
                    field,
                    order,
                });
            }
        }

        Sorting { directives }
    }
}

/// The parsed filter directives, bucketed by how they matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    field: BTreeMap<String, Vec<String>>,
    custom: BTreeMap<String, Vec<String>>,
}

impl Filters {
    /// Filters that matched the primary type's own fields.
    #[must_use]
    pub const fn field(&self) -> &BTreeMap<String, Vec<String>> {
        &self.field
    }

    /// Filters for an external handler to interpret.
    #[must_use]
    pub const fn custom(&self) -> &BTreeMap<String, Vec<String>> {
        &self.custom
    }

    /// Returns `true` if no filters were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field.is_empty() && self.custom.is_empty()
    }
}

/// Parses free-form filter parameters.
pub struct FilterParser<'a> {
    primary_metadata: &'a ResourceMetadata,
}

impl<'a> FilterParser<'a> {
    /// Creates a parser over the primary type's metadata.
    #[must_use]
    pub const fn new(primary_metadata: &'a ResourceMetadata) -> Self {
        Self { primary_metadata }
    }

    /// Buckets every non-reserved query key as a field or custom filter.
    ///
    /// Keys matching a declared field of the primary type land in the
    /// `field` bucket; everything else is passed through as `custom`.
    /// Repeated keys accumulate their values in order.
    #[must_use]
    pub fn parse(&self, query: &QueryParams) -> Filters {
        let mut filters = Filters::default();

        for (key, value) in query.entries() {
            if is_reserved(key) {
                continue;
            }

            let name = camelize(key);
            let bucket = if self.primary_metadata.is_field(&name) {
                &mut filters.field
            } else {
                &mut filters.custom
            };
            bucket.entry(name).or_default().push(value.to_string());
        }

        filters
    }
}

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS
        .iter()
        .any(|r| key == *r || (key.starts_with(r) && key[r.len()..].starts_with('[')))
}

/// Parses the `include` parameter into relationship chains.
///
/// `include=a.b,c` becomes `[[a, b], [c]]`. Returns an empty list when the
/// parameter is absent.
#[must_use]
pub fn parse_include(query: &QueryParams) -> Vec<Vec<String>> {
    let Some(raw) = query.get("include") else {
        return Vec::new();
    };

    raw.split(',')
        .filter(|chain| !chain.is_empty())
        .map(|chain| chain.split('.').map(ToString::to_string).collect())
        .collect()
}

/// Parses the `fields` parameter into a per-type sparse-fieldset map.
///
/// A flat `fields=a,b` applies to the primary type; `fields[type]=a,b`
/// scopes the restriction. Returns an empty map when the parameter is
/// absent.
#[must_use]
pub fn parse_sparse_fields(
    query: &QueryParams,
    primary_type: &str,
) -> BTreeMap<String, Vec<String>> {
    let mut sparse = BTreeMap::new();

    for (scope, list) in query.scoped("fields") {
        let resource = scope.unwrap_or(primary_type);
        let fields: Vec<String> = list
            .split(',')
            .filter(|f| !f.is_empty())
            .map(ToString::to_string)
            .collect();
        sparse.insert(resource.to_string(), fields);
    }

    sparse
}

/// Returns `true` if the `meta` parameter requests i18n metadata.
#[must_use]
pub fn parse_i18n(query: &QueryParams) -> bool {
    query
        .get("meta")
        .is_some_and(|meta| meta.split(',').any(|entry| entry == "i18n"))
}

/// Translates sorting directives into repository-consumable order tuples.
///
/// `field` directives order by the primary resource's own column;
/// `association` directives order by a to-one related resource's column.
/// `custom` directives are skipped — interpreting them is the external
/// handler's job.
#[must_use]
pub fn applicable_orderings(sorting: &Sorting) -> Vec<(SortKind, String, String, SortOrder)> {
    sorting
        .directives()
        .iter()
        .filter(|d| d.kind != SortKind::Custom)
        .map(|d| (d.kind, d.resource.clone(), d.field.clone(), d.order))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_metadata() -> ResourceMetadata {
        ResourceMetadata::builder("users")
            .fields(["name", "surname", "registeredDate"])
            .to_one("platform", "platforms")
            .to_many("groups", "user-groups")
            .build()
            .unwrap()
    }

    #[test]
    fn test_sort_classifies_own_fields_with_order_and_camelization() {
        let metadata = users_metadata();
        let query = QueryParams::parse("sort=surname,name,-registered-date");
        let sorting = SortingParser::new(&metadata).parse(&query, "users");

        let fields: Vec<_> = sorting.of_kind(SortKind::Field).collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].field, "surname");
        assert_eq!(fields[0].order, SortOrder::Ascending);
        assert_eq!(fields[1].field, "name");
        assert_eq!(fields[1].order, SortOrder::Ascending);
        assert_eq!(fields[2].field, "registeredDate");
        assert_eq!(fields[2].order, SortOrder::Descending);
        assert!(fields.iter().all(|d| d.resource == "users"));
    }

    #[test]
    fn test_sort_preserves_input_order_across_kinds() {
        let metadata = users_metadata();
        let query = QueryParams::parse("sort=ranking,name");
        let sorting = SortingParser::new(&metadata).parse(&query, "users");

        let kinds: Vec<_> = sorting.directives().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![SortKind::Custom, SortKind::Field]);
    }

    #[test]
    fn test_sort_qualified_by_to_one_relationship_is_association() {
        let metadata = users_metadata();
        let query = QueryParams::parse("sort%5Bplatform%5D=name");
        let sorting = SortingParser::new(&metadata).parse(&query, "users");

        let directive = &sorting.directives()[0];
        assert_eq!(directive.kind, SortKind::Association);
        assert_eq!(directive.resource, "platform");
        assert_eq!(directive.field, "name");
    }

    #[test]
    fn test_sort_unknown_name_is_custom() {
        let metadata = users_metadata();
        let query = QueryParams::parse("sort=relevance");
        let sorting = SortingParser::new(&metadata).parse(&query, "users");

        assert_eq!(sorting.directives()[0].kind, SortKind::Custom);
    }

    #[test]
    fn test_absent_sort_parameter_yields_empty_sorting() {
        let metadata = users_metadata();
        let sorting = SortingParser::new(&metadata).parse(&QueryParams::new(), "users");
        assert!(sorting.is_empty());
    }

    #[test]
    fn test_filters_bucket_known_fields_and_pass_custom_through() {
        let metadata = users_metadata();
        let query = QueryParams::parse("name=John&search=connor&sort=name");
        let filters = FilterParser::new(&metadata).parse(&query);

        assert_eq!(filters.field().get("name"), Some(&vec!["John".to_string()]));
        assert_eq!(
            filters.custom().get("search"),
            Some(&vec!["connor".to_string()])
        );
        assert!(!filters.field().contains_key("sort"));
    }

    #[test]
    fn test_filters_accumulate_repeated_keys() {
        let metadata = users_metadata();
        let query = QueryParams::parse("name=John&name=Sarah");
        let filters = FilterParser::new(&metadata).parse(&query);

        assert_eq!(
            filters.field().get("name"),
            Some(&vec!["John".to_string(), "Sarah".to_string()])
        );
    }

    #[test]
    fn test_filters_skip_reserved_keys_and_their_scoped_forms() {
        let metadata = users_metadata();
        let query = QueryParams::parse("fields%5Busers%5D=name&page=2&size=5&meta=i18n");
        let filters = FilterParser::new(&metadata).parse(&query);

        assert!(filters.is_empty());
    }

    #[test]
    fn test_include_chains_split_on_dots_and_commas() {
        let query = QueryParams::parse("include=platform.account,workspaces-joined");
        assert_eq!(
            parse_include(&query),
            vec![
                vec!["platform".to_string(), "account".to_string()],
                vec!["workspaces-joined".to_string()],
            ]
        );
    }

    #[test]
    fn test_include_absent_yields_empty() {
        assert!(parse_include(&QueryParams::new()).is_empty());
    }

    #[test]
    fn test_sparse_fields_flat_list_applies_to_primary_type() {
        let query = QueryParams::parse("fields=name,surname,email");
        let sparse = parse_sparse_fields(&query, "users");

        assert_eq!(
            sparse.get("users"),
            Some(&vec![
                "name".to_string(),
                "surname".to_string(),
                "email".to_string()
            ])
        );
    }

    #[test]
    fn test_sparse_fields_per_type_map() {
        let query = QueryParams::parse("fields%5Busers%5D=name&fields%5Buser-groups%5D=label");
        let sparse = parse_sparse_fields(&query, "users");

        assert_eq!(sparse.get("users"), Some(&vec!["name".to_string()]));
        assert_eq!(sparse.get("user-groups"), Some(&vec!["label".to_string()]));
    }

    #[test]
    fn test_i18n_flag_from_meta_parameter() {
        assert!(parse_i18n(&QueryParams::parse("meta=i18n")));
        assert!(parse_i18n(&QueryParams::parse("meta=stats,i18n")));
        assert!(!parse_i18n(&QueryParams::parse("meta=stats")));
        assert!(!parse_i18n(&QueryParams::new()));
    }

    #[test]
    fn test_applicable_orderings_skip_custom_directives() {
        let metadata = users_metadata();
        let query = QueryParams::parse("sort=name,relevance,-surname");
        let sorting = SortingParser::new(&metadata).parse(&query, "users");

        let orderings = applicable_orderings(&sorting);
        assert_eq!(orderings.len(), 2);
        assert_eq!(orderings[0].2, "name");
        assert_eq!(orderings[1].2, "surname");
        assert_eq!(orderings[1].3, SortOrder::Descending);
    }
}
