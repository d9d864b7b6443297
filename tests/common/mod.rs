//! Shared fixtures: a small users / user-groups / platforms record graph
//! and the contract implementations the pipeline needs around it.

// Not every suite uses every fixture.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use serde_json::json;

use jsonapi_pipeline::catalog::{CatalogBuilder, ResourceTypeCatalog};
use jsonapi_pipeline::contracts::{InMemoryRepository, StaticRoutes, StaticSchemas};
use jsonapi_pipeline::metadata::{MetadataIndex, ResourceMetadata};
use jsonapi_pipeline::record::{AccessError, FieldValue, RecordRef, Related, ResourceRecord};
use jsonapi_pipeline::{ApiBasePath, HttpMethod, JsonApiConfig, PageSize};

/// A record with explicitly registered attributes and relations.
///
/// Relations live behind a mutex so cyclic graphs can be wired after
/// construction.
pub struct TestRecord {
    kind: &'static str,
    id: String,
    attributes: BTreeMap<String, FieldValue>,
    relations: Mutex<BTreeMap<String, Related>>,
}

impl TestRecord {
    pub fn new(kind: &'static str, id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            id: id.into(),
            attributes: BTreeMap::new(),
            relations: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn with_attributes(
        kind: &'static str,
        id: impl Into<String>,
        attributes: &[(&str, FieldValue)],
    ) -> Arc<Self> {
        Arc::new(Self {
            kind,
            id: id.into(),
            attributes: attributes
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect(),
            relations: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn set_related(&self, name: &str, related: Related) {
        self.relations
            .lock()
            .unwrap()
            .insert(name.to_string(), related);
    }
}

impl ResourceRecord for TestRecord {
    fn kind(&self) -> &str {
        self.kind
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn attribute(&self, field: &str) -> Result<FieldValue, AccessError> {
        self.attributes
            .get(field)
            .cloned()
            .ok_or_else(|| AccessError::UncallableGetter {
                name: field.to_string(),
            })
    }

    fn related(&self, relationship: &str) -> Result<Related, AccessError> {
        self.relations
            .lock()
            .unwrap()
            .get(relationship)
            .cloned()
            .ok_or_else(|| AccessError::UncallableGetter {
                name: relationship.to_string(),
            })
    }
}

pub fn user(id: &str, name: &str, surname: &str) -> Arc<TestRecord> {
    let registered = Utc.with_ymd_and_hms(2014, 7, 5, 12, 0, 0).unwrap();
    TestRecord::with_attributes(
        "User",
        id,
        &[
            ("name", FieldValue::from(name)),
            ("surname", FieldValue::from(surname)),
            ("registeredDate", FieldValue::DateTime(registered)),
        ],
    )
}

pub fn group(id: &str, label: &str) -> Arc<TestRecord> {
    TestRecord::with_attributes("UserGroup", id, &[("label", FieldValue::from(label))])
}

pub fn platform(id: &str, name: &str) -> Arc<TestRecord> {
    TestRecord::with_attributes("Platform", id, &[("name", FieldValue::from(name))])
}

pub fn account(id: &str, name: &str) -> Arc<TestRecord> {
    TestRecord::with_attributes("Account", id, &[("name", FieldValue::from(name))])
}

pub fn as_record(record: &Arc<TestRecord>) -> RecordRef {
    Arc::clone(record) as RecordRef
}

pub fn metadata_index() -> MetadataIndex {
    let mut index = MetadataIndex::new();

    index.insert(
        "User",
        ResourceMetadata::builder("users")
            .fields(["name", "surname", "registeredDate"])
            .to_one("platform", "platforms")
            .to_many("groups", "user-groups")
            .link_only("followers", "users", "/users/{id}/links/followers")
            .page_size(PageSize::new(3).unwrap())
            .build()
            .unwrap(),
    );

    index.insert(
        "UserGroup",
        ResourceMetadata::builder("user-groups")
            .field("label")
            .to_many("members", "users")
            .build()
            .unwrap(),
    );

    index.insert(
        "Platform",
        ResourceMetadata::builder("platforms")
            .field("name")
            .to_one("account", "accounts")
            .build()
            .unwrap(),
    );

    index.insert(
        "Account",
        ResourceMetadata::builder("accounts")
            .field("name")
            .to_one("owner", "users")
            .build()
            .unwrap(),
    );

    index
}

pub fn catalog() -> ResourceTypeCatalog {
    CatalogBuilder::new()
        .declare("users", "User")
        .declare("user-groups", "UserGroup")
        .declare("platforms", "Platform")
        .declare("accounts", "Account")
        .build(&["users", "user-groups", "platforms", "accounts"])
        .unwrap()
}

pub fn routes() -> StaticRoutes {
    let mut routes = StaticRoutes::new();
    routes.declare("/users", &[HttpMethod::Get, HttpMethod::Post]);
    routes.declare(
        "/users/{ids}",
        &[HttpMethod::Get, HttpMethod::Put, HttpMethod::Delete],
    );
    routes.declare("/users/{ids}/linked/{relationship}", &[HttpMethod::Get]);
    routes.declare(
        "/users/{ids}/links/{relationship}",
        &[HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete],
    );
    routes.declare(
        "/users/{ids}/links/{relationship}/{ids}",
        &[HttpMethod::Delete],
    );
    routes.declare("/user-groups", &[HttpMethod::Get]);
    // Declared in the contract, but backed by no record kind.
    routes.declare("/posts", &[HttpMethod::Get]);
    routes
}

pub fn schemas() -> StaticSchemas {
    let mut schemas = StaticSchemas::new();
    let users_schema = json!({
        "type": "object",
        "properties": {
            "users": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string" },
                    "surname": { "type": "string" },
                    "links": { "type": "object" }
                }
            }
        }
    });
    schemas.declare(HttpMethod::Post, "/users", users_schema.clone());
    schemas.declare(HttpMethod::Put, "/users", users_schema);
    schemas
}

pub fn config() -> JsonApiConfig {
    JsonApiConfig::builder()
        .api_base_path(ApiBasePath::new("/api/v1").unwrap())
        .max_document_resources(5)
        .build()
}

pub fn repository_with(records: &[RecordRef]) -> InMemoryRepository {
    let repository = InMemoryRepository::new();
    for record in records {
        repository.insert(Arc::clone(record));
    }
    repository
}
