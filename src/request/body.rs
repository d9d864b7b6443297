//! Body parsing for write requests.
//!
//! Resource-target creates and updates are extracted from under the
//! primary-type key, hydrated into canonical link form, and validated
//! against the create or update schema from the schema contract.
//! Relationship-target writes are validated against a fixed links-only
//! shape; unlink payloads are derived from the URL, since DELETE requests
//! never carry a body.
//!
//! Update bodies may carry per-record translations under
//! `meta.translations`; when any are supplied, every record in the
//! request must be covered.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::contracts::{LinksHydrant, SchemaIndex};
use crate::http::{ApiRequest, HttpMethod};
use crate::request::errors::{ParseError, RequestError};
use crate::request::{ActionName, ActionTarget, RequestContext};

/// The media type this API accepts for write bodies.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// One normalized per-record payload: fields, links and meta as decoded.
pub type FieldBag = serde_json::Map<String, Value>;

/// The parsed body of one request.
///
/// Update, link and unlink payloads are keyed by record id so multi-record
/// writes can be applied per record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BodyPayload {
    /// No body payload applies to this request.
    #[default]
    None,
    /// Records to create, in body order.
    Create(Vec<FieldBag>),
    /// Records to update, keyed by id.
    Update(BTreeMap<String, FieldBag>),
    /// Relationship links to add, keyed by primary record id.
    Link(BTreeMap<String, FieldBag>),
    /// Relationship links to remove, keyed by primary record id.
    Unlink(BTreeMap<String, FieldBag>),
}

impl BodyPayload {
    /// Returns `true` if no payload applies.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// The fixed shape every relationship payload must match.
fn link_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "links": { "type": "object" }
        }
    })
}

/// Parses and validates write bodies.
pub struct BodyParser<'a> {
    schemas: &'a dyn SchemaIndex,
    hydrant: &'a dyn LinksHydrant,
}

impl<'a> BodyParser<'a> {
    /// Creates a parser over the schema and hydrant collaborators.
    #[must_use]
    pub const fn new(schemas: &'a dyn SchemaIndex, hydrant: &'a dyn LinksHydrant) -> Self {
        Self { schemas, hydrant }
    }

    /// Parses the request body according to the classified action.
    ///
    /// Fetches and resource deletes yield [`BodyPayload::None`].
    ///
    /// # Errors
    ///
    /// - [`RequestError::UnsupportedMediaType`] when a body arrives with
    ///   the wrong content type.
    /// - [`ParseError`] variants for structurally invalid payloads.
    /// - [`RequestError::MissingSchema`] / [`RequestError::MalformedSchema`]
    ///   for contract misconfiguration.
    /// - [`RequestError::MissingTranslation`] when translations are
    ///   supplied but do not cover every record.
    pub fn parse(
        &self,
        request: &ApiRequest,
        context: &RequestContext,
    ) -> Result<BodyPayload, RequestError> {
        if request.has_body() {
            self.check_content_type(request)?;
        }

        match (context.action.target, context.action.name) {
            (ActionTarget::Resource, ActionName::Create) => self.parse_create(context),
            (ActionTarget::Resource, ActionName::Update) => self.parse_update(context),
            (ActionTarget::Relationship, ActionName::Create | ActionName::Update) => {
                self.parse_link(context)
            }
            (ActionTarget::Relationship, ActionName::Delete) => self.parse_unlink(context),
            _ => Ok(BodyPayload::None),
        }
    }

    fn check_content_type(&self, request: &ApiRequest) -> Result<(), RequestError> {
        let actual = request
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string())
            .unwrap_or_default();

        if actual == JSON_API_CONTENT_TYPE {
            return Ok(());
        }

        Err(RequestError::UnsupportedMediaType {
            expected: JSON_API_CONTENT_TYPE,
            actual,
        })
    }

    fn parse_create(&self, context: &RequestContext) -> Result<BodyPayload, RequestError> {
        let mut data = primary_payloads(context)?;
        let schema = self.find_resource_object_schema(context, HttpMethod::Post)?;

        for bag in &mut data {
            self.prepare(context, &schema, bag)?;
        }

        Ok(BodyPayload::Create(data))
    }

    fn parse_update(&self, context: &RequestContext) -> Result<BodyPayload, RequestError> {
        let bags = primary_payloads(context)?;
        let mut data = BTreeMap::new();

        for mut bag in bags {
            let id = record_id(&mut bag, &context.primary_ids)?;
            data.insert(id, bag);
        }

        let translations = body_translations(context);
        if !translations.is_empty() {
            for (id, bag) in &mut data {
                let translation = translations
                    .get(id)
                    .ok_or_else(|| RequestError::MissingTranslation { id: id.clone() })?;
                merge_translation(bag, translation);
            }
        }

        let schema = self.find_resource_object_schema(context, HttpMethod::Put)?;
        for bag in data.values_mut() {
            self.prepare(context, &schema, bag)?;
        }

        Ok(BodyPayload::Update(data))
    }

    fn parse_link(&self, context: &RequestContext) -> Result<BodyPayload, RequestError> {
        let body = context
            .decoded_body
            .as_ref()
            .ok_or(ParseError::MissingLinksObject)?;
        let primary = body
            .get(&context.primary_type)
            .and_then(Value::as_object)
            .ok_or_else(|| ParseError::MissingPrimaryTypeKey {
                resource_type: context.primary_type.clone(),
            })?;
        let links = primary
            .get("links")
            .and_then(Value::as_object)
            .ok_or(ParseError::MissingLinksObject)?;

        let schema = link_schema();
        let mut data = BTreeMap::new();

        for id in &context.primary_ids {
            let mut bag = FieldBag::new();
            bag.insert("links".to_string(), Value::Object(links.clone()));
            self.prepare(context, &schema, &mut bag)?;
            data.insert(id.clone(), bag);
        }

        Ok(BodyPayload::Link(data))
    }

    /// DELETE requests carry no body, so unlink payloads are derived from
    /// the relationship ids in the URL.
    fn parse_unlink(&self, context: &RequestContext) -> Result<BodyPayload, RequestError> {
        let relationship = context
            .relationship
            .clone()
            .ok_or(ParseError::MissingLinksObject)?;
        let ids: Vec<Value> = context
            .relationship_ids
            .iter()
            .map(|id| Value::String(id.clone()))
            .collect();

        let schema = link_schema();
        let mut data = BTreeMap::new();

        for id in &context.primary_ids {
            let mut links = FieldBag::new();
            links.insert(relationship.clone(), Value::Array(ids.clone()));

            let mut bag = FieldBag::new();
            bag.insert("links".to_string(), Value::Object(links));
            self.prepare(context, &schema, &mut bag)?;
            data.insert(id.clone(), bag);
        }

        Ok(BodyPayload::Unlink(data))
    }

    /// Looks up the per-record schema for the action's canonical verb.
    ///
    /// Both PUT and PATCH updates validate against the PUT schema.
    fn find_resource_object_schema(
        &self,
        context: &RequestContext,
        method: HttpMethod,
    ) -> Result<Value, RequestError> {
        let path = format!("/{}", context.primary_type);
        let Some(schema) = self.schemas.find_request_schema(method, &path) else {
            tracing::warn!(
                resource_type = %context.primary_type,
                method = %method,
                "no request schema configured"
            );
            return Err(RequestError::MissingSchema {
                resource_type: context.primary_type.clone(),
            });
        };

        let Some(per_record) = schema
            .get("properties")
            .and_then(|p| p.get(&context.primary_type))
        else {
            tracing::warn!(
                resource_type = %context.primary_type,
                "request schema is missing the primary type key"
            );
            return Err(RequestError::MalformedSchema {
                resource_type: context.primary_type.clone(),
            });
        };

        Ok(per_record.clone())
    }

    /// Hydrates one payload into canonical link form, then validates it.
    ///
    /// Validation sees the fully-normalized shape, never the raw wire
    /// shape.
    fn prepare(
        &self,
        context: &RequestContext,
        schema: &Value,
        bag: &mut FieldBag,
    ) -> Result<(), RequestError> {
        self.hydrant.hydrate(&context.primary_metadata, bag)?;

        self.schemas
            .validate(&Value::Object(bag.clone()), schema)
            .map_err(|message| ParseError::SchemaMismatch { message })?;

        Ok(())
    }
}

/// Extracts the record payloads from under the primary-type key.
fn primary_payloads(context: &RequestContext) -> Result<Vec<FieldBag>, RequestError> {
    let primary = context
        .decoded_body
        .as_ref()
        .and_then(|body| body.get(&context.primary_type))
        .ok_or_else(|| ParseError::MissingPrimaryTypeKey {
            resource_type: context.primary_type.clone(),
        })?;

    match primary {
        Value::Object(bag) => Ok(vec![bag.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object().cloned().ok_or_else(|| {
                    ParseError::ExpectedResourceObject {
                        resource_type: context.primary_type.clone(),
                    }
                    .into()
                })
            })
            .collect(),
        _ => Err(ParseError::ExpectedResourceObject {
            resource_type: context.primary_type.clone(),
        }
        .into()),
    }
}

/// Reads the record id from an update payload.
///
/// A payload without an `id` adopts the sole URL id when exactly one was
/// given; otherwise the id cannot be attributed and the payload is
/// rejected.
fn record_id(bag: &mut FieldBag, primary_ids: &[String]) -> Result<String, RequestError> {
    match bag.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(n)) => {
            let id = n.to_string();
            bag.insert("id".to_string(), Value::String(id.clone()));
            Ok(id)
        }
        Some(_) => Err(ParseError::MissingRecordId.into()),
        None => match primary_ids {
            [only] => {
                bag.insert("id".to_string(), Value::String(only.clone()));
                Ok(only.clone())
            }
            _ => Err(ParseError::MissingRecordId.into()),
        },
    }
}

/// Reads the per-record translation maps from the body meta, if any.
fn body_translations(context: &RequestContext) -> BTreeMap<String, Value> {
    context
        .decoded_body
        .as_ref()
        .and_then(|body| body.get("meta"))
        .and_then(|meta| meta.get("translations"))
        .and_then(Value::as_object)
        .map(|translations| {
            translations
                .iter()
                .map(|(id, value)| (id.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Merges a translation map into a record payload's meta.
fn merge_translation(bag: &mut FieldBag, translation: &Value) {
    let meta = bag
        .entry("meta".to_string())
        .or_insert_with(|| Value::Object(FieldBag::new()));

    if let Some(meta) = meta.as_object_mut() {
        meta.insert("translations".to_string(), translation.clone());
    }
}
