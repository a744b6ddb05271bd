//! secret-field detection and masking-sentinel substitution.

use crate::normalize::FormatValue;
use crate::parse::parse_document;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;

/// literal the api returns in place of any secret it will not disclose.
pub const MASKING_SENTINEL: &str = "$encrypted$";

/// credential `inputs` as field name -> value.
pub type InputsMap = Map<String, Value>;

/// return true when a value is the masking sentinel.
pub fn is_masked(value: &Value) -> bool {
    value.as_str() == Some(MASKING_SENTINEL)
}

/// field ids declared `secret: true` by a credential type.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SecretFieldSet(BTreeSet<String>);

impl SecretFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// ids in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SecretFieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// reasons a credential-type schema could not be read as `{fields: [...]}`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ShapeMismatch {
    #[error("schema is absent")]
    Absent,
    #[error("schema is not a mapping")]
    NotMapping,
    #[error("schema has no `fields` key")]
    MissingFields,
    #[error("schema `fields` is not a list")]
    FieldsNotList,
}

/// strict view of a schema inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaInspection {
    /// the schema had a field list. `skipped` counts descriptors that were
    /// not mappings or had no string `id`.
    Parsed {
        secrets: SecretFieldSet,
        skipped: usize,
    },
    Unrecognized(ShapeMismatch),
}

impl SchemaInspection {
    /// secret ids, empty for an unrecognized schema.
    pub fn into_secrets(self) -> SecretFieldSet {
        match self {
            SchemaInspection::Parsed { secrets, .. } => secrets,
            SchemaInspection::Unrecognized(_) => SecretFieldSet::new(),
        }
    }
}

/// inspect a decoded credential-type `inputs` schema.
pub fn inspect_secret_fields(schema: Option<&Value>) -> SchemaInspection {
    let Some(schema) = schema else {
        return SchemaInspection::Unrecognized(ShapeMismatch::Absent);
    };
    let Some(object) = schema.as_object() else {
        return SchemaInspection::Unrecognized(if schema.is_null() {
            ShapeMismatch::Absent
        } else {
            ShapeMismatch::NotMapping
        });
    };
    let Some(fields) = object.get("fields") else {
        return SchemaInspection::Unrecognized(ShapeMismatch::MissingFields);
    };
    let Some(fields) = fields.as_array() else {
        return SchemaInspection::Unrecognized(ShapeMismatch::FieldsNotList);
    };

    let mut secrets = SecretFieldSet::new();
    let mut skipped = 0;
    for field in fields {
        let Some(id) = field
            .as_object()
            .and_then(|descriptor| descriptor.get("id"))
            .and_then(Value::as_str)
        else {
            skipped += 1;
            continue;
        };
        if field.get("secret") == Some(&Value::Bool(true)) {
            secrets.insert(id);
        }
    }
    SchemaInspection::Parsed { secrets, skipped }
}

/// secret field ids of a decoded schema; malformed schemas yield an empty set.
pub fn parse_secret_fields(schema: Option<&Value>) -> SecretFieldSet {
    inspect_secret_fields(schema).into_secrets()
}

/// secret field ids of a json or yaml schema text.
pub fn parse_secret_fields_text<'a>(schema: impl Into<FormatValue<'a>>) -> SecretFieldSet {
    match schema.into() {
        FormatValue::Empty => SecretFieldSet::new(),
        FormatValue::Text(text) => parse_secret_fields(parse_document(text).as_ref()),
    }
}

/// which fields are eligible for sentinel substitution.
#[derive(Debug, Clone, Copy)]
pub enum SecretMode<'a> {
    /// only the listed fields.
    Strict(&'a SecretFieldSet),
    /// any field whose value is the sentinel.
    Lenient,
}

impl SecretMode<'_> {
    fn covers(&self, field: &str) -> bool {
        match self {
            SecretMode::Strict(secrets) => secrets.contains(field),
            SecretMode::Lenient => true,
        }
    }
}

/// replace masked secret values in `server` with the matching `local` value.
///
/// the result always has exactly the keys of `server`.
pub fn sanitize_inputs(
    server: &InputsMap,
    local: Option<&InputsMap>,
    mode: SecretMode<'_>,
) -> InputsMap {
    let mut out = InputsMap::new();
    for (field, value) in server {
        let restored = if mode.covers(field) && is_masked(value) {
            local.and_then(|local| local.get(field))
        } else {
            None
        };
        match restored {
            Some(previous) => {
                tracing::debug!(field = %field, "restored masked secret from local inputs");
                out.insert(field.clone(), previous.clone());
            }
            None => {
                out.insert(field.clone(), value.clone());
            }
        }
    }
    out
}
