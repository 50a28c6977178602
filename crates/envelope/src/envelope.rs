//! Envelope records for schema-enabled JSON messages.
//!
//! The JDBC sink reads keys and values through the `JsonConverter` with
//! `schemas.enable=true`, so every message carries its own schema next to
//! the payload:
//!
//! ```json
//! {
//!   "schema": {
//!     "type": "struct",
//!     "fields": [{ "field": "id", "type": "string", "optional": "false" }]
//!   },
//!   "payload": { "id": "random_id" }
//! }
//! ```
//!
//! `optional` is written as a string. Payload values are always strings.

use crate::error::{EnvelopeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Connect primitive types that a struct field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    String,
    Bytes,
}

/// Top-level schema kind. Only structs are produced by this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchemaKind {
    #[default]
    #[serde(rename = "struct")]
    Struct,
}

/// One field declaration inside a struct schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(with = "optional_flag")]
    pub optional: bool,
}

/// Schema descriptor of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructSchema {
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    pub fields: Vec<FieldSchema>,
}

/// A schema plus the payload it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub schema: StructSchema,
    pub payload: BTreeMap<String, String>,
}

impl Envelope {
    /// Start building an envelope field by field.
    pub fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::default()
    }

    /// Envelope with a single required string field.
    ///
    /// This is the shape used for both the key (`{"id": ...}`) and the value
    /// (`{"value": ...}`) of the latency probe message.
    pub fn single_string(field: &str, value: &str) -> Self {
        Self {
            schema: StructSchema {
                kind: SchemaKind::Struct,
                fields: vec![FieldSchema {
                    field: field.to_string(),
                    field_type: FieldType::String,
                    optional: false,
                }],
            },
            payload: BTreeMap::from([(field.to_string(), value.to_string())]),
        }
    }

    /// Look up a payload value by field name.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.payload.get(field).map(String::as_str)
    }

    /// Check that field names are unique and every payload entry is declared.
    pub fn validate(&self) -> Result<()> {
        let mut declared = HashSet::new();
        for field in &self.schema.fields {
            if !declared.insert(field.field.as_str()) {
                return Err(EnvelopeError::DuplicateField(field.field.clone()));
            }
        }
        for name in self.payload.keys() {
            if !declared.contains(name.as_str()) {
                return Err(EnvelopeError::MissingField(name.clone()));
            }
        }
        Ok(())
    }

    /// Encode to JSON bytes.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(EnvelopeError::Encode)
    }

    /// Decode from JSON bytes and validate.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(EnvelopeError::Decode)?;
        envelope.validate()?;
        Ok(envelope)
    }
}

/// Builder for [`Envelope`].
#[derive(Debug, Default)]
pub struct EnvelopeBuilder {
    fields: Vec<FieldSchema>,
    payload: BTreeMap<String, String>,
}

impl EnvelopeBuilder {
    /// Declare a required field and set its value.
    pub fn field(mut self, name: &str, field_type: FieldType, value: impl Into<String>) -> Self {
        self.fields.push(FieldSchema {
            field: name.to_string(),
            field_type,
            optional: false,
        });
        self.payload.insert(name.to_string(), value.into());
        self
    }

    /// Declare an optional field. `None` leaves it out of the payload.
    pub fn nullable_field(mut self, name: &str, field_type: FieldType, value: Option<&str>) -> Self {
        self.fields.push(FieldSchema {
            field: name.to_string(),
            field_type,
            optional: true,
        });
        if let Some(value) = value {
            self.payload.insert(name.to_string(), value.to_string());
        }
        self
    }

    pub fn build(self) -> Result<Envelope> {
        let envelope = Envelope {
            schema: StructSchema {
                kind: SchemaKind::Struct,
                fields: self.fields,
            },
            payload: self.payload,
        };
        envelope.validate()?;
        Ok(envelope)
    }
}

/// `optional` travels as `"true"`/`"false"`; a JSON boolean is accepted on read.
mod optional_flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"\"true\" or \"false\"",
                )),
            },
        }
    }
}
