//! Kafka Connect JSON envelopes for sink-latency.
//!
//! This crate provides typed records for the `{schema, payload}` JSON shape
//! that the Kafka Connect `JsonConverter` expects when
//! `schemas.enable=true`. Keys and values are encoded independently and may
//! carry different schemas.
//!
//! # Example
//!
//! ```rust
//! use sink_latency_envelope::{Envelope, FieldType};
//!
//! let key = Envelope::single_string("id", "random_id");
//! let value = Envelope::builder()
//!     .field("value", FieldType::String, "random_value")
//!     .build()
//!     .unwrap();
//!
//! let key_bytes = key.to_vec().unwrap();
//! let decoded = Envelope::from_slice(&key_bytes).unwrap();
//! assert_eq!(decoded.get("id"), Some("random_id"));
//! # let _ = value;
//! ```

pub mod envelope;
pub mod error;

pub use envelope::{Envelope, EnvelopeBuilder, FieldSchema, FieldType, SchemaKind, StructSchema};
pub use error::{EnvelopeError, Result};
