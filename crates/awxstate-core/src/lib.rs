//! json/yaml normalization and secret sanitization for awx state.

pub mod normalize;
pub mod parse;
pub mod secret;

pub use normalize::{
    into_state_text, normalize, normalize_json, normalize_with, normalize_yaml, Format,
    FormatError, FormatValue, Normalized, DEFAULT_CHAIN,
};
pub use parse::parse_document;
pub use secret::{
    inspect_secret_fields, is_masked, parse_secret_fields, parse_secret_fields_text,
    sanitize_inputs, InputsMap, SchemaInspection, SecretFieldSet, SecretMode, ShapeMismatch,
    MASKING_SENTINEL,
};
