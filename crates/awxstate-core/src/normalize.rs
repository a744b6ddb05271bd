//! canonical json/yaml text for values kept in state.
//!
//! `normalize_json` and `normalize_yaml` report failures as errors whose
//! display text is meant to be stored as-is; `normalize` walks a format chain
//! and hands back the original text when nothing parses.

use crate::parse::{emit_json, emit_yaml, parse_json, parse_yaml};
use std::fmt;
use thiserror::Error;

/// raw text value that may be absent.
///
/// absent and blank inputs collapse into `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatValue<'a> {
    Empty,
    Text(&'a str),
}

impl<'a> From<&'a str> for FormatValue<'a> {
    fn from(value: &'a str) -> Self {
        if value.is_empty() {
            FormatValue::Empty
        } else {
            FormatValue::Text(value)
        }
    }
}

impl<'a> From<&'a String> for FormatValue<'a> {
    fn from(value: &'a String) -> Self {
        FormatValue::from(value.as_str())
    }
}

impl<'a> From<Option<&'a str>> for FormatValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map(FormatValue::from).unwrap_or(FormatValue::Empty)
    }
}

impl<'a> From<Option<&'a String>> for FormatValue<'a> {
    fn from(value: Option<&'a String>) -> Self {
        FormatValue::from(value.map(String::as_str))
    }
}

/// parse failure for a single format.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Error parsing JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("Error parsing YAML: {0}")]
    Yaml(#[source] serde_yaml::Error),
}

impl FormatError {
    /// format that rejected the input.
    pub fn format(&self) -> Format {
        match self {
            FormatError::Json(_) => Format::Json,
            FormatError::Yaml(_) => Format::Yaml,
        }
    }
}

/// normalized text or the parse error that prevented it.
pub type Normalized = Result<String, FormatError>;

/// document formats the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Yaml,
}

/// json first, then yaml.
pub const DEFAULT_CHAIN: [Format; 2] = [Format::Json, Format::Yaml];

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    /// parse `text` in this format and re-emit it canonically.
    pub fn normalize(&self, text: &str) -> Normalized {
        match self {
            Format::Json => parse_json(text)
                .map(|value| emit_json(&value))
                .map_err(FormatError::Json),
            Format::Yaml => parse_yaml(text)
                .and_then(emit_yaml)
                .map_err(FormatError::Yaml),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// normalize a json value into compact form.
pub fn normalize_json<'a>(value: impl Into<FormatValue<'a>>) -> Normalized {
    normalize_as(Format::Json, value.into())
}

/// normalize a yaml value into block form.
pub fn normalize_yaml<'a>(value: impl Into<FormatValue<'a>>) -> Normalized {
    normalize_as(Format::Yaml, value.into())
}

/// best-effort normalization: json, then yaml, then the text unchanged.
pub fn normalize<'a>(value: impl Into<FormatValue<'a>>) -> String {
    normalize_with(value, &DEFAULT_CHAIN)
}

/// best-effort normalization over an explicit format chain.
pub fn normalize_with<'a>(value: impl Into<FormatValue<'a>>, chain: &[Format]) -> String {
    let value = value.into();
    let text = match value {
        FormatValue::Empty => return String::new(),
        FormatValue::Text(text) => text,
    };
    for format in chain {
        match format.normalize(text) {
            Ok(normalized) => return normalized,
            Err(err) => tracing::trace!(format = %format, error = %err, "format rejected value"),
        }
    }
    text.to_string()
}

/// collapse a normalization result into the `(text, ok)` pair written to
/// state; on failure the text is the error message.
pub fn into_state_text(result: Normalized) -> (String, bool) {
    match result {
        Ok(text) => (text, true),
        Err(err) => (err.to_string(), false),
    }
}

fn normalize_as(format: Format, value: FormatValue<'_>) -> Normalized {
    match value {
        FormatValue::Empty => Ok(String::new()),
        FormatValue::Text(text) => format.normalize(text),
    }
}
