//! Structured literal decoding
//!
//! `{...}` and `[...]` blocks in `.arc` source are JSON. A block that does
//! not decode is kept as `{"raw": <inner text>}` instead of failing the
//! declaration.

use arcanea_core::{StructuredValue, ValueMap};
use serde_json::Value;

/// Which delimiter pair a block used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralShape {
    /// `{ ... }`
    Map,
    /// `[ ... ]`
    Sequence,
}

impl LiteralShape {
    pub fn open(self) -> char {
        match self {
            LiteralShape::Map => '{',
            LiteralShape::Sequence => '[',
        }
    }

    pub fn close(self) -> char {
        match self {
            LiteralShape::Map => '}',
            LiteralShape::Sequence => ']',
        }
    }
}

/// Verbatim inner text of a block that did not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFallback {
    pub raw: String,
}

impl RawFallback {
    /// `{"raw": <text>}`
    pub fn into_map(self) -> ValueMap {
        let mut map = ValueMap::new();
        map.insert("raw".to_string(), Value::String(self.raw));
        map
    }

    /// `[{"raw": <text>}]`
    pub fn into_sequence(self) -> Vec<Value> {
        vec![Value::Object(self.into_map())]
    }
}

/// Decode the text between a block's delimiters.
///
/// Succeeds only when `open + inner + close` is JSON of the matching shape.
pub fn decode_structured_literal(
    shape: LiteralShape,
    inner: &str,
) -> Result<StructuredValue, RawFallback> {
    let text = format!("{}{}{}", shape.open(), inner, shape.close());
    match (shape, serde_json::from_str::<Value>(&text)) {
        (LiteralShape::Map, Ok(value @ Value::Object(_)))
        | (LiteralShape::Sequence, Ok(value @ Value::Array(_))) => Ok(value),
        _ => Err(RawFallback {
            raw: inner.to_string(),
        }),
    }
}

/// Decode a `{...}` block into a mapping, falling back to `{"raw": ...}`.
pub fn decode_map_or_raw(inner: &str) -> ValueMap {
    match decode_structured_literal(LiteralShape::Map, inner) {
        Ok(Value::Object(map)) => map,
        Ok(_) => ValueMap::new(),
        Err(fallback) => fallback.into_map(),
    }
}

/// Decode a `[...]` block into a sequence, falling back to `[{"raw": ...}]`.
pub fn decode_sequence_or_raw(inner: &str) -> Vec<Value> {
    match decode_structured_literal(LiteralShape::Sequence, inner) {
        Ok(Value::Array(items)) => items,
        Ok(_) => Vec::new(),
        Err(fallback) => fallback.into_sequence(),
    }
}
