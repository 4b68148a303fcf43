//! Type tags describing the shape of values flowing between workflow steps.
//!
//! A type tag is a small string label the planner attaches to every declared
//! parameter and step return value (`"string"`, `"sequence-of-record"`,
//! `"mapping-of-string-int"`, ...). The engine never enforces a full type
//! system with them; they exist solely so the binding resolver can decide
//! whether the previous step's output is an acceptable value for a parameter.
//! Parsing is total: unknown labels become opaque [`TypeTag::Record`] tags
//! that only ever match themselves.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Closed vocabulary of value shapes used for binding compatibility checks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeTag {
    /// Unspecified or absent tag. Never matches a runtime value.
    #[default]
    Null,
    /// Text scalar.
    String,
    /// Whole-number scalar.
    Integer,
    /// Floating-point scalar.
    Float,
    /// Boolean scalar.
    Boolean,
    /// Ordered sequence, optionally parameterized over its element tag.
    Sequence(Option<Box<TypeTag>>),
    /// String-keyed mapping, optionally parameterized over key and value tags.
    Mapping(Option<Box<(TypeTag, TypeTag)>>),
    /// Opaque domain tag (for example `"record"` or `"post"`). Matches only by
    /// exact tag equality, never by runtime shape.
    Record(String),
}

impl TypeTag {
    /// Parse a planner-supplied tag string. Parsing never fails; anything the
    /// closed vocabulary does not cover is preserved as an opaque record tag.
    pub fn parse(tag: &str) -> TypeTag {
        let normalized = tag.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" | "null" | "none" => TypeTag::Null,
            "string" | "str" | "text" => TypeTag::String,
            "int" | "integer" => TypeTag::Integer,
            "float" | "number" => TypeTag::Float,
            "bool" | "boolean" => TypeTag::Boolean,
            "sequence" | "list" | "array" => TypeTag::Sequence(None),
            "mapping" | "dict" | "map" | "object" => TypeTag::Mapping(None),
            _ => {
                if let Some(element) = normalized.strip_prefix("sequence-of-").or_else(|| normalized.strip_prefix("list-of-")) {
                    return TypeTag::Sequence(Some(Box::new(TypeTag::parse(element))));
                }
                if let Some(rest) = normalized.strip_prefix("mapping-of-").or_else(|| normalized.strip_prefix("map-of-")) {
                    // The key tag is always a bare scalar; everything after the
                    // first separator belongs to the value tag.
                    if let Some((key, value)) = rest.split_once('-') {
                        return TypeTag::Mapping(Some(Box::new((TypeTag::parse(key), TypeTag::parse(value)))));
                    }
                    return TypeTag::Mapping(None);
                }
                TypeTag::Record(normalized)
            }
        }
    }

    /// True when the tag is the unspecified placeholder.
    pub fn is_null(&self) -> bool {
        matches!(self, TypeTag::Null)
    }

    /// Check whether a runtime value has the shape this tag describes.
    ///
    /// Opaque record tags cannot be checked structurally and report `false`;
    /// they participate in binding through exact tag equality instead.
    pub fn matches_value(&self, value: &Value) -> bool {
        match self {
            TypeTag::Null => false,
            TypeTag::String => value.is_string(),
            TypeTag::Integer => value.is_i64() || value.is_u64(),
            TypeTag::Float => value.is_f64(),
            TypeTag::Boolean => value.is_boolean(),
            TypeTag::Sequence(_) => value.is_array(),
            TypeTag::Mapping(_) => value.is_object(),
            TypeTag::Record(_) => false,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Null => formatter.write_str("null"),
            TypeTag::String => formatter.write_str("string"),
            TypeTag::Integer => formatter.write_str("int"),
            TypeTag::Float => formatter.write_str("float"),
            TypeTag::Boolean => formatter.write_str("bool"),
            TypeTag::Sequence(None) => formatter.write_str("sequence"),
            TypeTag::Sequence(Some(element)) => write!(formatter, "sequence-of-{}", element),
            TypeTag::Mapping(None) => formatter.write_str("mapping"),
            TypeTag::Mapping(Some(pair)) => write!(formatter, "mapping-of-{}-{}", pair.0, pair.1),
            TypeTag::Record(name) => formatter.write_str(name),
        }
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TypeTag::parse(&raw))
    }
}

/// True when a literal parameter value counts as "not provided".
///
/// The planner leaves a parameter's `value` as JSON null or an empty string to
/// signal that it must be bound from a previous step's output; the invoker
/// uses the same notion to drop unresolved optional arguments before a call.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}
