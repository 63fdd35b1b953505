//! Typed document values and the insertion-ordered document model.
//!
//! Documents round-trip through the store as extended JSON: plain JSON
//! scalars stay plain, while store-specific types (object ids, dates,
//! boxed numerics, binary payloads) are carried as single-key `$`-tagged
//! objects so no type information is lost between reads and writes.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Placeholder text rendered for binary payloads instead of raw bytes.
pub const NOT_DISPLAYED: &str = "<Not Displayed>";

/// Numbers at or above 2^53 cannot be represented exactly as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// 12-byte document identifier rendered as 24 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Length of the hex text form.
    pub const HEX_LEN: usize = 24;

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random identifier.
    ///
    /// Ids are random rather than timestamp-prefixed; uniqueness is all
    /// the store needs from them.
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4();
        let mut bytes = [0u8; 12];
        bytes.copy_from_slice(&uuid.as_bytes()[..12]);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 24-character hex string. Returns `None` on any other input.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != Self::HEX_LEN {
            return None;
        }
        let decoded = hex::decode(s).ok()?;
        let mut bytes = [0u8; 12];
        bytes.copy_from_slice(&decoded);
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

/// Every value kind a stored document field can hold.
///
/// `Number` is a plain JSON number; `Int32`/`Int64`/`Double` are the
/// explicitly boxed numerics carried through extended JSON tags. The
/// distinction matters to the tree builder, which renders boxed values
/// without consuming a block id.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Int32(i32),
    Int64(i64),
    Double(f64),
    /// Arbitrary-precision decimal kept as its source text.
    Decimal(String),
    ObjectId(ObjectId),
    DateTime(DateTime<Utc>),
    Binary(Vec<u8>),
    Array(Vec<FieldValue>),
    Object(Document),
}

/// Rendering classification used by the tree and summary builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// Binary payload, never displayed inline.
    Binary,
    /// Boxed numeric or id type displayed as canonical text.
    BoxedScalar,
    /// Array whose elements are all plain scalars.
    PrimitiveArray,
    /// Array with at least one non-scalar element.
    ObjectArray,
    Date,
    Object,
    /// Plain string, number, boolean, or null.
    Scalar,
}

impl FieldValue {
    pub fn classify(&self) -> ValueClass {
        match self {
            FieldValue::Binary(_) => ValueClass::Binary,
            FieldValue::Int32(_)
            | FieldValue::Int64(_)
            | FieldValue::Double(_)
            | FieldValue::Decimal(_)
            | FieldValue::ObjectId(_) => ValueClass::BoxedScalar,
            FieldValue::DateTime(_) => ValueClass::Date,
            FieldValue::Object(_) => ValueClass::Object,
            FieldValue::Array(items) => {
                if items
                    .iter()
                    .all(|item| item.classify() == ValueClass::Scalar)
                {
                    ValueClass::PrimitiveArray
                } else {
                    ValueClass::ObjectArray
                }
            }
            FieldValue::Null
            | FieldValue::Bool(_)
            | FieldValue::Number(_)
            | FieldValue::String(_) => ValueClass::Scalar,
        }
    }

    /// Canonical single-line text for display and summary tags.
    pub fn display_text(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) | FieldValue::Double(n) => format_number(*n),
            FieldValue::String(s) => s.clone(),
            FieldValue::Int32(i) => i.to_string(),
            FieldValue::Int64(i) => i.to_string(),
            FieldValue::Decimal(s) => s.clone(),
            FieldValue::ObjectId(id) => id.to_hex(),
            FieldValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            FieldValue::Binary(_) => NOT_DISPLAYED.to_string(),
            FieldValue::Array(_) | FieldValue::Object(_) => self.to_json().to_string(),
        }
    }

    /// Decode a JSON value, recognizing extended JSON tags at every level.
    pub fn from_json(value: Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => {
                FieldValue::Array(items.into_iter().map(FieldValue::from_json).collect())
            }
            Value::Object(map) => FieldValue::from_json_map(map),
        }
    }

    fn from_json_map(map: Map<String, Value>) -> FieldValue {
        if map.len() == 1 {
            if let Some(tagged) = FieldValue::from_tag(&map) {
                return tagged;
            }
        }
        let mut fields = Document::new();
        for (key, value) in map {
            fields.insert(key, FieldValue::from_json(value));
        }
        FieldValue::Object(fields)
    }

    /// Recognize a single-key extended JSON tag. Unknown tags and tags
    /// with malformed content fall back to a nested object so nothing
    /// is lost on the way in.
    fn from_tag(map: &Map<String, Value>) -> Option<FieldValue> {
        let (key, value) = map.iter().next()?;
        match key.as_str() {
            "$oid" => ObjectId::from_hex(value.as_str()?).map(FieldValue::ObjectId),
            "$date" => match value {
                Value::String(s) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| FieldValue::DateTime(dt.with_timezone(&Utc))),
                Value::Number(n) => n
                    .as_i64()
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                    .map(FieldValue::DateTime),
                _ => None,
            },
            "$numberDecimal" => value.as_str().map(|s| FieldValue::Decimal(s.to_string())),
            "$numberLong" => value.as_str()?.parse::<i64>().ok().map(FieldValue::Int64),
            "$numberInt" => value.as_str()?.parse::<i32>().ok().map(FieldValue::Int32),
            "$numberDouble" => value.as_str()?.parse::<f64>().ok().map(FieldValue::Double),
            "$binary" => hex::decode(value.as_str()?).ok().map(FieldValue::Binary),
            _ => None,
        }
    }

    /// Encode back to extended JSON. Inverse of [`FieldValue::from_json`]
    /// for every value that decodes without fallback.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => plain_number_to_json(*n),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Int32(i) => tag("$numberInt", i.to_string()),
            FieldValue::Int64(i) => tag("$numberLong", i.to_string()),
            FieldValue::Double(d) => tag("$numberDouble", double_tag_text(*d)),
            FieldValue::Decimal(s) => tag("$numberDecimal", s.clone()),
            FieldValue::ObjectId(id) => tag("$oid", id.to_hex()),
            FieldValue::DateTime(dt) => {
                tag("$date", dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            FieldValue::Binary(bytes) => tag("$binary", hex::encode(bytes)),
            FieldValue::Array(items) => {
                Value::Array(items.iter().map(FieldValue::to_json).collect())
            }
            FieldValue::Object(doc) => doc.to_json(),
        }
    }
}

fn tag(key: &str, text: String) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), Value::String(text));
    Value::Object(map)
}

/// Integral values print without a trailing `.0`.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn double_tag_text(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        d.to_string()
    }
}

fn plain_number_to_json(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        Value::Number(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// A stored document: field names mapped to typed values, preserving
/// insertion order. Field order drives the rendered tree, so the map
/// must never reorder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: IndexMap<String, FieldValue>,
}

/// Raised when a stored body is not a JSON object.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document body must be a JSON object")]
    NotAnObject,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a JSON object into a document. The root map is never
    /// treated as an extended JSON tag, only its values are.
    pub fn from_json_object(value: Value) -> Result<Self, DocumentError> {
        let map = match value {
            Value::Object(map) => map,
            _ => return Err(DocumentError::NotAnObject),
        };
        let mut doc = Document::new();
        for (key, value) in map {
            doc.insert(key, FieldValue::from_json(value));
        }
        Ok(doc)
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.to_json());
        }
        Value::Object(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// The `_id` field, if present.
    pub fn id(&self) -> Option<&FieldValue> {
        self.get("_id")
    }

    /// Canonical text of the `_id` field.
    pub fn display_id(&self) -> Option<String> {
        self.id().map(FieldValue::display_text)
    }

    /// Resolve a dotted path such as `threat.score` or `tags.0`.
    /// Numeric segments index into arrays.
    pub fn get_path(&self, path: &str) -> Option<&FieldValue> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                FieldValue::Object(doc) => doc.get(segment)?,
                FieldValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

// Include tests
#[cfg(test)]
#[path = "document_test.rs"]
mod document_test;
