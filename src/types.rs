//! Core types for spark-bind.
//!
//! These types define the foundation that everything builds on.
//! They flow from raw records through coercion into entities, and from
//! blueprints into the presentation engine's node arrays.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

/// A raw record as delivered by the transport (one JSON object).
pub type RawRecord = serde_json::Map<String, Value>;

// =============================================================================
// Field Kinds
// =============================================================================

/// Declared kind of a schema field.
///
/// `Sequence` is structural: it does not coerce a value, it asks the entity
/// to build a nested [`ObservableSequence`](crate::sequence::ObservableSequence)
/// over the matching container slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
    Float,
    Timestamp,
    Sequence,
}

impl FieldKind {
    /// Whether this kind carries a scalar value.
    #[inline]
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::Sequence)
    }

    /// Lowercase kind name, as used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Timestamp => "timestamp",
            Self::Sequence => "sequence",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How coercion failures are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Store [`FieldValue::Invalid`] and keep rendering.
    #[default]
    Lenient,
    /// Fail the entity's construction with a coercion error.
    Strict,
}

// =============================================================================
// Timestamp
// =============================================================================

const NANOS_PER_MILLI: i128 = 1_000_000;

/// An instant with millisecond precision, always normalized to UTC.
///
/// Millisecond precision matches the epoch-millisecond values exchanged with
/// the transport, so converting back and forth never drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Build from epoch milliseconds. `None` if out of the representable range.
    pub fn from_millis(millis: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * NANOS_PER_MILLI)
            .ok()
            .map(Self)
    }

    /// Normalize any instant: convert to UTC and drop sub-millisecond digits.
    pub fn from_datetime(datetime: OffsetDateTime) -> Option<Self> {
        let millis = datetime.unix_timestamp_nanos().div_euclid(NANOS_PER_MILLI);
        i64::try_from(millis).ok().and_then(Self::from_millis)
    }

    /// Parse an RFC 3339 string (`2024-05-01T12:30:00Z`, `...+02:00`).
    pub fn parse_rfc3339(text: &str) -> Option<Self> {
        OffsetDateTime::parse(text, &Rfc3339)
            .ok()
            .and_then(Self::from_datetime)
    }

    /// The current instant.
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        Self::from_datetime(now).unwrap_or(Self(now))
    }

    /// Epoch milliseconds.
    pub fn millis(&self) -> i64 {
        self.0.unix_timestamp_nanos().div_euclid(NANOS_PER_MILLI) as i64
    }

    /// The underlying UTC date-time.
    pub fn datetime(&self) -> OffsetDateTime {
        self.0.to_offset(UtcOffset::UTC)
    }

    /// RFC 3339 rendering, falling back to epoch millis.
    pub fn to_rfc3339(&self) -> String {
        self.datetime()
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.millis().to_string())
    }
}

// =============================================================================
// Field Values
// =============================================================================

/// A typed field value stored on an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(Timestamp),
    /// Sentinel for input that could not be coerced to `kind`.
    Invalid { kind: FieldKind, raw: String },
    /// Verbatim value of a field the schema does not declare.
    Raw(Value),
}

impl FieldValue {
    /// Default display string (used when a field has no formatter).
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Timestamp(ts) => ts.to_rfc3339(),
            Self::Invalid { .. } => String::new(),
            Self::Raw(Value::String(text)) => text.clone(),
            Self::Raw(Value::Null) => String::new(),
            Self::Raw(value) => value.to_string(),
        }
    }

    /// Convert back into a raw JSON value.
    ///
    /// Coercing the result with the same kind yields this value again.
    pub fn to_raw(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Integer(n) => Value::from(*n),
            Self::Float(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Timestamp(ts) => Value::from(ts.millis()),
            Self::Invalid { raw, .. } => Value::String(raw.clone()),
            Self::Raw(value) => value.clone(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Raw(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(ts: Timestamp) -> Self {
        Self::Timestamp(ts)
    }
}

// =============================================================================
// Presentation Node Types
// =============================================================================

/// Where a container attaches newly inserted children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// New children become the last child.
    #[default]
    Back,
    /// New children become the first child.
    Front,
}

/// Marks a node as the home of one entity field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binding {
    /// Text of this node mirrors the field's formatted value.
    Display(String),
    /// Children of this node mirror the field's sequence.
    Container(String),
}

impl Binding {
    /// Name of the bound field.
    pub fn field(&self) -> &str {
        match self {
            Self::Display(field) | Self::Container(field) => field,
        }
    }
}

bitflags::bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const NONE = 0;
        /// Node backs an observable sequence.
        const CONTAINER = 1 << 0;
        /// Container attaches new children at the front.
        const FRONT_INSERT = 1 << 1;
        /// Input affordance is disabled.
        const DISABLED = 1 << 2;
    }
}
