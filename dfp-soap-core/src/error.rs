//! Error types for the protocol layer.

use crate::value::ValueKind;

/// Errors raised while building or converting tagged values.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// A set contained elements of more than one value kind.
    #[error("set values must all be of the same kind: found {expected} and {found}")]
    HeterogeneousSetValue { expected: ValueKind, found: ValueKind },

    /// The `xsi:type` of a value element is not one of the known value kinds.
    #[error("unknown value type {0:?}")]
    UnknownType(String),

    /// A NumberValue whose text is not a decimal number.
    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    /// Date components that do not form a calendar date.
    #[error("invalid date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    /// A time zone id that is not in the IANA database.
    #[error("unknown time zone {0:?}")]
    UnknownTimeZone(String),

    /// A datetime carrying only an offset, not a named zone.
    #[error("datetime {0} is not time zone aware")]
    ZoneUnaware(String),

    /// A wall-clock time skipped by a daylight-saving transition.
    #[error("local time {0} does not exist in time zone {1}")]
    NonexistentLocalTime(String, String),

    /// A value element was missing a component.
    #[error("malformed {kind}: {reason}")]
    Malformed { kind: ValueKind, reason: String },
}

/// Errors raised while composing a PQL statement.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StatementError {
    #[error("a SELECT clause requires a FROM clause")]
    SelectWithoutFrom,

    #[error("a FROM clause requires a SELECT clause")]
    FromWithoutSelect,
}

/// Errors raised while reading or writing XML.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum XmlError {
    /// The document is not well formed.
    #[error("malformed xml: {0}")]
    Malformed(String),

    /// Serialization failed.
    #[error("xml write error: {0}")]
    Write(String),

    /// A required element is absent.
    #[error("missing element <{0}>")]
    MissingElement(String),

    /// The document is well formed but not shaped as expected.
    #[error("unexpected document: {0}")]
    Unexpected(String),
}
