//! The well-known type catalog.
//!
//! Protocol 1.0.0 schemas no longer describe primitives inline. They point at
//! a definition in the externally published `WellKnownTypes.json` document
//! instead, e.g. `{"$ref": "WellKnownTypes.json#/definitions/Integer"}`.
//! This module only knows the reference tokens; it never embeds the
//! referenced definitions.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Prefix shared by every well-known type reference token.
pub const WELL_KNOWN_TYPES_PREFIX: &str = "WellKnownTypes.json#/definitions/";

/// A primitive data type identified by a stable reference token.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum WellKnownType {
    String,
    BinaryData,
    Boolean,
    Date,
    TimestampWithTimezone,
    TimestampWithoutTimezone,
    Integer,
    Number,
    TimeWithTimezone,
    TimeWithoutTimezone,
}

impl WellKnownType {
    /// Returns the catalog entry's name, e.g. `"TimestampWithTimezone"`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Returns the reference token, e.g. `"WellKnownTypes.json#/definitions/Date"`.
    pub fn reference(self) -> String {
        format!("{}{}", WELL_KNOWN_TYPES_PREFIX, self.name())
    }

    /// Resolves a reference token back to its type.
    ///
    /// Returns `None` for references outside the catalog (local definitions,
    /// other documents, misspelled names).
    pub fn from_reference(reference: &str) -> Option<Self> {
        reference
            .strip_prefix(WELL_KNOWN_TYPES_PREFIX)
            .and_then(|name| name.parse().ok())
    }

    /// Maps an `airbyte_type` hint to its well-known type.
    pub fn from_airbyte_type(hint: &str) -> Option<Self> {
        match hint {
            "timestamp_with_timezone" => Some(Self::TimestampWithTimezone),
            "timestamp_without_timezone" => Some(Self::TimestampWithoutTimezone),
            "time_with_timezone" => Some(Self::TimeWithTimezone),
            "time_without_timezone" => Some(Self::TimeWithoutTimezone),
            "integer" | "big_integer" => Some(Self::Integer),
            "big_number" => Some(Self::Number),
            _ => None,
        }
    }

    /// The JSON Schema `type` the type was declared with before 1.0.0.
    pub fn legacy_base_type(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer | Self::Number => "number",
            Self::String
            | Self::BinaryData
            | Self::Date
            | Self::TimestampWithTimezone
            | Self::TimestampWithoutTimezone
            | Self::TimeWithTimezone
            | Self::TimeWithoutTimezone => "string",
        }
    }

    /// The `format` keyword of the pre-1.0.0 declaration, if any.
    pub fn legacy_format(self) -> Option<&'static str> {
        match self {
            Self::Date => Some("date"),
            Self::TimestampWithTimezone | Self::TimestampWithoutTimezone => Some("date-time"),
            Self::TimeWithTimezone | Self::TimeWithoutTimezone => Some("time"),
            _ => None,
        }
    }

    /// The `airbyte_type` keyword of the pre-1.0.0 declaration, if any.
    pub fn legacy_airbyte_type(self) -> Option<&'static str> {
        match self {
            Self::Integer => Some("integer"),
            Self::TimestampWithTimezone => Some("timestamp_with_timezone"),
            Self::TimestampWithoutTimezone => Some("timestamp_without_timezone"),
            Self::TimeWithTimezone => Some("time_with_timezone"),
            Self::TimeWithoutTimezone => Some("time_without_timezone"),
            _ => None,
        }
    }

    /// The `contentEncoding` keyword of the pre-1.0.0 declaration, if any.
    pub fn legacy_content_encoding(self) -> Option<&'static str> {
        match self {
            Self::BinaryData => Some("base64"),
            _ => None,
        }
    }

    /// Iterates the whole catalog in declaration order.
    pub fn all() -> impl Iterator<Item = WellKnownType> {
        Self::iter()
    }
}
