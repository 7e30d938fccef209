//! Type Registry Data Structures
//!
//! A `SoftType` is a named, registry-managed data type assignable to node
//! keys. Primitive types validate locally by their representation; all other
//! types reference an external validator endpoint and only the size
//! constraint is enforced here.
//!
//! Validation failures carry stable error codes (the `E-10x` family) so
//! callers can surface them consistently.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for model and value checks.
///
/// Every variant maps to a stable error code via [`ValidationError::error_code`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field was empty or absent (E-103)
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A primitive type's name is not a known representation (E-100)
    #[error("Unknown primitive representation: {0}")]
    UnknownRepresentation(String),

    /// The value does not parse as the declared representation (E-101)
    #[error("Value {value:?} is not a valid {repr}")]
    InvalidValue { repr: String, value: String },

    /// The value exceeds the key's size constraint (E-102)
    #[error("Value length {length} exceeds size limit {size}")]
    SizeExceeded { size: usize, length: usize },
}

impl ValidationError {
    /// Stable application error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::UnknownRepresentation(_) => "E-100",
            ValidationError::InvalidValue { .. } => "E-101",
            ValidationError::SizeExceeded { .. } => "E-102",
            ValidationError::MissingField(_) => "E-103",
        }
    }
}

/// Built-in representations a primitive type can validate against.
///
/// Parsed from the type's name, case-insensitively, with a few common
/// aliases ("int", "bool", "float").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveRepr {
    String,
    Text,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Email,
    Url,
}

impl PrimitiveRepr {
    /// Resolve a type name to a built-in representation.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Some(Self::String),
            "text" => Some(Self::Text),
            "integer" | "int" => Some(Self::Integer),
            "decimal" | "float" | "number" => Some(Self::Decimal),
            "boolean" | "bool" => Some(Self::Boolean),
            "datetime" | "date" => Some(Self::DateTime),
            "email" => Some(Self::Email),
            "url" => Some(Self::Url),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Email => "email",
            Self::Url => "url",
        }
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid url regex"))
}

/// A registry entry describing a data type assignable to keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftType {
    /// Unique identifier (UUID)
    pub id: String,

    /// Registry name (unique, doubles as the representation for primitives)
    pub name: String,

    /// Representation descriptor (URL of the external renderer)
    pub repr: String,

    /// Whether values validate locally against the built-in representation
    pub is_primitive: bool,

    /// External validator endpoint for non-primitive types
    pub validator: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl SoftType {
    /// Create a new registry entry.
    pub fn new(name: String, repr: String, is_primitive: bool, validator: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            repr,
            is_primitive,
            validator,
            created_at: now,
            modified_at: now,
        }
    }

    /// Validate structural fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()));
        }
        Ok(())
    }

    /// Validate a submitted value against this type.
    ///
    /// The `size` constraint (maximum length in characters) applies to every
    /// type. Primitive types additionally parse-check the value against the
    /// representation named by the type. Non-primitive types defer semantic
    /// validation to their external validator endpoint and pass here.
    ///
    /// # Errors
    ///
    /// - `SizeExceeded` (E-102) when the value is longer than `size`
    /// - `UnknownRepresentation` (E-100) when a primitive type's name is not
    ///   a built-in representation
    /// - `InvalidValue` (E-101) when the value fails the representation check
    ///
    /// # Examples
    ///
    /// ```rust
    /// use onebase_core::models::SoftType;
    ///
    /// let integer = SoftType::new("integer".to_string(), String::new(), true, None);
    /// assert!(integer.validate_value("42", None).is_ok());
    /// assert!(integer.validate_value("forty-two", None).is_err());
    /// assert!(integer.validate_value("1234", Some(3)).is_err());
    /// ```
    pub fn validate_value(&self, value: &str, size: Option<usize>) -> Result<(), ValidationError> {
        if let Some(limit) = size {
            let length = value.chars().count();
            if length > limit {
                return Err(ValidationError::SizeExceeded {
                    size: limit,
                    length,
                });
            }
        }

        if !self.is_primitive {
            // External validator owns semantic checks for non-primitives.
            return Ok(());
        }

        let repr = PrimitiveRepr::parse(&self.name)
            .ok_or_else(|| ValidationError::UnknownRepresentation(self.name.clone()))?;

        let valid = match repr {
            PrimitiveRepr::String | PrimitiveRepr::Text => true,
            PrimitiveRepr::Integer => value.parse::<i64>().is_ok(),
            PrimitiveRepr::Decimal => value.parse::<f64>().is_ok(),
            PrimitiveRepr::Boolean => matches!(value, "true" | "false" | "0" | "1"),
            PrimitiveRepr::DateTime => {
                DateTime::parse_from_rfc3339(value).is_ok()
                    || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
            }
            PrimitiveRepr::Email => email_regex().is_match(value),
            PrimitiveRepr::Url => url_regex().is_match(value),
        };

        if valid {
            Ok(())
        } else {
            Err(ValidationError::InvalidValue {
                repr: repr.label().to_string(),
                value: value.to_string(),
            })
        }
    }
}
