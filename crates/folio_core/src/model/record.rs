//! Shared record identity, kind and validation primitives.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-generated identity of one record.
pub type RecordId = Uuid;

/// The two record collections managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Article,
    Post,
}

impl RecordKind {
    /// Singular label used in log events and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Post => "post",
        }
    }

    /// Collection name, matching the backing table.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Article => "articles",
            Self::Post => "posts",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Input-shape violation detected before any store access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required string field is empty.
    Required(&'static str),
    /// The request payload could not be decoded.
    Malformed(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "{field} is required"),
            Self::Malformed(details) => write!(f, "malformed request: {details}"),
        }
    }
}

impl Error for ValidationError {}

/// Rejects empty strings for a named required field.
pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Parses an opaque id string.
///
/// Returns `Ok(None)` for well-formed input that cannot name any record, so
/// callers can report it the same way as a missing row.
pub fn parse_record_id(value: &str) -> Result<Option<RecordId>, ValidationError> {
    require_non_empty("id", value)?;
    Ok(Uuid::parse_str(value.trim()).ok())
}
