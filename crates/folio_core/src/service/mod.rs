//! Command handlers for article and post use-cases.
//!
//! # Responsibility
//! - Validate untrusted input before any store access.
//! - Require a session identity for every mutation and stamp ownership.
//! - Normalize repository failures into the `HandlerError` taxonomy.
//!
//! # Invariants
//! - Each handler performs at most one repository call.
//! - `NotFound` never reveals whether a record exists under another owner.
//! - Store failures are logged before they are returned as `Internal`.

use crate::model::record::{RecordKind, ValidationError};
use crate::repo::RepoError;
use crate::session::{Identity, SessionProvider};
use log::error;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod article_service;
pub mod post_service;

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Stable wire name of a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    Unauthenticated,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }
}

/// Outcome of a failed handler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Input failed shape checks; nothing was read or written.
    Validation(ValidationError),
    /// A mutation was attempted without a session identity.
    Unauthenticated,
    /// The record is missing or owned by another identity.
    NotFound { kind: RecordKind, id: String },
    /// The store failed; carries a human-readable message.
    Internal(String),
}

impl HandlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Unauthenticated => write!(f, "user not authenticated"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Internal(message) => write!(f, "{message}"),
        }
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for HandlerError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Delete acknowledgement, serialized as `{ "success": true }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub success: bool,
}

impl Deleted {
    pub(crate) fn ok() -> Self {
        Self { success: true }
    }
}

pub(crate) fn require_identity(
    session: &impl SessionProvider,
    event: &'static str,
) -> HandlerResult<Identity> {
    session.current_identity().ok_or_else(|| {
        error!("event={event} module=service status=error error_code=unauthenticated");
        HandlerError::Unauthenticated
    })
}

/// Maps a repository failure for `verb` on `kind`, logging store faults.
pub(crate) fn map_repo_error(
    err: RepoError,
    event: &'static str,
    kind: RecordKind,
    verb: &'static str,
) -> HandlerError {
    match err {
        RepoError::NotFound { kind, id } => HandlerError::NotFound {
            kind,
            id: id.to_string(),
        },
        RepoError::Validation(err) => HandlerError::Validation(err),
        other => {
            error!(
                "event={event} module=service status=error error_code=store_failed kind={kind} error={other}"
            );
            HandlerError::Internal(format!("failed to {verb} {kind}: {other}"))
        }
    }
}
