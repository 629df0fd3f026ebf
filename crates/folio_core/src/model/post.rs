//! Post record and its create payload.
//!
//! Posts have no update path; they are created, read and deleted.

use crate::model::record::{require_non_empty, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Persisted post row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: RecordId,
    pub title: String,
    pub body: String,
    /// Identity id of the creating session.
    pub user_id: String,
    /// Unix epoch milliseconds, stamped by the store.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub body: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)?;
        require_non_empty("body", &self.body)
    }
}
