//! Article record and its write payloads.

use crate::model::record::{require_non_empty, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Persisted article row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: RecordId,
    pub title: String,
    pub body: String,
    /// Identity id of the creating session. Used as the mutation predicate.
    pub author_id: String,
    /// Unix epoch milliseconds, stamped by the store.
    pub created_at: i64,
    /// Unix epoch milliseconds. `None` until the first edit.
    pub updated_at: Option<i64>,
}

/// Create payload. The owner is never accepted from input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
}

impl NewArticle {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Requires non-empty `title` and `body`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)?;
        require_non_empty("body", &self.body)
    }
}

/// Partial update payload. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ArticlePatch {
    /// Present fields must be non-empty; an empty patch is allowed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = self.title.as_deref() {
            require_non_empty("title", title)?;
        }
        if let Some(body) = self.body.as_deref() {
            require_non_empty("body", body)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{ArticlePatch, NewArticle};
    use crate::model::record::ValidationError;

    #[test]
    fn new_article_requires_title_then_body() {
        assert_eq!(
            NewArticle::new("", "").validate(),
            Err(ValidationError::Required("title"))
        );
        assert_eq!(
            NewArticle::new("t", "").validate(),
            Err(ValidationError::Required("body"))
        );
        assert!(NewArticle::new("t", "b").validate().is_ok());
    }

    #[test]
    fn patch_validates_only_present_fields() {
        assert!(ArticlePatch::default().validate().is_ok());
        assert!(ArticlePatch::default().is_empty());

        let patch = ArticlePatch {
            title: None,
            body: Some(String::new()),
        };
        assert_eq!(patch.validate(), Err(ValidationError::Required("body")));
    }

    #[test]
    fn patch_deserializes_missing_fields_as_none() {
        let patch: ArticlePatch = serde_json::from_str(r#"{"title":"X"}"#).unwrap();
        assert_eq!(patch.title.as_deref(), Some("X"));
        assert_eq!(patch.body, None);
    }
}
