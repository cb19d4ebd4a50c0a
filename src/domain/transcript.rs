use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};

/// A stored meeting record usable as generation context. Immutable once
/// created; there is no update operation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Transcript {
    pub id: String,
    pub title: String,
    pub content: String,
    pub meeting_date: Option<NaiveDate>,
    pub participants: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct TranscriptDraft {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<String>,
}

impl TranscriptDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            meeting_date: None,
            participants: None,
        }
    }

    pub fn validated(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Transcript title and content are required".to_string(),
            ));
        }
        self.validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))
    }
}

/// Title for a transcript created from an uploaded file: the file name
/// minus its extension.
pub fn title_from_file_name(file_name: &str) -> String {
    file_name
        .strip_suffix(".txt")
        .unwrap_or(file_name)
        .to_string()
}
