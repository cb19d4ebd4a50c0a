use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};
use crate::domain::test_case::Category;

/// MIME types the generation endpoint accepts as context files.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = [
    "text/plain",
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let content_type = content_type.into();
        if !ACCEPTED_MIME_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Unsupported file type: {} (supported: .txt, .pdf, .docx)",
                content_type
            )));
        }
        Ok(Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                AppError::ValidationError(format!("Invalid file name: {}", path.display()))
            })?
            .to_string();
        let content_type = mime_for_extension(&file_name)?;
        let bytes = std::fs::read(path)?;
        Self::new(file_name, content_type, bytes)
    }
}

fn mime_for_extension(file_name: &str) -> Result<&'static str> {
    let extension = file_name.rsplit('.').next().unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "txt" => Ok("text/plain"),
        "pdf" => Ok("application/pdf"),
        "docx" => {
            Ok("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        _ => Err(AppError::ValidationError(format!(
            "Unsupported file type: {} (supported: .txt, .pdf, .docx)",
            file_name
        ))),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlmSystem {
    Jira,
    Azure,
}

impl AlmSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlmSystem::Jira => "jira",
            AlmSystem::Azure => "azure",
        }
    }
}

/// External work-item context attached to one submission.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AlmContext {
    pub system: AlmSystem,
    pub item_ids: Vec<String>,
}

/// Transient state of the generation request builder. Lives for the
/// duration of one submission: reset on success, preserved on failure so
/// the user can retry.
#[derive(Debug, Clone)]
pub struct GenerationForm {
    pub prompt: String,
    pub requirements: String,
    pub test_type: Category,
    pub num_test_cases: u8,
    attachments: Vec<Attachment>,
    transcript_ids: Vec<String>,
    alm: Option<AlmContext>,
}

impl Default for GenerationForm {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            requirements: String::new(),
            test_type: Category::Functional,
            num_test_cases: 5,
            attachments: Vec::new(),
            transcript_ids: Vec::new(),
            alm: None,
        }
    }
}

impl GenerationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn remove_attachment(&mut self, index: usize) {
        if index < self.attachments.len() {
            self.attachments.remove(index);
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn select_transcript(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.transcript_ids.contains(&id) {
            self.transcript_ids.push(id);
        }
    }

    pub fn deselect_transcript(&mut self, id: &str) {
        self.transcript_ids.retain(|existing| existing != id);
    }

    pub fn transcript_ids(&self) -> &[String] {
        &self.transcript_ids
    }

    pub fn set_alm(&mut self, alm: Option<AlmContext>) {
        self.alm = alm;
    }

    pub fn alm(&self) -> Option<&AlmContext> {
        self.alm.as_ref()
    }

    /// Local gate: a blank prompt or an out-of-range count never reaches
    /// the network.
    pub fn validated(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Please enter a description for test case generation".to_string(),
            ));
        }
        if self.num_test_cases < 1 || self.num_test_cases > 20 {
            return Err(AppError::ValidationError(
                "Number of test cases must be between 1 and 20".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Serializes the whole submission, binary attachments included, as one
    /// multipart payload.
    pub fn to_multipart(&self) -> Result<Form> {
        let transcript_ids = serde_json::to_string(&self.transcript_ids)
            .map_err(|e| AppError::ParseError(format!("Failed to encode transcript ids: {}", e)))?;
        let alm_items = match &self.alm {
            Some(alm) => serde_json::to_string(&alm.item_ids)
                .map_err(|e| AppError::ParseError(format!("Failed to encode ALM items: {}", e)))?,
            None => "[]".to_string(),
        };

        let mut form = Form::new()
            .text("prompt", self.prompt.clone())
            .text("requirements", self.requirements.clone())
            .text("test_type", self.test_type.as_str())
            .text("num_test_cases", self.num_test_cases.to_string())
            .text("selected_transcripts", transcript_ids)
            .text(
                "selected_alm",
                self.alm
                    .as_ref()
                    .map(|alm| alm.system.as_str())
                    .unwrap_or_default(),
            )
            .text("selected_alm_items", alm_items);

        for attachment in &self.attachments {
            let part = Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(&attachment.content_type)
                .map_err(|e| {
                    AppError::Internal(format!("Invalid attachment content type: {}", e))
                })?;
            form = form.part("files", part);
        }

        Ok(form)
    }
}
