use std::sync::Arc;

use tracing::debug;

use crate::domain::error::Result;
use crate::domain::generation::Attachment;
use crate::domain::transcript::{Transcript, TranscriptDraft};
use crate::infrastructure::backend::BackendApi;
use crate::interfaces::confirm::ConfirmPrompt;

/// Meeting-transcript records: list, create (manual or upload), delete.
/// Transcripts are immutable once created.
pub struct TranscriptUseCase {
    backend: Arc<dyn BackendApi>,
    transcripts: Vec<Transcript>,
}

impl TranscriptUseCase {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            backend,
            transcripts: Vec::new(),
        }
    }

    pub fn transcripts(&self) -> &[Transcript] {
        &self.transcripts
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.transcripts = self.backend.list_transcripts().await?;
        debug!(total = self.transcripts.len(), "Transcripts refreshed");
        Ok(())
    }

    /// Authoritative single-record read.
    pub async fn get(&self, id: &str) -> Result<Transcript> {
        self.backend.get_transcript(id).await
    }

    /// Manual entry. Title and content are required; validation runs before
    /// any request.
    pub async fn create(&mut self, draft: &TranscriptDraft) -> Result<Transcript> {
        draft.validated()?;
        let created = self.backend.create_transcript(draft).await?;
        self.transcripts.insert(0, created.clone());
        Ok(created)
    }

    /// Upload of plain-text transcript files; one record per file.
    pub async fn upload(&mut self, files: &[Attachment]) -> Result<Vec<Transcript>> {
        let created = self.backend.upload_transcripts(files).await?;
        self.transcripts.splice(0..0, created.clone());
        Ok(created)
    }

    /// Confirmation-guarded removal, same discipline as test-case deletion.
    pub async fn delete(&mut self, id: &str, confirm: &dyn ConfirmPrompt) -> Result<bool> {
        if !confirm.confirm("Are you sure you want to delete this transcript?") {
            return Ok(false);
        }
        self.backend.delete_transcript(id).await?;
        self.transcripts.retain(|transcript| transcript.id != id);
        Ok(true)
    }
}
