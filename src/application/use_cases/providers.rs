use std::sync::Arc;

use tracing::debug;

use crate::domain::error::Result;
use crate::domain::provider::{AiProviderConfig, AiProviderDraft};
use crate::infrastructure::backend::BackendApi;

/// Provider credentials lifecycle: save replaces the active configuration
/// wholesale; there is no partial update.
pub struct ProviderUseCase {
    backend: Arc<dyn BackendApi>,
}

impl ProviderUseCase {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self { backend }
    }

    /// The active configuration, or None when the backend has never been
    /// configured (not-found is not an error).
    pub async fn active(&self) -> Result<Option<AiProviderConfig>> {
        self.backend.active_provider().await
    }

    pub async fn list(&self) -> Result<Vec<AiProviderConfig>> {
        self.backend.list_providers().await
    }

    /// Validates the draft locally (api key, model allow-list, parameter
    /// ranges) before anything is sent.
    pub async fn save(&self, draft: &AiProviderDraft) -> Result<AiProviderConfig> {
        draft.validated()?;
        let saved = self.backend.save_provider(draft).await?;
        debug!(model = %saved.model, "Provider configuration saved");
        Ok(saved)
    }
}
