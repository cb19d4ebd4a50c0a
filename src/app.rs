use std::sync::Arc;

use crate::application::{GenerationUseCase, ProviderUseCase, TestCaseStore, TranscriptUseCase};
use crate::domain::error::Result;
use crate::domain::provider::AiProviderConfig;
use crate::infrastructure::backend::{BackendApi, HttpBackend};
use crate::infrastructure::config::Settings;

/// Top-level application state: one owned store plus the use cases every
/// screen works through. Screens hold a reference to this, never a copy.
pub struct AppState {
    pub store: TestCaseStore,
    pub generation: GenerationUseCase,
    pub providers: ProviderUseCase,
    pub transcripts: TranscriptUseCase,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Self> {
        let backend: Arc<dyn BackendApi> = Arc::new(HttpBackend::new(settings)?);
        Ok(Self::with_backend(backend))
    }

    pub fn with_backend(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            store: TestCaseStore::new(backend.clone()),
            generation: GenerationUseCase::new(backend.clone()),
            providers: ProviderUseCase::new(backend.clone()),
            transcripts: TranscriptUseCase::new(backend),
        }
    }

    /// Initial load as the shell comes up: the collection, the transcript
    /// list, and the active provider for the header.
    pub async fn init(&mut self) -> Result<Option<AiProviderConfig>> {
        self.store.refresh().await?;
        self.transcripts.refresh().await?;
        self.providers.active().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::domain::error::AppError;
    use crate::domain::export::ExportFormat;
    use crate::domain::generation::{AlmContext, AlmSystem, Attachment, GenerationForm};
    use crate::domain::provider::{AiProvider, AiProviderDraft};
    use crate::domain::test_case::{Category, TestCaseUpdate};
    use crate::domain::transcript::TranscriptDraft;
    use crate::interfaces::confirm::AlwaysConfirm;
    use crate::interfaces::stub_server::{self, StubServer};

    async fn start_app() -> (AppState, StubServer) {
        let server = stub_server::start(0).await.expect("stub backend starts");
        let settings = Settings::new(server.base_url.clone());
        let app = AppState::new(&settings).expect("app state builds");
        (app, server)
    }

    fn filled_form(prompt: &str) -> GenerationForm {
        let mut form = GenerationForm::new();
        form.prompt = prompt.to_string();
        form
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_generation_scenario_sends_exact_fields_and_prepends() {
        let (mut app, server) = start_app().await;
        assert!(app.init().await.unwrap().is_none());
        assert_eq!(app.store.total(), 0);

        let mut form = filled_form("Login flow");
        form.test_type = Category::Security;
        form.num_test_cases = 3;

        let count = app
            .generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(app.store.total(), 3);

        let received = server.last_generation().expect("one request was issued");
        assert_eq!(received.prompt, "Login flow");
        assert_eq!(received.test_type, "Security");
        assert_eq!(received.num_test_cases, 3);
        assert!(received.file_names.is_empty());
        assert!(received.selected_transcripts.is_empty());
        assert_eq!(received.selected_alm, "");

        // Transient form resets to its initial state.
        assert!(form.prompt.is_empty());
        assert_eq!(form.test_type, Category::Functional);
        assert_eq!(form.num_test_cases, 5);

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_successive_generations_go_to_the_head() {
        let (mut app, server) = start_app().await;

        let mut form = filled_form("First feature");
        form.num_test_cases = 2;
        app.generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();

        let mut form = filled_form("Second feature");
        form.num_test_cases = 1;
        app.generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();

        assert_eq!(app.store.total(), 3);
        assert!(app.store.cases()[0].title.contains("Second feature"));
        assert!(app.store.cases()[2].title.contains("First feature"));

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_toggle_twice_returns_to_original_selection() {
        let (mut app, server) = start_app().await;
        let mut form = filled_form("Checkout");
        form.num_test_cases = 1;
        app.generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();
        let id = app.store.cases()[0].id.clone();

        assert!(app.store.toggle_select(&id).await.unwrap());
        app.store.refresh().await.unwrap();
        assert!(app.store.cases()[0].is_selected);

        assert!(!app.store.toggle_select(&id).await.unwrap());
        app.store.refresh().await.unwrap();
        assert!(!app.store.cases()[0].is_selected);

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_edit_persists_no_blank_steps() {
        let (mut app, server) = start_app().await;
        let mut form = filled_form("Password reset");
        form.num_test_cases = 1;
        app.generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();
        let id = app.store.cases()[0].id.clone();

        let update = TestCaseUpdate {
            title: Some("Reset via email".to_string()),
            steps: Some(vec![
                "Request a reset link".to_string(),
                "".to_string(),
                "   ".to_string(),
                "Open the link".to_string(),
            ]),
            ..TestCaseUpdate::default()
        };
        let updated = app.store.edit(&id, update).await.unwrap();
        assert_eq!(updated.title, "Reset via email");
        assert_eq!(
            updated.steps,
            vec!["Request a reset link".to_string(), "Open the link".to_string()]
        );

        // The backend holds the same record after reconciliation.
        app.store.refresh().await.unwrap();
        assert_eq!(app.store.cases()[0].steps.len(), 2);
        let fetched = app.store.fetch(&id).await.unwrap();
        assert_eq!(fetched.title, "Reset via email");

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_and_clear_all_with_confirmation() {
        let (mut app, server) = start_app().await;
        let mut form = filled_form("Search");
        form.num_test_cases = 2;
        app.generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();
        let id = app.store.cases()[0].id.clone();

        assert!(app.store.delete(&id, &AlwaysConfirm).await.unwrap());
        assert_eq!(app.store.total(), 1);
        app.store.refresh().await.unwrap();
        assert_eq!(app.store.total(), 1);

        assert!(app.store.clear_all(&AlwaysConfirm).await.unwrap());
        assert_eq!(app.store.total(), 0);
        app.store.refresh().await.unwrap();
        assert_eq!(app.store.total(), 0);

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_delete_leaves_the_record_in_place() {
        let (mut app, server) = start_app().await;
        let mut form = filled_form("Notifications");
        form.num_test_cases = 1;
        app.generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();
        let id = app.store.cases()[0].id.clone();

        server.state.fail_deletes.store(true, Ordering::SeqCst);
        let result = app.store.delete(&id, &AlwaysConfirm).await;
        assert!(matches!(result, Err(AppError::BackendError(_))));
        assert_eq!(app.store.total(), 1);

        server.state.fail_deletes.store(false, Ordering::SeqCst);
        assert!(app.store.delete(&id, &AlwaysConfirm).await.unwrap());
        assert_eq!(app.store.total(), 0);

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_export_carries_exactly_the_selected_ids() {
        let (mut app, server) = start_app().await;
        let mut form = filled_form("Profile");
        form.num_test_cases = 3;
        app.generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();

        let first = app.store.cases()[0].id.clone();
        let third = app.store.cases()[2].id.clone();
        app.store.toggle_select(&first).await.unwrap();
        app.store.toggle_select(&third).await.unwrap();
        assert!(app.store.can_export());

        let exported = app.store.export(ExportFormat::Json).await.unwrap();
        assert_eq!(exported.file_name, "test_cases.json");
        let records: Vec<serde_json::Value> = serde_json::from_slice(&exported.bytes).unwrap();
        assert_eq!(records.len(), 2);

        let sent = server.last_export_ids().expect("ids were transmitted");
        assert_eq!(sent, vec![first, third]);

        let exported = app.store.export(ExportFormat::Excel).await.unwrap();
        assert_eq!(exported.file_name, "test_cases.xlsx");
        assert!(!exported.bytes.is_empty());
        assert!(exported.content_type.contains("spreadsheetml"));

        let saved = exported.save_to(std::env::temp_dir()).unwrap();
        assert_eq!(std::fs::read(&saved).unwrap(), exported.bytes);
        std::fs::remove_file(saved).ok();

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_generation_failure_preserves_the_form_for_retry() {
        let (mut app, server) = start_app().await;
        server.state.fail_generation.store(true, Ordering::SeqCst);

        let mut form = filled_form("Billing");
        let result = app.generation.submit(&mut form, &mut app.store).await;
        assert!(matches!(result, Err(AppError::BackendError(_))));
        assert_eq!(form.prompt, "Billing");
        assert_eq!(app.store.total(), 0);
        assert!(!app.generation.is_busy());

        server.state.fail_generation.store(false, Ordering::SeqCst);
        let count = app
            .generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();
        assert_eq!(count, 5);
        assert!(form.prompt.is_empty());

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_provider_save_then_active_roundtrip() {
        let (app, server) = start_app().await;
        assert!(app.providers.active().await.unwrap().is_none());

        let draft = AiProviderDraft::new(AiProvider::Anthropic, "sk-ant-test");
        let saved = app.providers.save(&draft).await.unwrap();
        assert!(saved.is_active);
        assert_eq!(saved.model, "claude-3-opus-20240229");

        let active = app.providers.active().await.unwrap().unwrap();
        assert_eq!(active.id, saved.id);
        assert_eq!(app.providers.list().await.unwrap().len(), 1);

        // A second save replaces the active configuration.
        let draft = AiProviderDraft::new(AiProvider::OpenAi, "sk-test");
        let replacement = app.providers.save(&draft).await.unwrap();
        let active = app.providers.active().await.unwrap().unwrap();
        assert_eq!(active.id, replacement.id);
        assert_eq!(app.providers.list().await.unwrap().len(), 2);

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_transcript_lifecycle() {
        let (mut app, server) = start_app().await;

        let draft = TranscriptDraft::new("Sprint planning", "We agreed to ship the login flow.");
        let created = app.transcripts.create(&draft).await.unwrap();
        assert_eq!(app.transcripts.transcripts().len(), 1);

        let upload = Attachment::new(
            "standup.txt",
            "text/plain",
            b"Daily standup notes".to_vec(),
        )
        .unwrap();
        let uploaded = app.transcripts.upload(&[upload]).await.unwrap();
        assert_eq!(uploaded.len(), 1);
        assert_eq!(uploaded[0].title, "standup");
        assert_eq!(app.transcripts.transcripts().len(), 2);

        // Uploads are restricted to plain text before any request.
        let pdf = Attachment::new("notes.pdf", "application/pdf", vec![1]).unwrap();
        assert!(matches!(
            app.transcripts.upload(&[pdf]).await,
            Err(AppError::ValidationError(_))
        ));

        let fetched = app.transcripts.get(&created.id).await.unwrap();
        assert_eq!(fetched.title, "Sprint planning");

        assert!(app
            .transcripts
            .delete(&created.id, &AlwaysConfirm)
            .await
            .unwrap());
        app.transcripts.refresh().await.unwrap();
        assert_eq!(app.transcripts.transcripts().len(), 1);

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_generation_carries_attachments_and_context() {
        let (mut app, server) = start_app().await;

        let draft = TranscriptDraft::new("Kickoff", "Scope discussion");
        let transcript = app.transcripts.create(&draft).await.unwrap();

        let mut form = filled_form("Payments");
        form.attach(
            Attachment::new("requirements.txt", "text/plain", b"must be idempotent".to_vec())
                .unwrap(),
        );
        form.select_transcript(transcript.id.clone());
        form.set_alm(Some(AlmContext {
            system: AlmSystem::Jira,
            item_ids: vec!["PAY-12".to_string(), "PAY-13".to_string()],
        }));

        app.generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();

        let received = server.last_generation().unwrap();
        assert_eq!(received.file_names, vec!["requirements.txt".to_string()]);
        assert_eq!(received.selected_transcripts, vec![transcript.id]);
        assert_eq!(received.selected_alm, "jira");
        assert_eq!(
            received.selected_alm_items,
            vec!["PAY-12".to_string(), "PAY-13".to_string()]
        );

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bulk_select_reconciles_via_refresh() {
        let (mut app, server) = start_app().await;
        let mut form = filled_form("Inventory");
        form.num_test_cases = 3;
        app.generation
            .submit(&mut form, &mut app.store)
            .await
            .unwrap();

        let ids: Vec<String> = app
            .store
            .cases()
            .iter()
            .take(2)
            .map(|case| case.id.clone())
            .collect();
        app.store.bulk_select(&ids).await.unwrap();
        assert_eq!(app.store.selected_count(), 2);

        server.stop().await;
    }
}
