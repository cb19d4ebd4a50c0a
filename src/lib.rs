pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

mod app;

pub use app::AppState;
pub use application::{GenerationUseCase, ProviderUseCase, TestCaseStore, TranscriptUseCase};
pub use domain::error::{AppError, Result};
pub use domain::export::{ExportFormat, ExportedFile};
pub use domain::generation::{AlmContext, AlmSystem, Attachment, GenerationForm};
pub use domain::provider::{AiProvider, AiProviderConfig, AiProviderDraft};
pub use domain::test_case::{Category, Priority, TestCase, TestCaseUpdate};
pub use domain::transcript::{Transcript, TranscriptDraft};
pub use infrastructure::backend::{BackendApi, HttpBackend};
pub use infrastructure::config::Settings;
pub use interfaces::confirm::{AlwaysConfirm, ConfirmPrompt, NeverConfirm};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
}
