pub mod use_cases;

pub use use_cases::generation::GenerationUseCase;
pub use use_cases::providers::ProviderUseCase;
pub use use_cases::test_case_store::TestCaseStore;
pub use use_cases::transcripts::TranscriptUseCase;
