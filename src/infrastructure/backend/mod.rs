use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::export::{ExportFormat, ExportedFile};
use crate::domain::generation::{Attachment, GenerationForm};
use crate::domain::provider::{AiProviderConfig, AiProviderDraft};
use crate::domain::test_case::{TestCase, TestCaseUpdate};
use crate::domain::transcript::{Transcript, TranscriptDraft};
use crate::infrastructure::config::Settings;

/// The REST surface the application consumes, behind a trait so use cases
/// can be exercised against a double.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn list_test_cases(&self) -> Result<Vec<TestCase>>;
    async fn get_test_case(&self, id: &str) -> Result<TestCase>;
    async fn update_test_case(&self, id: &str, update: &TestCaseUpdate) -> Result<TestCase>;
    async fn delete_test_case(&self, id: &str) -> Result<()>;
    async fn delete_all_test_cases(&self) -> Result<()>;
    async fn bulk_select_test_cases(&self, ids: &[String]) -> Result<()>;
    async fn export_test_cases(&self, format: ExportFormat, ids: &[String])
        -> Result<ExportedFile>;
    async fn generate_test_cases(&self, form: &GenerationForm) -> Result<Vec<TestCase>>;
    async fn active_provider(&self) -> Result<Option<AiProviderConfig>>;
    async fn list_providers(&self) -> Result<Vec<AiProviderConfig>>;
    async fn save_provider(&self, draft: &AiProviderDraft) -> Result<AiProviderConfig>;
    async fn list_transcripts(&self) -> Result<Vec<Transcript>>;
    async fn get_transcript(&self, id: &str) -> Result<Transcript>;
    async fn create_transcript(&self, draft: &TranscriptDraft) -> Result<Transcript>;
    async fn upload_transcripts(&self, files: &[Attachment]) -> Result<Vec<Transcript>>;
    async fn delete_transcript(&self, id: &str) -> Result<()>;
    async fn health(&self) -> Result<()>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct UploadTranscriptsResponse {
    transcripts: Vec<Transcript>,
}

impl HttpBackend {
    pub fn new(settings: &Settings) -> Result<Self> {
        let origin = settings.origin()?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Ok(Self {
            client,
            base_url: origin.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn check(&self, response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("{}: {}", action, text)));
        }
        Err(AppError::BackendError(format!(
            "{} failed ({}): {}",
            action, status, text
        )))
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn list_test_cases(&self) -> Result<Vec<TestCase>> {
        let url = self.api_url("test-cases");
        debug!(url = %url, "Fetching test cases");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Load test cases")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse test cases: {}", e)))
    }

    async fn get_test_case(&self, id: &str) -> Result<TestCase> {
        let url = self.api_url(&format!("test-cases/{}", id));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Load test case")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse test case: {}", e)))
    }

    async fn update_test_case(&self, id: &str, update: &TestCaseUpdate) -> Result<TestCase> {
        let url = self.api_url(&format!("test-cases/{}", id));
        let response = self
            .client
            .put(&url)
            .json(update)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Update test case")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse updated test case: {}", e)))
    }

    async fn delete_test_case(&self, id: &str) -> Result<()> {
        let url = self.api_url(&format!("test-cases/{}", id));
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Delete test case").await?;
        Ok(())
    }

    async fn delete_all_test_cases(&self) -> Result<()> {
        let url = self.api_url("test-cases");
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Clear test cases").await?;
        Ok(())
    }

    async fn bulk_select_test_cases(&self, ids: &[String]) -> Result<()> {
        let url = self.api_url("test-cases/bulk-select");
        let response = self
            .client
            .post(&url)
            .json(&ids)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Bulk select test cases").await?;
        Ok(())
    }

    async fn export_test_cases(
        &self,
        format: ExportFormat,
        ids: &[String],
    ) -> Result<ExportedFile> {
        let url = self.api_url(&format!("export/{}", format.path_segment()));
        debug!(url = %url, count = ids.len(), "Exporting test cases");
        let response = self
            .client
            .get(&url)
            .query(&[("ids", ids.join(","))])
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        let response = self.check(response, "Export test cases").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::NetworkError(format!("Failed to read export payload: {}", e)))?;
        Ok(ExportedFile {
            file_name: format.file_name().to_string(),
            content_type: format.content_type().to_string(),
            bytes: bytes.to_vec(),
        })
    }

    async fn generate_test_cases(&self, form: &GenerationForm) -> Result<Vec<TestCase>> {
        let url = self.api_url("generate-test-cases");
        debug!(url = %url, num = form.num_test_cases, "Submitting generation request");
        let response = self
            .client
            .post(&url)
            .multipart(form.to_multipart()?)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Generate test cases")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse generated test cases: {}", e)))
    }

    async fn active_provider(&self) -> Result<Option<AiProviderConfig>> {
        let url = self.api_url("ai-providers/active");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.check(response, "Load active provider")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse provider config: {}", e)))
    }

    async fn list_providers(&self) -> Result<Vec<AiProviderConfig>> {
        let url = self.api_url("ai-providers");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Load providers")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse provider configs: {}", e)))
    }

    async fn save_provider(&self, draft: &AiProviderDraft) -> Result<AiProviderConfig> {
        let url = self.api_url("ai-providers");
        let response = self
            .client
            .post(&url)
            .json(draft)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Save provider configuration")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse provider config: {}", e)))
    }

    async fn list_transcripts(&self) -> Result<Vec<Transcript>> {
        let url = self.api_url("transcripts");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Load transcripts")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse transcripts: {}", e)))
    }

    async fn get_transcript(&self, id: &str) -> Result<Transcript> {
        let url = self.api_url(&format!("transcripts/{}", id));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Load transcript")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse transcript: {}", e)))
    }

    async fn create_transcript(&self, draft: &TranscriptDraft) -> Result<Transcript> {
        let url = self.api_url("transcripts");
        let response = self
            .client
            .post(&url)
            .json(draft)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Create transcript")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse transcript: {}", e)))
    }

    async fn upload_transcripts(&self, files: &[Attachment]) -> Result<Vec<Transcript>> {
        let url = self.api_url("transcripts/upload");
        let mut form = reqwest::multipart::Form::new();
        for file in files {
            if file.content_type != "text/plain" {
                return Err(AppError::ValidationError(format!(
                    "Transcript uploads accept plain-text files only, got {}",
                    file.content_type
                )));
            }
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| AppError::Internal(format!("Invalid content type: {}", e)))?;
            form = form.part("files", part);
        }
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        let parsed: UploadTranscriptsResponse = self
            .check(response, "Upload transcripts")
            .await?
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse transcripts: {}", e)))?;
        Ok(parsed.transcripts)
    }

    async fn delete_transcript(&self, id: &str) -> Result<()> {
        let url = self.api_url(&format!("transcripts/{}", id));
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Delete transcript").await?;
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        let url = self.api_url("health");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Request failed: {}", e)))?;
        self.check(response, "Health check").await?;
        Ok(())
    }
}

/// Backend double for use-case tests: reads succeed with empty data,
/// writes fail with a backend error.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub struct NullBackend;

    #[async_trait]
    impl BackendApi for NullBackend {
        async fn list_test_cases(&self) -> Result<Vec<TestCase>> {
            Ok(Vec::new())
        }
        async fn get_test_case(&self, id: &str) -> Result<TestCase> {
            Err(AppError::NotFound(id.to_string()))
        }
        async fn update_test_case(&self, id: &str, _: &TestCaseUpdate) -> Result<TestCase> {
            Err(AppError::NotFound(id.to_string()))
        }
        async fn delete_test_case(&self, _: &str) -> Result<()> {
            Err(AppError::BackendError("unavailable".to_string()))
        }
        async fn delete_all_test_cases(&self) -> Result<()> {
            Err(AppError::BackendError("unavailable".to_string()))
        }
        async fn bulk_select_test_cases(&self, _: &[String]) -> Result<()> {
            Err(AppError::BackendError("unavailable".to_string()))
        }
        async fn export_test_cases(
            &self,
            _: ExportFormat,
            _: &[String],
        ) -> Result<ExportedFile> {
            Err(AppError::BackendError("unavailable".to_string()))
        }
        async fn generate_test_cases(&self, _: &GenerationForm) -> Result<Vec<TestCase>> {
            Err(AppError::BackendError("unavailable".to_string()))
        }
        async fn active_provider(&self) -> Result<Option<AiProviderConfig>> {
            Ok(None)
        }
        async fn list_providers(&self) -> Result<Vec<AiProviderConfig>> {
            Ok(Vec::new())
        }
        async fn save_provider(&self, _: &AiProviderDraft) -> Result<AiProviderConfig> {
            Err(AppError::BackendError("unavailable".to_string()))
        }
        async fn list_transcripts(&self) -> Result<Vec<Transcript>> {
            Ok(Vec::new())
        }
        async fn get_transcript(&self, id: &str) -> Result<Transcript> {
            Err(AppError::NotFound(id.to_string()))
        }
        async fn create_transcript(&self, _: &TranscriptDraft) -> Result<Transcript> {
            Err(AppError::BackendError("unavailable".to_string()))
        }
        async fn upload_transcripts(&self, _: &[Attachment]) -> Result<Vec<Transcript>> {
            Err(AppError::BackendError("unavailable".to_string()))
        }
        async fn delete_transcript(&self, _: &str) -> Result<()> {
            Err(AppError::BackendError("unavailable".to_string()))
        }
        async fn health(&self) -> Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::stub_server;

    #[test]
    fn test_api_url_joins_base_and_prefix() {
        let backend = HttpBackend::new(&Settings::new("http://localhost:8001/")).unwrap();
        assert_eq!(
            backend.api_url("test-cases"),
            "http://localhost:8001/api/test-cases"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_status_mapping_against_the_stub() {
        let server = stub_server::start(0).await.unwrap();
        let backend = HttpBackend::new(&Settings::new(server.base_url.clone())).unwrap();

        backend.health().await.unwrap();
        assert!(backend.active_provider().await.unwrap().is_none());
        assert!(matches!(
            backend.get_test_case("missing").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            backend.get_transcript("missing").await,
            Err(AppError::NotFound(_))
        ));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_unreachable_origin_is_a_network_error() {
        // Port 9 is the discard service; nothing listens there.
        let mut settings = Settings::new("http://127.0.0.1:9");
        settings.request_timeout_secs = 2;
        let backend = HttpBackend::new(&settings).unwrap();
        assert!(matches!(
            backend.list_test_cases().await,
            Err(AppError::NetworkError(_))
        ));
    }
}
