use std::sync::Arc;

use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::export::{ExportFormat, ExportedFile};
use crate::domain::test_case::{TestCase, TestCaseUpdate};
use crate::infrastructure::backend::BackendApi;
use crate::interfaces::confirm::ConfirmPrompt;

/// The client-held, ordered cache of test-case records. One owned value;
/// every mutation goes through a `&mut` entry point and touches local state
/// only after the backend has confirmed it.
pub struct TestCaseStore {
    backend: Arc<dyn BackendApi>,
    cases: Vec<TestCase>,
}

impl TestCaseStore {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            backend,
            cases: Vec::new(),
        }
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn total(&self) -> usize {
        self.cases.len()
    }

    pub fn selected_count(&self) -> usize {
        self.cases.iter().filter(|case| case.is_selected).count()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.cases
            .iter()
            .filter(|case| case.is_selected)
            .map(|case| case.id.clone())
            .collect()
    }

    /// Export controls are disabled while this is false.
    pub fn can_export(&self) -> bool {
        self.selected_count() > 0
    }

    /// Clear-all is disabled while this is false.
    pub fn can_clear(&self) -> bool {
        !self.cases.is_empty()
    }

    /// Authoritative single-record read, for detail views that must not
    /// trust a possibly stale cache entry.
    pub async fn fetch(&self, id: &str) -> Result<TestCase> {
        self.backend.get_test_case(id).await
    }

    /// Replaces local state wholesale with the backend's sequence. Initial
    /// load and the reconciliation step after bulk selection.
    pub async fn refresh(&mut self) -> Result<()> {
        self.cases = self.backend.list_test_cases().await?;
        debug!(total = self.cases.len(), "Test case store refreshed");
        Ok(())
    }

    /// Newly generated records go to the head of the sequence.
    pub(crate) fn prepend(&mut self, new_cases: Vec<TestCase>) {
        self.cases.splice(0..0, new_cases);
    }

    /// Flips is_selected for exactly one record. Returns the new flag.
    pub async fn toggle_select(&mut self, id: &str) -> Result<bool> {
        let current = self
            .cases
            .iter()
            .find(|case| case.id == id)
            .map(|case| case.is_selected)
            .ok_or_else(|| AppError::NotFound(format!("Test case {}", id)))?;

        let updated = self
            .backend
            .update_test_case(id, &TestCaseUpdate::selection(!current))
            .await?;
        let selected = updated.is_selected;
        self.apply(updated);
        Ok(selected)
    }

    /// Persists an edited field set. Blank steps are stripped before
    /// transmission; the backend's returned record replaces the local one.
    pub async fn edit(&mut self, id: &str, update: TestCaseUpdate) -> Result<TestCase> {
        if !self.cases.iter().any(|case| case.id == id) {
            return Err(AppError::NotFound(format!("Test case {}", id)));
        }
        let updated = self.backend.update_test_case(id, &update.normalized()).await?;
        self.apply(updated.clone());
        Ok(updated)
    }

    /// Confirmation-guarded removal. Returns false (no request issued) when
    /// the prompt is declined. The record leaves local state only after the
    /// backend confirms the delete.
    pub async fn delete(&mut self, id: &str, confirm: &dyn ConfirmPrompt) -> Result<bool> {
        if !confirm.confirm("Are you sure you want to delete this test case?") {
            return Ok(false);
        }
        self.backend.delete_test_case(id).await?;
        self.cases.retain(|case| case.id != id);
        Ok(true)
    }

    /// Confirmation-guarded bulk removal of every record.
    pub async fn clear_all(&mut self, confirm: &dyn ConfirmPrompt) -> Result<bool> {
        if !confirm.confirm(
            "Are you sure you want to delete all test cases? This cannot be undone.",
        ) {
            return Ok(false);
        }
        self.backend.delete_all_test_cases().await?;
        self.cases.clear();
        Ok(true)
    }

    /// Marks every listed record selected, then reconciles wholesale.
    pub async fn bulk_select(&mut self, ids: &[String]) -> Result<()> {
        self.backend.bulk_select_test_cases(ids).await?;
        self.refresh().await
    }

    /// Exports the currently selected subset. The selected identifier list
    /// is transmitted explicitly; zero selected records is a local
    /// validation failure and no request is issued.
    pub async fn export(&self, format: ExportFormat) -> Result<ExportedFile> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return Err(AppError::ValidationError(
                "No test cases selected for export".to_string(),
            ));
        }
        self.backend.export_test_cases(format, &ids).await
    }

    fn apply(&mut self, updated: TestCase) {
        if let Some(slot) = self.cases.iter_mut().find(|case| case.id == updated.id) {
            *slot = updated;
        }
    }
}
