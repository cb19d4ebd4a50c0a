use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error};

use crate::application::use_cases::test_case_store::TestCaseStore;
use crate::domain::error::{AppError, Result};
use crate::domain::generation::GenerationForm;
use crate::infrastructure::backend::BackendApi;

/// Submits one generation request at a time. The in-flight flag is scoped
/// to this control: store operations stay available while a generation
/// call is outstanding.
pub struct GenerationUseCase {
    backend: Arc<dyn BackendApi>,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl GenerationUseCase {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            backend,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn try_begin(&self) -> Result<InFlightGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::ValidationError(
                "A generation request is already in progress".to_string(),
            ));
        }
        Ok(InFlightGuard {
            flag: &self.in_flight,
        })
    }

    /// Validates locally, issues the multipart request, and on success
    /// prepends the returned records and resets the form. On failure the
    /// form keeps its fields so the user can retry.
    pub async fn submit(
        &self,
        form: &mut GenerationForm,
        store: &mut TestCaseStore,
    ) -> Result<usize> {
        form.validated()?;
        let _guard = self.try_begin()?;

        debug!(
            test_type = form.test_type.as_str(),
            num = form.num_test_cases,
            attachments = form.attachments().len(),
            "Submitting generation request"
        );

        let cases = match self.backend.generate_test_cases(form).await {
            Ok(cases) => cases,
            Err(err) => {
                error!(error = %err, "Generation failed");
                return Err(err);
            }
        };

        let count = cases.len();
        store.prepend(cases);
        form.reset();
        Ok(count)
    }
}
