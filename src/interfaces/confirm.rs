/// Seam for interactive confirmation of destructive actions. The embedding
/// front end decides how to ask; a declined confirmation means no request
/// is issued.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Headless front ends (scripts, the stub binary) that want destructive
/// actions to proceed unprompted.
pub struct AlwaysConfirm;

impl ConfirmPrompt for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Declines everything. Useful for dry runs and for proving that declined
/// actions never reach the backend.
pub struct NeverConfirm;

impl ConfirmPrompt for NeverConfirm {
    fn confirm(&self, _message: &str) -> bool {
        false
    }
}
