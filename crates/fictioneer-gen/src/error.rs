//! Generation errors

use thiserror::Error;

/// Failures of the external generation/synthesis collaborators
#[derive(Error, Debug)]
pub enum GenError {
    /// The call exceeded its deadline
    #[error("generation timed out after {0}s")]
    Timeout(u64),

    /// Upstream quota exhausted (429)
    #[error("upstream quota exhausted")]
    Quota,

    /// Upstream rejected our credentials (401/403)
    #[error("upstream authentication failed")]
    Auth,

    /// Transient upstream or transport failure
    #[error("transient upstream error: {0}")]
    Transient(String),

    /// Upstream answered but the payload was unusable
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl GenError {
    /// Whether retrying the same request could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transient(_))
    }
}
