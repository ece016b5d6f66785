//! Core errors

use thiserror::Error;

use fictioneer_db::DbError;
use fictioneer_gen::GenError;
use fictioneer_types::SettingsError;

use crate::ledger::LedgerError;
use crate::visibility::VisibilityDenied;

/// Errors from the story orchestration core
#[derive(Error, Debug)]
pub enum CoreError {
    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// Story not found
    #[error("story not found")]
    StoryNotFound,

    /// Caller does not own the story
    #[error("caller does not own this story")]
    NotOwner,

    /// Free-tier story cap reached
    #[error("free users can only create {limit} stories")]
    StoryLimitReached {
        /// The cap that was hit
        limit: usize,
    },

    /// Balance below the operation cost; nothing was charged
    #[error("insufficient credits")]
    InsufficientCredits,

    /// Premium-gated visibility change denied
    #[error("{0}")]
    VisibilityDenied(#[from] VisibilityDenied),

    /// Settings failed boundary validation
    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    /// External generation failed; any charge was refunded
    #[error("generation failed: {0}")]
    Generation(#[source] GenError),

    /// Database error
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether this error means no state was mutated
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound
                | Self::StoryNotFound
                | Self::NotOwner
                | Self::StoryLimitReached { .. }
                | Self::InsufficientCredits
                | Self::VisibilityDenied(_)
                | Self::InvalidSettings(_)
        )
    }
}

impl From<LedgerError<GenError>> for CoreError {
    fn from(err: LedgerError<GenError>) -> Self {
        match err {
            LedgerError::InsufficientCredits => Self::InsufficientCredits,
            LedgerError::UserNotFound => Self::UserNotFound,
            LedgerError::Action(cause) => Self::Generation(cause),
            LedgerError::Persistence(db) => Self::Db(db),
        }
    }
}
