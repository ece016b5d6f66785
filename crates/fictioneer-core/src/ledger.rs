//! Credit ledger guard
//!
//! Wraps any "costs N credits" action so it is either fully charged and
//! applied, or fully refunded and unapplied, despite the wrapped action
//! being a slow, fallible external call.
//!
//! The debit happens *before* the action runs, as an atomic conditional
//! decrement. Debit-first keeps a burst of concurrent requests from all
//! observing a stale sufficient balance; the conditional decrement makes
//! over-spend impossible rather than merely unlikely.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use fictioneer_db::{DbError, UserRepository};
use fictioneer_types::UserId;

/// Errors from a charged operation
#[derive(Error, Debug)]
pub enum LedgerError<E>
where
    E: std::error::Error + 'static,
{
    /// Balance below cost; nothing was mutated
    #[error("insufficient credits")]
    InsufficientCredits,

    /// The charged user does not exist; nothing was mutated
    #[error("user not found")]
    UserNotFound,

    /// The wrapped action failed. The debit has been refunded.
    #[error("charged action failed (credits refunded)")]
    Action(#[source] E),

    /// A ledger write failed. When this wraps a refund failure the debit
    /// stands without its action having succeeded; there is no compensating
    /// mechanism, so the caller must not swallow it.
    #[error("ledger persistence failed")]
    Persistence(#[source] DbError),
}

/// Guard that meters fallible actions against a user's credit balance
#[derive(Clone)]
pub struct CreditLedger<U> {
    users: Arc<U>,
}

impl<U: UserRepository> CreditLedger<U> {
    /// Create a new ledger over a user repository
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    /// Charge `cost` credits, run `action`, refund on failure.
    ///
    /// On success the debit stands and the action's result is returned. On
    /// action failure the cost is credited back before the failure is
    /// resurfaced, so callers always observe the pre-call balance.
    #[instrument(skip(self, action), fields(user_id = %user_id, cost))]
    pub async fn charge_and_run<T, E, F, Fut>(
        &self,
        user_id: UserId,
        cost: i64,
        action: F,
    ) -> Result<T, LedgerError<E>>
    where
        E: std::error::Error + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        debug_assert!(cost > 0, "charge cost must be positive");

        let remaining = match self.users.debit_credits(user_id.0, cost).await {
            Ok(Some(remaining)) => remaining,
            Ok(None) => {
                // The conditional decrement matched no row: either the user
                // is missing or the balance was short. Distinguish for the
                // caller; neither case mutated anything.
                return match self.users.find_by_id(user_id.0).await {
                    Ok(Some(_)) => Err(LedgerError::InsufficientCredits),
                    Ok(None) => Err(LedgerError::UserNotFound),
                    Err(e) => Err(LedgerError::Persistence(e)),
                };
            }
            Err(e) => return Err(LedgerError::Persistence(e)),
        };

        debug!(remaining, "Credits debited");

        match action().await {
            Ok(result) => Ok(result),
            Err(cause) => {
                warn!(error = %cause, "Charged action failed, refunding");
                match self.users.credit_credits(user_id.0, cost).await {
                    Ok(balance) => {
                        debug!(balance, "Credits refunded");
                        Err(LedgerError::Action(cause))
                    }
                    Err(e) => {
                        // The user has paid for nothing and we cannot give
                        // the credits back. Manual intervention territory.
                        error!(
                            user_id = %user_id,
                            cost,
                            refund_error = %e,
                            action_error = %cause,
                            "REFUND FAILED: user charged for a failed action"
                        );
                        Err(LedgerError::Persistence(e))
                    }
                }
            }
        }
    }
}

impl<U> std::fmt::Debug for CreditLedger<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditLedger").finish()
    }
}
