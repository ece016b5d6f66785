//! Entitlement reconciler
//!
//! Translates a payment-success signal into exactly one entitlement
//! mutation, despite the signal being deliverable many times (webhook
//! retries, success-page reloads, back-navigation). The processed-events
//! set is checked-and-marked atomically before any mutation.
//!
//! Payment success and entitlement-application success are distinct events:
//! when the money has moved but the mutation fails, the gap is persisted to
//! the reconciliation-failure queue and logged, never dropped.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use fictioneer_db::{PaymentEventRepository, ProcessedPaymentEvent, UserRepository, UserRow};
use fictioneer_types::{PaymentKind, UserId};

use crate::error::BillingError;

/// A verified payment-success signal, from either delivery path
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    /// Idempotency key: the processor's checkout session id
    pub event_id: String,
    /// What the payment grants
    pub kind: PaymentKind,
    /// Credits granted (zero for premium upgrades)
    pub credits_granted: i64,
    /// Target user embedded in session metadata
    pub metadata_user_id: Option<UserId>,
}

/// Outcome of applying a payment event
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// User whose entitlements were (or already had been) updated
    pub user_id: UserId,
    /// Entitlement kind applied
    pub kind: PaymentKind,
    /// Credits added by THIS application (zero on duplicates)
    pub credits_added: i64,
    /// Balance after application
    pub credits_balance: i64,
    /// Premium flag after application
    pub is_premium: bool,
    /// Whether the event had already been applied
    pub duplicate: bool,
}

/// Applies payment events to user entitlements exactly once
pub struct EntitlementReconciler<U, P> {
    users: Arc<U>,
    events: Arc<P>,
}

impl<U, P> EntitlementReconciler<U, P>
where
    U: UserRepository,
    P: PaymentEventRepository,
{
    /// Create a new reconciler
    pub fn new(users: Arc<U>, events: Arc<P>) -> Self {
        Self { users, events }
    }

    /// Apply a payment event.
    ///
    /// `session_user` is the authenticated user on the redirect path; it
    /// takes precedence over the id embedded in event metadata.
    #[instrument(skip(self), fields(event_id = %event.event_id, kind = %event.kind))]
    pub async fn apply(
        &self,
        event: PaymentEvent,
        session_user: Option<UserId>,
    ) -> Result<Reconciled, BillingError> {
        let target = session_user
            .or(event.metadata_user_id)
            .ok_or(BillingError::UserNotResolvable)?;

        let fresh = self
            .events
            .mark_processed(ProcessedPaymentEvent {
                event_id: event.event_id.clone(),
                user_id: target.0,
                kind: event.kind.to_string(),
                credits_granted: event.credits_granted,
            })
            .await?;

        if !fresh {
            // Already applied; report current state as a no-op success
            info!(user_id = %target, "Duplicate payment event, skipping mutation");
            let user = self.load_user(target).await?;
            return Ok(Reconciled {
                user_id: target,
                kind: event.kind,
                credits_added: 0,
                credits_balance: user.credits,
                is_premium: user.is_premium,
                duplicate: true,
            });
        }

        match self.mutate(target, &event).await {
            Ok(user) => {
                info!(
                    user_id = %target,
                    credits_balance = user.credits,
                    is_premium = user.is_premium,
                    "Entitlement applied"
                );
                Ok(Reconciled {
                    user_id: target,
                    kind: event.kind,
                    credits_added: event.credits_granted,
                    credits_balance: user.credits,
                    is_premium: user.is_premium,
                    duplicate: false,
                })
            }
            Err(e) => {
                // The payment succeeded; the entitlement did not land. Queue
                // for manual reconciliation before surfacing.
                error!(
                    event_id = %event.event_id,
                    user_id = %target,
                    error = %e,
                    "Payment succeeded but entitlement application failed"
                );
                let detail = format!("user {target}, kind {}: {e}", event.kind);
                if let Err(rec) = self.events.record_failure(&event.event_id, &detail).await {
                    error!(
                        event_id = %event.event_id,
                        error = %rec,
                        "Could not record reconciliation failure"
                    );
                }
                Err(e)
            }
        }
    }

    /// Perform the entitlement mutation for an event
    async fn mutate(&self, target: UserId, event: &PaymentEvent) -> Result<UserRow, BillingError> {
        match event.kind {
            PaymentKind::PremiumSubscription => {
                self.users.set_premium(target.0).await?;
                self.load_user(target).await
            }
            PaymentKind::CreditPackage => {
                if event.credits_granted <= 0 {
                    warn!(event_id = %event.event_id, "Credit package grants no credits");
                }
                if event.credits_granted > 0 {
                    self.users
                        .credit_credits(target.0, event.credits_granted)
                        .await?;
                }
                self.load_user(target).await
            }
        }
    }

    async fn load_user(&self, target: UserId) -> Result<UserRow, BillingError> {
        self.users
            .find_by_id(target.0)
            .await?
            .ok_or(BillingError::UserNotFound)
    }
}

impl<U, P> std::fmt::Debug for EntitlementReconciler<U, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementReconciler").finish()
    }
}
