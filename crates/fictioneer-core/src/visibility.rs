//! Story visibility policy
//!
//! One decision function for the premium-gated visibility rule, consulted by
//! the orchestrator and by the visibility-toggle endpoint. The gate
//! direction is configurable; exactly one direction is ever active.

use thiserror::Error;

/// Which visibility setting requires premium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PremiumGate {
    /// Making a story public requires premium
    Public,
    /// Making a story private requires premium
    Private,
}

/// Visibility change denied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct VisibilityDenied {
    /// User-facing explanation
    pub reason: &'static str,
}

/// Premium-gated visibility rule
#[derive(Debug, Clone, Copy)]
pub struct VisibilityPolicy {
    gate: PremiumGate,
}

impl VisibilityPolicy {
    /// Create a policy gating the given direction
    pub const fn new(gate: PremiumGate) -> Self {
        Self { gate }
    }

    /// Decide whether a user may give a story the requested visibility
    pub fn check(&self, is_premium: bool, requested_public: bool) -> Result<(), VisibilityDenied> {
        if is_premium {
            return Ok(());
        }
        match (self.gate, requested_public) {
            (PremiumGate::Private, false) => Err(VisibilityDenied {
                reason: "Only premium users can set stories to private",
            }),
            (PremiumGate::Public, true) => Err(VisibilityDenied {
                reason: "Only premium users can create public stories",
            }),
            _ => Ok(()),
        }
    }
}

impl Default for VisibilityPolicy {
    /// Stories are public by default; going private is the premium feature
    fn default() -> Self {
        Self::new(PremiumGate::Private)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_users_pass_both_directions() {
        for gate in [PremiumGate::Public, PremiumGate::Private] {
            let policy = VisibilityPolicy::new(gate);
            assert!(policy.check(true, true).is_ok());
            assert!(policy.check(true, false).is_ok());
        }
    }

    #[test]
    fn private_gate_blocks_free_users_going_private() {
        let policy = VisibilityPolicy::new(PremiumGate::Private);
        assert!(policy.check(false, false).is_err());
        assert!(policy.check(false, true).is_ok());
    }

    #[test]
    fn public_gate_blocks_free_users_going_public() {
        let policy = VisibilityPolicy::new(PremiumGate::Public);
        assert!(policy.check(false, true).is_err());
        assert!(policy.check(false, false).is_ok());
    }

    #[test]
    fn default_gate_is_private() {
        let policy = VisibilityPolicy::default();
        assert!(policy.check(false, false).is_err());
    }
}
