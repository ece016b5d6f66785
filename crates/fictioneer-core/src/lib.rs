//! Fictioneer Core - Credit-gated story generation
//!
//! The heart of the platform: the credit ledger that makes every metered
//! operation fully-charged-and-applied or fully-refunded-and-unapplied, the
//! orchestrator composing policy checks with the external generator, and the
//! single authority for premium-gated visibility.
//!
//! # Example
//!
//! ```rust,ignore
//! use fictioneer_core::{PlanLimits, StoryService, VisibilityPolicy};
//!
//! let service = StoryService::new(users, stories, generator, tts, PlanLimits::default());
//!
//! let story = service
//!     .create_story(user_id, "The Locket", settings, None)
//!     .await?;
//! ```

pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod visibility;

pub use error::CoreError;
pub use ledger::{CreditLedger, LedgerError};
pub use orchestrator::{PlanLimits, StoryService};
pub use visibility::{PremiumGate, VisibilityDenied, VisibilityPolicy};
