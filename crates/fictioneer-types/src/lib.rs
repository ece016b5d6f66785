//! Fictioneer Types - Shared domain types
//!
//! This crate contains domain types used across Fictioneer services:
//! - User and story identity
//! - Story generation settings
//! - Payment and credit-package types

pub mod ids;
pub mod payment;
pub mod settings;

pub use ids::*;
pub use payment::*;
pub use settings::*;
