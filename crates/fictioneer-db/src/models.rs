//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// Consumable credit balance. Never negative; every debit goes through
    /// a conditional decrement, never a read-modify-write.
    pub credits: i64,
    pub is_premium: bool,
    /// Owned stories in creation order
    pub story_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Story row from the database
#[derive(Debug, Clone, FromRow)]
pub struct StoryRow {
    pub id: Uuid,
    pub title: String,
    /// Accumulated narrative text; continuations only ever append
    pub content: String,
    pub user_id: Uuid,
    /// Generation settings as stored (JSONB)
    pub settings: serde_json::Value,
    pub is_public: bool,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    /// Credits charged when the story was generated
    pub credits_cost: i64,
    pub likes: i64,
    pub plays: i64,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Processed payment event row
#[derive(Debug, Clone, FromRow)]
pub struct ProcessedPaymentEventRow {
    /// Processor-assigned session/event id
    pub event_id: String,
    pub user_id: Uuid,
    pub kind: String,
    pub credits_granted: i64,
    pub processed_at: DateTime<Utc>,
}

/// Reconciliation failure row
///
/// Payment succeeded but the entitlement mutation did not; rows here are the
/// queue a human works through.
#[derive(Debug, Clone, FromRow)]
pub struct ReconciliationFailureRow {
    pub id: Uuid,
    pub event_id: String,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}
