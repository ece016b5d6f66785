//! Repository traits
//!
//! Define async repository interfaces for database operations. Each write
//! is atomic per row; callers must not assume any cross-row transaction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Create a new user
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Atomically debit credits if the balance is sufficient.
    ///
    /// Returns the new balance, or `None` when the balance was below
    /// `amount` (or the user does not exist) — in which case nothing was
    /// mutated. This is the conditional decrement that keeps `credits >= 0`
    /// under concurrent charges.
    async fn debit_credits(&self, id: Uuid, amount: i64) -> DbResult<Option<i64>>;

    /// Atomically add credits; returns the new balance
    async fn credit_credits(&self, id: Uuid, amount: i64) -> DbResult<i64>;

    /// Grant the premium flag. Monotonic: this path never unsets it.
    async fn set_premium(&self, id: Uuid) -> DbResult<()>;

    /// Append a story to the user's ownership list
    async fn attach_story(&self, id: Uuid, story_id: Uuid) -> DbResult<()>;

    /// Remove a story from the user's ownership list
    async fn detach_story(&self, id: Uuid, story_id: Uuid) -> DbResult<()>;

    /// Delete a user
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// Starting balance; new signups get 10
    pub credits: i64,
}

/// Story repository trait
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Find a story by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<StoryRow>>;

    /// Create a new story
    async fn create(&self, story: CreateStory) -> DbResult<StoryRow>;

    /// Atomically append text to the story content.
    ///
    /// The concatenation happens in the database, so concurrent appends can
    /// interleave but never shrink or reorder existing content.
    async fn append_content(&self, id: Uuid, text: &str) -> DbResult<StoryRow>;

    /// Replace the story content (owner edit)
    async fn update_content(&self, id: Uuid, content: &str) -> DbResult<StoryRow>;

    /// Update visibility
    async fn set_visibility(&self, id: Uuid, is_public: bool) -> DbResult<()>;

    /// Store the narration audio URL
    async fn set_audio_url(&self, id: Uuid, audio_url: &str) -> DbResult<()>;

    /// Increment the play counter
    async fn increment_plays(&self, id: Uuid) -> DbResult<()>;

    /// All stories owned by a user, newest first
    async fn list_by_user(&self, user_id: Uuid) -> DbResult<Vec<StoryRow>>;

    /// Public stories, newest first
    async fn list_public(&self, limit: i64) -> DbResult<Vec<StoryRow>>;

    /// Delete a story
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create story input
#[derive(Debug, Clone)]
pub struct CreateStory {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub user_id: Uuid,
    pub settings: serde_json::Value,
    pub is_public: bool,
    pub credits_cost: i64,
    pub category: String,
}

/// Payment event repository trait
///
/// Tracks which processor events have already been applied so that
/// at-least-once delivery produces exactly-once entitlement mutations.
#[async_trait]
pub trait PaymentEventRepository: Send + Sync {
    /// Atomically record an event as processed.
    ///
    /// Returns `false` when the event id was already present — the caller
    /// must then skip the entitlement mutation.
    async fn mark_processed(&self, event: ProcessedPaymentEvent) -> DbResult<bool>;

    /// Whether an event id has been applied
    async fn is_processed(&self, event_id: &str) -> DbResult<bool>;

    /// Record a payment whose entitlement mutation failed, for manual
    /// reconciliation
    async fn record_failure(&self, event_id: &str, detail: &str) -> DbResult<()>;
}

/// Processed payment event input
#[derive(Debug, Clone)]
pub struct ProcessedPaymentEvent {
    pub event_id: String,
    pub user_id: Uuid,
    pub kind: String,
    pub credits_granted: i64,
}
