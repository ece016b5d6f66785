//! Shared mocks for billing tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use fictioneer_db::{
    CreateUser, DbError, DbResult, PaymentEventRepository, ProcessedPaymentEvent, UserRepository,
    UserRow,
};

/// In-memory user repository
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    fail_mutations: Arc<AtomicBool>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make entitlement mutations fail
    pub fn fail_mutations(&self) {
        self.fail_mutations.store(true, Ordering::SeqCst);
    }

    pub fn insert_user(&self, user: UserRow) {
        self.users.insert(user.id, user);
    }

    pub fn test_user(credits: i64, is_premium: bool) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: format!("test-{}@example.com", Uuid::new_v4()),
            name: "Test Reader".to_string(),
            credits,
            is_premium,
            story_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn balance(&self, id: Uuid) -> i64 {
        self.users.get(&id).map(|u| u.credits).unwrap()
    }

    pub fn is_premium(&self, id: Uuid) -> bool {
        self.users.get(&id).map(|u| u.is_premium).unwrap()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.value().email == email)
            .map(|r| r.value().clone()))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = UserRow {
            id: user.id,
            email: user.email,
            name: user.name,
            credits: user.credits,
            is_premium: false,
            story_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn debit_credits(&self, id: Uuid, amount: i64) -> DbResult<Option<i64>> {
        match self.users.get_mut(&id) {
            Some(mut user) if user.credits >= amount => {
                user.credits -= amount;
                Ok(Some(user.credits))
            }
            _ => Ok(None),
        }
    }

    async fn credit_credits(&self, id: Uuid, amount: i64) -> DbResult<i64> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(DbError::NotFound);
        }
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.credits += amount;
                Ok(user.credits)
            }
            None => Err(DbError::NotFound),
        }
    }

    async fn set_premium(&self, id: Uuid) -> DbResult<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(DbError::NotFound);
        }
        if let Some(mut user) = self.users.get_mut(&id) {
            user.is_premium = true;
        }
        Ok(())
    }

    async fn attach_story(&self, id: Uuid, story_id: Uuid) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.story_ids.push(story_id);
        }
        Ok(())
    }

    async fn detach_story(&self, id: Uuid, story_id: Uuid) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.story_ids.retain(|s| *s != story_id);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        self.users.remove(&id);
        Ok(())
    }
}

/// In-memory processed-events set with insert-if-absent semantics
#[derive(Default, Clone)]
pub struct MockPaymentEventRepository {
    processed: Arc<DashMap<String, ProcessedPaymentEvent>>,
    failures: Arc<DashMap<String, String>>,
}

impl MockPaymentEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

#[async_trait]
impl PaymentEventRepository for MockPaymentEventRepository {
    async fn mark_processed(&self, event: ProcessedPaymentEvent) -> DbResult<bool> {
        // entry() holds the shard lock, mirroring ON CONFLICT DO NOTHING
        match self.processed.entry(event.event_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(event);
                Ok(true)
            }
        }
    }

    async fn is_processed(&self, event_id: &str) -> DbResult<bool> {
        Ok(self.processed.contains_key(event_id))
    }

    async fn record_failure(&self, event_id: &str, detail: &str) -> DbResult<()> {
        self.failures
            .insert(event_id.to_string(), detail.to_string());
        Ok(())
    }
}
