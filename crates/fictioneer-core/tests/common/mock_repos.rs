//! In-memory repositories for testing
//!
//! The mocks mirror the SQL semantics that matter: `debit_credits` is a
//! conditional decrement performed under the map's per-key lock, so
//! concurrent charges see the same single-winner behavior as the database.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use fictioneer_db::{
    CreateStory, CreateUser, DbError, DbResult, StoryRepository, StoryRow, UserRepository, UserRow,
};

/// In-memory user repository
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    fail_refunds: Arc<AtomicBool>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `credit_credits` call fail
    pub fn fail_refunds(&self) {
        self.fail_refunds.store(true, Ordering::SeqCst);
    }

    /// Insert a test user directly
    pub fn insert_user(&self, user: UserRow) {
        self.users.insert(user.id, user);
    }

    /// Build a test user with the given balance and premium flag
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

    /// Current balance, panicking if the user is gone
    pub fn balance(&self, id: Uuid) -> i64 {
        self.users.get(&id).map(|u| u.credits).unwrap()
    }

    /// Current story list, panicking if the user is gone
    pub fn story_ids(&self, id: Uuid) -> Vec<Uuid> {
        self.users.get(&id).map(|u| u.story_ids.clone()).unwrap()
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
        // get_mut holds the shard lock: check-and-decrement is atomic here
        // just as the conditional UPDATE is in Postgres
        match self.users.get_mut(&id) {
            Some(mut user) if user.credits >= amount => {
                user.credits -= amount;
                Ok(Some(user.credits))
            }
            _ => Ok(None),
        }
    }

    async fn credit_credits(&self, id: Uuid, amount: i64) -> DbResult<i64> {
        if self.fail_refunds.load(Ordering::SeqCst) {
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

/// In-memory story repository
#[derive(Default, Clone)]
pub struct MockStoryRepository {
    stories: Arc<DashMap<Uuid, StoryRow>>,
}

impl MockStoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_story(&self, story: StoryRow) {
        self.stories.insert(story.id, story);
    }

    pub fn story_count(&self) -> usize {
        self.stories.len()
    }

    /// Build a story row owned by the given user
    pub fn test_story(user_id: Uuid, content: &str, settings: serde_json::Value) -> StoryRow {
        StoryRow {
            id: Uuid::new_v4(),
            title: "A Test Story".to_string(),
            content: content.to_string(),
            user_id,
            settings,
            is_public: true,
            audio_url: None,
            image_url: None,
            credits_cost: 1,
            likes: 0,
            plays: 0,
            category: "romance".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl StoryRepository for MockStoryRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<StoryRow>> {
        Ok(self.stories.get(&id).map(|r| r.value().clone()))
    }

    async fn create(&self, story: CreateStory) -> DbResult<StoryRow> {
        let row = StoryRow {
            id: story.id,
            title: story.title,
            content: story.content,
            user_id: story.user_id,
            settings: story.settings,
            is_public: story.is_public,
            audio_url: None,
            image_url: None,
            credits_cost: story.credits_cost,
            likes: 0,
            plays: 0,
            category: story.category,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.stories.insert(row.id, row.clone());
        Ok(row)
    }

    async fn append_content(&self, id: Uuid, text: &str) -> DbResult<StoryRow> {
        match self.stories.get_mut(&id) {
            Some(mut story) => {
                story.content.push_str(text);
                Ok(story.clone())
            }
            None => Err(DbError::NotFound),
        }
    }

    async fn update_content(&self, id: Uuid, content: &str) -> DbResult<StoryRow> {
        match self.stories.get_mut(&id) {
            Some(mut story) => {
                story.content = content.to_string();
                Ok(story.clone())
            }
            None => Err(DbError::NotFound),
        }
    }

    async fn set_visibility(&self, id: Uuid, is_public: bool) -> DbResult<()> {
        if let Some(mut story) = self.stories.get_mut(&id) {
            story.is_public = is_public;
        }
        Ok(())
    }

    async fn set_audio_url(&self, id: Uuid, audio_url: &str) -> DbResult<()> {
        if let Some(mut story) = self.stories.get_mut(&id) {
            story.audio_url = Some(audio_url.to_string());
        }
        Ok(())
    }

    async fn increment_plays(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut story) = self.stories.get_mut(&id) {
            story.plays += 1;
        }
        Ok(())
    }

    async fn list_by_user(&self, user_id: Uuid) -> DbResult<Vec<StoryRow>> {
        let mut stories: Vec<StoryRow> = self
            .stories
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(stories)
    }

    async fn list_public(&self, limit: i64) -> DbResult<Vec<StoryRow>> {
        let mut stories: Vec<StoryRow> = self
            .stories
            .iter()
            .filter(|r| r.value().is_public)
            .map(|r| r.value().clone())
            .collect();
        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        stories.truncate(limit as usize);
        Ok(stories)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        self.stories.remove(&id);
        Ok(())
    }
}
