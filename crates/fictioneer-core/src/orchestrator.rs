//! Generation orchestrator
//!
//! Implements "create story" and "continue story" as composed,
//! policy-checked, credit-metered operations, plus the surrounding story
//! lifecycle (edits, visibility, narration, deletion).

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use fictioneer_db::{
    CreateStory, StoryRepository, StoryRow, UserRepository, UserRow,
};
use fictioneer_gen::{SpeechSynthesizer, StoryGenerator};
use fictioneer_types::{StoryId, StorySettings, UserId};

use crate::error::CoreError;
use crate::ledger::CreditLedger;
use crate::visibility::VisibilityPolicy;

/// Separator inserted between a story and each continuation
const CONTINUATION_SEPARATOR: &str = "\n\n";

/// Plan limits and costs
#[derive(Debug, Clone, Copy)]
pub struct PlanLimits {
    /// Maximum stories a non-premium user may own
    pub free_story_limit: usize,
    /// Credits charged per generation call. Applies to every user: premium
    /// relaxes the story cap and the visibility gate, not the credit meter.
    pub generation_cost: i64,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            free_story_limit: 3,
            generation_cost: 1,
        }
    }
}

/// Story orchestration service
pub struct StoryService<U, S, G, T> {
    users: Arc<U>,
    stories: Arc<S>,
    generator: Arc<G>,
    synthesizer: Arc<T>,
    ledger: CreditLedger<U>,
    visibility: VisibilityPolicy,
    limits: PlanLimits,
}

impl<U, S, G, T> StoryService<U, S, G, T>
where
    U: UserRepository,
    S: StoryRepository,
    G: StoryGenerator,
    T: SpeechSynthesizer,
{
    /// Create a new story service
    pub fn new(
        users: Arc<U>,
        stories: Arc<S>,
        generator: Arc<G>,
        synthesizer: Arc<T>,
        limits: PlanLimits,
    ) -> Self {
        let ledger = CreditLedger::new(users.clone());
        Self {
            users,
            stories,
            generator,
            synthesizer,
            ledger,
            visibility: VisibilityPolicy::default(),
            limits,
        }
    }

    /// Override the visibility policy
    pub fn with_visibility(mut self, visibility: VisibilityPolicy) -> Self {
        self.visibility = visibility;
        self
    }

    /// Create a story: plan checks, charge, generate, persist.
    ///
    /// `requested_public` defaults to public when omitted.
    #[instrument(skip(self, settings), fields(user_id = %user_id))]
    pub async fn create_story(
        &self,
        user_id: UserId,
        title: &str,
        settings: StorySettings,
        requested_public: Option<bool>,
    ) -> Result<StoryRow, CoreError> {
        settings.validate()?;

        let user = self
            .users
            .find_by_id(user_id.0)
            .await?
            .ok_or(CoreError::UserNotFound)?;

        // Plan limit, not a resource cost: checked before any debit
        if !user.is_premium && user.story_ids.len() >= self.limits.free_story_limit {
            return Err(CoreError::StoryLimitReached {
                limit: self.limits.free_story_limit,
            });
        }

        let is_public = requested_public.unwrap_or(true);
        self.visibility.check(user.is_premium, is_public)?;

        let generated = self
            .ledger
            .charge_and_run(user_id, self.limits.generation_cost, || {
                self.generator.generate(title, &settings)
            })
            .await?;

        let settings_json = serde_json::to_value(&settings)
            .map_err(|e| CoreError::Internal(format!("settings serialization: {e}")))?;

        let story = self
            .stories
            .create(CreateStory {
                id: StoryId::new().0,
                title: if title.is_empty() {
                    generated.title
                } else {
                    title.to_string()
                },
                content: generated.content,
                user_id: user_id.0,
                settings: settings_json,
                is_public,
                credits_cost: self.limits.generation_cost,
                category: "romance".to_string(),
            })
            .await?;

        // A crash or failure between the story insert and this attach leaves
        // an orphaned story not counted toward the cap. Accepted residual;
        // never hidden.
        if let Err(e) = self.users.attach_story(user_id.0, story.id).await {
            error!(
                user_id = %user_id,
                story_id = %story.id,
                error = %e,
                "Story persisted but could not be attached to its owner"
            );
            return Err(e.into());
        }

        info!(story_id = %story.id, "Story created");
        Ok(story)
    }

    /// Continue a story: charge its owner, append the continuation
    #[instrument(skip(self), fields(story_id = %story_id))]
    pub async fn continue_story(&self, story_id: StoryId) -> Result<StoryRow, CoreError> {
        let story = self
            .stories
            .find_by_id(story_id.0)
            .await?
            .ok_or(CoreError::StoryNotFound)?;

        let owner = self
            .users
            .find_by_id(story.user_id)
            .await?
            .ok_or(CoreError::UserNotFound)?;

        let settings: StorySettings = serde_json::from_value(story.settings.clone())
            .map_err(|e| CoreError::Internal(format!("stored settings corrupted: {e}")))?;

        debug!(existing_chars = story.content.len(), "Continuing story");

        let continuation = self
            .ledger
            .charge_and_run(UserId(owner.id), self.limits.generation_cost, || {
                self.generator.continue_story(&story.content, &settings)
            })
            .await?;

        let appended = self
            .stories
            .append_content(
                story.id,
                &format!("{CONTINUATION_SEPARATOR}{continuation}"),
            )
            .await?;

        info!(
            added_chars = continuation.len(),
            total_chars = appended.content.len(),
            "Continuation appended"
        );
        Ok(appended)
    }

    /// Fetch a story
    pub async fn get_story(&self, story_id: StoryId) -> Result<StoryRow, CoreError> {
        self.stories
            .find_by_id(story_id.0)
            .await?
            .ok_or(CoreError::StoryNotFound)
    }

    /// Narration audio URL for a story, if one has been rendered.
    ///
    /// Counts a play when audio exists.
    pub async fn story_audio(&self, story_id: StoryId) -> Result<Option<String>, CoreError> {
        let story = self.get_story(story_id).await?;
        if story.audio_url.is_some() {
            self.stories.increment_plays(story.id).await?;
        }
        Ok(story.audio_url)
    }

    /// Render narration audio for a story and persist its URL
    #[instrument(skip(self), fields(story_id = %story_id, caller = %caller))]
    pub async fn narrate_story(
        &self,
        caller: UserId,
        story_id: StoryId,
    ) -> Result<String, CoreError> {
        let story = self.owned_story(caller, story_id).await?;

        let voice = serde_json::from_value::<StorySettings>(story.settings.clone())
            .map(|s| s.narration_voice)
            .unwrap_or_else(|_| "Soft Female".to_string());

        let audio = self
            .synthesizer
            .synthesize(&story.content, &voice)
            .await
            .map_err(CoreError::Generation)?;

        self.stories
            .set_audio_url(story.id, &audio.audio_url)
            .await?;

        info!(audio_url = %audio.audio_url, "Narration rendered");
        Ok(audio.audio_url)
    }

    /// Owner edit of story content
    pub async fn update_content(
        &self,
        caller: UserId,
        story_id: StoryId,
        content: &str,
    ) -> Result<StoryRow, CoreError> {
        let story = self.owned_story(caller, story_id).await?;
        Ok(self.stories.update_content(story.id, content).await?)
    }

    /// Change story visibility, subject to the premium gate
    #[instrument(skip(self), fields(story_id = %story_id, caller = %caller, is_public))]
    pub async fn set_visibility(
        &self,
        caller: UserId,
        story_id: StoryId,
        is_public: bool,
    ) -> Result<StoryRow, CoreError> {
        let story = self.owned_story(caller, story_id).await?;

        let user = self
            .users
            .find_by_id(caller.0)
            .await?
            .ok_or(CoreError::UserNotFound)?;
        self.visibility.check(user.is_premium, is_public)?;

        self.stories.set_visibility(story.id, is_public).await?;
        self.get_story(story_id).await
    }

    /// Delete a story and detach it from its owner
    #[instrument(skip(self), fields(story_id = %story_id, caller = %caller))]
    pub async fn delete_story(&self, caller: UserId, story_id: StoryId) -> Result<(), CoreError> {
        let story = self.owned_story(caller, story_id).await?;

        self.stories.delete(story.id).await?;
        self.users.detach_story(caller.0, story.id).await?;

        info!("Story deleted");
        Ok(())
    }

    /// All stories owned by a user, newest first
    pub async fn list_user_stories(&self, user_id: UserId) -> Result<Vec<StoryRow>, CoreError> {
        Ok(self.stories.list_by_user(user_id.0).await?)
    }

    /// Public stories for the community feed
    pub async fn list_public_stories(&self, limit: i64) -> Result<Vec<StoryRow>, CoreError> {
        Ok(self.stories.list_public(limit).await?)
    }

    /// Title suggestions for draft content
    pub async fn title_suggestions(&self, content: &str) -> Result<Vec<String>, CoreError> {
        self.generator
            .title_suggestions(content)
            .await
            .map_err(CoreError::Generation)
    }

    /// Current entitlement snapshot for a user
    pub async fn get_user(&self, user_id: UserId) -> Result<UserRow, CoreError> {
        self.users
            .find_by_id(user_id.0)
            .await?
            .ok_or(CoreError::UserNotFound)
    }

    /// Load a story and verify the caller owns it
    async fn owned_story(&self, caller: UserId, story_id: StoryId) -> Result<StoryRow, CoreError> {
        let story = self
            .stories
            .find_by_id(story_id.0)
            .await?
            .ok_or(CoreError::StoryNotFound)?;
        if story.user_id != caller.0 {
            return Err(CoreError::NotOwner);
        }
        Ok(story)
    }
}

impl<U, S, G, T> std::fmt::Debug for StoryService<U, S, G, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryService")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
