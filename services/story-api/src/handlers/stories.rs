//! Story handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use fictioneer_db::StoryRow;
use fictioneer_types::{StoryId, StorySettings};

use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub title: String,
    pub settings: StorySettings,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoryRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct TitleSuggestionsRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub user_id: String,
    pub settings: serde_json::Value,
    pub is_public: bool,
    pub audio_url: Option<String>,
    pub credits_cost: i64,
    pub likes: i64,
    pub plays: i64,
    pub category: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<StoryRow> for StoryResponse {
    fn from(row: StoryRow) -> Self {
        Self {
            id: row.id.to_string(),
            title: row.title,
            content: row.content,
            user_id: row.user_id.to_string(),
            settings: row.settings,
            is_public: row.is_public,
            audio_url: row.audio_url,
            credits_cost: row.credits_cost,
            likes: row.likes,
            plays: row.plays,
            category: row.category,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResponse {
    pub audio_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub credits: i64,
    pub is_premium: bool,
    pub story_count: usize,
}

fn parse_story_id(id: &str) -> ApiResult<StoryId> {
    StoryId::parse(id).map_err(|_| ApiError::BadRequest("Invalid story id".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/stories/generate
pub async fn create_story(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateStoryRequest>,
) -> ApiResult<(StatusCode, Json<StoryResponse>)> {
    let start = Instant::now();

    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let story = state
        .stories
        .create_story(user_id, &req.title, req.settings, req.is_public)
        .await?;

    metrics::counter!("stories_generated_total").increment(1);
    metrics::histogram!("story_operation_duration_seconds", "operation" => "create")
        .record(start.elapsed().as_secs_f64());

    tracing::info!(user_id = %user_id, story_id = %story.id, "Story generated");

    Ok((StatusCode::CREATED, Json(story.into())))
}

/// POST /api/v1/stories/{id}/continue
pub async fn continue_story(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StoryResponse>> {
    let start = Instant::now();

    let story_id = parse_story_id(&id)?;
    let story = state.stories.continue_story(story_id).await?;

    metrics::counter!("stories_continued_total").increment(1);
    metrics::histogram!("story_operation_duration_seconds", "operation" => "continue")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(story.into()))
}

/// GET /api/v1/stories/{id}
pub async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StoryResponse>> {
    let story_id = parse_story_id(&id)?;
    let story = state.stories.get_story(story_id).await?;
    Ok(Json(story.into()))
}

/// GET /api/v1/stories/{id}/audio
pub async fn get_story_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AudioResponse>> {
    let story_id = parse_story_id(&id)?;
    let audio_url = state.stories.story_audio(story_id).await?;
    Ok(Json(AudioResponse { audio_url }))
}

/// POST /api/v1/stories/{id}/narrate
pub async fn narrate_story(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<AudioResponse>> {
    let start = Instant::now();

    let story_id = parse_story_id(&id)?;
    let audio_url = state.stories.narrate_story(user_id, story_id).await?;

    metrics::counter!("stories_narrated_total").increment(1);
    metrics::histogram!("story_operation_duration_seconds", "operation" => "narrate")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(AudioResponse {
        audio_url: Some(audio_url),
    }))
}

/// PUT /api/v1/stories/{id}
pub async fn update_story(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStoryRequest>,
) -> ApiResult<Json<StoryResponse>> {
    let story_id = parse_story_id(&id)?;
    let story = state
        .stories
        .update_content(user_id, story_id, &req.content)
        .await?;
    Ok(Json(story.into()))
}

/// PATCH /api/v1/stories/{id}/visibility
pub async fn set_story_visibility(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<VisibilityRequest>,
) -> ApiResult<Json<StoryResponse>> {
    let story_id = parse_story_id(&id)?;
    let story = state
        .stories
        .set_visibility(user_id, story_id, req.is_public)
        .await?;
    Ok(Json(story.into()))
}

/// DELETE /api/v1/stories/{id}
pub async fn delete_story(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let story_id = parse_story_id(&id)?;
    state.stories.delete_story(user_id, story_id).await?;
    Ok(Json(
        serde_json::json!({ "message": "Story deleted successfully" }),
    ))
}

/// GET /api/v1/stories/public
pub async fn list_public_stories(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StoryResponse>>> {
    let stories = state
        .stories
        .list_public_stories(state.config.public_feed_limit)
        .await?;
    Ok(Json(stories.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/users/me/stories
pub async fn list_my_stories(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<StoryResponse>>> {
    let stories = state.stories.list_user_stories(user_id).await?;
    Ok(Json(stories.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<MeResponse>> {
    let user = state.stories.get_user(user_id).await?;
    Ok(Json(MeResponse {
        id: user.id.to_string(),
        email: user.email,
        name: user.name,
        credits: user.credits,
        is_premium: user.is_premium,
        story_count: user.story_ids.len(),
    }))
}

/// POST /api/v1/stories/title-suggestions
pub async fn title_suggestions(
    State(state): State<AppState>,
    Json(req): Json<TitleSuggestionsRequest>,
) -> ApiResult<Json<Vec<String>>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    }
    let titles = state.stories.title_suggestions(&req.content).await?;
    Ok(Json(titles))
}
