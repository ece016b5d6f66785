//! Application state for the Story API service.

use std::sync::Arc;

use fictioneer_billing::{EntitlementReconciler, StripeProvider, WebhookHandler};
use fictioneer_core::StoryService;
use fictioneer_db::pg::{PgPaymentEventRepository, PgStoryRepository, PgUserRepository};
use fictioneer_db::{DbPool, Repositories};
use fictioneer_gen::{ElevenLabsSynthesizer, OpenAiGenerator};

use crate::config::Config;

/// Concrete story service wired to Postgres and the HTTP collaborators
pub type Service =
    StoryService<PgUserRepository, PgStoryRepository, OpenAiGenerator, ElevenLabsSynthesizer>;

/// Concrete reconciler
pub type Reconciler = EntitlementReconciler<PgUserRepository, PgPaymentEventRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Story orchestration (generation, continuation, visibility)
    pub stories: Arc<Service>,
    /// Payment event reconciliation
    pub reconciler: Arc<Reconciler>,
    /// Payment provider (checkout sessions, verification)
    pub provider: Arc<StripeProvider>,
    /// Webhook signature verification and parsing
    pub webhooks: WebhookHandler,
    /// Database repositories (for direct access if needed)
    pub repos: Repositories,
    /// Database pool (for readiness checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        stories: Service,
        reconciler: Reconciler,
        provider: StripeProvider,
        webhooks: WebhookHandler,
        repos: Repositories,
        pool: DbPool,
        config: Config,
    ) -> Self {
        Self {
            stories: Arc::new(stories),
            reconciler: Arc::new(reconciler),
            provider: Arc::new(provider),
            webhooks,
            repos,
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
