//! Fictioneer Story API
//!
//! HTTP service for credit-gated story generation and entitlement
//! reconciliation.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/stories/generate` - Generate a story (1 credit)
//! - `POST /api/v1/stories/{id}/continue` - Continue a story (1 credit)
//! - `GET /api/v1/stories/{id}` - Fetch a story
//! - `PUT /api/v1/stories/{id}` - Edit story content
//! - `DELETE /api/v1/stories/{id}` - Delete a story
//! - `PATCH /api/v1/stories/{id}/visibility` - Toggle visibility
//! - `GET /api/v1/stories/{id}/audio` - Narration audio URL
//! - `POST /api/v1/stories/{id}/narrate` - Render narration audio
//! - `POST /api/v1/stories/title-suggestions` - Title suggestions
//! - `GET /api/v1/stories/public` - Community feed
//! - `GET /api/v1/users/me` - Entitlement snapshot
//! - `GET /api/v1/users/me/stories` - Own stories
//! - `POST /api/v1/payments/checkout` - Create checkout session
//! - `GET /api/v1/payments/success` - Verified payment redirect
//! - `POST /webhooks/stripe` - Stripe webhook handler
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use fictioneer_billing::{EntitlementReconciler, StripeProvider, WebhookHandler};
use fictioneer_core::{PlanLimits, StoryService};
use fictioneer_db::Repositories;
use fictioneer_gen::{ElevenLabsSynthesizer, OpenAiGenerator};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("story_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fictioneer Story API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool = fictioneer_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Create repositories
    let repos = Repositories::new(pool.clone());

    // External collaborators
    let generator = OpenAiGenerator::new(config.generation.clone());
    let synthesizer = ElevenLabsSynthesizer::new(config.generation.clone());
    let provider = StripeProvider::new(config.billing.clone());
    let webhooks = WebhookHandler::new(&config.billing.stripe_webhook_secret);

    // Core services
    let stories = StoryService::new(
        Arc::new(repos.users.clone()),
        Arc::new(repos.stories.clone()),
        Arc::new(generator),
        Arc::new(synthesizer),
        PlanLimits::default(),
    );
    let reconciler = EntitlementReconciler::new(
        Arc::new(repos.users.clone()),
        Arc::new(repos.payment_events.clone()),
    );

    // Create application state
    let state = AppState::new(
        stories, reconciler, provider, webhooks, repos, pool, config,
    );

    // Build HTTP router and serve
    let app = build_router(state.clone(), metrics_handle);
    let http_addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));

    run_http_server(app, http_addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API v1 routes
    let api_v1 = Router::new()
        // Story routes
        .route("/stories/generate", post(handlers::create_story))
        .route("/stories/public", get(handlers::list_public_stories))
        .route(
            "/stories/title-suggestions",
            post(handlers::title_suggestions),
        )
        .route("/stories/{id}/continue", post(handlers::continue_story))
        .route("/stories/{id}/audio", get(handlers::get_story_audio))
        .route("/stories/{id}/narrate", post(handlers::narrate_story))
        .route(
            "/stories/{id}/visibility",
            patch(handlers::set_story_visibility),
        )
        .route(
            "/stories/{id}",
            get(handlers::get_story)
                .put(handlers::update_story)
                .delete(handlers::delete_story),
        )
        // User routes
        .route("/users/me", get(handlers::get_me))
        .route("/users/me/stories", get(handlers::list_my_stories))
        // Payment routes
        .route("/payments/checkout", post(handlers::create_checkout))
        .route("/payments/success", get(handlers::payment_success));

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes = Router::new().route("/webhooks/stripe", post(handlers::stripe_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler). Generous enough
        // for a generation call plus the refund path.
        .layer(TimeoutLayer::new(request_timeout));

    // Combine all routes
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Story operations are dominated by the external generation call, so the
    // buckets stretch well past typical API latencies
    let story_latency_buckets = &[0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];
    let payment_latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("story_operation_duration_seconds".to_string()),
            story_latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("payment_operation_duration_seconds".to_string()),
            payment_latency_buckets,
        )?;

    let handle = builder.install_recorder()?;

    // Register metrics with descriptions
    metrics::describe_counter!("stories_generated_total", "Total stories generated");
    metrics::describe_counter!("stories_continued_total", "Total story continuations");
    metrics::describe_counter!("stories_narrated_total", "Total narration renders");
    metrics::describe_counter!(
        "payment_checkouts_created_total",
        "Total checkout sessions created"
    );
    metrics::describe_counter!(
        "payment_webhooks_processed_total",
        "Total webhooks processed by status"
    );
    metrics::describe_counter!(
        "payment_events_applied_total",
        "Total payment events applied by delivery path"
    );
    metrics::describe_histogram!(
        "story_operation_duration_seconds",
        "Story operation latency in seconds by operation type"
    );
    metrics::describe_histogram!(
        "payment_operation_duration_seconds",
        "Payment operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
