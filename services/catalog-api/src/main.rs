//! Reelgate Catalog API
//!
//! Subscription catalog and streaming access service.
//!
//! ## REST Endpoints
//!
//! - `GET /api/v1/plans` - List active plans
//! - `GET /api/v1/plans/{id}` - Get plan
//! - `POST /api/v1/plans` - Create plan (admin)
//! - `PUT /api/v1/plans/{id}` - Update plan (admin)
//! - `DELETE /api/v1/plans/{id}` - Delete plan (admin)
//! - `POST /api/v1/subscriptions/subscribe` - Subscribe to a plan
//! - `GET /api/v1/subscriptions/status` - Current subscription
//! - `GET /api/v1/subscriptions/history` - Subscription history
//! - `PUT /api/v1/subscriptions/cancel` - Cancel (grace period applies)
//! - `POST /api/v1/subscriptions/renew` - Renew after expiry/cancellation
//! - `POST /api/v1/content/{id}/stream` - Request a streaming session
//! - `POST /api/v1/content/stream/heartbeat` - Keep a session alive
//! - `GET /api/v1/content/streams/active` - List active sessions
//! - `DELETE /api/v1/content/stream/{session_id}` - Terminate a session
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod auth;
mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use reelgate_core::{run_dispatcher, LedgerConfig, LogMailer, PlanCatalog, SubscriptionLedger};
use reelgate_db::pg::Repositories;
use reelgate_sessions::{run_sweeper, RedisSessionStore, SessionRegistry};
use tokio::signal;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("catalog_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Reelgate Catalog API");

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
    let pool = reelgate_db::create_pool(
        &config.database_url,
        reelgate_db::PoolSettings {
            max_connections: config.database_max_connections,
            ..Default::default()
        },
    )
    .await?;
    tracing::info!("Database pool created");

    let repos = Repositories::new(pool.clone());
    let plans = Arc::new(repos.plans);
    let subscriptions = Arc::new(repos.subscriptions);
    let content = Arc::new(repos.content);

    // Session registry backed by redis
    let store = Arc::new(RedisSessionStore::new(&config.redis_url).await?);
    let sessions = SessionRegistry::new(store, config.sessions.clone());
    tracing::info!("Session store connected");

    // Lifecycle events flow from the ledger to the dispatcher task
    let (events_tx, events_rx) = mpsc::channel(256);
    tokio::spawn(run_dispatcher(events_rx, LogMailer));

    let catalog = Arc::new(PlanCatalog::new(Arc::clone(&plans), Arc::clone(&subscriptions)));
    let ledger = SubscriptionLedger::new(plans, subscriptions, events_tx, LedgerConfig::new());

    let tokens = TokenVerifier::new(&config.token_secret);

    let state = AppState {
        catalog,
        ledger: ledger.clone(),
        sessions: sessions.clone(),
        content,
        tokens,
        pool,
        config: Arc::new(config.clone()),
    };

    // Background tasks: stale-session sweep and expiry-warning scan
    tokio::spawn(run_sweeper(sessions));
    tokio::spawn(expiry_scan_loop(ledger, config.expiry_scan_interval));

    let app = build_router(state, metrics_handle);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    run_http_server(app, addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api_v1 = Router::new()
        // Plan catalog
        .route("/plans", get(handlers::list_plans).post(handlers::create_plan))
        .route(
            "/plans/{id}",
            get(handlers::get_plan)
                .put(handlers::update_plan)
                .delete(handlers::delete_plan),
        )
        // Subscription lifecycle
        .route("/subscriptions/subscribe", post(handlers::subscribe))
        .route("/subscriptions/status", get(handlers::subscription_status))
        .route("/subscriptions/history", get(handlers::subscription_history))
        .route("/subscriptions/cancel", put(handlers::cancel_subscription))
        .route("/subscriptions/renew", post(handlers::renew_subscription))
        // Streaming access
        .route("/content/{id}/stream", post(handlers::request_stream))
        .route("/content/stream/heartbeat", post(handlers::stream_heartbeat))
        .route("/content/streams/active", get(handlers::active_streams))
        .route(
            "/content/stream/{session_id}",
            delete(handlers::terminate_stream),
        );

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
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
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

/// Periodic expiry-warning scan; each pass marks and notifies subscriptions
/// approaching their end date.
async fn expiry_scan_loop(
    ledger: SubscriptionLedger<
        reelgate_db::pg::PgPlanRepository,
        reelgate_db::pg::PgSubscriptionRepository,
    >,
    interval: std::time::Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick fires immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match ledger.run_expiry_scan().await {
            Ok(notified) if notified > 0 => {
                tracing::info!(notified, "expiry scan pass complete");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "expiry scan failed"),
        }
    }
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most catalog ops should complete in <100ms, SLO at <200ms p99
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("catalog_operation_duration_seconds".to_string()),
            latency_buckets,
        )?;

    let handle = builder.install_recorder()?;

    metrics::describe_counter!(
        "subscriptions_created_total",
        "Total subscriptions created"
    );
    metrics::describe_counter!(
        "subscriptions_cancelled_total",
        "Total subscriptions cancelled"
    );
    metrics::describe_counter!(
        "subscriptions_renewed_total",
        "Total subscriptions renewed"
    );
    metrics::describe_counter!(
        "streams_admitted_total",
        "Total streaming sessions admitted"
    );
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency in seconds"
    );
    metrics::describe_histogram!(
        "catalog_operation_duration_seconds",
        "Catalog operation latency in seconds by operation type"
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
