use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_api::config::Config;
use task_api::db::contacts::{ContactDirectory, MemoryContacts};
use task_api::db::store::{MemoryStore, TaskStore};
use task_api::gateway::reminders;
use task_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing; env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;
    let sweep_every = Duration::from_secs(config.reminder_interval_secs);

    let store: Arc<dyn TaskStore> = Arc::new(MemoryStore::new());
    let contacts: Arc<dyn ContactDirectory> = match &config.contacts_file {
        Some(path) => Arc::new(
            MemoryContacts::from_json_file(path).expect("failed to load CONTACTS_FILE"),
        ),
        None => Arc::new(MemoryContacts::new()),
    };

    let cors = match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            tracing::warn!(origin = %config.cors_origin, "invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
    };

    tracing::info!(
        cors_origin = %config.cors_origin,
        reminder_interval_secs = config.reminder_interval_secs,
        due_reminder_window_hours = config.due_reminder_window_hours,
        "task-api configured"
    );

    let state = AppState::new(store, contacts, config);
    reminders::spawn(state.clone(), sweep_every);

    let app = Router::new()
        .merge(task_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "task-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("shutdown signal received");
}
