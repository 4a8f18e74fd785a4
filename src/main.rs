use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guesswho::{
    api::{self, AppState},
    catalog::{self, ParticipantCatalog, QuestionCatalog},
    config::AppConfig,
    state::{GameSession, SessionError},
    store::FileStore,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guesswho=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Guess Who...");

    let config = AppConfig::from_env();

    // A malformed state blob is fatal
    let session = match FileStore::open(&config.state_dir)
        .map_err(SessionError::from)
        .and_then(|store| GameSession::restored(Box::new(store)))
    {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(
                "Failed to restore session from {}: {}",
                config.state_dir.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(
        catalog::source_for(&config.data_location),
        QuestionCatalog::new(config.normalize.clone()),
        ParticipantCatalog::new(),
        session,
    ));

    // Load errors stay visible through /api/home
    if let Err(e) = state.load_catalogs().await {
        tracing::warn!("Catalogs not loaded: {}. Retry with POST /api/catalog/reload", e);
    }

    let app = api::router(state)
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
