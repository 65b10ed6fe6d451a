use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use server::config;
use server::db;
use server::engine::EngineSession;
use server::game::SessionRegistry;
use server::routes;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    // Connect to SQLite
    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run schema migrations
    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    // Engine connection is opened lazily on first request; here we only
    // report whether a binary is configured at all.
    let engine = Arc::new(EngineSession::new(config.stockfish_path.clone()));
    if engine.available() {
        tracing::info!(path = %config.stockfish_path, "Engine binary found");
    } else {
        tracing::warn!(
            path = %config.stockfish_path,
            "Engine binary not found - gameplay runs rules-only"
        );
    }

    let registry = Arc::new(SessionRegistry::new());

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router — same paths as the legacy Flask service
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/initialize-board", get(routes::play::initialize_board))
        .route("/post-move", post(routes::play::post_move))
        .route("/engine-move", post(routes::play::engine_move))
        .route("/best-moves", get(routes::analysis::best_moves))
        .route("/analyze-position", post(routes::analysis::analyze_position))
        .route("/game-history", get(routes::history::game_history))
        .route("/game/{game_id}", get(routes::history::get_game))
        // Shared state
        .layer(Extension(pool))
        .layer(Extension(config.clone()))
        .layer(Extension(engine.clone()))
        .layer(Extension(registry))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Let the engine process exit cleanly; kill-on-drop is the backstop.
    engine.shutdown().await;
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
