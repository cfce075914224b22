use std::net::SocketAddr;
use std::sync::Arc;

use duckdb::Connection;
use parking_lot::Mutex;
use utm_insights::capture::middleware::AppState;
use utm_insights::config::Config;
use utm_insights::{server, store};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "utm_insights=info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(std::path::Path::new));

    tracing::info!(
        host = %config.host,
        port = config.port,
        db_path = %config.db_path.display(),
        capture_enabled = config.capture_enabled,
        "Starting UTM Insights"
    );

    // Ensure the data directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create data directory");
    }

    // Initialize DuckDB
    let conn = Connection::open(&config.db_path).expect("Failed to open DuckDB");
    store::schema::init_schema(&conn).expect("Failed to initialize schema");

    let state = Arc::new(AppState {
        conn: Arc::new(Mutex::new(conn)),
        capture_enabled: config.capture_enabled,
        dashboard_origin: config.dashboard_origin.clone(),
    });

    let app = server::build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!(addr = %addr, "Listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
