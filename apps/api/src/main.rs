use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use todo_api::api::{router, AppState};
use todo_api::config::AppConfig;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("todo_api=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = AppConfig::from_env().map_err(|e| format!("Invalid configuration: {}", e))?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {}", e))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| format!("Failed to run migrations: {}", e))?;
    tracing::info!("Database connected and migrated");

    let addr = config.socket_addr();
    let app = router(AppState::from_pool(pool, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server failed: {}", e))
}
