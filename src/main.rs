use notice_dispatch::{
    db::{create_pool, run_migrations},
    routes::create_router,
    state::{AppState, Config},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,notice_dispatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(db, config);
    let app = create_router(state);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
