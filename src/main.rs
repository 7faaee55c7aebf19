use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classroom::api::router;
use classroom::config::{AppConfig, DEFAULT_LOG_FILTER};
use classroom::state::AppState;
use classroom::{db, geocoding};

const MAX_CONNECTIONS: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url, MAX_CONNECTIONS).await?;
    db::migrate(&pool).await?;
    info!("database ready at {}", config.database_url);

    let state = AppState {
        db: pool,
        geocoder: geocoding::from_config(&config)?,
    };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
