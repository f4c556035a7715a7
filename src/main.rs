use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use horarios_backend::api::router;
use horarios_backend::config::Config;
use horarios_backend::sheet::{HttpSheetSource, SheetSource};
use horarios_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "horarios_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    horarios_backend::db::run_migrations(&pool).await?;

    let sheet: Option<Arc<dyn SheetSource>> = match &config.sheet_csv_url {
        Some(url) => {
            info!("remote sheet source: {}", url);
            Some(Arc::new(HttpSheetSource::new(
                url.clone(),
                config.fetch_timeout,
            )?))
        }
        None => {
            info!("no SHEET_CSV_URL set, running local-only");
            None
        }
    };

    let addr = config.bind_addr;
    let state = AppState {
        db: pool,
        sheet,
        config: Arc::new(config),
    };

    let app = router(state);
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
