pub mod repository;

use sqlx::SqlitePool;

use crate::error::AppError;

/// Apply embedded migrations. Called from main and from test setups.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Database(e.into()))?;
    Ok(())
}
