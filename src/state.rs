use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::sheet::SheetSource;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sheet: Option<Arc<dyn SheetSource>>,
    pub config: Arc<Config>,
}
