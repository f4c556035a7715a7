use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

/// Runtime configuration, collected once from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub admin_password: String,
    /// Published-sheet CSV export URL. Absent means local-only mode:
    /// no remote fetch, the persisted blob is the first source.
    pub sheet_csv_url: Option<String>,
    /// When refreshing from the sheet, keep local-only entries instead
    /// of replacing wholesale.
    pub merge_on_refresh: bool,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://horarios.db".to_string());

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("invalid BIND_ADDR: {}", raw)))?,
            Err(_) => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        let admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin2024".to_string());

        let sheet_csv_url = env::var("SHEET_CSV_URL").ok().filter(|s| !s.is_empty());

        let merge_on_refresh = env::var("MERGE_ON_REFRESH")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let fetch_timeout = match env::var("FETCH_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                AppError::BadRequest(format!("invalid FETCH_TIMEOUT_SECS: {}", raw))
            })?),
            Err(_) => Duration::from_secs(10),
        };

        Ok(Self {
            database_url,
            bind_addr,
            admin_password,
            sheet_csv_url,
            merge_on_refresh,
            fetch_timeout,
        })
    }
}
