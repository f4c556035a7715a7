//! Remote sheet access. The school publishes its spreadsheet as a
//! world-readable CSV export; fetching it is the only network call the
//! service makes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AppError;

#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Fetch the published CSV body. A non-2xx status or empty body is
    /// a recoverable `Fetch` error; callers fall back to local data.
    async fn fetch_csv(&self) -> Result<String, AppError>;
}

pub struct HttpSheetSource {
    client: Client,
    url: String,
}

impl HttpSheetSource {
    pub fn new(url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::BadRequest(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl SheetSource for HttpSheetSource {
    async fn fetch_csv(&self) -> Result<String, AppError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Fetch(format!(
                "sheet endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Fetch(format!("failed to read body: {}", e)))?;
        if body.trim().is_empty() {
            return Err(AppError::Fetch("sheet endpoint returned an empty body".to_string()));
        }
        Ok(body)
    }
}
