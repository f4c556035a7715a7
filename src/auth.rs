//! Admin session gate. Cosmetic by design: one shared password, a
//! bearer token valid for 24 hours, sessions kept in their own blob.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::db::repository;
use crate::error::AppError;

const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub logged_in_at: String,
}

impl Session {
    fn mint() -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            logged_in_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.logged_in_at) {
            Ok(t) => now - t.with_timezone(&Utc) < Duration::hours(SESSION_TTL_HOURS),
            Err(_) => false,
        }
    }
}

/// Check the password and mint a session. Expired sessions are pruned
/// while we hold the blob anyway.
pub async fn login(db: &SqlitePool, config: &Config, password: &str) -> Result<Session, AppError> {
    if password != config.admin_password {
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now();
    let mut sessions: Vec<Session> = repository::load_sessions(db)
        .await?
        .into_iter()
        .filter(|s| s.is_valid_at(now))
        .collect();

    let session = Session::mint();
    sessions.push(session.clone());
    repository::save_sessions(db, &sessions).await?;
    Ok(session)
}

pub async fn logout(db: &SqlitePool, token: &str) -> Result<(), AppError> {
    let mut sessions = repository::load_sessions(db).await?;
    sessions.retain(|s| s.token != token);
    repository::save_sessions(db, &sessions).await?;
    Ok(())
}

/// Require a valid bearer token on protected routes. An expired token
/// is removed from the session blob as it is rejected.
pub async fn require_admin(db: &SqlitePool, headers: &HeaderMap) -> Result<(), AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;

    let now = Utc::now();
    let sessions = repository::load_sessions(db).await?;
    let valid = sessions
        .iter()
        .any(|s| s.token == token && s.is_valid_at(now));

    if !valid {
        let live: Vec<Session> = sessions
            .into_iter()
            .filter(|s| s.token != token && s.is_valid_at(now))
            .collect();
        repository::save_sessions(db, &live).await?;
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
