//! Blob repository. The whole schedule lives in two JSON-array blobs
//! (entries and time slots) keyed by fixed names, replaced wholesale on
//! every mutation; last write wins. Records read back are normalized
//! here so nothing downstream sees optional legacy fields.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::auth::Session;
use crate::error::AppError;
use crate::models::{ClassKind, ScheduleEntry, TeacherType, TimeSlot, Weekday};

pub const ENTRIES_KEY: &str = "school_schedules";
pub const SLOTS_KEY: &str = "time_slots";
pub const SESSIONS_KEY: &str = "admin_sessions";

/// A persisted entry as older writers may have left it: id, kind and
/// teacher type are all optional and defaulted on load.
#[derive(Debug, Deserialize)]
struct StoredEntry {
    #[serde(default)]
    id: Option<String>,
    grade: String,
    day: String,
    time: String,
    subject: String,
    #[serde(default)]
    teacher: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(rename = "teacherType", default)]
    teacher_type: Option<String>,
}

impl StoredEntry {
    fn normalize(self) -> Option<ScheduleEntry> {
        let day = match Weekday::parse(&self.day) {
            Some(day) => day,
            None => {
                warn!("dropping persisted entry with unknown day {:?}", self.day);
                return None;
            }
        };
        Some(ScheduleEntry {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            grade: self.grade,
            day,
            time: self.time,
            subject: self.subject,
            teacher: self.teacher,
            kind: self
                .kind
                .map(|s| ClassKind::from_keyword(&s))
                .unwrap_or_default(),
            teacher_type: self
                .teacher_type
                .map(|s| TeacherType::from_keyword(&s))
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSlot {
    #[serde(default)]
    id: Option<String>,
    label: String,
    #[serde(default)]
    is_break: bool,
}

impl StoredSlot {
    fn normalize(self) -> TimeSlot {
        TimeSlot {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            label: self.label,
            is_break: self.is_break,
        }
    }
}

async fn read_blob(db: &SqlitePool, key: &str) -> Result<Option<String>, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM blobs WHERE key = ?1")
        .bind(key)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|(value,)| value))
}

async fn write_blob<T: Serialize>(db: &SqlitePool, key: &str, value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string(value)?;
    sqlx::query(
        "INSERT INTO blobs (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(json)
    .execute(db)
    .await?;
    Ok(())
}

/// Deserialize a JSON-array blob tolerantly: an absent or malformed
/// blob is "no data", never an error.
fn decode_blob<T: for<'de> Deserialize<'de>>(key: &str, raw: Option<String>) -> Option<Vec<T>> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(list) => Some(list),
        Err(e) => {
            warn!("ignoring malformed blob {:?}: {}", key, e);
            None
        }
    }
}

/// `None` means no usable persisted data (absent or malformed blob).
pub async fn load_entries(db: &SqlitePool) -> Result<Option<Vec<ScheduleEntry>>, AppError> {
    let raw = read_blob(db, ENTRIES_KEY).await?;
    Ok(decode_blob::<StoredEntry>(ENTRIES_KEY, raw)
        .map(|list| list.into_iter().filter_map(StoredEntry::normalize).collect()))
}

pub async fn save_entries(db: &SqlitePool, entries: &[ScheduleEntry]) -> Result<(), AppError> {
    write_blob(db, ENTRIES_KEY, &entries).await
}

pub async fn load_slots(db: &SqlitePool) -> Result<Option<Vec<TimeSlot>>, AppError> {
    let raw = read_blob(db, SLOTS_KEY).await?;
    Ok(decode_blob::<StoredSlot>(SLOTS_KEY, raw)
        .map(|list| list.into_iter().map(StoredSlot::normalize).collect()))
}

pub async fn save_slots(db: &SqlitePool, slots: &[TimeSlot]) -> Result<(), AppError> {
    write_blob(db, SLOTS_KEY, &slots).await
}

pub async fn load_sessions(db: &SqlitePool) -> Result<Vec<Session>, AppError> {
    let raw = read_blob(db, SESSIONS_KEY).await?;
    Ok(decode_blob::<Session>(SESSIONS_KEY, raw).unwrap_or_default())
}

pub async fn save_sessions(db: &SqlitePool, sessions: &[Session]) -> Result<(), AppError> {
    write_blob(db, SESSIONS_KEY, &sessions).await
}
