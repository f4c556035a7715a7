//! The schedule store: reconciliation between the remote sheet, the
//! persisted blobs and the built-in sample data, plus all record and
//! slot mutations. Every mutation re-persists the whole list.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::csv;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    ClassKind, NewEntryRequest, NewSlotRequest, ScheduleEntry, TeacherType, TimeSlot,
    UpdateEntryRequest, UpdateSlotRequest, Weekday,
};
use crate::sheet::SheetSource;

pub struct ScheduleStore {
    db: SqlitePool,
    sheet: Option<Arc<dyn SheetSource>>,
}

/// Which rung of the fallback chain produced the entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote,
    Local,
    Sample,
}

#[derive(Debug, Serialize)]
pub struct LoadOutcome {
    pub entries: Vec<ScheduleEntry>,
    pub source: DataSource,
    /// User-visible notice when the remote fetch failed and we fell
    /// back to older data.
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshStats {
    pub fetched: usize,
    pub kept_local: usize,
    pub total: usize,
    pub row_errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotRemoval {
    pub slot: TimeSlot,
    pub removed_entries: usize,
}

impl ScheduleStore {
    pub fn new(db: SqlitePool, sheet: Option<Arc<dyn SheetSource>>) -> Self {
        Self { db, sheet }
    }

    /// Page-load path. Remote first when a sheet is configured, then
    /// the persisted blob, then the sample dataset. Transport and
    /// parse failures degrade with a warning; they never propagate.
    pub async fn load(&self) -> Result<LoadOutcome, AppError> {
        let mut warning = None;

        if let Some(sheet) = &self.sheet {
            match self.fetch_remote(sheet.as_ref()).await {
                Ok(outcome) => {
                    repository::save_entries(&self.db, &outcome.entries).await?;
                    info!("loaded {} entries from the remote sheet", outcome.entries.len());
                    return Ok(LoadOutcome {
                        entries: outcome.entries,
                        source: DataSource::Remote,
                        warning: None,
                    });
                }
                Err(e) => {
                    warn!("remote sheet load failed, falling back: {}", e);
                    warning = Some(
                        "No se pudo actualizar desde la planilla; mostrando datos guardados."
                            .to_string(),
                    );
                }
            }
        }

        match repository::load_entries(&self.db).await? {
            Some(entries) => Ok(LoadOutcome {
                entries,
                source: DataSource::Local,
                warning,
            }),
            None => Ok(LoadOutcome {
                entries: sample_entries(),
                source: DataSource::Sample,
                warning,
            }),
        }
    }

    /// Manual refresh. Unlike `load`, failures here surface to the
    /// caller; the admin asked for a fetch and should see why it
    /// failed. No automatic retry.
    pub async fn refresh(&self, merge: bool) -> Result<RefreshStats, AppError> {
        let sheet = self
            .sheet
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("no sheet source configured".to_string()))?;

        let outcome = self.fetch_remote(sheet.as_ref()).await?;
        let fetched = outcome.entries.len();

        let (merged, kept_local) = if merge {
            self.merge_remote(outcome.entries).await?
        } else {
            (outcome.entries, 0)
        };
        let total = merged.len();
        repository::save_entries(&self.db, &merged).await?;

        Ok(RefreshStats {
            fetched,
            kept_local,
            total,
            row_errors: outcome.errors,
        })
    }

    async fn fetch_remote(
        &self,
        sheet: &dyn SheetSource,
    ) -> Result<csv::ParseOutcome, AppError> {
        let body = sheet.fetch_csv().await?;
        let outcome = csv::parse_csv(&body)?;
        if outcome.entries.is_empty() {
            return Err(AppError::Parse(
                "la planilla no contiene filas válidas".to_string(),
            ));
        }
        if !outcome.errors.is_empty() {
            warn!("{} sheet rows rejected during parse", outcome.errors.len());
        }
        Ok(outcome)
    }

    /// Union remote entries with local-only ones, remote winning on the
    /// (grade, day, time, subject) key. Returns the merged list and how
    /// many local entries survived.
    async fn merge_remote(
        &self,
        remote: Vec<ScheduleEntry>,
    ) -> Result<(Vec<ScheduleEntry>, usize), AppError> {
        let local = repository::load_entries(&self.db).await?.unwrap_or_default();
        let seen: HashSet<_> = remote.iter().map(ScheduleEntry::dedup_key).collect();

        let mut merged = remote;
        let mut kept = 0;
        for entry in local {
            if !seen.contains(&entry.dedup_key()) {
                merged.push(entry);
                kept += 1;
            }
        }
        Ok((merged, kept))
    }

    /// Current working list for mutations and derived views: persisted
    /// blob, or the sample dataset when nothing was ever saved. An
    /// empty saved list is real data, not absence.
    pub async fn current(&self) -> Result<Vec<ScheduleEntry>, AppError> {
        Ok(repository::load_entries(&self.db)
            .await?
            .unwrap_or_else(sample_entries))
    }

    pub async fn replace_all(&self, entries: Vec<ScheduleEntry>) -> Result<usize, AppError> {
        let count = entries.len();
        repository::save_entries(&self.db, &entries).await?;
        Ok(count)
    }

    pub async fn add(&self, req: NewEntryRequest) -> Result<ScheduleEntry, AppError> {
        let day = parse_day(&req.day)?;
        let grade = required(&req.grade, "grade")?;
        let time = required(&req.time, "time")?;
        let subject = required(&req.subject, "subject")?;

        let entry = ScheduleEntry::new(
            grade,
            day,
            time,
            subject,
            req.teacher.unwrap_or_default().trim().to_string(),
            req.kind.as_deref().map(ClassKind::from_keyword).unwrap_or_default(),
            req.teacher_type
                .as_deref()
                .map(TeacherType::from_keyword)
                .unwrap_or_default(),
        );

        let mut entries = self.current().await?;
        entries.push(entry.clone());
        repository::save_entries(&self.db, &entries).await?;
        Ok(entry)
    }

    pub async fn update(
        &self,
        id: &str,
        req: UpdateEntryRequest,
    ) -> Result<Option<ScheduleEntry>, AppError> {
        let mut entries = self.current().await?;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };

        if let Some(grade) = req.grade {
            entry.grade = required(&grade, "grade")?;
        }
        if let Some(day) = req.day {
            entry.day = parse_day(&day)?;
        }
        if let Some(time) = req.time {
            entry.time = required(&time, "time")?;
        }
        if let Some(subject) = req.subject {
            entry.subject = required(&subject, "subject")?;
        }
        if let Some(teacher) = req.teacher {
            entry.teacher = teacher.trim().to_string();
        }
        if let Some(kind) = req.kind {
            entry.kind = ClassKind::from_keyword(&kind);
        }
        if let Some(teacher_type) = req.teacher_type {
            entry.teacher_type = TeacherType::from_keyword(&teacher_type);
        }

        let updated = entry.clone();
        repository::save_entries(&self.db, &entries).await?;
        Ok(Some(updated))
    }

    pub async fn remove(&self, id: &str) -> Result<bool, AppError> {
        let mut entries = self.current().await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        repository::save_entries(&self.db, &entries).await?;
        Ok(true)
    }

    pub async fn slots(&self) -> Result<Vec<TimeSlot>, AppError> {
        Ok(repository::load_slots(&self.db)
            .await?
            .unwrap_or_else(TimeSlot::defaults))
    }

    pub async fn add_slot(&self, req: NewSlotRequest) -> Result<TimeSlot, AppError> {
        let label = required(&req.label, "label")?;
        let slot = TimeSlot::new(label, req.is_break);

        let mut slots = self.slots().await?;
        slots.push(slot.clone());
        repository::save_slots(&self.db, &slots).await?;
        Ok(slot)
    }

    /// Rename or reflag a slot. A label change cascades to every entry
    /// referencing the old label, so renames never orphan entries.
    pub async fn update_slot(
        &self,
        id: &str,
        req: UpdateSlotRequest,
    ) -> Result<Option<TimeSlot>, AppError> {
        let mut slots = self.slots().await?;
        let Some(slot) = slots.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };

        let old_label = slot.label.clone();
        if let Some(label) = req.label {
            slot.label = required(&label, "label")?;
        }
        if let Some(is_break) = req.is_break {
            slot.is_break = is_break;
        }
        let updated = slot.clone();
        repository::save_slots(&self.db, &slots).await?;

        if updated.label != old_label {
            let mut entries = self.current().await?;
            let mut touched = false;
            for entry in entries.iter_mut().filter(|e| e.time == old_label) {
                entry.time = updated.label.clone();
                touched = true;
            }
            if touched {
                repository::save_entries(&self.db, &entries).await?;
            }
        }
        Ok(Some(updated))
    }

    /// Delete a slot and every entry referencing its label. The
    /// interactive confirmation lives client-side; reaching this code
    /// means the admin confirmed.
    pub async fn remove_slot(&self, id: &str) -> Result<Option<SlotRemoval>, AppError> {
        let mut slots = self.slots().await?;
        let Some(pos) = slots.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        let slot = slots.remove(pos);
        repository::save_slots(&self.db, &slots).await?;

        let mut entries = self.current().await?;
        let before = entries.len();
        entries.retain(|e| e.time != slot.label);
        let removed_entries = before - entries.len();
        if removed_entries > 0 {
            repository::save_entries(&self.db, &entries).await?;
        }

        Ok(Some(SlotRemoval {
            slot,
            removed_entries,
        }))
    }

    pub async fn reset_slots(&self) -> Result<Vec<TimeSlot>, AppError> {
        let slots = TimeSlot::defaults();
        repository::save_slots(&self.db, &slots).await?;
        Ok(slots)
    }
}

fn parse_day(raw: &str) -> Result<Weekday, AppError> {
    Weekday::parse(raw).ok_or_else(|| AppError::BadRequest(format!("día inválido ({})", raw)))
}

fn required(raw: &str, field: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Built-in dataset shown before anything was ever imported. Ids are
/// fixed so a mutation against a freshly served sample entry resolves;
/// the first edit persists the resulting list.
pub fn sample_entries() -> Vec<ScheduleEntry> {
    let rows: [(&str, Weekday, &str, &str, &str); 7] = [
        ("1° A", Weekday::Lunes, "08:00 - 08:45", "Matemáticas", "Prof. García"),
        ("1° A", Weekday::Lunes, "08:45 - 09:30", "Lengua", "Prof. Martínez"),
        ("1° A", Weekday::Lunes, "09:30 - 10:15", "Ciencias", "Prof. López"),
        ("1° A", Weekday::Martes, "08:00 - 08:45", "Historia", "Prof. Rodríguez"),
        ("1° A", Weekday::Martes, "08:45 - 09:30", "Matemáticas", "Prof. García"),
        ("2° B", Weekday::Lunes, "08:00 - 08:45", "Física", "Prof. Fernández"),
        ("2° B", Weekday::Lunes, "08:45 - 09:30", "Química", "Prof. Silva"),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (grade, day, time, subject, teacher))| ScheduleEntry {
            id: (i + 1).to_string(),
            grade: grade.to_string(),
            day,
            time: time.to_string(),
            subject: subject.to_string(),
            teacher: teacher.to_string(),
            kind: ClassKind::Teoria,
            teacher_type: TeacherType::Titular,
        })
        .collect()
}
