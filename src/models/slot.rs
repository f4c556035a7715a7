use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the schedule grid. `is_break` is an explicit flag; break
/// rows are rendered specially and normally hold no entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub label: String,
    pub is_break: bool,
}

impl TimeSlot {
    pub fn new(label: impl Into<String>, is_break: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            is_break,
        }
    }

    /// The school's standard nine-slot day, recreo at 11:00. Ids are
    /// fixed so the defaults can be renamed or deleted before a slot
    /// list was ever persisted.
    pub fn defaults() -> Vec<TimeSlot> {
        let rows: [(&str, bool); 9] = [
            ("08:00 - 08:45", false),
            ("08:45 - 09:30", false),
            ("09:30 - 10:15", false),
            ("10:15 - 11:00", false),
            ("11:00 - 11:15", true),
            ("11:15 - 12:00", false),
            ("12:00 - 12:45", false),
            ("12:45 - 13:30", false),
            ("13:30 - 14:15", false),
        ];
        rows.into_iter()
            .enumerate()
            .map(|(i, (label, is_break))| TimeSlot {
                id: format!("slot-{}", i + 1),
                label: label.to_string(),
                is_break,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSlotRequest {
    pub label: String,
    #[serde(default)]
    pub is_break: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlotRequest {
    pub label: Option<String>,
    pub is_break: Option<bool>,
}
