use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// School days, serialized by their Spanish name as the sheets use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Lunes,
    Martes,
    #[serde(rename = "Miércoles")]
    Miercoles,
    Jueves,
    Viernes,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Lunes,
        Weekday::Martes,
        Weekday::Miercoles,
        Weekday::Jueves,
        Weekday::Viernes,
    ];

    /// Case-insensitive parse; accepts the accentless "miercoles" too,
    /// since hand-typed sheets drop the accent often enough.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "lunes" => Some(Weekday::Lunes),
            "martes" => Some(Weekday::Martes),
            "miércoles" | "miercoles" => Some(Weekday::Miercoles),
            "jueves" => Some(Weekday::Jueves),
            "viernes" => Some(Weekday::Viernes),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Lunes => "Lunes",
            Weekday::Martes => "Martes",
            Weekday::Miercoles => "Miércoles",
            Weekday::Jueves => "Jueves",
            Weekday::Viernes => "Viernes",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Theory vs. workshop classification, display-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Teoria,
    Taller,
}

impl ClassKind {
    /// "taller" (case-insensitive) selects the workshop kind; anything
    /// else, including an absent cell, is theory.
    pub fn from_keyword(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("taller") {
            ClassKind::Taller
        } else {
            ClassKind::Teoria
        }
    }
}

/// Employment status of the teacher for one class occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeacherType {
    #[default]
    Titular,
    Suplente,
    Provisional,
}

impl TeacherType {
    pub fn from_keyword(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "suplente" => TeacherType::Suplente,
            "provisional" => TeacherType::Provisional,
            _ => TeacherType::Titular,
        }
    }
}

/// One timetabled class occurrence. The (grade, day, time) tuple is not
/// unique: a titular and a suplente may occupy the same cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub grade: String,
    pub day: Weekday,
    /// Slot label, stored denormalized. The store cascades slot renames
    /// and deletes so it cannot be orphaned by slot edits.
    pub time: String,
    pub subject: String,
    pub teacher: String,
    #[serde(rename = "type")]
    pub kind: ClassKind,
    #[serde(rename = "teacherType")]
    pub teacher_type: TeacherType,
}

impl ScheduleEntry {
    pub fn new(
        grade: String,
        day: Weekday,
        time: String,
        subject: String,
        teacher: String,
        kind: ClassKind,
        teacher_type: TeacherType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            grade,
            day,
            time,
            subject,
            teacher,
            kind,
            teacher_type,
        }
    }

    /// De-duplication key used when merging remote rows with local ones.
    pub fn dedup_key(&self) -> (String, Weekday, String, String) {
        (
            self.grade.clone(),
            self.day,
            self.time.clone(),
            self.subject.clone(),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEntryRequest {
    pub grade: String,
    pub day: String,
    pub time: String,
    pub subject: String,
    pub teacher: Option<String>,
    pub kind: Option<String>,
    pub teacher_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEntryRequest {
    pub grade: Option<String>,
    pub day: Option<String>,
    pub time: Option<String>,
    pub subject: Option<String>,
    pub teacher: Option<String>,
    pub kind: Option<String>,
    pub teacher_type: Option<String>,
}
