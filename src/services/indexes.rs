//! Derived views over the entry list, recomputed in full on demand.
//! At tens to low hundreds of entries there is nothing to incrementalize.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::ScheduleEntry;

#[derive(Debug, PartialEq, Serialize)]
pub struct ScheduleIndex {
    /// Distinct grades, sorted lexicographically.
    pub grades: Vec<String>,
    /// Distinct subjects, sorted lexicographically.
    pub subjects: Vec<String>,
    /// First grade of the sorted set, the UI's default selection.
    pub default_grade: Option<String>,
}

pub fn build(entries: &[ScheduleEntry]) -> ScheduleIndex {
    let grades: Vec<String> = entries
        .iter()
        .map(|e| e.grade.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let subjects: Vec<String> = entries
        .iter()
        .map(|e| e.subject.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let default_grade = grades.first().cloned();

    ScheduleIndex {
        grades,
        subjects,
        default_grade,
    }
}
