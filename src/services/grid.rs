//! Projection of the entry list into the day × slot table for one
//! grade. Pure lookup; presentation happens client-side.

use serde::Serialize;

use crate::models::{ScheduleEntry, TimeSlot, Weekday};

#[derive(Debug, Serialize)]
pub struct GridRow {
    pub slot: TimeSlot,
    /// One cell per day, Lunes..Viernes. A cell may hold several
    /// entries (titular and suplente side by side) or none.
    pub cells: Vec<Vec<ScheduleEntry>>,
}

#[derive(Debug, Serialize)]
pub struct GradeGrid {
    pub grade: String,
    pub days: Vec<Weekday>,
    pub rows: Vec<GridRow>,
}

pub fn build(grade: &str, entries: &[ScheduleEntry], slots: &[TimeSlot]) -> GradeGrid {
    let rows = slots
        .iter()
        .map(|slot| {
            let cells = Weekday::ALL
                .iter()
                .map(|day| {
                    entries
                        .iter()
                        .filter(|e| e.grade == grade && e.day == *day && e.time == slot.label)
                        .cloned()
                        .collect()
                })
                .collect();
            GridRow {
                slot: slot.clone(),
                cells,
            }
        })
        .collect();

    GradeGrid {
        grade: grade.to_string(),
        days: Weekday::ALL.to_vec(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassKind, TeacherType};

    fn entry(grade: &str, day: Weekday, time: &str, subject: &str) -> ScheduleEntry {
        ScheduleEntry::new(
            grade.into(),
            day,
            time.into(),
            subject.into(),
            String::new(),
            ClassKind::Teoria,
            TeacherType::Titular,
        )
    }

    #[test]
    fn cells_hold_matching_entries_only() {
        let slots = TimeSlot::defaults();
        let entries = vec![
            entry("1° A", Weekday::Lunes, "08:00 - 08:45", "Matemáticas"),
            entry("1° A", Weekday::Martes, "08:00 - 08:45", "Historia"),
            entry("2° B", Weekday::Lunes, "08:00 - 08:45", "Física"),
        ];

        let grid = build("1° A", &entries, &slots);
        assert_eq!(grid.rows.len(), slots.len());
        assert_eq!(grid.days, Weekday::ALL.to_vec());

        let first_row = &grid.rows[0];
        assert_eq!(first_row.slot.label, "08:00 - 08:45");
        assert_eq!(first_row.cells[0].len(), 1);
        assert_eq!(first_row.cells[0][0].subject, "Matemáticas");
        assert_eq!(first_row.cells[1].len(), 1);
        assert_eq!(first_row.cells[1][0].subject, "Historia");
        assert!(first_row.cells[2].is_empty());
    }

    #[test]
    fn multiple_entries_share_one_cell() {
        let slots = TimeSlot::defaults();
        let mut titular = entry("1° A", Weekday::Lunes, "08:00 - 08:45", "Matemáticas");
        titular.teacher = "Prof. García".into();
        let mut suplente = entry("1° A", Weekday::Lunes, "08:00 - 08:45", "Matemáticas");
        suplente.teacher = "Prof. Díaz".into();
        suplente.teacher_type = TeacherType::Suplente;

        let grid = build("1° A", &[titular, suplente], &slots);
        assert_eq!(grid.rows[0].cells[0].len(), 2);
    }

    #[test]
    fn break_row_is_flagged_even_when_empty() {
        let slots = TimeSlot::defaults();
        let grid = build("1° A", &[], &slots);
        let recreo = grid
            .rows
            .iter()
            .find(|r| r.slot.label == "11:00 - 11:15")
            .unwrap();
        assert!(recreo.slot.is_break);
        assert!(recreo.cells.iter().all(|c| c.is_empty()));
    }
}
