//! Parsing of published-sheet CSV text and uploaded spreadsheet rows
//! into schedule entries.
//!
//! Both forms share the same column order: grade, day, time, subject,
//! teacher, then optional kind ("teoria"/"taller") and teacher type
//! ("titular"/"suplente"/"provisional"). The first row is always a
//! header. Rows missing a required field are dropped, not failed; the
//! caller gets an aggregate report.

use serde_json::Value;

use crate::error::AppError;
use crate::models::{ClassKind, ScheduleEntry, TeacherType, Weekday};

/// Outcome of one import: accepted entries plus per-row rejection
/// messages. `total_rows` counts data rows seen, blank lines excluded.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub entries: Vec<ScheduleEntry>,
    pub total_rows: usize,
    pub errors: Vec<String>,
}

/// Quote-aware CSV field splitter. Commas inside double quotes do not
/// split; a doubled quote inside a quoted field is a literal quote.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Parse raw CSV text as exported by a published sheet. The first line
/// is the header and is skipped; blank lines are skipped. A data row
/// needs at least six fields (the teacher-type column is optional) and
/// non-empty grade, day, time and subject.
///
/// Text with no data rows at all is a hard error so the caller's
/// fallback chain can engage.
pub fn parse_csv(text: &str) -> Result<ParseOutcome, AppError> {
    let mut outcome = ParseOutcome::default();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if i == 0 || line.trim().is_empty() {
            continue;
        }
        outcome.total_rows += 1;

        let fields = split_line(line);
        if fields.len() < 6 {
            outcome
                .errors
                .push(format!("fila {}: datos incompletos", i + 1));
            continue;
        }

        match entry_from_fields(&fields) {
            Ok(entry) => outcome.entries.push(entry),
            Err(reason) => outcome.errors.push(format!("fila {}: {}", i + 1, reason)),
        }
    }

    if outcome.total_rows == 0 {
        return Err(AppError::Parse(
            "la planilla no contiene filas de datos".to_string(),
        ));
    }
    Ok(outcome)
}

/// Parse a 2-D array of raw spreadsheet cells, header row included
/// (row 0 is always skipped). Cells arrive as JSON values since the
/// sheet reader does not type them; numbers are stringified. A row
/// needs at least five cells and a non-empty grade; the kind and
/// teacher-type columns are optional.
pub fn parse_rows(rows: &[Vec<Value>]) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for (i, row) in rows.iter().enumerate().skip(1) {
        outcome.total_rows += 1;

        let fields: Vec<String> = row.iter().map(cell_to_string).collect();
        if fields.len() < 5 || fields[0].trim().is_empty() {
            outcome
                .errors
                .push(format!("fila {}: datos incompletos", i + 1));
            continue;
        }

        match entry_from_fields(&fields) {
            Ok(entry) => outcome.entries.push(entry),
            Err(reason) => outcome.errors.push(format!("fila {}: {}", i + 1, reason)),
        }
    }
    outcome
}

/// Positional mapping shared by both input forms. `fields` has at
/// least five elements when called.
fn entry_from_fields(fields: &[String]) -> Result<ScheduleEntry, String> {
    let grade = fields[0].trim();
    let day_raw = fields[1].trim();
    let time = fields[2].trim();
    let subject = fields[3].trim();
    let teacher = fields.get(4).map(|s| s.trim()).unwrap_or("");

    if grade.is_empty() || day_raw.is_empty() || time.is_empty() || subject.is_empty() {
        return Err("campos obligatorios vacíos".to_string());
    }
    let day = Weekday::parse(day_raw).ok_or_else(|| format!("día inválido ({})", day_raw))?;

    let kind = fields
        .get(5)
        .map(|s| ClassKind::from_keyword(s))
        .unwrap_or_default();
    let teacher_type = fields
        .get(6)
        .map(|s| TeacherType::from_keyword(s))
        .unwrap_or_default();

    Ok(ScheduleEntry::new(
        grade.to_string(),
        day,
        time.to_string(),
        subject.to_string(),
        teacher.to_string(),
        kind,
        teacher_type,
    ))
}

fn cell_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
