use axum::Json;
use axum::extract::{Path, Query};
use axum::http::HeaderMap;
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::auth::{self, Session};
use crate::csv;
use crate::error::AppError;
use crate::models::*;
use crate::services::grid::GradeGrid;
use crate::services::{LoadOutcome, RefreshStats, ScheduleStore, SlotRemoval, grid, indexes};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/{id}", patch(update_entry).delete(delete_entry))
        .route("/import/rows", post(import_rows))
        .route("/import/csv", post(import_csv))
        .route("/refresh", post(refresh))
        .route("/grades", get(list_grades))
        .route("/subjects", get(list_subjects))
        .route("/grid", get(grade_grid))
        .route("/slots", get(list_slots).post(create_slot))
        .route("/slots/{id}", patch(update_slot).delete(delete_slot))
        .route("/slots/reset", post(reset_slots))
        .with_state(state)
}

fn store(state: &AppState) -> ScheduleStore {
    ScheduleStore::new(state.db.clone(), state.sheet.clone())
}

#[derive(Deserialize)]
struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
struct GridParams {
    grade: String,
}

#[derive(Serialize)]
struct ImportResponse {
    total_rows: usize,
    valid_rows: usize,
    errors: Vec<String>,
}

#[derive(Serialize)]
struct GradesResponse {
    grades: Vec<String>,
    default_grade: Option<String>,
}

#[derive(Serialize)]
struct SubjectsResponse {
    subjects: Vec<String>,
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Session>, AppError> {
    let session = auth::login(&state.db, &state.config, &req.password).await?;
    Ok(Json(session))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    if let Some(token) = auth::bearer_token(&headers) {
        auth::logout(&state.db, token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_entries(State(state): State<AppState>) -> Result<Json<LoadOutcome>, AppError> {
    let outcome = store(&state).load().await?;
    Ok(Json(outcome))
}

async fn create_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewEntryRequest>,
) -> Result<Json<ScheduleEntry>, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    let entry = store(&state).add(req).await?;
    Ok(Json(entry))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Json<ScheduleEntry>, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    let entry = store(&state)
        .update(&id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    if store(&state).remove(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

/// Import a spreadsheet supplied as raw cell rows (header row
/// included). Replaces the whole schedule, matching the original
/// upload semantics.
async fn import_rows(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(rows): Json<Vec<Vec<serde_json::Value>>>,
) -> Result<Json<ImportResponse>, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    let outcome = csv::parse_rows(&rows);
    apply_import(&state, outcome).await
}

async fn import_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    let outcome = csv::parse_csv(&body)?;
    apply_import(&state, outcome).await
}

async fn apply_import(
    state: &AppState,
    outcome: csv::ParseOutcome,
) -> Result<Json<ImportResponse>, AppError> {
    if outcome.entries.is_empty() {
        return Err(AppError::BadRequest(
            "No se encontraron datos válidos en el archivo".to_string(),
        ));
    }
    let valid_rows = store(state).replace_all(outcome.entries).await?;
    Ok(Json(ImportResponse {
        total_rows: outcome.total_rows,
        valid_rows,
        errors: outcome.errors,
    }))
}

async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshStats>, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    let stats = store(&state).refresh(state.config.merge_on_refresh).await?;
    Ok(Json(stats))
}

async fn list_grades(State(state): State<AppState>) -> Result<Json<GradesResponse>, AppError> {
    let entries = store(&state).current().await?;
    let index = indexes::build(&entries);
    Ok(Json(GradesResponse {
        grades: index.grades,
        default_grade: index.default_grade,
    }))
}

async fn list_subjects(State(state): State<AppState>) -> Result<Json<SubjectsResponse>, AppError> {
    let entries = store(&state).current().await?;
    let index = indexes::build(&entries);
    Ok(Json(SubjectsResponse {
        subjects: index.subjects,
    }))
}

async fn grade_grid(
    State(state): State<AppState>,
    Query(params): Query<GridParams>,
) -> Result<Json<GradeGrid>, AppError> {
    let store = store(&state);
    let entries = store.current().await?;
    let slots = store.slots().await?;
    Ok(Json(grid::build(&params.grade, &entries, &slots)))
}

async fn list_slots(State(state): State<AppState>) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let slots = store(&state).slots().await?;
    Ok(Json(slots))
}

async fn create_slot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewSlotRequest>,
) -> Result<Json<TimeSlot>, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    let slot = store(&state).add_slot(req).await?;
    Ok(Json(slot))
}

async fn update_slot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateSlotRequest>,
) -> Result<Json<TimeSlot>, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    let slot = store(&state)
        .update_slot(&id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(slot))
}

async fn delete_slot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SlotRemoval>, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    let removal = store(&state)
        .remove_slot(&id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(removal))
}

async fn reset_slots(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    auth::require_admin(&state.db, &headers).await?;
    let slots = store(&state).reset_slots().await?;
    Ok(Json(slots))
}
