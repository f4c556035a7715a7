use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use horarios_backend::db::{self, repository};
use horarios_backend::error::AppError;
use horarios_backend::models::{ClassKind, NewEntryRequest, ScheduleEntry, TeacherType, Weekday};
use horarios_backend::services::{DataSource, ScheduleStore, indexes, store::sample_entries};
use horarios_backend::sheet::SheetSource;

struct FixedSheet(&'static str);

#[async_trait]
impl SheetSource for FixedSheet {
    async fn fetch_csv(&self) -> Result<String, AppError> {
        Ok(self.0.to_string())
    }
}

struct FailingSheet;

#[async_trait]
impl SheetSource for FailingSheet {
    async fn fetch_csv(&self) -> Result<String, AppError> {
        Err(AppError::Fetch("sheet endpoint returned 404 Not Found".to_string()))
    }
}

const SHEET_CSV: &str = "\
Curso,Día,Horario,Materia,Profesor,Tipo,Cargo
1° A,Lunes,08:00 - 08:45,Matemáticas,Prof. García,teoria,titular
1° A,Lunes,08:45 - 09:30,Lengua,Prof. Martínez,teoria,titular
2° B,Lunes,08:00 - 08:45,Física,Prof. Fernández,taller,suplente
";

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test db");
    db::run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

fn local_entry(grade: &str, subject: &str) -> ScheduleEntry {
    ScheduleEntry::new(
        grade.into(),
        Weekday::Viernes,
        "13:30 - 14:15".into(),
        subject.into(),
        "Prof. Local".into(),
        ClassKind::Teoria,
        TeacherType::Titular,
    )
}

#[tokio::test]
async fn remote_load_wins_and_persists() {
    let pool = setup_test_db().await;
    let store = ScheduleStore::new(pool.clone(), Some(Arc::new(FixedSheet(SHEET_CSV))));

    let outcome = store.load().await.unwrap();
    assert_eq!(outcome.source, DataSource::Remote);
    assert!(outcome.warning.is_none());
    assert_eq!(outcome.entries.len(), 3);

    let persisted = repository::load_entries(&pool).await.unwrap().unwrap();
    assert_eq!(persisted.len(), 3);
    assert_eq!(persisted[2].kind, ClassKind::Taller);
    assert_eq!(persisted[2].teacher_type, TeacherType::Suplente);
}

#[tokio::test]
async fn remote_failure_falls_back_to_persisted_with_warning() {
    let pool = setup_test_db().await;
    let saved = vec![local_entry("3° C", "Química")];
    repository::save_entries(&pool, &saved).await.unwrap();

    let store = ScheduleStore::new(pool, Some(Arc::new(FailingSheet)));
    let outcome = store.load().await.unwrap();

    assert_eq!(outcome.source, DataSource::Local);
    assert!(outcome.warning.is_some());
    assert_eq!(outcome.entries, saved);
}

#[tokio::test]
async fn remote_failure_with_no_local_data_falls_back_to_sample() {
    let pool = setup_test_db().await;
    let store = ScheduleStore::new(pool, Some(Arc::new(FailingSheet)));

    let outcome = store.load().await.unwrap();
    assert_eq!(outcome.source, DataSource::Sample);
    assert!(outcome.warning.is_some());

    let index = indexes::build(&outcome.entries);
    assert_eq!(index.grades, vec!["1° A", "2° B"]);
}

#[tokio::test]
async fn unparseable_remote_body_falls_back() {
    let pool = setup_test_db().await;
    let store = ScheduleStore::new(pool, Some(Arc::new(FixedSheet("Curso,Día,Horario\n"))));

    let outcome = store.load().await.unwrap();
    assert_eq!(outcome.source, DataSource::Sample);
    assert!(outcome.warning.is_some());
}

#[tokio::test]
async fn local_only_mode_reads_persisted_then_sample() {
    let pool = setup_test_db().await;
    let store = ScheduleStore::new(pool.clone(), None);

    let outcome = store.load().await.unwrap();
    assert_eq!(outcome.source, DataSource::Sample);
    assert!(outcome.warning.is_none());
    assert_eq!(outcome.entries.len(), sample_entries().len());

    let saved = vec![local_entry("3° C", "Química")];
    repository::save_entries(&pool, &saved).await.unwrap();
    let outcome = store.load().await.unwrap();
    assert_eq!(outcome.source, DataSource::Local);
    assert_eq!(outcome.entries, saved);
}

#[tokio::test]
async fn repeated_loads_yield_identical_indexes() {
    let pool = setup_test_db().await;
    let saved = vec![
        local_entry("2° B", "Física"),
        local_entry("1° A", "Matemáticas"),
    ];
    repository::save_entries(&pool, &saved).await.unwrap();

    let store = ScheduleStore::new(pool, None);
    let first = indexes::build(&store.load().await.unwrap().entries);
    let second = indexes::build(&store.load().await.unwrap().entries);
    assert_eq!(first, second);
}

#[tokio::test]
async fn deleting_the_last_entry_leaves_the_schedule_empty() {
    let pool = setup_test_db().await;
    let store = ScheduleStore::new(pool.clone(), None);

    let saved = vec![local_entry("3° C", "Química")];
    store.replace_all(saved.clone()).await.unwrap();
    assert!(store.remove(&saved[0].id).await.unwrap());

    // an empty saved list is real data; the sample set must not resurface
    assert!(store.current().await.unwrap().is_empty());
    let outcome = store.load().await.unwrap();
    assert_eq!(outcome.source, DataSource::Local);
    assert!(outcome.entries.is_empty());
}

#[tokio::test]
async fn add_after_clearing_persists_only_the_new_entry() {
    let pool = setup_test_db().await;
    let store = ScheduleStore::new(pool.clone(), None);

    let saved = vec![local_entry("3° C", "Química")];
    store.replace_all(saved.clone()).await.unwrap();
    assert!(store.remove(&saved[0].id).await.unwrap());

    let added = store
        .add(NewEntryRequest {
            grade: "4° D".into(),
            day: "Viernes".into(),
            time: "13:30 - 14:15".into(),
            subject: "Inglés".into(),
            teacher: Some("Prof. Brown".into()),
            kind: None,
            teacher_type: None,
        })
        .await
        .unwrap();

    let persisted = repository::load_entries(&pool).await.unwrap().unwrap();
    assert_eq!(persisted, vec![added]);
}

#[tokio::test]
async fn sample_entry_can_be_removed_by_its_served_id() {
    let pool = setup_test_db().await;
    let store = ScheduleStore::new(pool.clone(), None);

    let served = store.current().await.unwrap();
    let victim = served[0].id.clone();
    assert!(store.remove(&victim).await.unwrap());

    let persisted = repository::load_entries(&pool).await.unwrap().unwrap();
    assert_eq!(persisted.len(), served.len() - 1);
    assert!(persisted.iter().all(|e| e.id != victim));
}

#[tokio::test]
async fn refresh_replace_drops_local_only_entries() {
    let pool = setup_test_db().await;
    repository::save_entries(&pool, &[local_entry("3° C", "Química")])
        .await
        .unwrap();

    let store = ScheduleStore::new(pool.clone(), Some(Arc::new(FixedSheet(SHEET_CSV))));
    let stats = store.refresh(false).await.unwrap();

    assert_eq!(stats.fetched, 3);
    assert_eq!(stats.kept_local, 0);
    assert_eq!(stats.total, 3);

    let persisted = repository::load_entries(&pool).await.unwrap().unwrap();
    assert!(persisted.iter().all(|e| e.subject != "Química"));
}

#[tokio::test]
async fn refresh_merge_keeps_local_only_and_dedups() {
    let pool = setup_test_db().await;
    // duplicates a remote row on (grade, day, time, subject)
    let duplicate = ScheduleEntry::new(
        "1° A".into(),
        Weekday::Lunes,
        "08:00 - 08:45".into(),
        "Matemáticas".into(),
        "Prof. Viejo".into(),
        ClassKind::Teoria,
        TeacherType::Titular,
    );
    let local_only = local_entry("3° C", "Química");
    repository::save_entries(&pool, &[duplicate, local_only.clone()])
        .await
        .unwrap();

    let store = ScheduleStore::new(pool.clone(), Some(Arc::new(FixedSheet(SHEET_CSV))));
    let stats = store.refresh(true).await.unwrap();

    assert_eq!(stats.fetched, 3);
    assert_eq!(stats.kept_local, 1);
    assert_eq!(stats.total, 4);

    let persisted = repository::load_entries(&pool).await.unwrap().unwrap();
    assert!(persisted.contains(&local_only));
    let mates: Vec<_> = persisted
        .iter()
        .filter(|e| e.subject == "Matemáticas")
        .collect();
    assert_eq!(mates.len(), 1);
    assert_eq!(mates[0].teacher, "Prof. García");
}

#[tokio::test]
async fn refresh_without_sheet_source_is_a_bad_request() {
    let pool = setup_test_db().await;
    let store = ScheduleStore::new(pool, None);
    assert!(matches!(
        store.refresh(false).await,
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn serialize_parse_replace_round_trips() {
    let pool = setup_test_db().await;
    let store = ScheduleStore::new(pool.clone(), None);

    let original = vec![
        ScheduleEntry::new(
            "1° A".into(),
            Weekday::Lunes,
            "08:00 - 08:45".into(),
            "Matemáticas, Avanzada".into(),
            "Prof. García".into(),
            ClassKind::Teoria,
            TeacherType::Titular,
        ),
        ScheduleEntry::new(
            "2° B".into(),
            Weekday::Jueves,
            "12:00 - 12:45".into(),
            "Taller de Soldadura".into(),
            "Prof. López".into(),
            ClassKind::Taller,
            TeacherType::Provisional,
        ),
    ];

    let mut text = String::from("Curso,Día,Horario,Materia,Profesor,Tipo,Cargo\n");
    for e in &original {
        let kind = match e.kind {
            ClassKind::Teoria => "teoria",
            ClassKind::Taller => "taller",
        };
        let teacher_type = match e.teacher_type {
            TeacherType::Titular => "titular",
            TeacherType::Suplente => "suplente",
            TeacherType::Provisional => "provisional",
        };
        text.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\n",
            e.grade, e.day, e.time, e.subject, e.teacher, kind, teacher_type
        ));
    }

    let outcome = horarios_backend::csv::parse_csv(&text).unwrap();
    assert!(outcome.errors.is_empty());
    store.replace_all(outcome.entries).await.unwrap();

    let restored = store.current().await.unwrap();
    assert_eq!(restored.len(), original.len());
    for (restored, original) in restored.iter().zip(&original) {
        assert_ne!(restored.id, original.id);
        assert_eq!(restored.grade, original.grade);
        assert_eq!(restored.day, original.day);
        assert_eq!(restored.time, original.time);
        assert_eq!(restored.subject, original.subject);
        assert_eq!(restored.teacher, original.teacher);
        assert_eq!(restored.kind, original.kind);
        assert_eq!(restored.teacher_type, original.teacher_type);
    }
}
