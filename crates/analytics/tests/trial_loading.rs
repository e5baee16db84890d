use analytics::{AnalyticsError, Trial};
use async_trait::async_trait;
use core_types::{CellValue, ColumnLayout, RawRow};
use database::{DbError, QueryConnection, SqlQuery};
use ndarray::array;
use sqlx::{Connection, SqliteConnection};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

async fn seeded_db(statements: &[&str]) -> SqliteConnection {
    let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
    sqlx::query(
        "CREATE TABLE data (id INTEGER PRIMARY KEY, trial_id TEXT, patient_id INTEGER, day_1, day_2, day_3)",
    )
    .execute(&mut conn)
    .await
    .unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&mut conn).await.unwrap();
    }
    conn
}

/// Serves canned rows and counts how often it is closed.
struct CannedConnection {
    rows: Vec<RawRow>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl QueryConnection for CannedConnection {
    async fn fetch_all(&mut self, _query: &SqlQuery) -> Result<Vec<RawRow>, DbError> {
        Ok(std::mem::take(&mut self.rows))
    }

    async fn close(self) -> Result<(), DbError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn csv_fixture_loads_into_a_trial() {
    let trial = Trial::from_csv(fixture("inflammation-small.csv"), "small").unwrap();
    assert_eq!(trial.id(), "small");
    assert_eq!(trial.shape(), (4, 6));
    assert_eq!(trial.daily_max().unwrap(), array![0.0, 1.0, 2.0, 3.0, 4.0, 2.0]);
    assert_eq!(trial.get_patient(3).unwrap().daily_max().unwrap(), 4.0);
}

#[test]
fn ragged_csv_is_a_parse_error() {
    let err = Trial::from_csv(fixture("ragged.csv"), "bad").unwrap_err();
    assert!(matches!(err, AnalyticsError::Parse(_)));
}

#[tokio::test]
async fn query_builds_a_trial_for_one_identifier() {
    let conn = seeded_db(&[
        "INSERT INTO data VALUES (1, 'A', 10, 0, 1, 2), (2, 'A', 11, 3.0, '4', 5), (3, 'B', 12, 9, 9, 9)",
    ])
    .await;

    let trial = Trial::from_query(Some(conn), "A", &ColumnLayout::default())
        .await
        .unwrap();

    assert_eq!(trial.id(), "A");
    assert_eq!(trial.data(), &array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
    assert_eq!(trial.daily_mean().unwrap(), array![1.5, 2.5, 3.5]);
    assert_eq!(trial.get_patient(1).unwrap().id(), "11");
}

#[tokio::test]
async fn query_with_one_row_keeps_the_patient_axis() {
    let conn = seeded_db(&["INSERT INTO data VALUES (1, 'solo', 1, 4, 5, 6)"]).await;

    let trial = Trial::from_query(Some(conn), "solo", &ColumnLayout::default())
        .await
        .unwrap();

    assert_eq!(trial.shape(), (1, 3));
    assert_eq!(trial.daily_max().unwrap(), array![4.0, 5.0, 6.0]);
    assert_eq!(trial.normalise().unwrap(), array![[4.0 / 6.0, 5.0 / 6.0, 1.0]]);
}

#[tokio::test]
async fn query_for_unknown_trial_is_an_empty_result() {
    let conn = seeded_db(&["INSERT INTO data VALUES (1, 'A', 1, 4, 5, 6)"]).await;

    let err = Trial::from_query(Some(conn), "missing", &ColumnLayout::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyticsError::EmptyResult { ref trial_id } if trial_id == "missing"));
}

#[tokio::test]
async fn empty_result_path_still_closes_the_connection() {
    let closes = Arc::new(AtomicUsize::new(0));
    let conn = CannedConnection {
        rows: Vec::new(),
        closes: closes.clone(),
    };

    let err = Trial::from_query(Some(conn), "A", &ColumnLayout::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyticsError::EmptyResult { .. }));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn query_without_connection_is_a_connection_error() {
    let err = Trial::from_query::<SqliteConnection>(None, "A", &ColumnLayout::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::Connection));
}

#[tokio::test]
async fn non_numeric_readings_are_reported_together() {
    let conn = seeded_db(&[
        "INSERT INTO data VALUES (1, 'A', 1, 'high', 5, 6), (2, 'A', 2, 1, 2, NULL)",
    ])
    .await;

    let err = Trial::from_query(Some(conn), "A", &ColumnLayout::default())
        .await
        .unwrap_err();

    match err {
        AnalyticsError::TypeConversion { failures } => {
            let cells: Vec<_> = failures
                .iter()
                .map(|f| (f.patient_id.as_str(), f.column.as_str()))
                .collect();
            assert_eq!(cells, vec![("1", "day_1"), ("2", "day_3")]);
        }
        other => panic!("expected a conversion error, got {other:?}"),
    }
}

#[tokio::test]
async fn custom_column_layout_is_honoured() {
    let closes = Arc::new(AtomicUsize::new(0));
    let row = |patient: &str, a: i64, b: i64| {
        RawRow::default()
            .with("reading_a", CellValue::Integer(a))
            .with("patient", CellValue::Text(patient.to_string()))
            .with("reading_b", CellValue::Integer(b))
            .with("trial", CellValue::Text("T".to_string()))
            .with("rowid", CellValue::Integer(0))
    };
    let conn = CannedConnection {
        rows: vec![row("x", 1, 2), row("y", 3, 4)],
        closes: closes.clone(),
    };
    let layout = ColumnLayout {
        row_key: "rowid".to_string(),
        trial_id: "trial".to_string(),
        patient_id: "patient".to_string(),
    };

    let trial = Trial::from_query(Some(conn), "T", &layout).await.unwrap();

    assert_eq!(trial.data(), &array![[1.0, 2.0], [3.0, 4.0]]);
    assert_eq!(trial.patient_ids(), Some(&["x".to_string(), "y".to_string()][..]));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rows_from_another_trial_are_rejected_and_closed() {
    let closes = Arc::new(AtomicUsize::new(0));
    let conn = CannedConnection {
        rows: vec![RawRow::default()
            .with("id", CellValue::Integer(1))
            .with("trial_id", CellValue::Text("other".to_string()))
            .with("patient_id", CellValue::Integer(1))
            .with("day_1", CellValue::Integer(3))],
        closes: closes.clone(),
    };

    let err = Trial::from_query(Some(conn), "A", &ColumnLayout::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyticsError::Shape(_)));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}
