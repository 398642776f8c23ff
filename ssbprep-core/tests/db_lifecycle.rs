//! Integration test for the SQLite store.
//!
//! Exercises: open_db, migrate, catalog seeding, cache_get/cache_put,
//! insert_report, complete_report, load_report, list_reports.

mod common;

use ssbprep_core::db;
use ssbprep_core::types::{ReportStatus, TestKind};

#[tokio::test]
async fn schema_and_catalog_are_ready_after_open() {
    let (conn, dir) = common::temp_db().await;

    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?)
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    let cache_pk: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT COUNT(*) FROM pragma_table_info('content_cache') WHERE pk > 0",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(cache_pk, 2, "content_cache should have composite PK");

    let scenarios = db::list_scenarios(&conn).await.unwrap();
    assert_eq!(scenarios.len(), 3);
    assert_eq!(scenarios[0].id, "gpe-railway-halt", "easy scenarios sort first");
    let topics = db::list_topics(&conn).await.unwrap();
    assert_eq!(topics.len(), 8);

    // Reopening must not re-seed or fail.
    let conn2 = db::open_db(&dir.join("test.db").to_string_lossy()).await.unwrap();
    assert_eq!(db::list_scenarios(&conn2).await.unwrap().len(), 3);
}

#[tokio::test]
async fn cache_is_keyed_by_category_and_date() {
    let (conn, _dir) = common::temp_db().await;

    assert_eq!(db::cache_get(&conn, "current_affairs", "2026-01-01").await.unwrap(), None);

    db::cache_put(&conn, "current_affairs", "2026-01-01", "first").await.unwrap();
    db::cache_put(&conn, "current_affairs", "2026-01-01", "second").await.unwrap();
    db::cache_put(&conn, "other", "2026-01-01", "unrelated").await.unwrap();

    assert_eq!(
        db::cache_get(&conn, "current_affairs", "2026-01-01").await.unwrap().as_deref(),
        Some("second"),
        "put should upsert"
    );
    assert_eq!(db::cache_get(&conn, "current_affairs", "2026-01-02").await.unwrap(), None);
}

#[tokio::test]
async fn report_moves_from_pending_to_completed() {
    let (conn, dir) = common::temp_db().await;

    let report = db::insert_report(&conn, TestKind::Lecturette, "Lecturette: Space", "{}")
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::Pending);
    assert!(!report.id.is_empty());

    let loaded = db::load_report(&conn, &report.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, ReportStatus::Pending);
    assert_eq!(loaded.evaluation, None);

    assert!(db::complete_report(&conn, &report.id, "{\"x\":1}", 6.5).await.unwrap());
    assert!(!db::complete_report(&conn, "missing", "{}", 1.0).await.unwrap());

    let conn2 = db::open_db(&dir.join("test.db").to_string_lossy()).await.unwrap();
    let done = db::load_report(&conn2, &report.id).await.unwrap().unwrap();
    assert_eq!(done.status, ReportStatus::Completed);
    assert_eq!(done.score, Some(6.5));
    assert_eq!(done.test_kind, TestKind::Lecturette);
}

#[tokio::test]
async fn reports_list_newest_first() {
    let (conn, _dir) = common::temp_db().await;
    let a = db::insert_report(&conn, TestKind::Gpe, "a", "{}").await.unwrap();
    let b = db::insert_report(&conn, TestKind::Screening, "b", "{}").await.unwrap();

    let listed = db::list_reports(&conn, 10).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, b.id);
    assert_eq!(listed[1].id, a.id);

    assert_eq!(db::list_reports(&conn, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_test_kind_is_rejected_by_schema() {
    let (conn, _dir) = common::temp_db().await;
    let result = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.execute(
                "INSERT INTO reports (id, test_kind, title, inputs, created_at, updated_at)
                 VALUES ('x', 'tat', 't', '{}', 0, 0)",
                [],
            )?)
        })
        .await;
    assert!(result.is_err());
}
