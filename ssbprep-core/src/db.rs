use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::types::{Difficulty, Report, ReportStatus, Scenario, TestKind, Topic};

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// This function is the single entry point for all database connections.
/// It sets `busy_timeout` via the `Connection` method (not a PRAGMA string) to
/// ensure the setting takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok(())
    })
    .await?;

    // Checkpoint any leftover WAL from a previous run.
    conn.call(|db| {
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok(())
    })
    .await?;

    Ok(conn)
}

/// Returns the current Unix timestamp in seconds.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

// ---------------------------------------------------------------------------
// Content cache
// ---------------------------------------------------------------------------

/// Returns cached content for `(category, date_key)`, or `None` on a miss.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn cache_get(
    conn: &Connection,
    category: &str,
    date_key: &str,
) -> Result<Option<String>, tokio_rusqlite::Error> {
    let category = category.to_owned();
    let date_key = date_key.to_owned();

    conn.call(move |db| {
        let content = db
            .query_row(
                "SELECT content FROM content_cache WHERE category = ?1 AND date_key = ?2",
                rusqlite::params![&category, &date_key],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok(content)
    })
    .await
}

/// Writes `content` under `(category, date_key)`, replacing any previous entry.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the upsert transaction fails.
pub async fn cache_put(
    conn: &Connection,
    category: &str,
    date_key: &str,
    content: &str,
) -> Result<(), tokio_rusqlite::Error> {
    let category = category.to_owned();
    let date_key = date_key.to_owned();
    let content = content.to_owned();

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO content_cache (category, date_key, content, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(category, date_key)
             DO UPDATE SET content = excluded.content,
                           created_at = excluded.created_at",
            rusqlite::params![&category, &date_key, &content, now_secs()],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Loads every GPE scenario, ordered by difficulty then title.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn list_scenarios(conn: &Connection) -> Result<Vec<Scenario>, tokio_rusqlite::Error> {
    conn.call(|db| {
        let mut stmt = db.prepare(
            "SELECT id, title, narrative, difficulty, image_ref FROM scenarios
             ORDER BY CASE difficulty WHEN 'easy' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END, title",
        )?;
        let rows = stmt
            .query_map([], |r| {
                let difficulty: String = r.get(3)?;
                Ok(Scenario {
                    id: r.get(0)?,
                    title: r.get(1)?,
                    narrative: r.get(2)?,
                    difficulty: Difficulty::parse(&difficulty),
                    image_ref: r.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

/// Loads every lecturette topic, ordered by category then title.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn list_topics(conn: &Connection) -> Result<Vec<Topic>, tokio_rusqlite::Error> {
    conn.call(|db| {
        let mut stmt = db.prepare(
            "SELECT id, title, category, difficulty FROM topics ORDER BY category, title",
        )?;
        let rows = stmt
            .query_map([], |r| {
                let difficulty: String = r.get(3)?;
                Ok(Topic {
                    id: r.get(0)?,
                    title: r.get(1)?,
                    category: r.get(2)?,
                    difficulty: Difficulty::parse(&difficulty),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

const REPORT_COLUMNS: &str =
    "id, test_kind, status, title, inputs, evaluation, score, created_at, updated_at";

fn report_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    let kind: String = r.get(1)?;
    let status: String = r.get(2)?;
    let test_kind = TestKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown test kind '{kind}'").into(),
        )
    })?;
    Ok(Report {
        id: r.get(0)?,
        test_kind,
        status: ReportStatus::parse(&status),
        title: r.get(3)?,
        inputs: r.get(4)?,
        evaluation: r.get(5)?,
        score: r.get(6)?,
        created_at: r.get(7)?,
        updated_at: r.get(8)?,
    })
}

/// Inserts a new `PENDING` report holding the serialized evaluation inputs.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the insert transaction fails.
pub async fn insert_report(
    conn: &Connection,
    test_kind: TestKind,
    title: &str,
    inputs: &str,
) -> Result<Report, tokio_rusqlite::Error> {
    let title = title.to_owned();
    let inputs = inputs.to_owned();

    conn.call(move |db| {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO reports (id, test_kind, status, title, inputs, created_at, updated_at)
             VALUES (?1, ?2, 'PENDING', ?3, ?4, ?5, ?5)",
            rusqlite::params![&id, test_kind.as_str(), &title, &inputs, now],
        )?;
        tx.commit()?;
        Ok(Report {
            id,
            test_kind,
            status: ReportStatus::Pending,
            title,
            inputs,
            evaluation: None,
            score: None,
            created_at: now,
            updated_at: now,
        })
    })
    .await
}

/// Stores an evaluation on `report_id` and moves it to `COMPLETED`.
///
/// Returns `false` when no row matched.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the update transaction fails.
pub async fn complete_report(
    conn: &Connection,
    report_id: &str,
    evaluation: &str,
    score: f64,
) -> Result<bool, tokio_rusqlite::Error> {
    let report_id = report_id.to_owned();
    let evaluation = evaluation.to_owned();

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE reports
             SET status = 'COMPLETED', evaluation = ?1, score = ?2, updated_at = ?3
             WHERE id = ?4",
            rusqlite::params![&evaluation, score, now_secs(), &report_id],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    })
    .await
}

/// Loads a single report by id.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn load_report(
    conn: &Connection,
    report_id: &str,
) -> Result<Option<Report>, tokio_rusqlite::Error> {
    let report_id = report_id.to_owned();

    conn.call(move |db| {
        let report = db
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
                rusqlite::params![&report_id],
                report_from_row,
            )
            .optional()?;
        Ok(report)
    })
    .await
}

/// Lists the most recent `limit` reports, newest first.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn list_reports(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<Report>, tokio_rusqlite::Error> {
    conn.call(move |db| {
        let mut stmt = db.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map(rusqlite::params![limit as i64], report_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}
