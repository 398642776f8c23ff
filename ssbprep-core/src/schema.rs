/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the full v1 schema.
///
/// Contains four tables:
/// - `content_cache`: once-per-day generated content keyed by `(category, date_key)`.
/// - `reports`: persisted assessments with a `PENDING → COMPLETED` status column.
/// - `scenarios`: GPE scenario catalog (seeded from [`crate::catalog`]).
/// - `topics`: lecturette topic catalog (seeded from [`crate::catalog`]).
///
/// All tables use `STRICT` mode for type enforcement.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS content_cache (
        category    TEXT    NOT NULL,
        date_key    TEXT    NOT NULL,
        content     TEXT    NOT NULL,
        created_at  INTEGER NOT NULL,
        PRIMARY KEY (category, date_key)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS reports (
        id          TEXT    PRIMARY KEY,
        test_kind   TEXT    NOT NULL
                            CHECK(test_kind IN ('gpe', 'lecturette', 'screening')),
        status      TEXT    NOT NULL DEFAULT 'PENDING'
                            CHECK(status IN ('PENDING', 'COMPLETED')),
        title       TEXT    NOT NULL,
        inputs      TEXT    NOT NULL,
        evaluation  TEXT,
        score       REAL,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    ) STRICT;

    CREATE INDEX IF NOT EXISTS reports_by_created ON reports(created_at DESC);

    CREATE TABLE IF NOT EXISTS scenarios (
        id          TEXT    PRIMARY KEY,
        title       TEXT    NOT NULL,
        narrative   TEXT    NOT NULL,
        difficulty  TEXT    NOT NULL
                            CHECK(difficulty IN ('easy', 'medium', 'hard')),
        image_ref   TEXT
    ) STRICT;

    CREATE TABLE IF NOT EXISTS topics (
        id          TEXT    PRIMARY KEY,
        title       TEXT    NOT NULL,
        category    TEXT    NOT NULL,
        difficulty  TEXT    NOT NULL
                            CHECK(difficulty IN ('easy', 'medium', 'hard'))
    ) STRICT;
";

/// Runs forward-only schema migration to migrate the DB to the latest version.
///
/// Idempotent: safe to call on every startup.
///
/// # Process
///
/// 1. Creates the `schema_version` table if it does not exist.
/// 2. Reads the current version (`0` if the table is empty).
/// 3. If the version is below 1, applies `SCHEMA_V1_SQL` and seeds the scenario and
///    topic catalogs inside one `BEGIN IMMEDIATE` transaction, then records `version = 1`.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        seed_catalog(&tx)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}

fn seed_catalog(tx: &rusqlite::Transaction<'_>) -> rusqlite::Result<()> {
    for s in crate::catalog::default_scenarios() {
        tx.execute(
            "INSERT OR IGNORE INTO scenarios (id, title, narrative, difficulty, image_ref)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![s.id, s.title, s.narrative, s.difficulty.as_str(), s.image_ref],
        )?;
    }
    for t in crate::catalog::default_topics() {
        tx.execute(
            "INSERT OR IGNORE INTO topics (id, title, category, difficulty)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![t.id, t.title, t.category, t.difficulty.as_str()],
        )?;
    }
    Ok(())
}
