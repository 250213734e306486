//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{debug, info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Events carry the participant field schema as JSON
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                fields TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            );

            -- Participants table
            CREATE TABLE IF NOT EXISTS participants (
                id TEXT PRIMARY KEY,
                event_id TEXT NOT NULL,
                profile TEXT NOT NULL DEFAULT '{}',
                registration_status TEXT NOT NULL,
                badge_code TEXT UNIQUE,
                email_key TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
            );

            -- Courses table
            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                event_id TEXT NOT NULL,
                title TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                requires_registration INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
            );

            -- Course registrations table
            CREATE TABLE IF NOT EXISTS registrations (
                id TEXT PRIMARY KEY,
                participant_id TEXT NOT NULL,
                course_id TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (participant_id) REFERENCES participants(id) ON DELETE CASCADE,
                FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE,
                UNIQUE(participant_id, course_id)
            );

            -- Halls table
            CREATE TABLE IF NOT EXISTS halls (
                id TEXT PRIMARY KEY,
                event_id TEXT NOT NULL,
                name TEXT NOT NULL,
                fields TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
            );

            -- Attendance table
            CREATE TABLE IF NOT EXISTS attendances (
                id TEXT PRIMARY KEY,
                participant_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                course_id TEXT,
                hall_id TEXT,
                check_in_time TEXT,
                check_out_time TEXT,
                scanned_by TEXT,
                FOREIGN KEY (participant_id) REFERENCES participants(id) ON DELETE CASCADE,
                FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE,
                FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE,
                FOREIGN KEY (hall_id) REFERENCES halls(id) ON DELETE SET NULL
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add uniqueness and lookup indexes",
        sql: r#"
            -- One participant per normalized email within an event
            CREATE UNIQUE INDEX IF NOT EXISTS idx_participants_event_email
                ON participants(event_id, email_key) WHERE email_key IS NOT NULL;
            CREATE INDEX IF NOT EXISTS idx_participants_event ON participants(event_id);

            -- One attendance per participant and course; a NULL course is its own key
            CREATE UNIQUE INDEX IF NOT EXISTS idx_attendances_participant_course
                ON attendances(participant_id, IFNULL(course_id, ''));
            CREATE INDEX IF NOT EXISTS idx_attendances_event ON attendances(event_id);

            CREATE INDEX IF NOT EXISTS idx_courses_event ON courses(event_id);
            CREATE INDEX IF NOT EXISTS idx_registrations_course ON registrations(course_id);
            CREATE INDEX IF NOT EXISTS idx_halls_event ON halls(event_id);
        "#,
    },
];

/// Create the bookkeeping table on first open
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Highest applied version, 0 on a fresh database
pub(crate) fn current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Apply one migration and its bookkeeping row atomically
fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    tx.commit()?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let from = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        debug!(version = from, "Schema up to date");
        return Ok(());
    }

    for migration in pending {
        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );
        apply(conn, migration)?;
    }

    info!(from, to = current_version(conn)?, "Database schema updated");
    Ok(())
}
