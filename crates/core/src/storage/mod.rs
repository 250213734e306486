//! SQLite storage layer for Rollcall

mod attendance;
mod courses;
mod events;
mod halls;
mod migrations;
mod parse;
mod participants;
mod registrations;
mod traits;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::identity::IdentityKey;
use crate::models::{Attendance, Course, Event, Hall, Participant, Registration, RegistrationStatus};

pub use attendance::AttendanceStore;
pub use courses::CourseStore;
pub use events::EventStore;
pub use halls::HallStore;
pub use participants::ParticipantStore;
pub use registrations::RegistrationStore;
pub use traits::{
    AttendanceRepository, CourseRepository, EventRepository, HallRepository,
    ParticipantRepository, RegistrationRepository, Storage,
};

/// Default wait for a locked database before giving up
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Main database handle
///
/// Wraps one connection. Concurrent callers each open their own handle on
/// the same file; uniqueness is enforced by the schema, not by the handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open or create database, waiting up to `busy_timeout` on locks
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open_with_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<u32> {
        migrations::current_version(&self.conn)
    }

    pub fn events(&self) -> EventStore<'_> {
        EventStore::new(&self.conn)
    }

    pub fn participants(&self) -> ParticipantStore<'_> {
        ParticipantStore::new(&self.conn)
    }

    pub fn courses(&self) -> CourseStore<'_> {
        CourseStore::new(&self.conn)
    }

    pub fn registrations(&self) -> RegistrationStore<'_> {
        RegistrationStore::new(&self.conn)
    }

    pub fn attendances(&self) -> AttendanceStore<'_> {
        AttendanceStore::new(&self.conn)
    }

    pub fn halls(&self) -> HallStore<'_> {
        HallStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl EventRepository for Database {
    fn create_event(&self, event: &Event) -> Result<()> {
        self.events().create(event)
    }

    fn find_event_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        self.events().find_by_id(id)
    }
}

impl ParticipantRepository for Database {
    fn create_participant(&self, participant: &Participant, key: &IdentityKey) -> Result<()> {
        self.participants()
            .create(participant, key.email.as_deref())
    }

    fn find_participant_by_id(&self, id: Uuid) -> Result<Option<Participant>> {
        self.participants().find_by_id(id)
    }

    fn find_participant_by_badge(&self, badge_code: &str) -> Result<Option<Participant>> {
        self.participants().find_by_badge(badge_code)
    }

    fn list_participants_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        self.participants().list_for_event(event_id)
    }

    fn assign_badge_code(&self, participant_id: Uuid, badge_code: &str) -> Result<bool> {
        self.participants().set_badge_code(participant_id, badge_code)
    }
}

impl CourseRepository for Database {
    fn create_course(&self, course: &Course) -> Result<()> {
        self.courses().create(course)
    }

    fn find_course_by_id(&self, id: Uuid) -> Result<Option<Course>> {
        self.courses().find_by_id(id)
    }
}

impl RegistrationRepository for Database {
    fn create_registration(&self, registration: &Registration) -> Result<()> {
        self.registrations().create(registration)
    }

    fn find_registration(
        &self,
        participant_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Registration>> {
        self.registrations().find(participant_id, course_id)
    }

    fn update_registration_status(
        &self,
        participant_id: Uuid,
        course_id: Uuid,
        status: RegistrationStatus,
    ) -> Result<bool> {
        self.registrations()
            .update_status(participant_id, course_id, status)
    }
}

impl AttendanceRepository for Database {
    fn create_attendance(&self, attendance: &Attendance) -> Result<()> {
        self.attendances().create(attendance)
    }

    fn find_attendance(
        &self,
        participant_id: Uuid,
        course_id: Option<Uuid>,
    ) -> Result<Option<Attendance>> {
        self.attendances().find(participant_id, course_id)
    }

    fn find_attendance_by_id(&self, id: Uuid) -> Result<Option<Attendance>> {
        self.attendances().find_by_id(id)
    }

    fn mark_checked_in(
        &self,
        attendance_id: Uuid,
        at: DateTime<Utc>,
        hall_id: Option<Uuid>,
        scanned_by: Option<Uuid>,
    ) -> Result<bool> {
        self.attendances()
            .mark_checked_in(attendance_id, at, hall_id, scanned_by)
    }

    fn mark_checked_out(&self, attendance_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        self.attendances().mark_checked_out(attendance_id, at)
    }
}

impl HallRepository for Database {
    fn create_hall(&self, hall: &Hall) -> Result<()> {
        self.halls().create(hall)
    }

    fn find_hall_by_id(&self, id: Uuid) -> Result<Option<Hall>> {
        self.halls().find_by_id(id)
    }
}
