//! Attendance storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime_opt, parse_uuid, parse_uuid_opt, OptionalExt};
use crate::error::{Error, Result};
use crate::models::Attendance;

const COLUMNS: &str =
    "id, participant_id, event_id, course_id, hall_id, check_in_time, check_out_time, scanned_by";

pub struct AttendanceStore<'a> {
    conn: &'a Connection,
}

fn attendance_from_row(row: &Row<'_>) -> rusqlite::Result<Attendance> {
    Ok(Attendance {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        participant_id: parse_uuid(&row.get::<_, String>(1)?)?,
        event_id: parse_uuid(&row.get::<_, String>(2)?)?,
        course_id: parse_uuid_opt(row.get::<_, Option<String>>(3)?)?,
        hall_id: parse_uuid_opt(row.get::<_, Option<String>>(4)?)?,
        check_in_time: parse_datetime_opt(row.get::<_, Option<String>>(5)?)?,
        check_out_time: parse_datetime_opt(row.get::<_, Option<String>>(6)?)?,
        scanned_by: parse_uuid_opt(row.get::<_, Option<String>>(7)?)?,
    })
}

impl<'a> AttendanceStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert an attendance row
    ///
    /// Fails with `Duplicate` when the (participant, course) pair already has one.
    #[instrument(skip(self, attendance), fields(participant_id = %attendance.participant_id, course_id = ?attendance.course_id))]
    pub fn create(&self, attendance: &Attendance) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO attendances (id, participant_id, event_id, course_id, hall_id, check_in_time, check_out_time, scanned_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    attendance.id.to_string(),
                    attendance.participant_id.to_string(),
                    attendance.event_id.to_string(),
                    attendance.course_id.map(|c| c.to_string()),
                    attendance.hall_id.map(|h| h.to_string()),
                    attendance.check_in_time.map(|t| t.to_rfc3339()),
                    attendance.check_out_time.map(|t| t.to_rfc3339()),
                    attendance.scanned_by.map(|s| s.to_string()),
                ],
            )
            .map_err(|e| Error::from_write(e, "attendance"))?;
        Ok(())
    }

    /// Find attendance by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Attendance>> {
        let attendance = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM attendances WHERE id = ?1"),
                params![id.to_string()],
                attendance_from_row,
            )
            .optional()?;
        Ok(attendance)
    }

    /// Find the row of a (participant, course) pair; `None` course means event level
    #[instrument(skip(self))]
    pub fn find(&self, participant_id: Uuid, course_id: Option<Uuid>) -> Result<Option<Attendance>> {
        let attendance = self
            .conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM attendances WHERE participant_id = ?1 AND course_id IS ?2"
                ),
                params![participant_id.to_string(), course_id.map(|c| c.to_string())],
                attendance_from_row,
            )
            .optional()?;
        Ok(attendance)
    }

    /// List the attendance rows of an event
    #[instrument(skip(self))]
    pub fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Attendance>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM attendances WHERE event_id = ?1 ORDER BY check_in_time"
        ))?;

        let rows = stmt
            .query_map(params![event_id.to_string()], attendance_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Count rows of a participant across all courses
    pub fn count_for_participant(&self, participant_id: Uuid) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM attendances WHERE participant_id = ?1",
            params![participant_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Stamp the check-in of a row that has none yet. Returns false if it already had one.
    #[instrument(skip(self))]
    pub fn mark_checked_in(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        hall_id: Option<Uuid>,
        scanned_by: Option<Uuid>,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE attendances
             SET check_in_time = ?1, hall_id = COALESCE(?2, hall_id), scanned_by = COALESCE(?3, scanned_by)
             WHERE id = ?4 AND check_in_time IS NULL",
            params![
                at.to_rfc3339(),
                hall_id.map(|h| h.to_string()),
                scanned_by.map(|s| s.to_string()),
                id.to_string(),
            ],
        )?;
        Ok(changed == 1)
    }

    /// Stamp the check-out of a checked-in row. Returns false if it was not open.
    #[instrument(skip(self))]
    pub fn mark_checked_out(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE attendances SET check_out_time = ?1
             WHERE id = ?2 AND check_in_time IS NOT NULL AND check_out_time IS NULL",
            params![at.to_rfc3339(), id.to_string()],
        )?;
        Ok(changed == 1)
    }
}
