//! Course registration storage operations

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_status, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Registration, RegistrationStatus};

pub struct RegistrationStore<'a> {
    conn: &'a Connection,
}

impl<'a> RegistrationStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a registration; a second one for the same pair is a `Duplicate`
    #[instrument(skip(self, registration), fields(participant_id = %registration.participant_id, course_id = %registration.course_id, status = %registration.status))]
    pub fn create(&self, registration: &Registration) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO registrations (id, participant_id, course_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    registration.id.to_string(),
                    registration.participant_id.to_string(),
                    registration.course_id.to_string(),
                    registration.status.as_str(),
                    registration.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::from_write(e, "registration"))?;
        Ok(())
    }

    /// Find the registration of a participant to a course
    #[instrument(skip(self))]
    pub fn find(&self, participant_id: Uuid, course_id: Uuid) -> Result<Option<Registration>> {
        let registration = self
            .conn
            .query_row(
                "SELECT id, participant_id, course_id, status, created_at FROM registrations
                 WHERE participant_id = ?1 AND course_id = ?2",
                params![participant_id.to_string(), course_id.to_string()],
                |row| {
                    Ok(Registration {
                        id: parse_uuid(&row.get::<_, String>(0)?)?,
                        participant_id: parse_uuid(&row.get::<_, String>(1)?)?,
                        course_id: parse_uuid(&row.get::<_, String>(2)?)?,
                        status: parse_status(&row.get::<_, String>(3)?)?,
                        created_at: parse_datetime(&row.get::<_, String>(4)?)?,
                    })
                },
            )
            .optional()?;
        Ok(registration)
    }

    /// Update registration status
    #[instrument(skip(self))]
    pub fn update_status(
        &self,
        participant_id: Uuid,
        course_id: Uuid,
        status: RegistrationStatus,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE registrations SET status = ?1 WHERE participant_id = ?2 AND course_id = ?3",
            params![status.as_str(), participant_id.to_string(), course_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    /// Count registrations of a course
    pub fn count_for_course(&self, course_id: Uuid) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM registrations WHERE course_id = ?1",
            params![course_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
