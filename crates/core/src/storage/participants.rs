//! Participant storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_json, parse_status, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::Participant;

const COLUMNS: &str = "id, event_id, profile, registration_status, badge_code, created_at";

pub struct ParticipantStore<'a> {
    conn: &'a Connection,
}

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        event_id: parse_uuid(&row.get::<_, String>(1)?)?,
        profile: parse_json(&row.get::<_, String>(2)?)?,
        registration_status: parse_status(&row.get::<_, String>(3)?)?,
        badge_code: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl<'a> ParticipantStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a participant
    ///
    /// `email_key` is the normalized email; the database refuses a second
    /// participant with the same key in the same event.
    #[instrument(skip(self, participant), fields(participant_id = %participant.id, event_id = %participant.event_id))]
    pub fn create(&self, participant: &Participant, email_key: Option<&str>) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO participants (id, event_id, profile, registration_status, badge_code, email_key, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    participant.id.to_string(),
                    participant.event_id.to_string(),
                    serde_json::to_string(&participant.profile)?,
                    participant.registration_status.as_str(),
                    participant.badge_code,
                    email_key,
                    participant.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::from_write(e, "participant"))?;
        Ok(())
    }

    /// Find participant by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Participant>> {
        let participant = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM participants WHERE id = ?1"),
                params![id.to_string()],
                participant_from_row,
            )
            .optional()?;
        Ok(participant)
    }

    /// Find participant by badge code
    #[instrument(skip(self))]
    pub fn find_by_badge(&self, badge_code: &str) -> Result<Option<Participant>> {
        let participant = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM participants WHERE badge_code = ?1"),
                params![badge_code],
                participant_from_row,
            )
            .optional()?;
        Ok(participant)
    }

    /// List every participant of an event, oldest first
    #[instrument(skip(self))]
    pub fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM participants WHERE event_id = ?1 ORDER BY created_at, id"
        ))?;

        let participants = stmt
            .query_map(params![event_id.to_string()], participant_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(participants)
    }

    /// Count participants of an event
    pub fn count_for_event(&self, event_id: Uuid) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM participants WHERE event_id = ?1",
            params![event_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Set the badge code if none is assigned yet
    ///
    /// Returns false when the participant already had a badge.
    #[instrument(skip(self))]
    pub fn set_badge_code(&self, id: Uuid, badge_code: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE participants SET badge_code = ?1 WHERE id = ?2 AND badge_code IS NULL",
                params![badge_code, id.to_string()],
            )
            .map_err(|e| Error::from_write(e, "badge code"))?;
        Ok(changed == 1)
    }
}
