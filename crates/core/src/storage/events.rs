//! Event storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_json, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::Event;

pub struct EventStore<'a> {
    conn: &'a Connection,
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        fields: parse_json(&row.get::<_, String>(2)?)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?)?,
    })
}

impl<'a> EventStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new event
    #[instrument(skip(self, event), fields(event_id = %event.id, event_name = %event.name))]
    pub fn create(&self, event: &Event) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO events (id, name, fields, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    event.id.to_string(),
                    event.name,
                    serde_json::to_string(&event.fields)?,
                    event.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::from_write(e, "event"))?;
        Ok(())
    }

    /// Find event by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let event = self
            .conn
            .query_row(
                "SELECT id, name, fields, created_at FROM events WHERE id = ?1",
                params![id.to_string()],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }
}
