//! Hall storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_json, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::Hall;

pub struct HallStore<'a> {
    conn: &'a Connection,
}

fn hall_from_row(row: &Row<'_>) -> rusqlite::Result<Hall> {
    Ok(Hall {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        event_id: parse_uuid(&row.get::<_, String>(1)?)?,
        name: row.get(2)?,
        fields: parse_json(&row.get::<_, String>(3)?)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?)?,
    })
}

impl<'a> HallStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new Hall
    #[instrument(skip(self, hall), fields(hall_name = %hall.name, event_id = %hall.event_id))]
    pub fn create(&self, hall: &Hall) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO halls (id, event_id, name, fields, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    hall.id.to_string(),
                    hall.event_id.to_string(),
                    hall.name,
                    hall.fields.to_string(),
                    hall.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::from_write(e, "hall"))?;
        Ok(())
    }

    /// Find Hall by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Hall>> {
        let hall = self
            .conn
            .query_row(
                "SELECT id, event_id, name, fields, created_at FROM halls WHERE id = ?1",
                params![id.to_string()],
                hall_from_row,
            )
            .optional()?;
        Ok(hall)
    }

    /// List the Halls of an event
    #[instrument(skip(self))]
    pub fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Hall>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_id, name, fields, created_at FROM halls
             WHERE event_id = ?1 ORDER BY name",
        )?;

        let halls = stmt
            .query_map(params![event_id.to_string()], hall_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(halls)
    }
}
