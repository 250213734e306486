//! Course storage operations

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::Course;

pub struct CourseStore<'a> {
    conn: &'a Connection,
}

impl<'a> CourseStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new course
    #[instrument(skip(self, course), fields(course_id = %course.id, restricted = course.requires_registration))]
    pub fn create(&self, course: &Course) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO courses (id, event_id, title, start_time, end_time, requires_registration)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    course.id.to_string(),
                    course.event_id.to_string(),
                    course.title,
                    course.start_time.to_rfc3339(),
                    course.end_time.to_rfc3339(),
                    course.requires_registration as i32,
                ],
            )
            .map_err(|e| Error::from_write(e, "course"))?;
        Ok(())
    }

    /// Find course by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Course>> {
        let course = self
            .conn
            .query_row(
                "SELECT id, event_id, title, start_time, end_time, requires_registration
                 FROM courses WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok(Course {
                        id: parse_uuid(&row.get::<_, String>(0)?)?,
                        event_id: parse_uuid(&row.get::<_, String>(1)?)?,
                        title: row.get(2)?,
                        start_time: parse_datetime(&row.get::<_, String>(3)?)?,
                        end_time: parse_datetime(&row.get::<_, String>(4)?)?,
                        requires_registration: row.get::<_, i32>(5)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(course)
    }
}
