//! Course model - a session inside an event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Restricted courses only admit participants with a confirmed registration
    pub requires_registration: bool,
}

impl Course {
    pub fn new(
        event_id: Uuid,
        title: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            title,
            start_time,
            end_time,
            requires_registration: false,
        }
    }

    pub fn restricted(mut self) -> Self {
        self.requires_registration = true;
        self
    }
}
