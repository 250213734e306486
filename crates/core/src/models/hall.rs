//! Hall model - a room or gate inside an event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A Hall is a scanning location belonging to one event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hall {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    /// Free-form descriptive fields (capacity, floor, ...)
    pub fields: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Hall {
    pub fn new(event_id: Uuid, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            name,
            fields: serde_json::Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = fields;
        self
    }
}
