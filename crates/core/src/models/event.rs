//! Event model - the owner of every other record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldDefinition;

/// An event with its declared participant field schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    /// Ordered field definitions for participant profiles
    pub fields: Vec<FieldDefinition>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            fields: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldDefinition>) -> Self {
        self.fields = fields;
        self
    }
}
