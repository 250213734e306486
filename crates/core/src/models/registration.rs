//! Registration status and course registration models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a participant's registration, to an event or to a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "PENDING",
            RegistrationStatus::Confirmed => "CONFIRMED",
            RegistrationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(RegistrationStatus::Pending),
            "CONFIRMED" => Some(RegistrationStatus::Confirmed),
            "CANCELLED" => Some(RegistrationStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A participant's registration to one course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub course_id: Uuid,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(participant_id: Uuid, course_id: Uuid, status: RegistrationStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant_id,
            course_id,
            status,
            created_at: Utc::now(),
        }
    }

    pub fn confirmed(participant_id: Uuid, course_id: Uuid) -> Self {
        Self::new(participant_id, course_id, RegistrationStatus::Confirmed)
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == RegistrationStatus::Confirmed
    }
}
