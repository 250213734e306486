//! Participant model - a person registered to an event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProfileFields, RegistrationStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub profile: ProfileFields,
    pub registration_status: RegistrationStatus,
    /// Assigned once, immutable afterwards
    pub badge_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(event_id: Uuid, profile: ProfileFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            profile,
            registration_status: RegistrationStatus::Pending,
            badge_code: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_badge(mut self, badge_code: String) -> Self {
        self.badge_code = Some(badge_code);
        self
    }

    pub fn with_status(mut self, status: RegistrationStatus) -> Self {
        self.registration_status = status;
        self
    }
}
