//! Attendance model and its check-in state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Presence of a participant at an event (no course) or at one course session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub event_id: Uuid,
    /// `None` marks an event-level check-in
    pub course_id: Option<Uuid>,
    pub hall_id: Option<Uuid>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub scanned_by: Option<Uuid>,
}

/// Where a (participant, course) pair is in the check-in lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceState {
    NoRecord,
    CheckedIn,
    CheckedOut,
}

impl Attendance {
    /// A fresh row checked in at `now`
    pub fn checked_in(
        participant_id: Uuid,
        event_id: Uuid,
        course_id: Option<Uuid>,
        hall_id: Option<Uuid>,
        scanned_by: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant_id,
            event_id,
            course_id,
            hall_id,
            check_in_time: Some(Utc::now()),
            check_out_time: None,
            scanned_by,
        }
    }

    pub fn state(&self) -> AttendanceState {
        match (self.check_in_time, self.check_out_time) {
            (_, Some(_)) => AttendanceState::CheckedOut,
            (Some(_), None) => AttendanceState::CheckedIn,
            (None, None) => AttendanceState::NoRecord,
        }
    }
}
