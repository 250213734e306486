//! Attendance recording
//!
//! Each (participant, course) pair moves through
//! `NoRecord -> CheckedIn -> CheckedOut`; a missing course means the
//! event-level record. Every transition is a single write to one row and
//! relies on the unique index over the pair to settle concurrent scans.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants::{assert_admission_allowed, assert_attendance_invariants};
use crate::models::{Attendance, AttendanceState, Participant};
use crate::permissions::AccessScope;
use crate::storage::Storage;

pub const MSG_CHECKED_IN: &str = "Check-in successful";
pub const MSG_ALREADY_SCANNED: &str = "Participant already checked in";

/// A badge scan at a station
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Badge code, or the participant id as text
    pub badge_or_id: String,
    pub event_id: Uuid,
    pub course_id: Option<Uuid>,
    pub hall_id: Option<Uuid>,
    pub scanned_by: Option<Uuid>,
}

/// Result of a scan, rendered unchanged by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub attendance: Attendance,
    pub message: String,
    pub already_scanned: bool,
}

impl ScanOutcome {
    fn recorded(attendance: Attendance) -> Self {
        Self {
            attendance,
            message: MSG_CHECKED_IN.to_string(),
            already_scanned: false,
        }
    }

    fn already_scanned(attendance: Attendance) -> Self {
        Self {
            attendance,
            message: MSG_ALREADY_SCANNED.to_string(),
            already_scanned: true,
        }
    }
}

/// An explicit check-in or check-out for a known participant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub participant_id: Uuid,
    pub event_id: Uuid,
    pub course_id: Option<Uuid>,
    pub hall_id: Option<Uuid>,
    pub scanned_by: Option<Uuid>,
}

pub struct AttendanceRecorder<'a, S> {
    storage: &'a S,
}

impl<'a, S: Storage> AttendanceRecorder<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Single-call check-in from a badge scan
    ///
    /// Scanning the same badge again for the same course returns the
    /// existing record with `already_scanned` set; it never errors and
    /// never creates a second row.
    #[instrument(skip(self, scope, request), fields(event_id = %request.event_id, course_id = ?request.course_id))]
    pub fn scan(&self, scope: &AccessScope, request: &ScanRequest) -> Result<ScanOutcome> {
        let badge = request.badge_or_id.trim();
        if badge.is_empty() {
            return Err(Error::Validation(
                "a badge code or participant id is required".to_string(),
            ));
        }
        scope.ensure_event(request.event_id)?;

        let participant = self.find_by_badge_or_id(badge, request.event_id)?;
        self.check_admission(&participant, request.event_id, request.course_id, request.hall_id)?;

        if let Some(existing) = self.storage.find_attendance(participant.id, request.course_id)? {
            info!(participant_id = %participant.id, "Badge already scanned");
            return Ok(ScanOutcome::already_scanned(existing));
        }

        let attendance = Attendance::checked_in(
            participant.id,
            request.event_id,
            request.course_id,
            request.hall_id,
            request.scanned_by,
        );
        match self.storage.create_attendance(&attendance) {
            Ok(()) => {
                info!(participant_id = %participant.id, attendance_id = %attendance.id, "Participant checked in");
                Ok(ScanOutcome::recorded(attendance))
            }
            Err(e) if e.is_unique_violation() => {
                // Another station recorded the same pair between our read and write
                warn!(participant_id = %participant.id, "Concurrent scan resolved to existing record");
                let winner = self
                    .storage
                    .find_attendance(participant.id, request.course_id)?
                    .ok_or_else(|| Error::NotFound("attendance record".to_string()))?;
                Ok(ScanOutcome::already_scanned(winner))
            }
            Err(e) => Err(e),
        }
    }

    /// Explicit check-in; refuses a pair that is already checked in
    #[instrument(skip(self, scope, request), fields(participant_id = %request.participant_id, course_id = ?request.course_id))]
    pub fn check_in(&self, scope: &AccessScope, request: &CheckRequest) -> Result<Attendance> {
        scope.ensure_event(request.event_id)?;
        let participant = self.find_by_id(request.participant_id, request.event_id)?;
        self.check_admission(&participant, request.event_id, request.course_id, request.hall_id)?;

        let now = Utc::now();
        let attendance = match self.storage.find_attendance(participant.id, request.course_id)? {
            Some(existing) if existing.state() != AttendanceState::NoRecord => {
                return Err(Error::AlreadyCheckedIn);
            }
            // Row written without a check-in time (pre-seeded by an external tool)
            Some(mut existing) => {
                if !self.storage.mark_checked_in(
                    existing.id,
                    now,
                    request.hall_id,
                    request.scanned_by,
                )? {
                    return Err(Error::AlreadyCheckedIn);
                }
                existing.check_in_time = Some(now);
                existing.hall_id = request.hall_id.or(existing.hall_id);
                existing.scanned_by = request.scanned_by.or(existing.scanned_by);
                existing
            }
            None => {
                let attendance = Attendance::checked_in(
                    participant.id,
                    request.event_id,
                    request.course_id,
                    request.hall_id,
                    request.scanned_by,
                );
                match self.storage.create_attendance(&attendance) {
                    Err(e) if e.is_unique_violation() => return Err(Error::AlreadyCheckedIn),
                    other => other?,
                }
                attendance
            }
        };

        assert_attendance_invariants(&attendance);
        info!(attendance_id = %attendance.id, "Participant checked in");
        Ok(attendance)
    }

    /// Explicit check-out of an open record; only ever sets the check-out time
    #[instrument(skip(self, scope, request), fields(participant_id = %request.participant_id, course_id = ?request.course_id))]
    pub fn check_out(&self, scope: &AccessScope, request: &CheckRequest) -> Result<Attendance> {
        scope.ensure_event(request.event_id)?;
        let participant = self.find_by_id(request.participant_id, request.event_id)?;

        let mut attendance = match self.storage.find_attendance(participant.id, request.course_id)? {
            None => return Err(Error::MustCheckInFirst),
            Some(existing) => existing,
        };
        match attendance.state() {
            AttendanceState::NoRecord => return Err(Error::MustCheckInFirst),
            AttendanceState::CheckedOut => return Err(Error::AlreadyCheckedOut),
            AttendanceState::CheckedIn => {}
        }

        let now = Utc::now();
        if !self.storage.mark_checked_out(attendance.id, now)? {
            return Err(Error::AlreadyCheckedOut);
        }
        attendance.check_out_time = Some(now);

        assert_attendance_invariants(&attendance);
        info!(attendance_id = %attendance.id, "Participant checked out");
        Ok(attendance)
    }

    /// Badge code first, then participant id
    fn find_by_badge_or_id(&self, badge_or_id: &str, event_id: Uuid) -> Result<Participant> {
        let participant = match self.storage.find_participant_by_badge(badge_or_id)? {
            Some(p) => Some(p),
            None => match Uuid::parse_str(badge_or_id) {
                Ok(id) => self.storage.find_participant_by_id(id)?,
                Err(_) => None,
            },
        };

        let participant = participant
            .ok_or_else(|| Error::NotFound(format!("participant '{badge_or_id}'")))?;
        if participant.event_id != event_id {
            return Err(Error::NotRegisteredForEvent);
        }
        Ok(participant)
    }

    fn find_by_id(&self, participant_id: Uuid, event_id: Uuid) -> Result<Participant> {
        let participant = self
            .storage
            .find_participant_by_id(participant_id)?
            .ok_or_else(|| Error::NotFound(format!("participant {participant_id}")))?;
        if participant.event_id != event_id {
            return Err(Error::NotRegisteredForEvent);
        }
        Ok(participant)
    }

    /// Course must belong to the event and admit the participant; hall must belong to the event
    fn check_admission(
        &self,
        participant: &Participant,
        event_id: Uuid,
        course_id: Option<Uuid>,
        hall_id: Option<Uuid>,
    ) -> Result<()> {
        if let Some(course_id) = course_id {
            let course = self
                .storage
                .find_course_by_id(course_id)?
                .filter(|c| c.event_id == event_id)
                .ok_or_else(|| Error::NotFound(format!("course {course_id}")))?;

            if course.requires_registration {
                let registration = self
                    .storage
                    .find_registration(participant.id, course.id)?
                    .filter(|r| r.is_confirmed());
                if registration.is_none() {
                    return Err(Error::RestrictedCourseNotRegistered);
                }
                assert_admission_allowed(&course, registration.as_ref());
            }
        }

        if let Some(hall_id) = hall_id {
            self.storage
                .find_hall_by_id(hall_id)?
                .filter(|h| h.event_id == event_id)
                .ok_or_else(|| Error::NotFound(format!("hall {hall_id}")))?;
        }

        Ok(())
    }
}
