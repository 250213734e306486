//! Storage repository traits
//!
//! These traits define the persistence interface the services run against,
//! allowing for different implementations (SQLite, mock).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::identity::IdentityKey;
use crate::models::{Attendance, Course, Event, Hall, Participant, Registration, RegistrationStatus};

/// Event repository operations
pub trait EventRepository {
    /// Create a new event
    fn create_event(&self, event: &Event) -> Result<()>;

    /// Find event by ID
    fn find_event_by_id(&self, id: Uuid) -> Result<Option<Event>>;
}

/// Participant repository operations
pub trait ParticipantRepository {
    /// Create a participant indexed under its identity key
    fn create_participant(&self, participant: &Participant, key: &IdentityKey) -> Result<()>;

    /// Find participant by ID
    fn find_participant_by_id(&self, id: Uuid) -> Result<Option<Participant>>;

    /// Find participant by badge code
    fn find_participant_by_badge(&self, badge_code: &str) -> Result<Option<Participant>>;

    /// List all participants of an event
    fn list_participants_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>>;

    /// Assign a badge code if none is set; false when one already exists
    fn assign_badge_code(&self, participant_id: Uuid, badge_code: &str) -> Result<bool>;
}

/// Course repository operations
pub trait CourseRepository {
    /// Create a new course
    fn create_course(&self, course: &Course) -> Result<()>;

    /// Find course by ID
    fn find_course_by_id(&self, id: Uuid) -> Result<Option<Course>>;
}

/// Registration repository operations
pub trait RegistrationRepository {
    /// Create a registration (unique per participant and course)
    fn create_registration(&self, registration: &Registration) -> Result<()>;

    /// Find the registration of a participant to a course
    fn find_registration(&self, participant_id: Uuid, course_id: Uuid)
        -> Result<Option<Registration>>;

    /// Update registration status; false when no registration exists
    fn update_registration_status(
        &self,
        participant_id: Uuid,
        course_id: Uuid,
        status: RegistrationStatus,
    ) -> Result<bool>;
}

/// Attendance repository operations
pub trait AttendanceRepository {
    /// Create an attendance row (unique per participant and course)
    fn create_attendance(&self, attendance: &Attendance) -> Result<()>;

    /// Find the attendance of a participant for a course, or event level for `None`
    fn find_attendance(&self, participant_id: Uuid, course_id: Option<Uuid>)
        -> Result<Option<Attendance>>;

    /// Find attendance by ID
    fn find_attendance_by_id(&self, id: Uuid) -> Result<Option<Attendance>>;

    /// Conditionally set the check-in time of a row without one
    fn mark_checked_in(
        &self,
        attendance_id: Uuid,
        at: DateTime<Utc>,
        hall_id: Option<Uuid>,
        scanned_by: Option<Uuid>,
    ) -> Result<bool>;

    /// Conditionally set the check-out time of an open row
    fn mark_checked_out(&self, attendance_id: Uuid, at: DateTime<Utc>) -> Result<bool>;
}

/// Hall repository operations
pub trait HallRepository {
    /// Create a new Hall
    fn create_hall(&self, hall: &Hall) -> Result<()>;

    /// Find Hall by ID
    fn find_hall_by_id(&self, id: Uuid) -> Result<Option<Hall>>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite or mocks.
pub trait Storage:
    EventRepository
    + ParticipantRepository
    + CourseRepository
    + RegistrationRepository
    + AttendanceRepository
    + HallRepository
{
}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where
    T: EventRepository
        + ParticipantRepository
        + CourseRepository
        + RegistrationRepository
        + AttendanceRepository
        + HallRepository
{
}
