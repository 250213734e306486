//! Error types for Rollcall Core

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A uniqueness constraint rejected the write
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Participant is not registered for this event")]
    NotRegisteredForEvent,

    #[error("Participant not registered for this restricted course")]
    RestrictedCourseNotRegistered,

    #[error("Participant already checked in")]
    AlreadyCheckedIn,

    #[error("Participant already checked out")]
    AlreadyCheckedOut,

    #[error("Participant must check in first")]
    MustCheckInFirst,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Convert a rusqlite error, turning UNIQUE / PRIMARY KEY failures into `Duplicate`
    pub(crate) fn from_write(err: rusqlite::Error, what: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
                match e.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        Error::Duplicate(what.to_string())
                    }
                    _ => Error::Database(err),
                }
            }
            _ => Error::Database(err),
        }
    }

    /// True when the error came from a uniqueness constraint
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Error::Duplicate(_))
    }

    /// Idempotency and ordering violations raised by the attendance state machine
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Error::NotRegisteredForEvent
                | Error::RestrictedCourseNotRegistered
                | Error::AlreadyCheckedIn
                | Error::AlreadyCheckedOut
                | Error::MustCheckInFirst
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_unique_violation_maps_to_duplicate() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT NOT NULL UNIQUE)")
            .unwrap();
        conn.execute("INSERT INTO t (k) VALUES ('a')", []).unwrap();
        let err = conn
            .execute("INSERT INTO t (k) VALUES ('a')", [])
            .unwrap_err();

        let mapped = Error::from_write(err, "t");
        assert!(mapped.is_unique_violation());
    }

    #[test]
    fn test_not_null_violation_stays_database_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT NOT NULL)").unwrap();
        let err = conn
            .execute("INSERT INTO t (k) VALUES (NULL)", [])
            .unwrap_err();

        let mapped = Error::from_write(err, "t");
        assert!(matches!(mapped, Error::Database(_)));
    }

    #[test]
    fn test_restricted_course_message() {
        assert_eq!(
            Error::RestrictedCourseNotRegistered.to_string(),
            "Participant not registered for this restricted course"
        );
        assert!(Error::RestrictedCourseNotRegistered.is_state_conflict());
        assert!(!Error::NotFound("x".into()).is_state_conflict());
    }
}
