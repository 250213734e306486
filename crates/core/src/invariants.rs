//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{Attendance, Course, Registration};
use crate::reconcile::ReconcileSummary;

/// Validate that an attendance row is internally consistent
pub fn assert_attendance_invariants(attendance: &Attendance) {
    // A check-out without a check-in is impossible
    debug_assert!(
        !(attendance.check_out_time.is_some() && attendance.check_in_time.is_none()),
        "Attendance {} is checked out but was never checked in",
        attendance.id
    );

    if let (Some(check_in), Some(check_out)) = (attendance.check_in_time, attendance.check_out_time)
    {
        debug_assert!(
            check_out >= check_in,
            "Attendance {} checks out before it checks in",
            attendance.id
        );
    }
}

/// Validate that admission to a course respected its registration gate
pub fn assert_admission_allowed(course: &Course, registration: Option<&Registration>) {
    if course.requires_registration {
        debug_assert!(
            registration.is_some_and(|r| r.is_confirmed() && r.course_id == course.id),
            "Admission to restricted course {} without a confirmed registration",
            course.id
        );
    }
}

/// Validate the bookkeeping of an import run
pub fn assert_summary_invariants(
    summary: &ReconcileSummary,
    rows: usize,
    created: usize,
    unresolved: usize,
) {
    debug_assert_eq!(
        summary.success + summary.failed,
        rows,
        "Every row must be counted exactly once"
    );

    debug_assert_eq!(
        summary.failed,
        summary.errors.len(),
        "Every failed row must carry an error entry"
    );

    debug_assert!(
        created <= unresolved,
        "Created {} participants from only {} unresolved rows",
        created,
        unresolved
    );
}
