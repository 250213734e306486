//! Rollcall Core Library
//!
//! Attendance recording and roster reconciliation for multi-hall events:
//! models, identity matching, storage, and the services built on them.

pub mod config;
pub mod error;
pub mod identity;
pub mod invariants;
pub mod models;
pub mod normalize;
pub mod permissions;
pub mod reconcile;
pub mod recorder;
pub mod registrar;
pub mod storage;

pub use config::RollcallConfig;
pub use error::{Error, Result};
pub use identity::{IdentityKey, IdentityResolver, IdentityRole, SynonymConfig, SynonymTables};
pub use models::*;
pub use normalize::{normalize_row, NormalizedRow, RawRow};
pub use permissions::AccessScope;
pub use reconcile::{ReconcileSummary, RosterReconciler, RowError};
pub use recorder::{AttendanceRecorder, CheckRequest, ScanOutcome, ScanRequest};
pub use registrar::{Registrar, RegistrationOutcome};
pub use storage::{
    AttendanceRepository, CourseRepository, Database, EventRepository, HallRepository,
    ParticipantRepository, RegistrationRepository, Storage,
};
