//! Subcommands and their dispatch onto the core services

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use rollcall_core::{
    AccessScope, AttendanceRecorder, CheckRequest, ProfileFields, RawRow, Registrar,
    RosterReconciler, ScanRequest, Storage, SynonymTables,
};
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile a roster file against a restricted course
    Import {
        #[arg(long)]
        course: Uuid,
        /// JSON array of rows, one object per spreadsheet line
        rows: PathBuf,
    },
    /// Import a roster file into an event without course registration
    ImportParticipants {
        #[arg(long)]
        event: Uuid,
        rows: PathBuf,
    },
    /// Record a badge scan
    Scan {
        #[arg(long)]
        event: Uuid,
        /// Badge code or participant id
        badge: String,
        #[command(flatten)]
        station: Station,
    },
    /// Check a participant in explicitly
    CheckIn(CheckArgs),
    /// Check a participant out
    CheckOut(CheckArgs),
    /// Register one participant from a JSON profile file
    Register {
        #[arg(long)]
        event: Uuid,
        profile: PathBuf,
    },
    /// Register a participant to a course
    Enroll {
        #[arg(long)]
        participant: Uuid,
        #[arg(long)]
        course: Uuid,
    },
    /// Show or assign a participant's badge code
    Badge {
        #[arg(long)]
        participant: Uuid,
    },
}

/// Where a scan or check happens
#[derive(Args, Debug, Clone, Default)]
pub struct Station {
    /// Course being attended; omit for event-level attendance
    #[arg(long)]
    pub course: Option<Uuid>,
    #[arg(long)]
    pub hall: Option<Uuid>,
    /// Staff member operating the station
    #[arg(long)]
    pub scanned_by: Option<Uuid>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(long)]
    pub participant: Uuid,
    #[arg(long)]
    pub event: Uuid,
    #[command(flatten)]
    pub station: Station,
}

impl CheckArgs {
    fn request(&self) -> CheckRequest {
        CheckRequest {
            participant_id: self.participant,
            event_id: self.event,
            course_id: self.station.course,
            hall_id: self.station.hall,
            scanned_by: self.station.scanned_by,
        }
    }
}

/// Run one command and return its JSON result
pub fn execute<S: Storage>(
    storage: &S,
    scope: &AccessScope,
    synonyms: SynonymTables,
    command: Command,
) -> Result<Value> {
    let recorder = AttendanceRecorder::new(storage);
    let registrar = Registrar::new(storage).with_synonyms(synonyms.clone());

    let output = match command {
        Command::Import { course, rows } => {
            let rows = read_rows(&rows)?;
            let summary = RosterReconciler::new(storage)
                .with_synonyms(synonyms)
                .reconcile(scope, course, &rows)
                .context("Roster import failed")?;
            serde_json::to_value(summary)?
        }
        Command::ImportParticipants { event, rows } => {
            let rows = read_rows(&rows)?;
            let summary = RosterReconciler::new(storage)
                .with_synonyms(synonyms)
                .import_participants(scope, event, &rows)
                .context("Participant import failed")?;
            serde_json::to_value(summary)?
        }
        Command::Scan {
            event,
            badge,
            station,
        } => {
            let request = ScanRequest {
                badge_or_id: badge,
                event_id: event,
                course_id: station.course,
                hall_id: station.hall,
                scanned_by: station.scanned_by,
            };
            serde_json::to_value(recorder.scan(scope, &request)?)?
        }
        Command::CheckIn(args) => serde_json::to_value(recorder.check_in(scope, &args.request())?)?,
        Command::CheckOut(args) => {
            serde_json::to_value(recorder.check_out(scope, &args.request())?)?
        }
        Command::Register { event, profile } => {
            let content = std::fs::read_to_string(&profile)
                .with_context(|| format!("Failed to read {}", profile.display()))?;
            let profile: ProfileFields = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a JSON object", profile.display()))?;
            serde_json::to_value(registrar.register_participant(scope, event, profile)?)?
        }
        Command::Enroll {
            participant,
            course,
        } => serde_json::to_value(registrar.register_for_course(scope, participant, course)?)?,
        Command::Badge { participant } => {
            let badge = registrar.assign_badge(scope, participant)?;
            json!({ "participantId": participant, "badgeCode": badge })
        }
    };

    Ok(output)
}

/// Rows as produced by the spreadsheet extractor: a JSON array of objects
fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of rows", path.display()))
}
