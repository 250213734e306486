//! Roster reconciliation
//!
//! Imports spreadsheet rows into an event: each row is matched to an
//! existing participant or creates one, then gets registered to the course.
//! Rows are independent units of work. A bad row is reported in the summary
//! and the loop moves on; rows already processed stay committed, there is no
//! rollback and no mid-batch cancellation.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::identity::{IdentityKey, IdentityResolver, SynonymTables};
use crate::invariants::assert_summary_invariants;
use crate::models::{Event, Participant, Registration};
use crate::normalize::{normalize_row, RawRow};
use crate::permissions::AccessScope;
use crate::storage::Storage;

/// Reason reported for rows without any usable identity column
pub const MISSING_IDENTITY_REASON: &str = "Missing Email, Name (Nom/Prenom), or Full Name fields";

/// Spreadsheet row number of the first data row (row 1 is the header)
const FIRST_DATA_ROW: usize = 2;

/// One failed row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub identifier: String,
    pub reason: String,
}

/// Outcome of an import
///
/// `success` does not tell newly registered rows apart from rows that were
/// already registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

impl ReconcileSummary {
    fn record_success(&mut self) {
        self.success += 1;
    }

    fn record_failure(&mut self, row: usize, identifier: String, reason: impl Into<String>) {
        self.failed += 1;
        self.errors.push(RowError {
            row,
            identifier,
            reason: reason.into(),
        });
    }
}

/// Per-run state: the identity index lives exactly as long as one import
struct ImportRun<'s, S> {
    storage: &'s S,
    event: &'s Event,
    synonyms: &'s SynonymTables,
    resolver: IdentityResolver,
    unresolved: usize,
    created: usize,
}

impl<'s, S: Storage> ImportRun<'s, S> {
    fn start(storage: &'s S, event: &'s Event, synonyms: &'s SynonymTables) -> Result<Self> {
        let existing = storage.list_participants_for_event(event.id)?;
        let resolver = IdentityResolver::from_participants(&existing, &event.fields, synonyms);
        debug!(indexed = existing.len(), "Identity index built");
        Ok(Self {
            storage,
            event,
            synonyms,
            resolver,
            unresolved: 0,
            created: 0,
        })
    }

    /// Resolve a row to a participant, creating one when needed.
    /// `Ok(None)` means the row carries no usable identity.
    fn participant_for(&mut self, row: &RawRow) -> (String, Result<Option<Uuid>>) {
        let normalized = normalize_row(row, &self.event.fields, self.synonyms);
        let identifier = normalized.identifier();

        let key = IdentityKey::build(&normalized.profile, &self.event.fields, self.synonyms);
        if key.is_empty() {
            return (identifier, Ok(None));
        }

        if let Some(id) = self.resolver.resolve(&key) {
            debug!(participant_id = %id, "Row matched existing participant");
            return (identifier, Ok(Some(id)));
        }

        self.unresolved += 1;
        let participant = Participant::new(self.event.id, normalized.profile);
        if let Err(e) = self.storage.create_participant(&participant, &key) {
            return (identifier, Err(e));
        }
        self.resolver.insert(&key, participant.id);
        self.created += 1;
        debug!(participant_id = %participant.id, "Participant created from row");

        (identifier, Ok(Some(participant.id)))
    }

    /// Walk every row, handing resolved participants to `on_participant`
    fn process<F>(&mut self, rows: &[RawRow], mut on_participant: F) -> ReconcileSummary
    where
        F: FnMut(&S, Uuid) -> Result<()>,
    {
        let mut summary = ReconcileSummary::default();

        for (index, row) in rows.iter().enumerate() {
            let row_number = index + FIRST_DATA_ROW;
            let (identifier, resolved) = self.participant_for(row);

            let outcome = match resolved {
                Ok(Some(participant_id)) => on_participant(self.storage, participant_id),
                Ok(None) => {
                    debug!(row = row_number, "Row has no usable identity");
                    summary.record_failure(row_number, identifier, MISSING_IDENTITY_REASON);
                    continue;
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => summary.record_success(),
                Err(e) => {
                    warn!(row = row_number, identifier = %identifier, error = %e, "Row failed");
                    summary.record_failure(row_number, identifier, e.to_string());
                }
            }
        }

        assert_summary_invariants(&summary, rows.len(), self.created, self.unresolved);
        summary
    }
}

/// Register a participant to a course unless already registered
fn ensure_registered<S: Storage>(storage: &S, participant_id: Uuid, course_id: Uuid) -> Result<()> {
    if storage.find_registration(participant_id, course_id)?.is_some() {
        return Ok(());
    }
    match storage.create_registration(&Registration::confirmed(participant_id, course_id)) {
        Err(e) if e.is_unique_violation() => Ok(()),
        other => other,
    }
}

/// Imports external roster rows for one course or one event
pub struct RosterReconciler<'a, S> {
    storage: &'a S,
    synonyms: SynonymTables,
}

impl<'a, S: Storage> RosterReconciler<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self {
            storage,
            synonyms: SynonymTables::default(),
        }
    }

    pub fn with_synonyms(mut self, synonyms: SynonymTables) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Import rows and register every resolved participant to the course
    ///
    /// Fails as a whole only when the course or its event is missing or out
    /// of scope. A course open to everyone needs no registrations, so the
    /// import is a no-op there.
    #[instrument(skip(self, scope, rows), fields(rows = rows.len()))]
    pub fn reconcile(
        &self,
        scope: &AccessScope,
        course_id: Uuid,
        rows: &[RawRow],
    ) -> Result<ReconcileSummary> {
        let course = self
            .storage
            .find_course_by_id(course_id)?
            .ok_or_else(|| Error::NotFound(format!("course {course_id}")))?;
        scope.ensure_event(course.event_id)?;

        if !course.requires_registration {
            info!("Course does not require registration, nothing to import");
            return Ok(ReconcileSummary::default());
        }

        let event = self.find_event(course.event_id)?;
        let mut run = ImportRun::start(self.storage, &event, &self.synonyms)?;
        let summary = run.process(rows, |storage, participant_id| {
            ensure_registered(storage, participant_id, course.id)
        });

        info!(
            success = summary.success,
            failed = summary.failed,
            created = run.created,
            "Course roster imported"
        );
        Ok(summary)
    }

    /// Import rows into the event roster without any course registration
    #[instrument(skip(self, scope, rows), fields(rows = rows.len()))]
    pub fn import_participants(
        &self,
        scope: &AccessScope,
        event_id: Uuid,
        rows: &[RawRow],
    ) -> Result<ReconcileSummary> {
        scope.ensure_event(event_id)?;
        let event = self.find_event(event_id)?;

        let mut run = ImportRun::start(self.storage, &event, &self.synonyms)?;
        let summary = run.process(rows, |_, _| Ok(()));

        info!(
            success = summary.success,
            failed = summary.failed,
            created = run.created,
            "Event roster imported"
        );
        Ok(summary)
    }

    fn find_event(&self, event_id: Uuid) -> Result<Event> {
        self.storage
            .find_event_by_id(event_id)?
            .ok_or_else(|| Error::NotFound(format!("event {event_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, FieldDefinition, FieldType, FieldValue, ProfileFields, RegistrationStatus};
    use crate::storage::{
        CourseRepository, Database, EventRepository, ParticipantRepository, RegistrationRepository,
    };
    use chrono::{Duration, Utc};

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells
            .iter()
            .map(|(h, v)| (h.to_string(), FieldValue::from(*v)))
            .collect()
    }

    fn setup(restricted: bool) -> (Database, Event, Course) {
        let db = Database::open_in_memory().unwrap();
        let event = Event::new("Summit".to_string()).with_fields(vec![
            FieldDefinition::new("email", "Email", FieldType::Email),
            FieldDefinition::new("lastName", "Nom", FieldType::Text),
            FieldDefinition::new("firstName", "Prenom", FieldType::Text),
        ]);
        db.create_event(&event).unwrap();

        let start = Utc::now();
        let mut course = Course::new(event.id, "Workshop".to_string(), start, start + Duration::hours(1));
        if restricted {
            course = course.restricted();
        }
        db.create_course(&course).unwrap();
        (db, event, course)
    }

    fn participant_count(db: &Database, event: &Event) -> usize {
        db.list_participants_for_event(event.id).unwrap().len()
    }

    #[test]
    fn test_missing_course_fails_whole_import() {
        let (db, _, _) = setup(true);
        let err = RosterReconciler::new(&db)
            .reconcile(&AccessScope::Administrator, Uuid::new_v4(), &[])
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_unrestricted_course_is_noop() {
        let (db, event, course) = setup(false);
        let rows = vec![row(&[("Email", "a@x.com")])];

        let summary = RosterReconciler::new(&db)
            .reconcile(&AccessScope::Administrator, course.id, &rows)
            .unwrap();
        assert_eq!(summary, ReconcileSummary::default());
        assert_eq!(participant_count(&db, &event), 0);
    }

    #[test]
    fn test_staff_of_other_event_rejected() {
        let (db, _, course) = setup(true);
        let err = RosterReconciler::new(&db)
            .reconcile(&AccessScope::staff(Uuid::new_v4()), course.id, &[])
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[test]
    fn test_rows_create_and_register() {
        let (db, event, course) = setup(true);
        let rows = vec![
            row(&[("Email", "a@x.com"), ("Nom", "Doe"), ("Prenom", "Jane")]),
            row(&[("Nom", "Martin"), ("Prenom", "Paul")]),
            row(&[("Full Name", "Ada Lovelace")]),
        ];

        let summary = RosterReconciler::new(&db)
            .reconcile(&AccessScope::staff(event.id), course.id, &rows)
            .unwrap();
        assert_eq!(summary.success, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(participant_count(&db, &event), 3);

        for participant in db.list_participants_for_event(event.id).unwrap() {
            assert_eq!(participant.registration_status, RegistrationStatus::Pending);
            let reg = db.find_registration(participant.id, course.id).unwrap().unwrap();
            assert!(reg.is_confirmed());
        }
    }

    #[test]
    fn test_duplicate_email_within_file_creates_one_participant() {
        let (db, event, course) = setup(true);
        let rows = vec![row(&[("Email", "a@x.com")]), row(&[("Email", "A@X.com")])];

        let summary = RosterReconciler::new(&db)
            .reconcile(&AccessScope::Administrator, course.id, &rows)
            .unwrap();
        assert_eq!(summary.success, 2);
        assert_eq!(participant_count(&db, &event), 1);
        assert_eq!(db.registrations().count_for_course(course.id).unwrap(), 1);
    }

    #[test]
    fn test_existing_participant_matched_by_email() {
        let (db, event, course) = setup(true);
        let existing = Participant::new(
            event.id,
            ProfileFields::new()
                .with("email", "jane@x.com")
                .with("lastName", "Smith")
                .with("firstName", "Janet"),
        );
        let key = IdentityKey::build(&existing.profile, &event.fields, &SynonymTables::default());
        db.create_participant(&existing, &key).unwrap();

        let rows = vec![row(&[("Email", "JANE@x.com"), ("Nom", "Doe"), ("Prenom", "Jane")])];
        let summary = RosterReconciler::new(&db)
            .reconcile(&AccessScope::Administrator, course.id, &rows)
            .unwrap();

        assert_eq!(summary.success, 1);
        assert_eq!(participant_count(&db, &event), 1);
        assert!(db.find_registration(existing.id, course.id).unwrap().is_some());
    }

    #[test]
    fn test_missing_identity_reported_with_row_number() {
        let (db, event, course) = setup(true);
        let rows = vec![
            row(&[("Email", "a@x.com")]),
            row(&[("Company", "Acme"), ("Nom", "Solo")]),
        ];

        let summary = RosterReconciler::new(&db)
            .reconcile(&AccessScope::Administrator, course.id, &rows)
            .unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            summary.errors,
            vec![RowError {
                row: 3,
                identifier: "Solo".to_string(),
                reason: MISSING_IDENTITY_REASON.to_string(),
            }]
        );
        assert_eq!(participant_count(&db, &event), 1);
    }

    #[test]
    fn test_persistence_failure_recorded_and_loop_continues() {
        let (db, event, course) = setup(true);

        // Email index holds a@x.com but the stored profile carries no email,
        // so the row is unresolved and its insert hits the unique index
        let hidden = Participant::new(event.id, ProfileFields::new().with("lastName", "Ghost"));
        let key = IdentityKey {
            email: Some("a@x.com".to_string()),
            name_pair: None,
        };
        db.create_participant(&hidden, &key).unwrap();

        let summary = RosterReconciler::new(&db)
            .reconcile(
                &AccessScope::Administrator,
                course.id,
                &[row(&[("Email", "a@x.com")]), row(&[("Email", "b@x.com")])],
            )
            .unwrap();

        assert_eq!(summary.success, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].row, 2);
        assert_eq!(summary.errors[0].identifier, "a@x.com");
        assert_eq!(summary.errors[0].reason, "Duplicate record: participant");

        let created = db
            .list_participants_for_event(event.id)
            .unwrap()
            .into_iter()
            .find(|p| p.profile.text("email").as_deref() == Some("b@x.com"))
            .unwrap();
        assert!(db.find_registration(created.id, course.id).unwrap().is_some());
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let (db, event, course) = setup(true);
        let rows = vec![
            row(&[("Email", "a@x.com")]),
            row(&[("Nom", "Martin"), ("Prenom", "Paul")]),
        ];
        let reconciler = RosterReconciler::new(&db);

        let first = reconciler
            .reconcile(&AccessScope::Administrator, course.id, &rows)
            .unwrap();
        let second = reconciler
            .reconcile(&AccessScope::Administrator, course.id, &rows)
            .unwrap();

        assert_eq!(first.success, rows.len());
        assert_eq!(second.success, rows.len());
        assert_eq!(participant_count(&db, &event), 2);
        assert_eq!(db.registrations().count_for_course(course.id).unwrap(), 2);
    }

    #[test]
    fn test_import_participants_without_course() {
        let (db, event, _) = setup(true);
        let rows = vec![
            row(&[("Email", "a@x.com")]),
            row(&[("Email", "a@x.com")]),
            row(&[("Company", "Acme")]),
        ];

        let summary = RosterReconciler::new(&db)
            .import_participants(&AccessScope::Administrator, event.id, &rows)
            .unwrap();
        assert_eq!(summary.success, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].row, 4);
        assert_eq!(participant_count(&db, &event), 1);
    }

    #[test]
    fn test_summary_serializes_contract_fields() {
        let mut summary = ReconcileSummary::default();
        summary.record_success();
        summary.record_failure(2, "Unknown".to_string(), MISSING_IDENTITY_REASON);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["success"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["errors"][0]["row"], 2);
        assert_eq!(json["errors"][0]["identifier"], "Unknown");
        assert_eq!(json["errors"][0]["reason"], MISSING_IDENTITY_REASON);
    }
}
