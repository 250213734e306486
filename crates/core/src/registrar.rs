//! Direct participant registration and badge assignment

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::identity::{IdentityKey, IdentityResolver, IdentityRole, SynonymTables};
use crate::models::{Event, FieldDefinition, Participant, ProfileFields, Registration, RegistrationStatus};
use crate::permissions::AccessScope;
use crate::storage::Storage;

const BADGE_PREFIX: &str = "B-";
const BADGE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const BADGE_LENGTH: usize = 8;
const BADGE_ATTEMPTS: usize = 5;

/// Result of a manual course registration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub registration: Registration,
    pub already_registered: bool,
}

/// Check a profile against the event's field schema
///
/// Unknown keys are rejected, except the literal identity keys used by
/// events that declare no identity fields.
pub fn validate_profile(profile: &ProfileFields, schema: &[FieldDefinition]) -> Result<()> {
    for (key, value) in profile.iter() {
        match schema.iter().find(|f| &f.name == key) {
            Some(field) if !field.field_type.accepts(value) => {
                return Err(Error::Validation(format!(
                    "field '{}' expects a {:?} value",
                    field.name, field.field_type
                )));
            }
            Some(_) => {}
            None if IdentityRole::ALL.iter().any(|r| r.literal_key() == key) => {}
            None => {
                return Err(Error::Validation(format!("unknown field '{key}'")));
            }
        }
    }

    if let Some(missing) = schema.iter().find(|f| f.required && !profile.has_value(&f.name)) {
        return Err(Error::Validation(format!(
            "required field '{}' is missing",
            missing.label
        )));
    }

    Ok(())
}

fn generate_badge_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..BADGE_LENGTH)
        .map(|_| BADGE_ALPHABET[rng.gen_range(0..BADGE_ALPHABET.len())] as char)
        .collect();
    format!("{BADGE_PREFIX}{suffix}")
}

pub struct Registrar<'a, S> {
    storage: &'a S,
    synonyms: SynonymTables,
}

impl<'a, S: Storage> Registrar<'a, S> {
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

    /// Register one participant directly to an event
    #[instrument(skip(self, scope, profile))]
    pub fn register_participant(
        &self,
        scope: &AccessScope,
        event_id: Uuid,
        profile: ProfileFields,
    ) -> Result<Participant> {
        scope.ensure_event(event_id)?;
        let event = self.find_event(event_id)?;
        validate_profile(&profile, &event.fields)?;

        let key = IdentityKey::build(&profile, &event.fields, &self.synonyms);
        if key.is_empty() {
            return Err(Error::Validation(
                "a participant needs an email or both a last and a first name".to_string(),
            ));
        }

        let existing = self.storage.list_participants_for_event(event_id)?;
        let resolver = IdentityResolver::from_participants(&existing, &event.fields, &self.synonyms);
        if let Some(id) = resolver.resolve(&key) {
            debug!(participant_id = %id, "Identity already registered");
            return Err(Error::Duplicate(format!("participant {id} has the same identity")));
        }

        let participant = Participant::new(event_id, profile);
        self.storage.create_participant(&participant, &key)?;
        info!(participant_id = %participant.id, "Participant registered");
        Ok(participant)
    }

    /// Register a participant to a course; an existing registration is returned as is
    #[instrument(skip(self, scope))]
    pub fn register_for_course(
        &self,
        scope: &AccessScope,
        participant_id: Uuid,
        course_id: Uuid,
    ) -> Result<RegistrationOutcome> {
        let participant = self.find_participant(participant_id)?;
        let course = self
            .storage
            .find_course_by_id(course_id)?
            .ok_or_else(|| Error::NotFound(format!("course {course_id}")))?;
        scope.ensure_event(course.event_id)?;
        if participant.event_id != course.event_id {
            return Err(Error::NotRegisteredForEvent);
        }

        if let Some(registration) = self.storage.find_registration(participant_id, course_id)? {
            return Ok(RegistrationOutcome {
                registration,
                already_registered: true,
            });
        }

        let registration = Registration::confirmed(participant_id, course_id);
        match self.storage.create_registration(&registration) {
            Ok(()) => {
                info!(registration_id = %registration.id, "Course registration created");
                Ok(RegistrationOutcome {
                    registration,
                    already_registered: false,
                })
            }
            Err(e) if e.is_unique_violation() => {
                let registration = self
                    .storage
                    .find_registration(participant_id, course_id)?
                    .ok_or_else(|| Error::NotFound("registration".to_string()))?;
                Ok(RegistrationOutcome {
                    registration,
                    already_registered: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Mark an existing course registration as confirmed
    #[instrument(skip(self, scope))]
    pub fn confirm_registration(
        &self,
        scope: &AccessScope,
        participant_id: Uuid,
        course_id: Uuid,
    ) -> Result<Registration> {
        let participant = self.find_participant(participant_id)?;
        scope.ensure_event(participant.event_id)?;

        let not_found = || Error::NotFound(format!("registration of {participant_id} to {course_id}"));
        if !self.storage.update_registration_status(
            participant_id,
            course_id,
            RegistrationStatus::Confirmed,
        )? {
            return Err(not_found());
        }
        self.storage
            .find_registration(participant_id, course_id)?
            .ok_or_else(not_found)
    }

    /// Badge code of a participant, generating one on first call
    #[instrument(skip(self, scope))]
    pub fn assign_badge(&self, scope: &AccessScope, participant_id: Uuid) -> Result<String> {
        let participant = self.find_participant(participant_id)?;
        scope.ensure_event(participant.event_id)?;
        if let Some(code) = participant.badge_code {
            return Ok(code);
        }

        for _ in 0..BADGE_ATTEMPTS {
            let code = generate_badge_code();
            match self.storage.assign_badge_code(participant_id, &code) {
                Ok(true) => {
                    info!(badge = %code, "Badge assigned");
                    return Ok(code);
                }
                // Someone else assigned a badge first; theirs stands
                Ok(false) => {
                    return self
                        .find_participant(participant_id)?
                        .badge_code
                        .ok_or_else(|| Error::NotFound(format!("badge of {participant_id}")));
                }
                Err(e) if e.is_unique_violation() => {
                    debug!(badge = %code, "Badge code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::Duplicate(format!(
            "no free badge code after {BADGE_ATTEMPTS} attempts"
        )))
    }

    fn find_event(&self, event_id: Uuid) -> Result<Event> {
        self.storage
            .find_event_by_id(event_id)?
            .ok_or_else(|| Error::NotFound(format!("event {event_id}")))
    }

    fn find_participant(&self, participant_id: Uuid) -> Result<Participant> {
        self.storage
            .find_participant_by_id(participant_id)?
            .ok_or_else(|| Error::NotFound(format!("participant {participant_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, FieldType};
    use crate::storage::{
        CourseRepository, Database, EventRepository, ParticipantRepository, RegistrationRepository,
    };
    use chrono::Utc;

    fn setup() -> (Database, Event) {
        let db = Database::open_in_memory().unwrap();
        let event = Event::new("Fair".to_string()).with_fields(vec![
            FieldDefinition::new("email", "Email", FieldType::Email).required(),
            FieldDefinition::new("lastName", "Nom", FieldType::Text),
            FieldDefinition::new("firstName", "Prenom", FieldType::Text),
            FieldDefinition::new("age", "Age", FieldType::Number),
            FieldDefinition::new("code", "Code", FieldType::Text),
        ]);
        db.create_event(&event).unwrap();
        (db, event)
    }

    #[test]
    fn test_validate_profile() {
        let (_, event) = setup();

        let ok = ProfileFields::new().with("email", "a@x.com").with("age", "30");
        assert!(validate_profile(&ok, &event.fields).is_ok());

        let missing = ProfileFields::new().with("lastName", "Doe");
        assert!(matches!(
            validate_profile(&missing, &event.fields),
            Err(Error::Validation(_))
        ));

        let unknown = ProfileFields::new().with("email", "a@x.com").with("shoe", "42");
        assert!(validate_profile(&unknown, &event.fields).is_err());

        let wrong_type = ProfileFields::new().with("email", "a@x.com").with("age", "old");
        assert!(validate_profile(&wrong_type, &event.fields).is_err());
    }

    #[test]
    fn test_register_participant_rejects_duplicate_identity() {
        let (db, event) = setup();
        let registrar = Registrar::new(&db);
        let profile = ProfileFields::new().with("email", "a@x.com");

        let created = registrar
            .register_participant(&AccessScope::Administrator, event.id, profile)
            .unwrap();
        assert_eq!(created.registration_status, RegistrationStatus::Pending);

        let err = registrar
            .register_participant(
                &AccessScope::Administrator,
                event.id,
                ProfileFields::new().with("email", " A@X.COM"),
            )
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_date_shaped_text_accepted_and_kept() {
        let (db, event) = setup();
        let registrar = Registrar::new(&db);
        let profile: ProfileFields =
            serde_json::from_str(r#"{"email": "a@x.com", "code": "2024-01-01"}"#).unwrap();

        let created = registrar
            .register_participant(&AccessScope::Administrator, event.id, profile.clone())
            .unwrap();

        let stored = db.find_participant_by_id(created.id).unwrap().unwrap();
        assert_eq!(stored.profile, profile);
        assert_eq!(stored.profile.text("code").as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_register_for_course_is_idempotent() {
        let (db, event) = setup();
        let registrar = Registrar::new(&db);
        let participant = registrar
            .register_participant(
                &AccessScope::Administrator,
                event.id,
                ProfileFields::new().with("email", "a@x.com"),
            )
            .unwrap();
        let course = Course::new(event.id, "Lab".to_string(), Utc::now(), Utc::now()).restricted();
        db.create_course(&course).unwrap();

        let first = registrar
            .register_for_course(&AccessScope::staff(event.id), participant.id, course.id)
            .unwrap();
        assert!(!first.already_registered);
        assert!(first.registration.is_confirmed());

        let second = registrar
            .register_for_course(&AccessScope::staff(event.id), participant.id, course.id)
            .unwrap();
        assert!(second.already_registered);
        assert_eq!(second.registration.id, first.registration.id);
    }

    #[test]
    fn test_confirm_registration() {
        let (db, event) = setup();
        let registrar = Registrar::new(&db);
        let participant = registrar
            .register_participant(
                &AccessScope::Administrator,
                event.id,
                ProfileFields::new().with("email", "a@x.com"),
            )
            .unwrap();
        let course = Course::new(event.id, "Lab".to_string(), Utc::now(), Utc::now()).restricted();
        db.create_course(&course).unwrap();

        let err = registrar
            .confirm_registration(&AccessScope::Administrator, participant.id, course.id)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        db.create_registration(&Registration::new(
            participant.id,
            course.id,
            RegistrationStatus::Pending,
        ))
        .unwrap();
        let confirmed = registrar
            .confirm_registration(&AccessScope::Administrator, participant.id, course.id)
            .unwrap();
        assert!(confirmed.is_confirmed());
    }

    #[test]
    fn test_badge_assigned_once() {
        let (db, event) = setup();
        let registrar = Registrar::new(&db);
        let participant = registrar
            .register_participant(
                &AccessScope::Administrator,
                event.id,
                ProfileFields::new().with("email", "a@x.com"),
            )
            .unwrap();

        let badge = registrar
            .assign_badge(&AccessScope::Administrator, participant.id)
            .unwrap();
        assert!(badge.starts_with(BADGE_PREFIX));
        assert_eq!(badge.len(), BADGE_PREFIX.len() + BADGE_LENGTH);

        let again = registrar
            .assign_badge(&AccessScope::Administrator, participant.id)
            .unwrap();
        assert_eq!(again, badge);
        assert_eq!(
            db.find_participant_by_badge(&badge).unwrap().unwrap().id,
            participant.id
        );
    }
}
