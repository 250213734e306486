//! In-memory identity index for one reconciliation run

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::{IdentityKey, SynonymTables};
use crate::models::{FieldDefinition, Participant};

/// Lookup tables from normalized email and name pair to participant id
///
/// Built from the event's participants at the start of a run and grown as
/// the run creates new participants, so repeated identities inside one
/// file resolve to the record created for their first occurrence.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    by_email: HashMap<String, Uuid>,
    /// Name key -> (participant id, participant has an email)
    by_name: HashMap<String, (Uuid, bool)>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every participant of an event
    pub fn from_participants(
        participants: &[Participant],
        schema: &[FieldDefinition],
        synonyms: &SynonymTables,
    ) -> Self {
        let mut resolver = Self::new();
        for participant in participants {
            let key = IdentityKey::build(&participant.profile, schema, synonyms);
            resolver.insert(&key, participant.id);
        }
        resolver
    }

    /// Email match first, then name pair
    ///
    /// A name-pair hit is rejected when both sides carry an email: two
    /// people with different addresses are different people.
    pub fn resolve(&self, key: &IdentityKey) -> Option<Uuid> {
        if let Some(id) = key.email.as_ref().and_then(|e| self.by_email.get(e)) {
            return Some(*id);
        }

        let (id, indexed_has_email) = key.name_key().and_then(|k| self.by_name.get(&k).copied())?;
        if key.email.is_some() && indexed_has_email {
            return None;
        }
        Some(id)
    }

    /// Register a participant; the first id seen for a key is kept
    pub fn insert(&mut self, key: &IdentityKey, id: Uuid) {
        if let Some(email) = &key.email {
            self.by_email.entry(email.clone()).or_insert(id);
        }
        if let Some(name) = key.name_key() {
            self.by_name
                .entry(name)
                .or_insert((id, key.email.is_some()));
        }
    }

    /// Number of distinct participants reachable through the index
    pub fn len(&self) -> usize {
        self.by_email
            .values()
            .chain(self.by_name.values().map(|(id, _)| id))
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty() && self.by_name.is_empty()
    }
}
