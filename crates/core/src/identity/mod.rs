//! Participant identity keys
//!
//! A participant is identified by a normalized email, or failing that by
//! a normalized (last name, first name) pair. Keys are derived from a
//! profile using the event's field schema to locate the identity fields.

mod resolver;
mod synonyms;

pub use resolver::IdentityResolver;
pub use synonyms::{normalize_header, IdentityRole, SynonymConfig, SynonymTables};

use serde::{Deserialize, Serialize};

use crate::models::{FieldDefinition, FieldType, ProfileFields};

/// Normalized lookup key for one person
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    /// Lower-cased, trimmed email
    pub email: Option<String>,
    /// Lower-cased, trimmed (last name, first name), only when both are present
    pub name_pair: Option<(String, String)>,
}

impl IdentityKey {
    /// Derive the key of a profile. Never fails: missing data yields an empty key.
    pub fn build(
        profile: &ProfileFields,
        schema: &[FieldDefinition],
        synonyms: &SynonymTables,
    ) -> Self {
        let read = |role: IdentityRole| {
            profile
                .text(&profile_key(role, schema, synonyms))
                .map(|v| v.to_lowercase())
        };

        let email = read(IdentityRole::Email);
        let name_pair = match (read(IdentityRole::LastName), read(IdentityRole::FirstName)) {
            (Some(last), Some(first)) => Some((last, first)),
            _ => None,
        };

        Self { email, name_pair }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name_pair.is_none()
    }

    /// `"lastname_firstname"` index key
    pub fn name_key(&self) -> Option<String> {
        self.name_pair
            .as_ref()
            .map(|(last, first)| format!("{last}_{first}"))
    }
}

/// The schema field that carries `role`, if the event declares one
pub fn schema_field_for<'a>(
    role: IdentityRole,
    schema: &'a [FieldDefinition],
    synonyms: &SynonymTables,
) -> Option<&'a FieldDefinition> {
    let by_label = schema
        .iter()
        .find(|f| synonyms.matches(role, &f.label) || synonyms.matches(role, &f.name));

    match role {
        IdentityRole::Email => {
            by_label.or_else(|| schema.iter().find(|f| f.field_type == FieldType::Email))
        }
        _ => by_label,
    }
}

/// Profile key holding `role`: the schema field name, else the literal fallback key
pub fn profile_key(role: IdentityRole, schema: &[FieldDefinition], synonyms: &SynonymTables) -> String {
    schema_field_for(role, schema, synonyms)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| role.literal_key().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;

    fn french_schema() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("f_mail", "Courriel", FieldType::Email),
            FieldDefinition::new("f_nom", "Nom", FieldType::Text),
            FieldDefinition::new("f_prenom", "Prenom", FieldType::Text),
        ]
    }

    #[test]
    fn test_key_from_schema_fields() {
        let profile = ProfileFields::new()
            .with("f_mail", " Jane.Doe@Example.COM ")
            .with("f_nom", "Doe")
            .with("f_prenom", " Jane");

        let key = IdentityKey::build(&profile, &french_schema(), &SynonymTables::default());
        assert_eq!(key.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(
            key.name_pair,
            Some(("doe".to_string(), "jane".to_string()))
        );
        assert_eq!(key.name_key().as_deref(), Some("doe_jane"));
    }

    #[test]
    fn test_literal_keys_used_without_schema() {
        let profile = ProfileFields::new()
            .with("lastName", "Martin")
            .with("firstName", "Paul");

        let key = IdentityKey::build(&profile, &[], &SynonymTables::default());
        assert_eq!(key.email, None);
        assert_eq!(key.name_key().as_deref(), Some("martin_paul"));
    }

    #[test]
    fn test_literal_keys_ignored_when_schema_declares_field() {
        // The schema owns the last name, so the literal key must not be consulted
        let profile = ProfileFields::new()
            .with("lastName", "Martin")
            .with("f_prenom", "Paul");

        let key = IdentityKey::build(&profile, &french_schema(), &SynonymTables::default());
        assert!(key.name_pair.is_none());
    }

    #[test]
    fn test_partial_name_yields_empty_key() {
        let profile = ProfileFields::new().with("lastName", "Martin");

        let key = IdentityKey::build(&profile, &[], &SynonymTables::default());
        assert!(key.is_empty());
    }

    #[test]
    fn test_email_field_found_by_type() {
        let schema = vec![FieldDefinition::new("contact", "Contact", FieldType::Email)];
        let profile = ProfileFields::new().with("contact", "A@X.com");

        let key = IdentityKey::build(&profile, &schema, &SynonymTables::default());
        assert_eq!(key.email.as_deref(), Some("a@x.com"));
    }
}
