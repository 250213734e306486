//! External row normalization
//!
//! Turns one raw spreadsheet row (header -> cell) into the identity fields
//! and the schema-keyed profile of a participant. Headers are matched
//! against field labels and synonym tables; nothing here touches storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::{normalize_header, profile_key, IdentityRole, SynonymTables};
use crate::models::{FieldDefinition, FieldValue, ProfileFields};

/// One row as handed over by the spreadsheet extractor
pub type RawRow = BTreeMap<String, FieldValue>;

/// Identity values found in a row, trimmed but not case-folded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityFields {
    pub email: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
}

impl IdentityFields {
    fn get(&self, role: IdentityRole) -> Option<&String> {
        match role {
            IdentityRole::Email => self.email.as_ref(),
            IdentityRole::LastName => self.last_name.as_ref(),
            IdentityRole::FirstName => self.first_name.as_ref(),
        }
    }

    fn slot(&mut self, role: IdentityRole) -> &mut Option<String> {
        match role {
            IdentityRole::Email => &mut self.email,
            IdentityRole::LastName => &mut self.last_name,
            IdentityRole::FirstName => &mut self.first_name,
        }
    }
}

/// Result of normalizing one row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    pub identity: IdentityFields,
    pub profile: ProfileFields,
}

impl NormalizedRow {
    /// Neither an email nor a complete name pair could be extracted
    pub fn is_insufficient(&self) -> bool {
        self.identity.email.is_none()
            && (self.identity.last_name.is_none() || self.identity.first_name.is_none())
    }

    /// Operator-facing label for the row
    pub fn identifier(&self) -> String {
        let id = &self.identity;
        if let Some(email) = &id.email {
            return email.clone();
        }
        match (&id.last_name, &id.first_name) {
            (Some(last), Some(first)) => format!("{last} {first}"),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => "Unknown".to_string(),
        }
    }
}

/// Normalize one raw row against the event's field schema
pub fn normalize_row(
    row: &RawRow,
    schema: &[FieldDefinition],
    synonyms: &SynonymTables,
) -> NormalizedRow {
    let mut profile = ProfileFields::new();
    for field in schema {
        if let Some(value) = find_schema_cell(row, field) {
            profile.insert(field.name.clone(), value.clone());
        }
    }

    let mut identity = IdentityFields::default();
    for role in IdentityRole::ALL {
        let from_headers = find_by_synonyms(row, synonyms.for_role(role));
        let from_profile = || profile.text(&profile_key(role, schema, synonyms));
        *identity.slot(role) = from_headers.or_else(from_profile);
    }

    if identity.last_name.is_none() || identity.first_name.is_none() {
        if let Some((last, first)) =
            find_by_synonyms(row, synonyms.full_name()).and_then(|full| split_full_name(&full))
        {
            identity.last_name.get_or_insert(last);
            identity.first_name.get_or_insert(first);
        }
    }

    for role in IdentityRole::ALL {
        if let Some(value) = identity.get(role) {
            let key = profile_key(role, schema, synonyms);
            if !profile.has_value(&key) {
                profile.insert(key, value.clone());
            }
        }
    }

    NormalizedRow { identity, profile }
}

/// Exact label, then case-insensitive label, then case-insensitive field name
fn find_schema_cell<'a>(row: &'a RawRow, field: &FieldDefinition) -> Option<&'a FieldValue> {
    let label = normalize_header(&field.label);
    let name = normalize_header(&field.name);

    row.get(&field.label)
        .or_else(|| find_normalized(row, &label))
        .or_else(|| find_normalized(row, &name))
        .filter(|v| !v.is_blank())
}

fn find_normalized<'a>(row: &'a RawRow, wanted: &str) -> Option<&'a FieldValue> {
    row.iter()
        .find(|(header, value)| normalize_header(header) == wanted && !value.is_blank())
        .map(|(_, value)| value)
}

/// First non-blank cell whose header matches the table, in table order
fn find_by_synonyms(row: &RawRow, table: &[String]) -> Option<String> {
    table
        .iter()
        .find_map(|synonym| find_normalized(row, synonym))
        .and_then(FieldValue::as_text)
}

/// Last token is the last name, the rest is the first name
fn split_full_name(full: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = full.split_whitespace().collect();
    match tokens.split_last() {
        Some((last, rest)) if !rest.is_empty() => Some((last.to_string(), rest.join(" "))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells
            .iter()
            .map(|(h, v)| (h.to_string(), FieldValue::from(*v)))
            .collect()
    }

    fn schema() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("email", "Email", FieldType::Email),
            FieldDefinition::new("lastName", "Nom", FieldType::Text),
            FieldDefinition::new("firstName", "Prenom", FieldType::Text),
            FieldDefinition::new("company", "Company", FieldType::Text),
        ]
    }

    #[test]
    fn test_exact_and_case_insensitive_labels() {
        let raw = row(&[
            ("Email", "jane@x.com"),
            ("NOM", "Doe"),
            (" prenom ", "Jane"),
            ("company", "Acme"),
        ]);

        let normalized = normalize_row(&raw, &schema(), &SynonymTables::default());
        assert_eq!(normalized.identity.email.as_deref(), Some("jane@x.com"));
        assert_eq!(normalized.identity.last_name.as_deref(), Some("Doe"));
        assert_eq!(normalized.identity.first_name.as_deref(), Some("Jane"));
        assert_eq!(normalized.profile.text("company").as_deref(), Some("Acme"));
        assert_eq!(normalized.profile.text("lastName").as_deref(), Some("Doe"));
        assert!(!normalized.is_insufficient());
    }

    #[test]
    fn test_synonym_headers_fill_schema_fields() {
        let raw = row(&[("E-mail", "a@x.com"), ("Last Name", "Doe"), ("First Name", "Jo")]);

        let normalized = normalize_row(&raw, &schema(), &SynonymTables::default());
        assert_eq!(normalized.profile.text("email").as_deref(), Some("a@x.com"));
        assert_eq!(normalized.profile.text("lastName").as_deref(), Some("Doe"));
        assert_eq!(normalized.profile.text("firstName").as_deref(), Some("Jo"));
    }

    #[test]
    fn test_full_name_split() {
        let raw = row(&[("Full Name", "Jean  Pierre Dupont")]);

        let normalized = normalize_row(&raw, &[], &SynonymTables::default());
        assert_eq!(normalized.identity.last_name.as_deref(), Some("Dupont"));
        assert_eq!(normalized.identity.first_name.as_deref(), Some("Jean Pierre"));
        // Without schema the literal keys carry the identity
        assert_eq!(normalized.profile.text("lastName").as_deref(), Some("Dupont"));
        assert_eq!(normalized.identifier(), "Dupont Jean Pierre");
    }

    #[test]
    fn test_full_name_does_not_override_populated_fields() {
        let raw = row(&[("Nom", "Durand"), ("Nom complet", "Alice Martin")]);

        let normalized = normalize_row(&raw, &[], &SynonymTables::default());
        assert_eq!(normalized.identity.last_name.as_deref(), Some("Durand"));
        assert_eq!(normalized.identity.first_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_single_token_full_name_is_insufficient() {
        let raw = row(&[("fullname", "Madonna"), ("Company", "Acme")]);

        let normalized = normalize_row(&raw, &schema(), &SynonymTables::default());
        assert!(normalized.is_insufficient());
        assert_eq!(normalized.identifier(), "Unknown");
    }

    #[test]
    fn test_blank_cells_are_ignored() {
        let mut raw = row(&[("Email", "   "), ("Nom", "Doe"), ("Prenom", "Jane")]);
        raw.insert("Company".to_string(), FieldValue::Empty);

        let normalized = normalize_row(&raw, &schema(), &SynonymTables::default());
        assert!(normalized.identity.email.is_none());
        assert!(normalized.profile.get("company").is_none());
        assert_eq!(normalized.identifier(), "Doe Jane");
    }

    #[test]
    fn test_numeric_cells_keep_type_in_profile() {
        let schema = vec![FieldDefinition::new("age", "Age", FieldType::Number)];
        let mut raw = row(&[("Email", "a@x.com")]);
        raw.insert("age".to_string(), FieldValue::Number(31.0));

        let normalized = normalize_row(&raw, &schema, &SynonymTables::default());
        assert_eq!(normalized.profile.get("age"), Some(&FieldValue::Number(31.0)));
        assert_eq!(normalized.profile.text("email").as_deref(), Some("a@x.com"));
    }
}
