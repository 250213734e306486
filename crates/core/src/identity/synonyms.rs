//! Header synonym tables
//!
//! Each identity role owns an ordered list of accepted spellings. Matching
//! is done on trimmed, lower-cased text, and earlier entries win when a row
//! carries several candidate columns.

use serde::{Deserialize, Serialize};

const EMAIL: &[&str] = &["email", "e-mail", "mail", "courriel"];
const LAST_NAME: &[&str] = &["nom", "lastname", "last name"];
const FIRST_NAME: &[&str] = &["prenom", "prénom", "firstname", "first name"];
const FULL_NAME: &[&str] = &["fullname", "full name", "nom complet"];

/// The identity roles a column can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityRole {
    Email,
    LastName,
    FirstName,
}

impl IdentityRole {
    pub const ALL: [IdentityRole; 3] = [
        IdentityRole::Email,
        IdentityRole::LastName,
        IdentityRole::FirstName,
    ];

    /// Profile key used when the event schema declares no field for the role
    pub fn literal_key(&self) -> &'static str {
        match self {
            IdentityRole::Email => "email",
            IdentityRole::LastName => "lastName",
            IdentityRole::FirstName => "firstName",
        }
    }
}

/// Extra spellings supplied through configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymConfig {
    pub email: Vec<String>,
    pub last_name: Vec<String>,
    pub first_name: Vec<String>,
    pub full_name: Vec<String>,
}

/// Ordered synonym tables for every identity role plus the full-name column
#[derive(Debug, Clone, PartialEq)]
pub struct SynonymTables {
    email: Vec<String>,
    last_name: Vec<String>,
    first_name: Vec<String>,
    full_name: Vec<String>,
}

impl Default for SynonymTables {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            email: owned(EMAIL),
            last_name: owned(LAST_NAME),
            first_name: owned(FIRST_NAME),
            full_name: owned(FULL_NAME),
        }
    }
}

impl SynonymTables {
    /// Built-in tables with configured spellings appended after the defaults
    pub fn extended(mut self, extra: &SynonymConfig) -> Self {
        fn append(table: &mut Vec<String>, extra: &[String]) {
            for entry in extra {
                let entry = normalize_header(entry);
                if !entry.is_empty() && !table.contains(&entry) {
                    table.push(entry);
                }
            }
        }
        append(&mut self.email, &extra.email);
        append(&mut self.last_name, &extra.last_name);
        append(&mut self.first_name, &extra.first_name);
        append(&mut self.full_name, &extra.full_name);
        self
    }

    pub fn for_role(&self, role: IdentityRole) -> &[String] {
        match role {
            IdentityRole::Email => &self.email,
            IdentityRole::LastName => &self.last_name,
            IdentityRole::FirstName => &self.first_name,
        }
    }

    pub fn full_name(&self) -> &[String] {
        &self.full_name
    }

    /// Whether `header` is one of the spellings for `role`
    pub fn matches(&self, role: IdentityRole, header: &str) -> bool {
        let header = normalize_header(header);
        self.for_role(role).iter().any(|s| *s == header)
    }
}

/// Case-folded, trimmed form used for every header comparison
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}
