//! Participant profile fields and the per-event field schema

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Declared type of a profile field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Number,
    Date,
    Boolean,
}

impl FieldType {
    /// Whether a value is acceptable for a field of this type
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Empty) => true,
            (FieldType::Text, FieldValue::Boolean(_)) => false,
            (FieldType::Text, _) => true,
            (FieldType::Email, FieldValue::Text(s)) => s.contains('@'),
            (FieldType::Number, FieldValue::Number(_)) => true,
            (FieldType::Number, FieldValue::Text(s)) => s.trim().parse::<f64>().is_ok(),
            (FieldType::Date, FieldValue::Date(_)) => true,
            (FieldType::Date, FieldValue::Text(s)) => {
                NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).is_ok()
            }
            (FieldType::Boolean, FieldValue::Boolean(_)) => true,
            _ => false,
        }
    }
}

/// One entry of an event's ordered field schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Key under which the value is stored in the profile
    pub name: String,
    /// Human label, usually the spreadsheet column header
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn new(name: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A scalar cell or profile value
///
/// Deserializes from plain JSON scalars, `null` becoming `Empty`. Strings
/// always stay text; a date cell is written as `{"$date": "YYYY-MM-DD"}` so
/// every variant survives a save and reload unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Empty,
    Boolean(bool),
    Number(f64),
    Date(#[serde(with = "date_cell")] NaiveDate),
    Text(String),
}

mod date_cell {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct DateCell {
        #[serde(rename = "$date")]
        date: NaiveDate,
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        DateCell { date: *date }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        DateCell::deserialize(deserializer).map(|cell| cell.date)
    }
}

impl FieldValue {
    /// Trimmed textual rendering, `None` for blank values
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            FieldValue::Empty => return None,
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            FieldValue::Text(s) => s.trim().to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Typed profile map keyed by declared field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileFields(BTreeMap<String, FieldValue>);

impl ProfileFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Trimmed text of a field, `None` when missing or blank
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(FieldValue::as_text)
    }

    /// True when the field holds a non-blank value
    pub fn has_value(&self, key: &str) -> bool {
        self.text(key).is_some()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert, mostly for tests and seeding
    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for ProfileFields {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_values_from_json() {
        let row: BTreeMap<String, FieldValue> = serde_json::from_str(
            r#"{"Email": " A@X.com ", "Age": 42, "Born": {"$date": "1990-05-17"}, "Code": "2024-01-01", "Note": null, "Vip": true}"#,
        )
        .unwrap();

        assert_eq!(row["Email"].as_text().as_deref(), Some("A@X.com"));
        assert_eq!(row["Age"].as_text().as_deref(), Some("42"));
        assert_eq!(
            row["Born"],
            FieldValue::Date(NaiveDate::from_ymd_opt(1990, 5, 17).unwrap())
        );
        assert_eq!(row["Code"], FieldValue::Text("2024-01-01".to_string()));
        assert!(row["Note"].is_blank());
        assert_eq!(row["Vip"], FieldValue::Boolean(true));
    }

    #[test]
    fn test_profile_values_keep_their_variant() {
        let profile = ProfileFields::new()
            .with("note", "2024-01-01")
            .with("born", FieldValue::Date(NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()))
            .with("age", FieldValue::Number(42.0))
            .with("vip", FieldValue::Boolean(false))
            .with("fax", FieldValue::Empty);

        let json = serde_json::to_string(&profile).unwrap();
        let reloaded: ProfileFields = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, profile);
    }

    #[test]
    fn test_field_type_accepts() {
        assert!(FieldType::Email.accepts(&"a@x.com".into()));
        assert!(!FieldType::Email.accepts(&"nope".into()));
        assert!(FieldType::Number.accepts(&"12".into()));
        assert!(!FieldType::Boolean.accepts(&FieldValue::Number(1.0)));
        assert!(FieldType::Date.accepts(&FieldValue::Empty));
        assert!(FieldType::Date.accepts(&"2024-01-01".into()));
        assert!(!FieldType::Date.accepts(&"soon".into()));

        let date = FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(FieldType::Text.accepts(&"2024-01-01".into()));
        assert!(FieldType::Text.accepts(&date));
        assert!(FieldType::Text.accepts(&FieldValue::Number(3.5)));
        assert!(!FieldType::Text.accepts(&FieldValue::Boolean(true)));
    }

    #[test]
    fn test_profile_text_trims_and_skips_blanks() {
        let profile = ProfileFields::new()
            .with("lastName", "  Doe ")
            .with("firstName", "   ");

        assert_eq!(profile.text("lastName").as_deref(), Some("Doe"));
        assert!(!profile.has_value("firstName"));
        assert!(!profile.has_value("missing"));
    }

    #[test]
    fn test_schema_deserializes_with_defaults() {
        let fields: Vec<FieldDefinition> =
            serde_json::from_str(r#"[{"name": "email", "label": "Email", "type": "email", "required": true}, {"name": "company", "label": "Company"}]"#)
                .unwrap();

        assert_eq!(fields[0].field_type, FieldType::Email);
        assert!(fields[0].required);
        assert_eq!(fields[1].field_type, FieldType::Text);
        assert!(!fields[1].required);
    }
}
