use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar cell value. Date inputs are kept as `Text` in `YYYY-MM-DD` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Number(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
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

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// One table row: form-declared fixed fields plus user-added column values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(rename = "dynamicFields", default)]
    pub dynamic_fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// A record with every named fixed field present and empty.
    pub fn empty<'a, I>(field_names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            fields: field_names
                .into_iter()
                .map(|name| (name.to_string(), FieldValue::default()))
                .collect(),
            dynamic_fields: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub key: String,
    pub label: String,
}

/// One signature slot in an approval role group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleEntry {
    #[serde(rename = "roleName")]
    pub role_name: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub label: String,
    pub value: String,
}

/// Point-in-time copy of one table, including orphaned `dynamicFields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    #[serde(rename = "fixedFields")]
    pub fixed_fields: Vec<String>,
    pub columns: Vec<ColumnDefinition>,
    pub rows: Vec<Record>,
}

/// The entire value tree handed to a `Submitter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(rename = "formId")]
    pub form_id: String,
    pub title: String,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
    pub sections: BTreeMap<String, BTreeMap<String, FieldValue>>,
    pub tables: Vec<TableSnapshot>,
    #[serde(rename = "roleGroups")]
    pub role_groups: BTreeMap<String, Vec<RoleEntry>>,
    pub attachments: Vec<Attachment>,
    #[serde(rename = "customFields")]
    pub custom_fields: Vec<CustomField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub message: String,
    /// Where the payload ended up, when the submitter persisted it.
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_dynamic_fields_in_camel_case() {
        let mut record = Record::empty(["invoiceAmount"]);
        record
            .dynamic_fields
            .insert("Risk".to_string(), FieldValue::from("high"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["dynamicFields"]["Risk"], "high");
        assert_eq!(json["fields"]["invoiceAmount"], "");
    }

    #[test]
    fn test_record_json_keys_are_sorted() {
        let mut record = Record::empty(["zeta", "alpha", "mid"]);
        record
            .dynamic_fields
            .insert("Risk".to_string(), FieldValue::from("high"));
        record
            .dynamic_fields
            .insert("CostCentre".to_string(), FieldValue::from("CC-17"));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"fields":{"alpha":"","mid":"","zeta":""},"dynamicFields":{"CostCentre":"CC-17","Risk":"high"}}"#
        );
    }

    #[test]
    fn test_field_value_untagged() {
        let number: FieldValue = serde_json::from_str("12.5").unwrap();
        let text: FieldValue = serde_json::from_str("\"2024-01-31\"").unwrap();
        assert_eq!(number, FieldValue::Number(12.5));
        assert_eq!(text.as_text(), Some("2024-01-31"));
    }

    #[test]
    fn test_field_value_emptiness() {
        assert!(FieldValue::default().is_empty());
        assert!(FieldValue::from("   ").is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
    }
}
