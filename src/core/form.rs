use crate::config::form_config::{FieldDefinition, FieldKind, FormDefinition};
use crate::core::group::{RepeatableGroup, RoleGroup};
use crate::core::table::DynamicRecordTable;
use crate::domain::model::{Attachment, CustomField, FieldValue, SubmissionPayload};
use crate::utils::error::{FormError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// `section.field`, `table[row].field` or the table name for row-count rules.
    pub location: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Every value a user can edit on one form instance. Lives for one session.
#[derive(Debug, Clone)]
pub struct FormState {
    sections: BTreeMap<String, BTreeMap<String, FieldValue>>,
    tables: Vec<DynamicRecordTable>,
    role_groups: Vec<RoleGroup>,
    attachments: RepeatableGroup<Attachment>,
    custom_fields: RepeatableGroup<CustomField>,
}

impl FormState {
    pub fn new(definition: &FormDefinition) -> Self {
        let sections = definition
            .sections
            .iter()
            .map(|section| {
                let values = section
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), FieldValue::default()))
                    .collect();
                (section.name.clone(), values)
            })
            .collect();

        let tables = definition
            .tables
            .iter()
            .map(|t| {
                DynamicRecordTable::new(
                    &t.name,
                    t.fields.iter().map(|f| f.name.clone()).collect(),
                    t.derived.clone(),
                )
                .with_min_rows(t.min_rows)
            })
            .collect();

        let role_groups = definition
            .role_groups
            .iter()
            .map(|g| RoleGroup::new(&g.name, g.roles.iter().map(String::as_str), g.editable_names))
            .collect();

        Self {
            sections,
            tables,
            role_groups,
            attachments: RepeatableGroup::new(),
            custom_fields: RepeatableGroup::new(),
        }
    }

    pub fn section_value(&self, section: &str, field: &str) -> Option<&FieldValue> {
        self.sections.get(section)?.get(field)
    }

    pub fn set_section_value(
        &mut self,
        section: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        let values = self
            .sections
            .get_mut(section)
            .ok_or_else(|| FormError::UnknownField {
                kind: "section",
                name: section.to_string(),
            })?;
        let slot = values.get_mut(field).ok_or_else(|| FormError::UnknownField {
            kind: "field",
            name: format!("{}.{}", section, field),
        })?;
        *slot = value.into();
        Ok(())
    }

    pub fn tables(&self) -> &[DynamicRecordTable] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&DynamicRecordTable> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut DynamicRecordTable> {
        self.tables
            .iter_mut()
            .find(|t| t.name() == name)
            .ok_or_else(|| FormError::UnknownField {
                kind: "table",
                name: name.to_string(),
            })
    }

    pub fn role_groups(&self) -> &[RoleGroup] {
        &self.role_groups
    }

    pub fn role_group_mut(&mut self, name: &str) -> Result<&mut RoleGroup> {
        self.role_groups
            .iter_mut()
            .find(|g| g.name() == name)
            .ok_or_else(|| FormError::UnknownField {
                kind: "role group",
                name: name.to_string(),
            })
    }

    pub fn attachments(&self) -> &RepeatableGroup<Attachment> {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut RepeatableGroup<Attachment> {
        &mut self.attachments
    }

    pub fn custom_fields(&self) -> &RepeatableGroup<CustomField> {
        &self.custom_fields
    }

    pub fn custom_fields_mut(&mut self) -> &mut RepeatableGroup<CustomField> {
        &mut self.custom_fields
    }

    /// Submit-time checks. Editing is never blocked by these.
    pub fn validate(&self, definition: &FormDefinition) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for section in &definition.sections {
            for field in &section.fields {
                let value = self.section_value(&section.name, &field.name);
                if let Some(message) = check_field(field, value) {
                    issues.push(ValidationIssue {
                        location: format!("{}.{}", section.name, field.name),
                        message,
                    });
                }
            }
        }

        for table_def in &definition.tables {
            let Some(table) = self.table(&table_def.name) else {
                continue;
            };
            if table.len() < table_def.min_rows {
                let message = if table_def.min_rows == 1 {
                    "At least one item required".to_string()
                } else {
                    format!("At least {} items required", table_def.min_rows)
                };
                issues.push(ValidationIssue {
                    location: table_def.name.clone(),
                    message,
                });
            }
            for (index, row) in table.rows().iter().enumerate() {
                for field in &table_def.fields {
                    if let Some(message) = check_field(field, row.fields.get(&field.name)) {
                        issues.push(ValidationIssue {
                            location: format!("{}[{}].{}", table_def.name, index, field.name),
                            message,
                        });
                    }
                }
            }
        }

        issues
    }

    /// The full value tree, orphaned column values included.
    pub fn payload(
        &self,
        definition: &FormDefinition,
        submitted_at: DateTime<Utc>,
    ) -> SubmissionPayload {
        SubmissionPayload {
            form_id: definition.form.id.clone(),
            title: definition.form.title.clone(),
            submitted_at,
            sections: self.sections.clone(),
            tables: self.tables.iter().map(DynamicRecordTable::snapshot).collect(),
            role_groups: self
                .role_groups
                .iter()
                .map(|g| (g.name().to_string(), g.entries().to_vec()))
                .collect(),
            attachments: self.attachments.as_slice().to_vec(),
            custom_fields: self.custom_fields.as_slice().to_vec(),
        }
    }
}

fn check_field(field: &FieldDefinition, value: Option<&FieldValue>) -> Option<String> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ if field.required => return Some(format!("{} is required", field.label())),
        _ => return None,
    };

    match (field.kind, value) {
        (FieldKind::Number, FieldValue::Text(s))
            if !s.trim().parse::<f64>().is_ok_and(f64::is_finite) =>
        {
            Some(format!("{} must be a number", field.label()))
        }
        (FieldKind::Date, FieldValue::Text(s))
            if NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).is_err() =>
        {
            Some(format!("{} must be a date (YYYY-MM-DD)", field.label()))
        }
        (FieldKind::Date, FieldValue::Number(_)) => {
            Some(format!("{} must be a date (YYYY-MM-DD)", field.label()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::FieldPath;

    fn definition() -> FormDefinition {
        FormDefinition::from_toml_str(
            r#"
[form]
id = "treasury-checklist"
title = "Treasury Checklist"

[[sections]]
name = "header"
[[sections.fields]]
name = "preparedBy"
label = "Prepared By"
required = true
[[sections.fields]]
name = "reviewDate"
label = "Review Date"
kind = "date"

[[tables]]
name = "items"
min_rows = 1
[[tables.fields]]
name = "expectedValue"
label = "Expected"
kind = "number"
required = true
[[tables.fields]]
name = "actualValue"
kind = "number"
[[tables.fields]]
name = "variance"
[[tables.derived]]
target = "variance"
formula = "difference"
inputs = ["actualValue", "expectedValue"]

[[role_groups]]
name = "signatures"
roles = ["Checker"]
editable_names = true
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_new_state_seeds_every_structure() {
        let def = definition();
        let state = FormState::new(&def);

        assert_eq!(state.section_value("header", "preparedBy"), Some(&FieldValue::default()));
        assert_eq!(state.table("items").unwrap().len(), 1);
        assert_eq!(state.role_groups()[0].entries()[0].role_name, "Checker");
        assert!(state.attachments().is_empty());
        assert!(state.custom_fields().is_empty());
    }

    #[test]
    fn test_unknown_section_field_rejected() {
        let mut state = FormState::new(&definition());
        assert!(state.set_section_value("header", "nope", "x").is_err());
        assert!(state.set_section_value("nope", "preparedBy", "x").is_err());
        assert!(state.table_mut("nope").is_err());
    }

    #[test]
    fn test_validation_reports_required_number_and_date() {
        let def = definition();
        let mut state = FormState::new(&def);
        state.set_section_value("header", "reviewDate", "31/01/2024").unwrap();
        state
            .table_mut("items")
            .unwrap()
            .set_field_value(0, &FieldPath::Fixed("actualValue".to_string()), "abc")
            .unwrap();

        let issues = state.validate(&def);
        let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "header.preparedBy: Prepared By is required",
                "header.reviewDate: Review Date must be a date (YYYY-MM-DD)",
                "items[0].expectedValue: Expected is required",
                "items[0].actualValue: actualValue must be a number",
            ]
        );
    }

    #[test]
    fn test_non_finite_numbers_fail_validation() {
        let def = definition();
        let mut state = FormState::new(&def);
        state.set_section_value("header", "preparedBy", "A. Shah").unwrap();
        let items = state.table_mut("items").unwrap();
        items
            .set_field_value(0, &FieldPath::Fixed("expectedValue".to_string()), "NaN")
            .unwrap();
        items
            .set_field_value(0, &FieldPath::Fixed("actualValue".to_string()), "inf")
            .unwrap();

        let messages: Vec<String> = state.validate(&def).into_iter().map(|i| i.message).collect();
        assert_eq!(
            messages,
            vec!["Expected must be a number", "actualValue must be a number"]
        );
    }

    #[test]
    fn test_min_rows_enforced_only_at_validation() {
        let def = definition();
        let mut state = FormState::new(&def);
        state.set_section_value("header", "preparedBy", "A. Shah").unwrap();
        state.table_mut("items").unwrap().remove_row(0).unwrap();

        let issues = state.validate(&def);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, "items");
        assert_eq!(issues[0].message, "At least one item required");
    }

    #[test]
    fn test_valid_form_has_no_issues() {
        let def = definition();
        let mut state = FormState::new(&def);
        state.set_section_value("header", "preparedBy", "A. Shah").unwrap();
        state.set_section_value("header", "reviewDate", "2024-01-31").unwrap();
        state
            .table_mut("items")
            .unwrap()
            .set_field_value(0, &FieldPath::Fixed("expectedValue".to_string()), 10.0)
            .unwrap();

        assert!(state.validate(&def).is_empty());
    }

    #[test]
    fn test_payload_carries_orphaned_dynamic_fields() {
        let def = definition();
        let mut state = FormState::new(&def);
        let items = state.table_mut("items").unwrap();
        items.add_column("Risk").unwrap();
        items
            .set_field_value(0, &FieldPath::Dynamic("Risk".to_string()), "high")
            .unwrap();
        items.remove_column("Risk");

        let payload = state.payload(&def, Utc::now());
        assert_eq!(payload.form_id, "treasury-checklist");
        assert!(payload.tables[0].columns.is_empty());
        assert_eq!(
            payload.tables[0].rows[0].dynamic_fields["Risk"],
            FieldValue::from("high")
        );
        assert_eq!(payload.role_groups["signatures"].len(), 1);
    }
}
