use crate::core::columns::ColumnRegistry;
use crate::core::derive::DerivedField;
use crate::core::group::RepeatableGroup;
use crate::domain::model::{ColumnDefinition, FieldValue, Record, TableSnapshot};
use crate::domain::ports::Prompter;
use crate::utils::error::{FormError, Result};
use std::str::FromStr;

const DYNAMIC_PREFIX: &str = "dynamicFields.";

/// Address of one cell inside a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Fixed(String),
    Dynamic(String),
}

impl FromStr for FieldPath {
    type Err = FormError;

    /// `invoiceAmount` addresses a fixed field, `dynamicFields.Risk` a user column.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FormError::UnknownField {
                kind: "field",
                name: String::new(),
            });
        }
        Ok(match s.strip_prefix(DYNAMIC_PREFIX) {
            Some(key) => FieldPath::Dynamic(key.to_string()),
            None => FieldPath::Fixed(s.to_string()),
        })
    }
}

/// Result of an interactive column prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Added(ColumnDefinition),
    Rejected,
    Cancelled,
}

/// Rows of homogeneous records with fixed fields declared by the form and
/// columns added by the user at runtime.
#[derive(Debug, Clone)]
pub struct DynamicRecordTable {
    name: String,
    fixed_fields: Vec<String>,
    derived: Vec<DerivedField>,
    min_rows: usize,
    columns: ColumnRegistry,
    rows: RepeatableGroup<Record>,
}

impl DynamicRecordTable {
    /// Starts with a single empty seed row.
    pub fn new(name: &str, fixed_fields: Vec<String>, derived: Vec<DerivedField>) -> Self {
        let mut table = Self {
            name: name.to_string(),
            fixed_fields,
            derived,
            min_rows: 0,
            columns: ColumnRegistry::new(),
            rows: RepeatableGroup::new(),
        };
        table.add_empty_row();
        table
    }

    /// Minimum row count checked at submit time. Removal is never blocked.
    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fixed_fields(&self) -> &[String] {
        &self.fixed_fields
    }

    pub fn derived_fields(&self) -> &[DerivedField] {
        &self.derived
    }

    pub fn min_rows(&self) -> usize {
        self.min_rows
    }

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        self.rows.as_slice()
    }

    pub fn row(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_derived(&self, field: &str) -> bool {
        self.derived.iter().any(|d| d.target == field)
    }

    /// Existing rows are untouched; they read the new key as empty.
    pub fn add_column(&mut self, name: &str) -> Result<ColumnDefinition> {
        match self.columns.add(name) {
            Ok(column) => {
                tracing::debug!("Table '{}': added column '{}'", self.name, column.key);
                Ok(column.clone())
            }
            Err(e) => {
                tracing::warn!("Table '{}': column not added: {}", self.name, e);
                Err(e)
            }
        }
    }

    /// Asks for a name, alerting on collision. Rejections never mutate state.
    pub fn add_column_interactive(&mut self, prompter: &mut dyn Prompter) -> PromptOutcome {
        let Some(name) = prompter.prompt("Enter column name") else {
            return PromptOutcome::Cancelled;
        };
        if name.trim().is_empty() {
            return PromptOutcome::Cancelled;
        }

        match self.add_column(&name) {
            Ok(column) => PromptOutcome::Added(column),
            Err(e) => {
                prompter.alert(&e.user_friendly_message());
                PromptOutcome::Rejected
            }
        }
    }

    /// Values stored under `key` stay in every row's `dynamicFields`.
    pub fn remove_column(&mut self, key: &str) -> Option<ColumnDefinition> {
        let removed = self.columns.remove(key);
        if removed.is_some() {
            tracing::debug!("Table '{}': removed column '{}'", self.name, key);
        }
        removed
    }

    pub fn add_row(&mut self, seed: Record) -> usize {
        let index = self.rows.push(seed);
        tracing::debug!("Table '{}': added row {}", self.name, index);
        index
    }

    pub fn add_empty_row(&mut self) -> usize {
        let seed = Record::empty(self.fixed_fields.iter().map(String::as_str));
        self.add_row(seed)
    }

    pub fn remove_row(&mut self, index: usize) -> Result<Record> {
        let removed = self.rows.remove(index)?;
        tracing::debug!(
            "Table '{}': removed row {} ({} left)",
            self.name,
            index,
            self.rows.len()
        );
        Ok(removed)
    }

    pub fn set_field_value(
        &mut self,
        row: usize,
        path: &FieldPath,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        if let FieldPath::Fixed(name) = path {
            self.require_fixed(name)?;
        }
        let record = self.rows.get_mut(row)?;
        match path {
            FieldPath::Fixed(name) => record.fields.insert(name.clone(), value.into()),
            FieldPath::Dynamic(key) => record.dynamic_fields.insert(key.clone(), value.into()),
        };
        Ok(())
    }

    pub fn value(&self, row: usize, path: &FieldPath) -> Option<&FieldValue> {
        let record = self.rows.get(row)?;
        match path {
            FieldPath::Fixed(name) => record.fields.get(name),
            FieldPath::Dynamic(key) => record.dynamic_fields.get(key),
        }
    }

    /// Focus left `field` on `row`: recompute every derivation it triggers.
    pub fn blur(&mut self, row: usize, field: &str) -> Result<Vec<String>> {
        self.require_fixed(field)?;
        let record = self.rows.get_mut(row)?;
        let mut updated = Vec::new();
        for derived in self.derived.iter().filter(|d| d.is_triggered_by(field)) {
            let value = derived.apply(record);
            tracing::debug!("Row {}: {} = {}", row, derived.target, value);
            updated.push(derived.target.clone());
        }
        Ok(updated)
    }

    /// Runs every derivation of the table, in declaration order.
    pub fn recompute_derived(&mut self, row: usize) -> Result<()> {
        let record = self.rows.get_mut(row)?;
        for derived in &self.derived {
            derived.apply(record);
        }
        Ok(())
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            name: self.name.clone(),
            fixed_fields: self.fixed_fields.clone(),
            columns: self.columns.as_slice().to_vec(),
            rows: self.rows.as_slice().to_vec(),
        }
    }

    fn require_fixed(&self, name: &str) -> Result<()> {
        if self.fixed_fields.iter().any(|f| f == name) {
            Ok(())
        } else {
            Err(FormError::UnknownField {
                kind: "field",
                name: name.to_string(),
            })
        }
    }
}
