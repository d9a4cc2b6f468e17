use crate::domain::model::ColumnDefinition;
use crate::utils::error::{FormError, Result};

/// Column keys are the display name with every whitespace character removed,
/// so "Risk Level" and "RiskLevel" collide.
pub fn normalize_key(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Ordered list of user-added columns for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDefinition>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str) -> Result<&ColumnDefinition> {
        let label = name.trim();
        if label.is_empty() {
            return Err(FormError::EmptyColumnName);
        }

        let key = normalize_key(label);
        if self.contains(&key) {
            return Err(FormError::DuplicateColumn { key });
        }

        self.columns.push(ColumnDefinition {
            key,
            label: label.to_string(),
        });
        let index = self.columns.len() - 1;
        Ok(&self.columns[index])
    }

    /// Drops the definition only; row values under `key` are left alone.
    pub fn remove(&mut self, key: &str) -> Option<ColumnDefinition> {
        let position = self.columns.iter().position(|c| c.key == key)?;
        Some(self.columns.remove(position))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter()
    }

    pub fn as_slice(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
