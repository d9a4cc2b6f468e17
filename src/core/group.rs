use crate::domain::model::RoleEntry;
use crate::utils::error::{FormError, Result};
use serde::Serialize;

/// Ordered list edited by push and remove-by-position. Identity is the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RepeatableGroup<T> {
    items: Vec<T>,
}

impl<T> Default for RepeatableGroup<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> RepeatableGroup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: T) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    /// Later items shift up by one.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            return Err(FormError::RowOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(FormError::RowOutOfRange { index, len })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Signature/sign-off slots, e.g. "Prepared by", "Approved by".
#[derive(Debug, Clone, PartialEq)]
pub struct RoleGroup {
    name: String,
    editable_names: bool,
    entries: RepeatableGroup<RoleEntry>,
}

impl RoleGroup {
    pub fn new<'a, I>(name: &str, roles: I, editable_names: bool) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let entries = roles
            .into_iter()
            .map(|role| RoleEntry {
                role_name: role.to_string(),
                data: String::new(),
            })
            .collect();
        Self {
            name: name.to_string(),
            editable_names,
            entries: RepeatableGroup::from_items(entries),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn editable_names(&self) -> bool {
        self.editable_names
    }

    pub fn add_role(&mut self, role_name: &str) -> usize {
        tracing::debug!("Adding role '{}' to group '{}'", role_name, self.name);
        self.entries.push(RoleEntry {
            role_name: role_name.trim().to_string(),
            data: String::new(),
        })
    }

    pub fn remove_role(&mut self, index: usize) -> Result<RoleEntry> {
        self.entries.remove(index)
    }

    pub fn rename(&mut self, index: usize, role_name: &str) -> Result<()> {
        if !self.editable_names {
            return Err(FormError::RoleNameLocked {
                group: self.name.clone(),
            });
        }
        self.entries.get_mut(index)?.role_name = role_name.trim().to_string();
        Ok(())
    }

    pub fn sign(&mut self, index: usize, data: &str) -> Result<()> {
        self.entries.get_mut(index)?.data = data.to_string();
        Ok(())
    }

    pub fn entries(&self) -> &[RoleEntry] {
        self.entries.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_shifts_later_items() {
        let mut group = RepeatableGroup::from_items(vec!["a", "b", "c"]);
        assert_eq!(group.remove(0).unwrap(), "a");
        assert_eq!(group.as_slice(), &["b", "c"]);
        assert!(matches!(
            group.remove(2),
            Err(FormError::RowOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_role_group_seeds_declared_roles() {
        let group = RoleGroup::new("approvals", ["Prepared By", "Approved By"], false);
        let names: Vec<&str> = group.entries().iter().map(|e| e.role_name.as_str()).collect();
        assert_eq!(names, vec!["Prepared By", "Approved By"]);
        assert!(group.entries().iter().all(|e| e.data.is_empty()));
    }

    #[test]
    fn test_rename_requires_editable_names() {
        let mut locked = RoleGroup::new("approvals", ["Reviewer"], false);
        assert!(matches!(
            locked.rename(0, "Auditor"),
            Err(FormError::RoleNameLocked { .. })
        ));

        let mut open = RoleGroup::new("approvals", ["Reviewer"], true);
        open.rename(0, " Auditor ").unwrap();
        assert_eq!(open.entries()[0].role_name, "Auditor");
    }

    #[test]
    fn test_sign_and_remove_role() {
        let mut group = RoleGroup::new("sign-off", ["Maker", "Checker"], true);
        group.sign(1, "J. Rao, 2024-03-01").unwrap();
        group.add_role("CFO");
        group.remove_role(0).unwrap();

        assert_eq!(group.entries().len(), 2);
        assert_eq!(group.entries()[0].role_name, "Checker");
        assert_eq!(group.entries()[0].data, "J. Rao, 2024-03-01");
        assert!(group.sign(5, "x").is_err());
    }
}
