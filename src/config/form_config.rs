use crate::core::derive::{DerivedField, Formula};
use crate::utils::error::{FormError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDefinition {
    pub form: FormInfo,
    #[serde(default)]
    pub sections: Vec<SectionDefinition>,
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
    #[serde(default)]
    pub role_groups: Vec<RoleGroupDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormInfo {
    pub id: String,
    pub title: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Date,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: Option<String>,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub name: String,
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub title: Option<String>,
    #[serde(default)]
    pub min_rows: usize,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub derived: Vec<DerivedField>,
}

impl TableDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleGroupDefinition {
    pub name: String,
    pub title: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub editable_names: bool,
}

impl FormDefinition {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FormError::DefinitionError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are kept verbatim.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FormError::DefinitionError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn section(&self, name: &str) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn validate_definition(&self) -> Result<()> {
        validation::validate_non_empty_string("form.id", &self.form.id)?;
        validation::validate_non_empty_string("form.title", &self.form.title)?;

        validation::validate_unique_names("sections", self.sections.iter().map(|s| s.name.as_str()))?;
        for section in &self.sections {
            let field = format!("sections.{}.fields", section.name);
            validation::validate_unique_names(&field, section.fields.iter().map(|f| f.name.as_str()))?;
        }

        validation::validate_unique_names("tables", self.tables.iter().map(|t| t.name.as_str()))?;
        for table in &self.tables {
            validate_table(table)?;
        }

        validation::validate_unique_names(
            "role_groups",
            self.role_groups.iter().map(|g| g.name.as_str()),
        )?;

        Ok(())
    }
}

fn validate_table(table: &TableDefinition) -> Result<()> {
    let prefix = format!("tables.{}", table.name);
    if table.fields.is_empty() {
        return Err(FormError::DefinitionError {
            field: format!("{}.fields", prefix),
            message: "A table needs at least one fixed field".to_string(),
        });
    }
    validation::validate_unique_names(
        &format!("{}.fields", prefix),
        table.fields.iter().map(|f| f.name.as_str()),
    )?;
    validation::validate_range(&format!("{}.min_rows", prefix), table.min_rows, 0, 10_000)?;

    let known: Vec<&str> = table.fields.iter().map(|f| f.name.as_str()).collect();
    for derived in &table.derived {
        let field = format!("{}.derived.{}", prefix, derived.target);
        validation::validate_known_name(&format!("{}.target", field), &derived.target, &known)?;
        if derived.inputs.is_empty() {
            return Err(FormError::DefinitionError {
                field,
                message: "Derived fields need at least one input".to_string(),
            });
        }
        for name in derived.inputs.iter().chain(derived.triggers.iter()) {
            validation::validate_known_name(&field, name, &known)?;
        }
        if derived.formula == Formula::Scale {
            let factor = derived.factor.ok_or_else(|| FormError::DefinitionError {
                field: field.clone(),
                message: "The scale formula requires a factor".to_string(),
            })?;
            validation::validate_range(&format!("{}.factor", field), factor, f64::MIN, f64::MAX)?;
            if derived.inputs.len() != 1 {
                return Err(FormError::DefinitionError {
                    field,
                    message: "The scale formula takes exactly one input".to_string(),
                });
            }
        }
    }
    Ok(())
}

impl Validate for FormDefinition {
    fn validate(&self) -> Result<()> {
        self.validate_definition()
    }
}
