use crate::core::form::ValidationIssue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Form definition error in '{field}': {message}")]
    DefinitionError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Column name cannot be empty")]
    EmptyColumnName,

    #[error("Column already exists: {key}")]
    DuplicateColumn { key: String },

    #[error("Row {index} is out of range (table has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Unknown {kind} '{name}'")]
    UnknownField { kind: &'static str, name: String },

    #[error("Role names in group '{group}' cannot be edited")]
    RoleNameLocked { group: String },

    #[error("Unrecognized command: {message}")]
    CommandError { message: String },

    #[error("Form has {} validation issue(s)", .issues.len())]
    Validation { issues: Vec<ValidationIssue> },

    #[error("Submission failed: {message}")]
    SubmissionError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Definition,
    Editing,
    Validation,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FormError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FormError::DefinitionError { .. } | FormError::InvalidConfigValueError { .. } => {
                ErrorCategory::Definition
            }
            FormError::EmptyColumnName
            | FormError::DuplicateColumn { .. }
            | FormError::RowOutOfRange { .. }
            | FormError::UnknownField { .. }
            | FormError::RoleNameLocked { .. }
            | FormError::CommandError { .. } => ErrorCategory::Editing,
            FormError::Validation { .. } => ErrorCategory::Validation,
            FormError::ZipError(_)
            | FormError::CsvError(_)
            | FormError::IoError(_)
            | FormError::SerializationError(_)
            | FormError::SubmissionError { .. } => ErrorCategory::Output,
        }
    }

    /// Editing mistakes are recoverable in-session; broken definitions and
    /// failed writes are not.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Editing => ErrorSeverity::Low,
            ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Definition => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            FormError::DefinitionError { field, .. } => {
                format!("Fix '{}' in the form definition file", field)
            }
            FormError::InvalidConfigValueError { field, .. } => {
                format!("Provide a valid value for '{}'", field)
            }
            FormError::EmptyColumnName => "Enter a non-blank column name".to_string(),
            FormError::DuplicateColumn { .. } => {
                "Choose a different column name or remove the existing column".to_string()
            }
            FormError::RowOutOfRange { len, .. } => {
                format!("Use a row index between 0 and {}", len.saturating_sub(1))
            }
            FormError::UnknownField { kind, .. } => {
                format!("Check the {} names declared in the form definition", kind)
            }
            FormError::RoleNameLocked { .. } => {
                "Only groups declared with editable_names allow renaming".to_string()
            }
            FormError::CommandError { .. } => "Type 'help' to list commands".to_string(),
            FormError::Validation { .. } => {
                "Correct the listed fields and submit again".to_string()
            }
            FormError::IoError(_) | FormError::ZipError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            FormError::CsvError(_)
            | FormError::SerializationError(_)
            | FormError::SubmissionError { .. } => {
                "Retry the submission; if it keeps failing, report the form id".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FormError::Validation { issues } => {
                let lines: Vec<String> = issues.iter().map(|i| format!("  - {}", i)).collect();
                format!("The form cannot be submitted:\n{}", lines.join("\n"))
            }
            FormError::DuplicateColumn { .. } => "Column already exists".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
