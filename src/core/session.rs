use crate::config::form_config::FormDefinition;
use crate::core::form::FormState;
use crate::core::render::{self, RenderMode};
use crate::core::table::{FieldPath, PromptOutcome};
use crate::domain::model::{Attachment, CustomField, SubmissionReceipt};
use crate::domain::ports::{Prompter, Submitter};
use crate::utils::error::{FormError, Result};
use crate::utils::validation::Validate;
use chrono::Utc;

pub const HELP: &str = "\
Commands:
  add-row <table>
  remove-row <table> <index>
  add-column <table> [name...]
  remove-column <table> <key>
  set <table> <row> <field> <value...>
  col <table> <row> <key> <value...>
  blur <table> <row> <field>
  field <section> <name> <value...>
  add-role <group> <name...>
  remove-role <group> <index>
  rename-role <group> <index> <name...>
  sign <group> <index> <data...>
  attach <name> [description...]
  attach <name...> = <description...>
  remove-attachment <index>
  custom <label> <value...>
  custom <label...> = <value...>
  remove-custom <index>
  render [edit|print]
  validate
  submit
  help";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddRow { table: String },
    RemoveRow { table: String, index: usize },
    AddColumn { table: String, name: Option<String> },
    RemoveColumn { table: String, key: String },
    Set { table: String, row: usize, path: FieldPath, value: String },
    Blur { table: String, row: usize, field: String },
    Field { section: String, name: String, value: String },
    AddRole { group: String, name: String },
    RemoveRole { group: String, index: usize },
    RenameRole { group: String, index: usize, name: String },
    Sign { group: String, index: usize, data: String },
    Attach { name: String, description: String },
    RemoveAttachment { index: usize },
    Custom { label: String, value: String },
    RemoveCustom { index: usize },
    Render { mode: Option<RenderMode> },
    Validate,
    Submit,
    Help,
}

impl Command {
    /// Blank lines and `#` comments yield `None`. Trailing free-text
    /// arguments are kept verbatim, internal spacing included.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let tokens = tokenize(line);
        let Some(((_, verb), tokens)) = tokens.split_first() else {
            return Ok(None);
        };
        let args = Args { line, tokens };

        let command = match *verb {
            "add-row" => Command::AddRow {
                table: args.arg(0, "table")?,
            },
            "remove-row" => Command::RemoveRow {
                table: args.arg(0, "table")?,
                index: args.index(1)?,
            },
            "add-column" => Command::AddColumn {
                table: args.arg(0, "table")?,
                name: args.rest(1),
            },
            "remove-column" => Command::RemoveColumn {
                table: args.arg(0, "table")?,
                key: args.arg(1, "key")?,
            },
            "set" => Command::Set {
                table: args.arg(0, "table")?,
                row: args.index(1)?,
                path: args.arg(2, "field")?.parse()?,
                value: args.rest(3).unwrap_or_default(),
            },
            "col" => Command::Set {
                table: args.arg(0, "table")?,
                row: args.index(1)?,
                path: FieldPath::Dynamic(args.arg(2, "key")?),
                value: args.rest(3).unwrap_or_default(),
            },
            "blur" => Command::Blur {
                table: args.arg(0, "table")?,
                row: args.index(1)?,
                field: args.arg(2, "field")?,
            },
            "field" => Command::Field {
                section: args.arg(0, "section")?,
                name: args.arg(1, "name")?,
                value: args.rest(2).unwrap_or_default(),
            },
            "add-role" => Command::AddRole {
                group: args.arg(0, "group")?,
                name: args.required_rest(1, "name")?,
            },
            "remove-role" => Command::RemoveRole {
                group: args.arg(0, "group")?,
                index: args.index(1)?,
            },
            "rename-role" => Command::RenameRole {
                group: args.arg(0, "group")?,
                index: args.index(1)?,
                name: args.required_rest(2, "name")?,
            },
            "sign" => Command::Sign {
                group: args.arg(0, "group")?,
                index: args.index(1)?,
                data: args.rest(2).unwrap_or_default(),
            },
            "attach" => {
                let (name, description) = args.labelled("name")?;
                Command::Attach { name, description }
            }
            "remove-attachment" => Command::RemoveAttachment {
                index: args.index(0)?,
            },
            "custom" => {
                let (label, value) = args.labelled("label")?;
                Command::Custom { label, value }
            }
            "remove-custom" => Command::RemoveCustom {
                index: args.index(0)?,
            },
            "render" => Command::Render {
                mode: args.tokens.first().map(|(_, m)| m.parse()).transpose()?,
            },
            "validate" => Command::Validate,
            "submit" => Command::Submit,
            "help" => Command::Help,
            other => {
                return Err(FormError::CommandError {
                    message: other.to_string(),
                })
            }
        };
        Ok(Some(command))
    }
}

/// Whitespace-separated tokens with their byte offsets into `line`.
fn tokenize(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push((s, &line[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push((s, &line[s..]));
    }
    tokens
}

/// The arguments after the verb, still tied to the trimmed source line.
struct Args<'a> {
    line: &'a str,
    tokens: &'a [(usize, &'a str)],
}

impl Args<'_> {
    fn arg(&self, position: usize, name: &str) -> Result<String> {
        self.tokens
            .get(position)
            .map(|(_, s)| s.to_string())
            .ok_or_else(|| FormError::CommandError {
                message: format!("missing <{}>", name),
            })
    }

    fn index(&self, position: usize) -> Result<usize> {
        let raw = self.arg(position, "index")?;
        raw.parse().map_err(|_| FormError::CommandError {
            message: format!("'{}' is not a row index", raw),
        })
    }

    /// Everything from the token at `from` to the end of the line, as typed.
    fn rest(&self, from: usize) -> Option<String> {
        self.tokens
            .get(from)
            .map(|(offset, _)| self.line[*offset..].to_string())
    }

    fn required_rest(&self, from: usize, name: &str) -> Result<String> {
        self.rest(from).ok_or_else(|| FormError::CommandError {
            message: format!("missing <{}>", name),
        })
    }

    /// `<label...> = <value...>`, or a one-token label followed by the value.
    fn labelled(&self, name: &str) -> Result<(String, String)> {
        let text = self.required_rest(0, name)?;
        if let Some((label, value)) = text.split_once('=') {
            let label = label.trim();
            if label.is_empty() {
                return Err(FormError::CommandError {
                    message: format!("missing <{}>", name),
                });
            }
            return Ok((label.to_string(), value.trim().to_string()));
        }
        Ok((self.arg(0, name)?, self.rest(1).unwrap_or_default()))
    }
}

/// A form definition plus the live values of one form instance.
pub struct FormSession {
    definition: FormDefinition,
    state: FormState,
    mode: RenderMode,
}

impl FormSession {
    pub fn new(definition: FormDefinition) -> Result<Self> {
        definition.validate()?;
        let state = FormState::new(&definition);
        tracing::info!(
            "Opened form '{}' ({} table(s), {} section(s))",
            definition.form.id,
            definition.tables.len(),
            definition.sections.len()
        );
        Ok(Self {
            definition,
            state,
            mode: RenderMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn render(&self, mode: RenderMode) -> String {
        render::render_form(&self.definition, &self.state, mode)
    }

    /// Applies one editing command and returns the text to show the user.
    /// `Submit` is handled by [`FormSession::submit`].
    pub fn execute(&mut self, command: Command, prompter: &mut dyn Prompter) -> Result<String> {
        tracing::debug!("Executing {:?}", command);
        let output = match command {
            Command::AddRow { table } => {
                let index = self.state.table_mut(&table)?.add_empty_row();
                format!("Added row {} to {}", index, table)
            }
            Command::RemoveRow { table, index } => {
                self.state.table_mut(&table)?.remove_row(index)?;
                format!("Removed row {} from {}", index, table)
            }
            Command::AddColumn { table, name: Some(name) } => {
                let column = self.state.table_mut(&table)?.add_column(&name)?;
                format!("Added column {} ({})", column.key, column.label)
            }
            Command::AddColumn { table, name: None } => {
                match self.state.table_mut(&table)?.add_column_interactive(prompter) {
                    PromptOutcome::Added(column) => {
                        format!("Added column {} ({})", column.key, column.label)
                    }
                    PromptOutcome::Rejected => "No column added".to_string(),
                    PromptOutcome::Cancelled => "Cancelled".to_string(),
                }
            }
            Command::RemoveColumn { table, key } => {
                match self.state.table_mut(&table)?.remove_column(&key) {
                    Some(column) => format!("Removed column {}", column.key),
                    None => format!("No column {} in {}", key, table),
                }
            }
            Command::Set {
                table,
                row,
                path,
                value,
            } => {
                self.state
                    .table_mut(&table)?
                    .set_field_value(row, &path, value)?;
                "OK".to_string()
            }
            Command::Blur { table, row, field } => {
                let table_ref = self.state.table_mut(&table)?;
                let updated = table_ref.blur(row, &field)?;
                let parts: Vec<String> = updated
                    .iter()
                    .map(|target| {
                        let value = table_ref
                            .value(row, &FieldPath::Fixed(target.clone()))
                            .map(ToString::to_string)
                            .unwrap_or_default();
                        format!("{} = {}", target, value)
                    })
                    .collect();
                if parts.is_empty() {
                    "Nothing to recompute".to_string()
                } else {
                    parts.join(", ")
                }
            }
            Command::Field {
                section,
                name,
                value,
            } => {
                self.state.set_section_value(&section, &name, value)?;
                "OK".to_string()
            }
            Command::AddRole { group, name } => {
                let index = self.state.role_group_mut(&group)?.add_role(&name);
                format!("Added role {} ({})", index, name)
            }
            Command::RemoveRole { group, index } => {
                let entry = self.state.role_group_mut(&group)?.remove_role(index)?;
                format!("Removed role {}", entry.role_name)
            }
            Command::RenameRole { group, index, name } => {
                self.state.role_group_mut(&group)?.rename(index, &name)?;
                "OK".to_string()
            }
            Command::Sign { group, index, data } => {
                self.state.role_group_mut(&group)?.sign(index, &data)?;
                "OK".to_string()
            }
            Command::Attach { name, description } => {
                let index = self
                    .state
                    .attachments_mut()
                    .push(Attachment { name, description });
                format!("Added attachment {}", index)
            }
            Command::RemoveAttachment { index } => {
                let removed = self.state.attachments_mut().remove(index)?;
                format!("Removed attachment {}", removed.name)
            }
            Command::Custom { label, value } => {
                let index = self
                    .state
                    .custom_fields_mut()
                    .push(CustomField { label, value });
                format!("Added custom field {}", index)
            }
            Command::RemoveCustom { index } => {
                let removed = self.state.custom_fields_mut().remove(index)?;
                format!("Removed custom field {}", removed.label)
            }
            Command::Render { mode } => self.render(mode.unwrap_or(self.mode)),
            Command::Validate => {
                let issues = self.state.validate(&self.definition);
                if issues.is_empty() {
                    "Form is valid".to_string()
                } else {
                    issues
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::Help => HELP.to_string(),
            Command::Submit => {
                return Err(FormError::CommandError {
                    message: "submit must go through FormSession::submit".to_string(),
                })
            }
        };
        Ok(output)
    }

    /// Validates, then hands the full value tree to `submitter`.
    pub async fn submit(&self, submitter: &dyn Submitter) -> Result<SubmissionReceipt> {
        let issues = self.state.validate(&self.definition);
        if !issues.is_empty() {
            tracing::warn!(
                "Submission of '{}' blocked by {} validation issue(s)",
                self.definition.form.id,
                issues.len()
            );
            return Err(FormError::Validation { issues });
        }

        let payload = self.state.payload(&self.definition, Utc::now());
        let receipt = submitter.submit(&payload).await?;
        tracing::info!("Form '{}': {}", payload.form_id, receipt.message);
        Ok(receipt)
    }
}
