//! Plain-text rendering. Output is a pure function of the data and the
//! `RenderMode` passed in; nothing here reads global state.

use crate::config::form_config::{FormDefinition, TableDefinition};
use crate::core::form::FormState;
use crate::core::group::{RepeatableGroup, RoleGroup};
use crate::core::table::DynamicRecordTable;
use crate::domain::model::{Attachment, CustomField, FieldValue};
use crate::utils::error::FormError;
use std::fmt::Write;
use std::str::FromStr;

/// Shown in print mode wherever a value is empty.
pub const PLACEHOLDER: &str = "__________";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RenderMode {
    /// Inputs and add/remove/submit controls.
    #[default]
    Edit,
    /// Static text, controls hidden.
    Print,
}

impl RenderMode {
    pub fn shows_controls(self) -> bool {
        matches!(self, RenderMode::Edit)
    }
}

impl FromStr for RenderMode {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edit" => Ok(RenderMode::Edit),
            "print" => Ok(RenderMode::Print),
            other => Err(FormError::CommandError {
                message: format!("unknown render mode '{}' (expected edit or print)", other),
            }),
        }
    }
}

pub fn render_value(value: Option<&FieldValue>, mode: RenderMode) -> String {
    let text = value.map(ToString::to_string).unwrap_or_default();
    match mode {
        RenderMode::Edit => format!("[{}]", text),
        RenderMode::Print if text.trim().is_empty() => PLACEHOLDER.to_string(),
        RenderMode::Print => text,
    }
}

/// Derived cells are not inputs, so edit mode shows them unbracketed.
fn render_derived(value: Option<&FieldValue>, mode: RenderMode) -> String {
    let text = value.map(ToString::to_string).unwrap_or_default();
    if text.trim().is_empty() && mode == RenderMode::Print {
        PLACEHOLDER.to_string()
    } else {
        format!("= {}", text)
    }
}

pub fn render_table(
    table: &DynamicRecordTable,
    definition: Option<&TableDefinition>,
    mode: RenderMode,
) -> String {
    let mut header = vec!["#".to_string()];
    for name in table.fixed_fields() {
        let label = definition
            .and_then(|d| d.field(name))
            .map(|f| f.label().to_string())
            .unwrap_or_else(|| name.clone());
        header.push(label);
    }
    for column in table.columns().iter() {
        if mode.shows_controls() {
            header.push(format!("{} [x]", column.label));
        } else {
            header.push(column.label.clone());
        }
    }
    if mode.shows_controls() {
        header.push(String::new());
    }

    let mut grid = vec![header];
    for (index, row) in table.rows().iter().enumerate() {
        let mut cells = vec![index.to_string()];
        for name in table.fixed_fields() {
            let value = row.fields.get(name);
            if table.is_derived(name) {
                cells.push(render_derived(value, mode));
            } else {
                cells.push(render_value(value, mode));
            }
        }
        for column in table.columns().iter() {
            cells.push(render_value(row.dynamic_fields.get(&column.key), mode));
        }
        if mode.shows_controls() {
            cells.push("[x]".to_string());
        }
        grid.push(cells);
    }

    let title = definition
        .and_then(|d| d.title.as_deref())
        .unwrap_or_else(|| table.name());
    let mut out = format!("-- {} --\n", title);
    out.push_str(&layout_grid(&grid));
    if mode.shows_controls() {
        out.push_str("[+ Add Row] [+ Add Column]\n");
    }
    out
}

fn layout_grid(grid: &[Vec<String>]) -> String {
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            grid.iter()
                .filter_map(|row| row.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in grid {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        let _ = writeln!(out, "| {} |", cells.join(" | ").trim_end());
    }
    out
}

pub fn render_role_group(group: &RoleGroup, title: Option<&str>, mode: RenderMode) -> String {
    let mut out = format!("-- {} --\n", title.unwrap_or_else(|| group.name()));
    for (index, entry) in group.entries().iter().enumerate() {
        let data = render_value(Some(&FieldValue::Text(entry.data.clone())), mode);
        if mode.shows_controls() {
            let role = if group.editable_names() {
                format!("[{}]", entry.role_name)
            } else {
                entry.role_name.clone()
            };
            let _ = writeln!(out, "{}. {}: {} [x]", index, role, data);
        } else {
            let _ = writeln!(out, "{}: {}", entry.role_name, data);
        }
    }
    if mode.shows_controls() {
        out.push_str("[+ Add Role]\n");
    }
    out
}

pub fn render_attachments(attachments: &RepeatableGroup<Attachment>, mode: RenderMode) -> String {
    let mut out = "-- Attachments --\n".to_string();
    if attachments.is_empty() && !mode.shows_controls() {
        let _ = writeln!(out, "{}", PLACEHOLDER);
    }
    for (index, attachment) in attachments.iter().enumerate() {
        let description = render_value(
            Some(&FieldValue::Text(attachment.description.clone())),
            mode,
        );
        if mode.shows_controls() {
            let _ = writeln!(out, "{}. {} {} [x]", index, attachment.name, description);
        } else {
            let _ = writeln!(out, "{} {}", attachment.name, description);
        }
    }
    if mode.shows_controls() {
        out.push_str("[+ Add Attachment]\n");
    }
    out
}

pub fn render_custom_fields(fields: &RepeatableGroup<CustomField>, mode: RenderMode) -> String {
    let mut out = "-- Custom Fields --\n".to_string();
    for (index, field) in fields.iter().enumerate() {
        let value = render_value(Some(&FieldValue::Text(field.value.clone())), mode);
        if mode.shows_controls() {
            let _ = writeln!(out, "{}. {}: {} [x]", index, field.label, value);
        } else {
            let _ = writeln!(out, "{}: {}", field.label, value);
        }
    }
    if mode.shows_controls() {
        out.push_str("[+ Add Custom Field]\n");
    }
    out
}

pub fn render_form(definition: &FormDefinition, state: &FormState, mode: RenderMode) -> String {
    let mut out = format!("==== {} ====\n", definition.form.title);

    for section in &definition.sections {
        let _ = writeln!(
            out,
            "\n-- {} --",
            section.title.as_deref().unwrap_or(&section.name)
        );
        for field in &section.fields {
            let value = state.section_value(&section.name, &field.name);
            let marker = if field.required && mode.shows_controls() {
                " *"
            } else {
                ""
            };
            let _ = writeln!(out, "{}{}: {}", field.label(), marker, render_value(value, mode));
        }
    }

    for table in state.tables() {
        out.push('\n');
        out.push_str(&render_table(table, definition.table(table.name()), mode));
    }

    for group in state.role_groups() {
        let title = definition
            .role_groups
            .iter()
            .find(|g| g.name == group.name())
            .and_then(|g| g.title.as_deref());
        out.push('\n');
        out.push_str(&render_role_group(group, title, mode));
    }

    out.push('\n');
    out.push_str(&render_attachments(state.attachments(), mode));
    if !state.custom_fields().is_empty() || mode.shows_controls() {
        out.push('\n');
        out.push_str(&render_custom_fields(state.custom_fields(), mode));
    }

    if mode.shows_controls() {
        out.push_str("\n[Submit]\n");
    }
    out
}
