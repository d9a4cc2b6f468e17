use crate::domain::model::{FieldValue, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// All inputs added together.
    Sum,
    /// First input minus every following input.
    Difference,
    /// All inputs multiplied together.
    Product,
    /// Single input multiplied by `factor`.
    Scale,
}

/// A fixed field whose value is recomputed from sibling fields of the same row
/// when one of its trigger fields loses focus. The result is stored, so it can
/// go stale when an input changes without a blur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedField {
    pub target: String,
    pub formula: Formula,
    pub inputs: Vec<String>,
    /// Fields whose blur recomputes the target. Defaults to `inputs`.
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub factor: Option<f64>,
}

impl DerivedField {
    pub fn is_triggered_by(&self, field: &str) -> bool {
        let triggers = if self.triggers.is_empty() {
            &self.inputs
        } else {
            &self.triggers
        };
        triggers.iter().any(|t| t == field)
    }

    pub fn evaluate(&self, record: &Record) -> f64 {
        let mut values = self
            .inputs
            .iter()
            .map(|name| coerce_number(name, record.fields.get(name)));

        let result = match self.formula {
            Formula::Sum => values.sum(),
            Formula::Product => values.product(),
            Formula::Difference => {
                let first = values.next().unwrap_or(0.0);
                values.fold(first, |acc, v| acc - v)
            }
            Formula::Scale => values.next().unwrap_or(0.0) * self.factor.unwrap_or(1.0),
        };

        if result.is_finite() {
            result
        } else {
            0.0
        }
    }

    /// Recomputes the target on `record` and returns the stored text.
    pub fn apply(&self, record: &mut Record) -> String {
        let formatted = format_amount(self.evaluate(record));
        record
            .fields
            .insert(self.target.clone(), FieldValue::Text(formatted.clone()));
        formatted
    }
}

/// Missing, blank, non-numeric and non-finite inputs all read as zero.
pub fn coerce_number(name: &str, value: Option<&FieldValue>) -> f64 {
    let parsed = match value {
        Some(FieldValue::Number(n)) => Some(*n),
        Some(FieldValue::Text(s)) if s.trim().is_empty() => Some(0.0),
        Some(FieldValue::Text(s)) => s.trim().parse::<f64>().ok(),
        None => Some(0.0),
    };

    match parsed {
        Some(n) if n.is_finite() => n,
        _ => {
            tracing::debug!("Coercing non-numeric input '{}' to 0", name);
            0.0
        }
    }
}

/// Two fixed decimals with ties rounded away from zero (`1.125` gives
/// `"1.13"`); negative zero prints as "0.00".
pub fn format_amount(value: f64) -> String {
    let cents = (value * 100.0).round() / 100.0;
    let rounded = format!("{:.2}", cents);
    if rounded == "-0.00" {
        "0.00".to_string()
    } else {
        rounded
    }
}
