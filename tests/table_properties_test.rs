use formsheet::core::derive::{DerivedField, Formula};
use formsheet::core::{FieldValue, Prompter};
use formsheet::{DynamicRecordTable, FieldPath, FormError};

fn allocation_table() -> DynamicRecordTable {
    DynamicRecordTable::new(
        "allocations",
        vec![
            "invoiceAmount".to_string(),
            "allocatedAmount".to_string(),
            "balanceAmount".to_string(),
        ],
        vec![DerivedField {
            target: "balanceAmount".to_string(),
            formula: Formula::Difference,
            inputs: vec!["invoiceAmount".to_string(), "allocatedAmount".to_string()],
            triggers: Vec::new(),
            factor: None,
        }],
    )
}

fn fixed(name: &str) -> FieldPath {
    FieldPath::Fixed(name.to_string())
}

fn dynamic(key: &str) -> FieldPath {
    FieldPath::Dynamic(key.to_string())
}

#[derive(Default)]
struct RecordingPrompter {
    answers: Vec<String>,
    alerts: Vec<String>,
}

impl Prompter for RecordingPrompter {
    fn prompt(&mut self, _message: &str) -> Option<String> {
        if self.answers.is_empty() {
            None
        } else {
            Some(self.answers.remove(0))
        }
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

/// A second add of the same name is rejected and leaves the columns as they were.
#[test]
fn test_duplicate_column_rejection_is_idempotent() {
    for name in ["Risk", "Cost Centre", "  due  date "] {
        let mut table = allocation_table();
        let first = table.add_column(name);
        assert!(first.is_ok(), "first add of {:?} should succeed", name);
        let after_first = table.columns().clone();

        let second = table.add_column(name);
        assert!(matches!(second, Err(FormError::DuplicateColumn { .. })));
        assert_eq!(table.columns(), &after_first);
    }
}

#[test]
fn test_interactive_duplicate_alerts_only_on_rejection() {
    let mut table = allocation_table();
    let mut prompter = RecordingPrompter {
        answers: vec!["Risk".to_string(), "Risk".to_string()],
        ..Default::default()
    };

    table.add_column_interactive(&mut prompter);
    assert!(prompter.alerts.is_empty());
    table.add_column_interactive(&mut prompter);
    assert_eq!(prompter.alerts, vec!["Column already exists".to_string()]);
    assert_eq!(table.columns().len(), 1);
}

#[test]
fn test_remove_row_reduces_count_and_keeps_order() {
    for remove_at in 0..4 {
        let mut table = allocation_table();
        for _ in 0..3 {
            table.add_empty_row();
        }
        for row in 0..4 {
            table
                .set_field_value(row, &fixed("invoiceAmount"), format!("{}", row))
                .unwrap();
        }

        table.remove_row(remove_at).unwrap();

        assert_eq!(table.len(), 3);
        let remaining: Vec<String> = table
            .rows()
            .iter()
            .map(|r| r.fields["invoiceAmount"].to_string())
            .collect();
        let expected: Vec<String> = (0..4)
            .filter(|i| *i != remove_at)
            .map(|i| i.to_string())
            .collect();
        assert_eq!(remaining, expected);
    }
}

#[test]
fn test_balance_round_trip() {
    let mut table = allocation_table();
    table.set_field_value(0, &fixed("invoiceAmount"), 1000.0).unwrap();
    table.set_field_value(0, &fixed("allocatedAmount"), 400.0).unwrap();
    table.recompute_derived(0).unwrap();
    assert_eq!(
        table.value(0, &fixed("balanceAmount")),
        Some(&FieldValue::from("600.00"))
    );

    table.set_field_value(0, &fixed("invoiceAmount"), 0.0).unwrap();
    table.set_field_value(0, &fixed("allocatedAmount"), 0.0).unwrap();
    table.recompute_derived(0).unwrap();
    assert_eq!(
        table.value(0, &fixed("balanceAmount")),
        Some(&FieldValue::from("0.00"))
    );
}

#[test]
fn test_annual_cost_from_monthly() {
    let mut table = DynamicRecordTable::new(
        "expenses",
        vec!["monthlyCost".to_string(), "annualCost".to_string()],
        vec![DerivedField {
            target: "annualCost".to_string(),
            formula: Formula::Scale,
            inputs: vec!["monthlyCost".to_string()],
            triggers: Vec::new(),
            factor: Some(12.0),
        }],
    );
    table.set_field_value(0, &fixed("monthlyCost"), "1500").unwrap();
    table.blur(0, "monthlyCost").unwrap();
    assert_eq!(
        table.value(0, &fixed("annualCost")),
        Some(&FieldValue::from("18000.00"))
    );
}

#[test]
fn test_readding_removed_column_exposes_old_values() {
    let mut table = allocation_table();
    table.add_column("Risk Level").unwrap();
    table.set_field_value(0, &dynamic("RiskLevel"), "high").unwrap();

    table.remove_column("RiskLevel");
    assert!(table.columns().is_empty());

    let column = table.add_column("Risk Level").unwrap();
    assert_eq!(column.key, "RiskLevel");
    assert_eq!(
        table.value(0, &dynamic(&column.key)),
        Some(&FieldValue::from("high"))
    );
}

#[test]
fn test_non_numeric_inputs_coerce_to_zero() {
    let mut table = DynamicRecordTable::new(
        "checks",
        vec![
            "actualValue".to_string(),
            "expectedValue".to_string(),
            "variance".to_string(),
        ],
        vec![DerivedField {
            target: "variance".to_string(),
            formula: Formula::Difference,
            inputs: vec!["actualValue".to_string(), "expectedValue".to_string()],
            triggers: Vec::new(),
            factor: None,
        }],
    );
    table.set_field_value(0, &fixed("actualValue"), "abc").unwrap();
    table.set_field_value(0, &fixed("expectedValue"), "n/a").unwrap();

    let updated = table.blur(0, "actualValue").unwrap();
    assert_eq!(updated, vec!["variance".to_string()]);
    assert_eq!(
        table.value(0, &fixed("variance")),
        Some(&FieldValue::from("0.00"))
    );
}

#[test]
fn test_end_to_end_orphan_retention() {
    let mut table = allocation_table();
    assert_eq!(table.len(), 1);
    assert!(table.columns().is_empty());

    table.add_empty_row();
    table.add_empty_row();
    assert_eq!(table.len(), 3);

    let column = table.add_column("Risk").unwrap();
    assert_eq!(column.key, "Risk");
    for row in 0..3 {
        table
            .set_field_value(row, &dynamic("Risk"), format!("r{}", row))
            .unwrap();
    }

    table.remove_row(1).unwrap();
    assert_eq!(table.len(), 2);

    assert!(table.remove_column("Risk").is_some());
    assert!(table.columns().is_empty());

    let orphans: Vec<String> = table
        .rows()
        .iter()
        .map(|r| r.dynamic_fields["Risk"].to_string())
        .collect();
    assert_eq!(orphans, vec!["r0", "r2"]);
}
