//! Evaluation reports and precondition dumps.
//!
//! Turns accuracy records and learning results into serializable rows and
//! human-readable summaries. Writing them anywhere is left to the caller.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::accuracy::AccuracyRecord;
use super::learning::TestResult;

/// One scored precondition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRow {
    pub test_name: String,
    pub condition: String,
    pub precondition: String,
    /// Raw accuracy in percent
    pub raw_accuracy: Option<f64>,
    /// Resulting accuracy in percent
    pub resulting_accuracy: Option<f64>,
    pub measured: bool,
}

/// Summary of an accuracy evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<EvaluationRow>,
    pub measured: usize,
    pub unmeasured: usize,
}

impl EvaluationReport {
    pub fn from_records(records: &[AccuracyRecord]) -> Self {
        let rows: Vec<EvaluationRow> = records
            .iter()
            .map(|record| EvaluationRow {
                test_name: record.test.name().to_string(),
                condition: record.test.condition().description(),
                precondition: record.precondition.to_string(),
                raw_accuracy: record.raw_precision().map(|p| p * 100.0),
                resulting_accuracy: record.resulting_precision().map(|p| p * 100.0),
                measured: record.is_measured(),
            })
            .collect();
        let measured = rows.iter().filter(|row| row.measured).count();

        Self {
            generated_at: Utc::now(),
            unmeasured: rows.len() - measured,
            measured,
            rows,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current: Option<(&str, &str)> = None;
        for row in &self.rows {
            let key = (row.test_name.as_str(), row.condition.as_str());
            if current != Some(key) {
                current = Some(key);
                writeln!(f, "[Test] {} ({})", row.test_name, row.condition)?;
            }
            match (row.raw_accuracy, row.resulting_accuracy) {
                (Some(raw), Some(resulting)) => writeln!(
                    f,
                    "- Found precondition (accuracy {raw:.1}% -> {resulting:.1}%)\n  {}",
                    row.precondition
                )?,
                _ => writeln!(f, "- Unmeasured precondition\n  {}", row.precondition)?,
            }
        }
        write!(
            f,
            "Measured {} and could not measure {} preconditions",
            self.measured, self.unmeasured
        )
    }
}

/// Text dump of learned preconditions, one block per test.
pub struct PreconditionDump<'a>(pub &'a [TestResult]);

impl fmt::Display for PreconditionDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, result) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("\n\n\n")?;
            }
            write!(f, "[{}]", result.test.name())?;
            for formula in &result.preconditions {
                write!(f, "\n\n{formula}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Condition, DerivationTree, Formula, ObservableTest};
    use crate::services::accuracy::{Measurement, StreamSplit};

    fn split(passing: usize, failing: usize) -> StreamSplit {
        StreamSplit {
            passing: vec![DerivationTree::terminal("p"); passing],
            failing: vec![DerivationTree::terminal("f"); failing],
        }
    }

    fn records() -> Vec<AccuracyRecord> {
        let test = ObservableTest::new("value_over_fifty", Condition::new("value > 50"), |_: &str| {});
        vec![
            AccuracyRecord {
                test: test.clone(),
                precondition: Formula::atom("first digit >= 5"),
                measurement: Some(Measurement {
                    raw: split(1, 1),
                    constrained: split(9, 1),
                }),
            },
            AccuracyRecord {
                test,
                precondition: Formula::atom("unsatisfiable"),
                measurement: None,
            },
        ]
    }

    #[test]
    fn test_report_rows_and_totals() {
        let report = EvaluationReport::from_records(&records());
        assert_eq!(report.measured, 1);
        assert_eq!(report.unmeasured, 1);
        assert_eq!(report.rows[0].raw_accuracy, Some(50.0));
        assert_eq!(report.rows[0].resulting_accuracy, Some(90.0));
        assert!(!report.rows[1].measured);
        assert!(report.rows[1].raw_accuracy.is_none());
    }

    #[test]
    fn test_report_display() {
        let text = EvaluationReport::from_records(&records()).to_string();
        assert_eq!(text.matches("[Test] value_over_fifty (value > 50)").count(), 1);
        assert!(text.contains("accuracy 50.0% -> 90.0%"));
        assert!(text.contains("- Unmeasured precondition\n  unsatisfiable"));
        assert!(text.ends_with("Measured 1 and could not measure 1 preconditions"));
    }

    #[test]
    fn test_report_serializes() {
        let json = EvaluationReport::from_records(&records()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rows"][0]["test_name"], "value_over_fifty");
        assert_eq!(value["measured"], 1);
    }

    #[test]
    fn test_precondition_dump() {
        let results = vec![
            TestResult {
                test: ObservableTest::new("a", Condition::new("A"), |_: &str| {}),
                preconditions: vec![Formula::atom("x"), Formula::atom("y")],
                attempts: 1,
            },
            TestResult {
                test: ObservableTest::new("b", Condition::new("B"), |_: &str| {}),
                preconditions: Vec::new(),
                attempts: 5,
            },
        ];
        assert_eq!(PreconditionDump(&results).to_string(), "[a]\n\nx\n\ny\n\n\n[b]");
    }
}
