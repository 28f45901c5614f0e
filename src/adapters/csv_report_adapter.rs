//! Per-outcome CSV report adapter implementing ReportPort.
//!
//! One row per signal outcome, in evaluation order. Feature values are
//! flattened into a single `name=value` column separated by `;`.

use std::path::Path;

use serde::Serialize;

use crate::domain::error::EdgecheckError;
use crate::domain::evaluator::BacktestResult;
use crate::domain::outcome::Outcome;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct OutcomeRow<'a> {
    symbol: &'a str,
    trigger_date: String,
    bar_index: usize,
    entry_price: f64,
    exit_date: String,
    exit_price: f64,
    return_pct: f64,
    holding_days: usize,
    truncated: bool,
    features: String,
}

impl<'a> From<&'a Outcome> for OutcomeRow<'a> {
    fn from(outcome: &'a Outcome) -> Self {
        let features = outcome
            .event
            .feature_values
            .iter()
            .map(|(name, value)| format!("{}={:.4}", name, value))
            .collect::<Vec<_>>()
            .join(";");
        Self {
            symbol: &outcome.event.symbol,
            trigger_date: outcome.event.trigger_date.format("%Y-%m-%d").to_string(),
            bar_index: outcome.event.bar_index,
            entry_price: outcome.entry_price,
            exit_date: outcome.exit_date.format("%Y-%m-%d").to_string(),
            exit_price: outcome.exit_price,
            return_pct: outcome.return_pct,
            holding_days: outcome.holding_days,
            truncated: outcome.is_truncated(),
            features,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvOutcomesAdapter;

impl CsvOutcomesAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn report_error(e: csv::Error) -> EdgecheckError {
    EdgecheckError::Report {
        reason: format!("CSV write error: {}", e),
    }
}

impl ReportPort for CsvOutcomesAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), EdgecheckError> {
        let mut writer = csv::Writer::from_path(output_path).map_err(report_error)?;

        if result.outcomes.is_empty() {
            writer
                .write_record([
                    "symbol",
                    "trigger_date",
                    "bar_index",
                    "entry_price",
                    "exit_date",
                    "exit_price",
                    "return_pct",
                    "holding_days",
                    "truncated",
                    "features",
                ])
                .map_err(report_error)?;
        }
        for outcome in &result.outcomes {
            writer
                .serialize(OutcomeRow::from(outcome))
                .map_err(report_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}
