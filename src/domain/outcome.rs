//! Forward outcome of a signal: entry at the trigger close, exit H bars later.

use crate::domain::detector::SignalEvent;
use crate::domain::error::EdgecheckError;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub event: SignalEvent,
    pub entry_price: f64,
    pub exit_price: f64,
    pub exit_date: NaiveDate,
    pub return_pct: f64,
    /// Bars actually held; shorter than the holding period when the series ends first.
    pub holding_days: usize,
}

impl Outcome {
    pub fn is_truncated(&self) -> bool {
        self.holding_days < self.event.holding_period
    }
}

/// (exit - entry) / entry * 100. A non-positive entry price yields 0.0.
pub fn forward_return_pct(entry_price: f64, exit_price: f64) -> f64 {
    if entry_price > 0.0 {
        (exit_price - entry_price) / entry_price * 100.0
    } else {
        0.0
    }
}

/// Computes the outcome of `event` on `series`.
///
/// The exit index is clamped to the last bar, so outcomes near the end of a
/// series may be held for fewer than `holding_period` bars; `holding_days`
/// records the length actually used.
pub fn compute_outcome(
    event: &SignalEvent,
    series: &PriceSeries,
) -> Result<Outcome, EdgecheckError> {
    let bars = series.bars();
    let index = event.bar_index;
    if index >= bars.len() {
        return Err(EdgecheckError::OutOfRangeIndex {
            symbol: series.symbol().to_string(),
            index,
            len: bars.len(),
        });
    }

    let exit_index = index.saturating_add(event.holding_period).min(bars.len() - 1);
    let entry_price = bars[index].close;
    let exit_price = bars[exit_index].close;

    Ok(Outcome {
        event: event.clone(),
        entry_price,
        exit_price,
        exit_date: bars[exit_index].date,
        return_pct: forward_return_pct(entry_price, exit_price),
        holding_days: exit_index - index,
    })
}
