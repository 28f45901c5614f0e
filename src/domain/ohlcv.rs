//! Daily price bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// Checks high >= max(open, close) >= min(open, close) >= low >= 0 and volume >= 0.
    pub fn validate(&self) -> Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(format!("{}: non-finite price", self.date));
        }
        if self.low < 0.0 {
            return Err(format!("{}: negative low {}", self.date, self.low));
        }
        if self.high < self.open.max(self.close) {
            return Err(format!(
                "{}: high {} below max(open, close)",
                self.date, self.high
            ));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!(
                "{}: low {} above min(open, close)",
                self.date, self.low
            ));
        }
        if self.volume < 0 {
            return Err(format!("{}: negative volume {}", self.date, self.volume));
        }
        Ok(())
    }

    /// Close Location Value: (close - low) / (high - low). A zero range yields 0.5.
    pub fn clv(&self) -> f64 {
        let range = self.high - self.low;
        if range > 0.0 {
            (self.close - self.low) / range
        } else {
            0.5
        }
    }

    /// Percent change of this close relative to `prev_close`; 0.0 when the base is not positive.
    pub fn change_pct(&self, prev_close: f64) -> f64 {
        if prev_close > 0.0 {
            (self.close - prev_close) / prev_close * 100.0
        } else {
            0.0
        }
    }
}
