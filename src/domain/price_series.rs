//! Validated, date-ordered price history for one instrument.

use crate::domain::error::EdgecheckError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Builds a series, rejecting invalid bars and non-increasing dates.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, EdgecheckError> {
        let symbol = symbol.into();

        for bar in &bars {
            bar.validate()
                .map_err(|reason| EdgecheckError::InvalidSeries {
                    symbol: symbol.clone(),
                    reason,
                })?;
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(EdgecheckError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "dates not strictly increasing: {} then {}",
                        pair[0].date, pair[1].date
                    ),
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bar_at(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    /// Position of the bar dated `date`; bars are strictly date-ordered.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}
