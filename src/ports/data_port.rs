//! Price data provider port.

use crate::domain::error::EdgecheckError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

/// Historical daily bars for one symbol.
///
/// Implementations return bars sorted by date with one bar per trading day,
/// already normalized to a single-level layout. Any blocking or timeout policy
/// belongs to the implementation; failures surface as `DataUnavailable`.
pub trait PriceDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, EdgecheckError>;

    fn list_symbols(&self) -> Result<Vec<String>, EdgecheckError>;
}
