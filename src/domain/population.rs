//! Unconditional population of H-bar forward returns.
//!
//! Every bar with a complete H-bar window ahead of it contributes one return.
//! Windows overlap and come from the same instruments the signal is tested on,
//! so the population is autocorrelated; the null model treats it as an i.i.d.
//! pool anyway and should be read as an approximation.

use crate::domain::outcome::forward_return_pct;
use crate::domain::price_series::PriceSeries;

/// Forward returns for every `i` in `[0, N - H)` of one series.
pub fn forward_returns(series: &PriceSeries, holding_period: usize) -> Vec<f64> {
    let bars = series.bars();
    if holding_period == 0 || bars.len() <= holding_period {
        return Vec::new();
    }
    bars.iter()
        .zip(bars.iter().skip(holding_period))
        .map(|(entry, exit)| forward_return_pct(entry.close, exit.close))
        .collect()
}

/// Concatenated forward returns across `universe`, in universe order.
pub fn unconditional_population<'a, I>(universe: I, holding_period: usize) -> Vec<f64>
where
    I: IntoIterator<Item = &'a PriceSeries>,
{
    universe
        .into_iter()
        .flat_map(|series| forward_returns(series, holding_period))
        .collect()
}
