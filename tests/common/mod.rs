#![allow(dead_code)]

use chrono::NaiveDate;
use edgecheck::domain::error::EdgecheckError;
pub use edgecheck::domain::ohlcv::PriceBar;
use edgecheck::domain::price_series::PriceSeries;
use edgecheck::ports::data_port::PriceDataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, EdgecheckError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EdgecheckError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, EdgecheckError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A consistent bar that opened at `prev_close` and closed at `close`.
pub fn make_bar(date: NaiveDate, prev_close: f64, close: f64, volume: i64) -> PriceBar {
    PriceBar {
        date,
        open: prev_close,
        high: prev_close.max(close) * 1.005,
        low: prev_close.min(close) * 0.995,
        close,
        volume,
    }
}

/// Daily bars from 2020-01-01 following `closes` and `volumes`.
pub fn bars_from(closes: &[f64], volumes: &[i64]) -> Vec<PriceBar> {
    let start = date(2020, 1, 1);
    let mut prev = closes.first().copied().unwrap_or(100.0);
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let bar = make_bar(start + chrono::Duration::days(i as i64), prev, close, volume);
            prev = close;
            bar
        })
        .collect()
}

pub fn generate_series(symbol: &str, bars: Vec<PriceBar>) -> PriceSeries {
    PriceSeries::new(symbol, bars).unwrap()
}

pub fn flat_bars(count: usize, price: f64, volume: i64) -> Vec<PriceBar> {
    bars_from(&vec![price; count], &vec![volume; count])
}

/// Closes compounding by `daily_pct` percent per bar.
pub fn rising_bars(count: usize, start_price: f64, daily_pct: f64, volume: i64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| start_price * (1.0 + daily_pct / 100.0).powi(i as i32))
        .collect();
    bars_from(&closes, &vec![volume; count])
}

/// Bar indices carrying a 5x volume spike in [`edge_bars`].
pub fn edge_spike_indices(count: usize) -> Vec<usize> {
    (30..count).filter(|i| i % 20 == 10).collect()
}

/// Small alternating drift, with a 5x volume spike every 20 bars from bar 30
/// followed by five bars of +2% closes.
pub fn edge_bars(count: usize) -> Vec<PriceBar> {
    let spikes = edge_spike_indices(count);
    let mut closes = Vec::with_capacity(count);
    let mut volumes = Vec::with_capacity(count);
    let mut price = 100.0;

    for i in 0..count {
        let after_spike = spikes.iter().any(|&s| i > s && i <= s + 5);
        if i > 0 {
            price *= if after_spike {
                1.02
            } else if i % 2 == 0 {
                1.003
            } else {
                0.997
            };
        }
        closes.push(price);
        volumes.push(if spikes.contains(&i) { 5000 } else { 1000 });
    }

    bars_from(&closes, &volumes)
}
