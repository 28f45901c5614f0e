//! Universe loading for multi-instrument evaluation.
//!
//! Parses symbol lists and loads one validated price series per symbol.
//! Instruments whose data cannot be fetched or fails validation are skipped
//! and recorded; the load continues with the rest of the universe.

use crate::domain::error::EdgecheckError;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedInstrument {
    pub symbol: String,
    pub reason: String,
}

impl SkippedInstrument {
    pub fn new(symbol: &str, err: &EdgecheckError) -> Self {
        Self {
            symbol: symbol.to_string(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct LoadedUniverse {
    pub series: Vec<PriceSeries>,
    pub skipped: Vec<SkippedInstrument>,
}

fn load_one(
    data_port: &dyn PriceDataPort,
    symbol: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<PriceSeries, EdgecheckError> {
    let bars = data_port
        .fetch_bars(symbol, start_date, end_date)
        .map_err(|e| match e {
            EdgecheckError::DataUnavailable { .. } => e,
            other => EdgecheckError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: other.to_string(),
            },
        })?;

    if bars.is_empty() {
        return Err(EdgecheckError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("no bars between {} and {}", start_date, end_date),
        });
    }

    PriceSeries::new(symbol, bars)
}

/// Loads every symbol, skipping instruments that fail. Fails with
/// `EmptyUniverse` only when no symbols are given; a universe whose every
/// instrument was skipped loads as empty with the skips recorded.
pub fn load_universe(
    data_port: &dyn PriceDataPort,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<LoadedUniverse, EdgecheckError> {
    if symbols.is_empty() {
        return Err(EdgecheckError::EmptyUniverse);
    }

    let mut series = Vec::with_capacity(symbols.len());
    let mut skipped = Vec::new();

    for symbol in symbols {
        match load_one(data_port, symbol, start_date, end_date) {
            Ok(s) => {
                debug!(symbol = %symbol, bars = s.len(), "loaded price series");
                series.push(s);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping instrument");
                skipped.push(SkippedInstrument::new(symbol, &e));
            }
        }
    }

    if series.is_empty() {
        warn!(requested = symbols.len(), "no instrument could be loaded");
    } else if !skipped.is_empty() {
        info!(
            loaded = series.len(),
            requested = symbols.len(),
            "universe partially loaded"
        );
    }

    Ok(LoadedUniverse { series, skipped })
}
