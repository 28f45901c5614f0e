//! CSV file price data adapter.
//!
//! Reads one file per instrument, `<base_path>/<SYMBOL>.csv`, matching the
//! file name case-insensitively. Columns are
//! located by header name, so exports with reordered or extra columns load
//! as-is. Rows that are not trading days (extra header rows from multi-level
//! exports, blank or non-numeric prices) are dropped.

use crate::domain::error::EdgecheckError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<SYMBOL>.csv` if present, else the first `.csv` whose stem matches
    /// `symbol` ignoring ASCII case.
    fn csv_path(&self, symbol: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", symbol));
        if exact.is_file() {
            return exact;
        }

        let Ok(entries) = fs::read_dir(&self.base_path) else {
            return exact;
        };
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().and_then(|e| e.to_str()) == Some("csv")
                    && path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|stem| stem.eq_ignore_ascii_case(symbol))
            })
            .collect();
        candidates.sort();
        candidates.into_iter().next().unwrap_or(exact)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, String> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_lowercase().replace('_', " "))
            .collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let require = |name: &str| find(name).ok_or_else(|| format!("missing '{}' column", name));

        // Multi-level exports label the date column "Price"; fall back to the first column.
        let date = find("date").unwrap_or(0);
        let close = match find("close") {
            Some(i) => i,
            None => find("adj close")
                .or_else(|| find("adjclose"))
                .ok_or_else(|| "missing 'close' column".to_string())?,
        };

        Ok(Self {
            date,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close,
            volume: require("volume")?,
        })
    }

    fn parse_row(&self, record: &StringRecord) -> Option<PriceBar> {
        let date = parse_date(record.get(self.date)?)?;
        Some(PriceBar {
            date,
            open: parse_price(record.get(self.open)?)?,
            high: parse_price(record.get(self.high)?)?,
            low: parse_price(record.get(self.low)?)?,
            close: parse_price(record.get(self.close)?)?,
            volume: parse_volume(record.get(self.volume)?)?,
        })
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(field: &str) -> Option<NaiveDate> {
    let field = field.trim();
    let day = field.get(..10).unwrap_or(field);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_price(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_volume(field: &str) -> Option<i64> {
    let field = field.trim();
    field.parse::<i64>().ok().or_else(|| {
        field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.round() as i64)
    })
}

/// Sorts by date and collapses duplicate dates, keeping the later row.
fn normalize(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.sort_by_key(|b| b.date);
    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

impl PriceDataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, EdgecheckError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| EdgecheckError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| EdgecheckError::InvalidSeries {
                symbol: symbol.to_string(),
                reason: format!("CSV header error: {}", e),
            })?
            .clone();
        let columns = ColumnMap::from_headers(&headers).map_err(|reason| {
            EdgecheckError::InvalidSeries {
                symbol: symbol.to_string(),
                reason,
            }
        })?;

        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| EdgecheckError::InvalidSeries {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            match columns.parse_row(&record) {
                Some(bar) if bar.date >= start_date && bar.date <= end_date => bars.push(bar),
                Some(_) => {}
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(symbol, dropped, "dropped non-trading rows");
        }

        Ok(normalize(bars))
    }

    fn list_symbols(&self) -> Result<Vec<String>, EdgecheckError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| EdgecheckError::DataUnavailable {
            symbol: "*".to_string(),
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_uppercase());
                }
            }
        }

        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}
