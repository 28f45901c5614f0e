//! Configuration validation.
//!
//! Checks every section an evaluation run reads before any data is loaded, and
//! reports the first failure. Numeric keys are parsed strictly from their raw
//! text so a typo is an error instead of a silent default.

use crate::domain::error::EdgecheckError;
use crate::domain::null_sampler::MIN_SIMULATIONS;
use crate::domain::rule::SignalRule;
use crate::domain::rule_parser;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub fn validate_evaluation_config(config: &dyn ConfigPort) -> Result<(), EdgecheckError> {
    validate_dates(config)?;
    validate_symbols(config)?;
    validate_signal(config)?;
    validate_evaluation(config)?;
    Ok(())
}

/// Parses an optional key into `T`. Absent or blank → `None`.
pub fn read_optional<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, EdgecheckError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| EdgecheckError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("cannot parse '{}'", raw.trim()),
                })
        }
        _ => Ok(None),
    }
}

pub fn read_required<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<T, EdgecheckError> {
    read_optional(config, section, key)?.ok_or_else(|| EdgecheckError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    })
}

pub fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, EdgecheckError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| EdgecheckError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }),
        _ => Err(EdgecheckError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn ensure_at_least(
    value: Option<usize>,
    minimum: usize,
    section: &str,
    key: &str,
) -> Result<(), EdgecheckError> {
    match value {
        Some(v) if v < minimum => Err(EdgecheckError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be at least {}", key, minimum),
        }),
        _ => Ok(()),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), EdgecheckError> {
    let start_date = read_date(config, "data", "start_date")?;
    let end_date = read_date(config, "data", "end_date")?;

    if start_date >= end_date {
        return Err(EdgecheckError::ConfigInvalid {
            section: "data".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), EdgecheckError> {
    match config.get_string("data", "symbols") {
        Some(s) if !s.trim().is_empty() => {
            parse_symbols(&s).map_err(|e| EdgecheckError::ConfigInvalid {
                section: "data".to_string(),
                key: "symbols".to_string(),
                reason: e.to_string(),
            })?;
            Ok(())
        }
        _ => Err(EdgecheckError::ConfigMissing {
            section: "data".to_string(),
            key: "symbols".to_string(),
        }),
    }
}

fn validate_signal(config: &dyn ConfigPort) -> Result<(), EdgecheckError> {
    let rule_text = match config.get_string("signal", "rule") {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            return Err(EdgecheckError::ConfigMissing {
                section: "signal".to_string(),
                key: "rule".to_string(),
            });
        }
    };

    let lookback: usize = read_required(config, "signal", "lookback")?;
    ensure_at_least(Some(lookback), 1, "signal", "lookback")?;
    let cooldown: usize = read_optional(config, "signal", "cooldown")?.unwrap_or(0);

    let predicates = rule_parser::parse(&rule_text)?;
    let name = config
        .get_string("signal", "name")
        .unwrap_or_else(|| "signal".to_string());
    SignalRule::new(name, predicates, lookback)
        .with_cooldown(cooldown)
        .validate()
}

fn validate_evaluation(config: &dyn ConfigPort) -> Result<(), EdgecheckError> {
    let holding_period: Option<usize> = read_optional(config, "evaluation", "holding_period")?;
    ensure_at_least(holding_period, 1, "evaluation", "holding_period")?;

    let simulations: Option<usize> = read_optional(config, "evaluation", "simulations")?;
    ensure_at_least(simulations, MIN_SIMULATIONS, "evaluation", "simulations")?;

    let min_signals: Option<usize> = read_optional(config, "evaluation", "min_signals")?;
    ensure_at_least(min_signals, 1, "evaluation", "min_signals")?;

    read_optional::<u64>(config, "evaluation", "seed")?;
    Ok(())
}
