//! Backtest evaluation: detector → outcomes → null sampler → significance.
//!
//! [`evaluate`] runs the whole procedure for one rule over one universe and
//! returns a self-contained [`BacktestResult`]. Per-instrument failures are
//! recovered (the instrument is recorded in `skipped` and the run continues);
//! structural failures (invalid rule or parameters, empty universe, detector
//! contract violations) are returned to the caller.

use crate::domain::detector;
use crate::domain::error::EdgecheckError;
use crate::domain::metrics::OutcomeStats;
use crate::domain::null_sampler::{DEFAULT_SIMULATIONS, NullSampler};
use crate::domain::outcome::{Outcome, compute_outcome};
use crate::domain::population::unconditional_population;
use crate::domain::price_series::PriceSeries;
use crate::domain::rule::SignalRule;
use crate::domain::significance::{self, DEFAULT_MIN_SIGNALS, Verdict};
use crate::domain::universe::{SkippedInstrument, load_universe};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_HOLDING_PERIOD: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub holding_period: usize,
    pub simulations: usize,
    pub min_signals: usize,
    /// Fixed seed for the null sampler; drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            holding_period: DEFAULT_HOLDING_PERIOD,
            simulations: DEFAULT_SIMULATIONS,
            min_signals: DEFAULT_MIN_SIGNALS,
            seed: None,
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<(), EdgecheckError> {
        if self.holding_period == 0 {
            return Err(EdgecheckError::InvalidParameter {
                name: "holding_period".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_signals == 0 {
            return Err(EdgecheckError::InvalidParameter {
                name: "min_signals".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        NullSampler::new(self.simulations, 0).validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub signal_name: String,
    pub rule: String,
    pub lookback: usize,
    pub holding_period: usize,
    pub outcomes: Vec<Outcome>,
    pub stats: OutcomeStats,
    pub signal_count: usize,
    pub win_rate: f64,
    pub mean_return: f64,
    pub median_return: f64,
    pub p_value: f64,
    pub effect_size: f64,
    pub null_mean: f64,
    pub null_std: f64,
    pub simulations: usize,
    pub seed: u64,
    pub min_signals: usize,
    pub population_size: usize,
    pub instruments_evaluated: usize,
    pub skipped: Vec<SkippedInstrument>,
    pub verdict: Verdict,
}

impl BacktestResult {
    /// True only for verdicts backed by enough signals.
    pub fn is_conclusive(&self) -> bool {
        self.verdict != Verdict::InsufficientSample
    }
}

pub fn evaluate(
    rule: &SignalRule,
    universe: &[PriceSeries],
    config: &EvaluationConfig,
) -> Result<BacktestResult, EdgecheckError> {
    rule.validate()?;
    config.validate()?;
    if universe.is_empty() {
        return Err(EdgecheckError::EmptyUniverse);
    }

    evaluate_series(rule, universe, config)
}

/// Scans and scores `universe`, which may be empty once every requested
/// instrument has been skipped.
fn evaluate_series(
    rule: &SignalRule,
    universe: &[PriceSeries],
    config: &EvaluationConfig,
) -> Result<BacktestResult, EdgecheckError> {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(
        signal = %rule.name,
        instruments = universe.len(),
        holding_period = config.holding_period,
        simulations = config.simulations,
        seed,
        "evaluating signal"
    );

    let mut outcomes = Vec::new();
    let mut evaluated: Vec<&PriceSeries> = Vec::with_capacity(universe.len());
    let mut skipped = Vec::new();

    for series in universe {
        let events = match detector::scan(series, rule, config.holding_period) {
            Ok(events) => events,
            Err(e) if e.is_instrument_local() => {
                warn!(symbol = %series.symbol(), error = %e, "skipping instrument");
                skipped.push(SkippedInstrument::new(series.symbol(), &e));
                continue;
            }
            Err(e) => return Err(e),
        };

        let before = outcomes.len();
        for event in events {
            outcomes.push(compute_outcome(&event, series)?);
        }
        debug!(
            symbol = %series.symbol(),
            signals = outcomes.len() - before,
            "scanned instrument"
        );
        evaluated.push(series);
    }

    let stats = OutcomeStats::compute(&outcomes);
    let population = unconditional_population(evaluated.iter().copied(), config.holding_period);

    let (null_mean, null_std, p_value, effect_size) = if outcomes.is_empty() || population.is_empty()
    {
        (0.0, 0.0, 1.0, 0.0)
    } else {
        let null = NullSampler::new(config.simulations, seed).sample(&population, outcomes.len())?;
        let p = significance::p_value(stats.mean_return, &null.values);
        let effect = significance::effect_size(stats.mean_return, null.mean, null.std);
        (null.mean, null.std, p, effect)
    };

    let verdict = significance::verdict(outcomes.len(), config.min_signals, p_value, effect_size);
    info!(
        signal = %rule.name,
        signals = outcomes.len(),
        mean_return = stats.mean_return,
        p_value,
        effect_size,
        verdict = %verdict,
        "evaluation complete"
    );

    Ok(BacktestResult {
        signal_name: rule.name.clone(),
        rule: rule.expression(),
        lookback: rule.lookback,
        holding_period: config.holding_period,
        signal_count: outcomes.len(),
        win_rate: stats.win_rate,
        mean_return: stats.mean_return,
        median_return: stats.median_return,
        stats,
        outcomes,
        p_value,
        effect_size,
        null_mean,
        null_std,
        simulations: config.simulations,
        seed,
        min_signals: config.min_signals,
        population_size: population.len(),
        instruments_evaluated: evaluated.len(),
        skipped,
        verdict,
    })
}

/// Loads `symbols` through `data_port` and evaluates the survivors.
/// Instruments skipped while loading are listed ahead of those skipped by the scan.
/// Fails with `EmptyUniverse` only when `symbols` is empty.
pub fn evaluate_from_port(
    data_port: &dyn PriceDataPort,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    rule: &SignalRule,
    config: &EvaluationConfig,
) -> Result<BacktestResult, EdgecheckError> {
    rule.validate()?;
    config.validate()?;

    let loaded = load_universe(data_port, symbols, start_date, end_date)?;
    let mut result = evaluate_series(rule, &loaded.series, config)?;

    let mut skipped = loaded.skipped;
    skipped.append(&mut result.skipped);
    result.skipped = skipped;
    Ok(result)
}
