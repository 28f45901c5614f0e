//! Signal detection over a single price series.
//!
//! # Scan Semantics
//!
//! - Candidate bars are `i` in `[W, N - H)`: every feature sees a full lookback
//!   window and every trigger has a full holding period ahead of it.
//! - A bar triggers when every predicate of the rule holds.
//! - With `cooldown = c > 0`, a trigger is suppressed unless at least `c` bars
//!   have passed since the previous emitted trigger. With `c = 0` every matching
//!   bar is emitted.
//! - The scan is lazy and single-use: events are produced in ascending date order
//!   as the iterator is advanced, and re-scanning requires calling [`scan`] again.

use crate::domain::error::EdgecheckError;
use crate::domain::price_series::PriceSeries;
use crate::domain::rule::SignalRule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub trigger_date: NaiveDate,
    pub bar_index: usize,
    /// Computed value of every rule feature at the trigger bar, keyed by DSL name.
    pub feature_values: BTreeMap<String, f64>,
    pub holding_period: usize,
}

pub struct SignalScan<'a> {
    series: &'a PriceSeries,
    rule: &'a SignalRule,
    holding_period: usize,
    next_index: usize,
    end: usize,
    last_trigger: Option<usize>,
}

/// Starts a scan of `series` with `rule`.
///
/// Fails with `InsufficientHistory` when the series cannot hold one lookback
/// window plus one holding period (`N <= W + H`), which includes `W >= N`.
pub fn scan<'a>(
    series: &'a PriceSeries,
    rule: &'a SignalRule,
    holding_period: usize,
) -> Result<SignalScan<'a>, EdgecheckError> {
    let required = rule.lookback.checked_add(holding_period);
    if required.is_none_or(|required| series.len() <= required) {
        return Err(EdgecheckError::InsufficientHistory {
            symbol: series.symbol().to_string(),
            bars: series.len(),
            required: required.unwrap_or(usize::MAX),
        });
    }

    Ok(SignalScan {
        series,
        rule,
        holding_period,
        next_index: rule.lookback,
        end: series.len() - holding_period,
        last_trigger: None,
    })
}

impl SignalScan<'_> {
    fn in_cooldown(&self, index: usize) -> bool {
        match self.last_trigger {
            Some(last) if self.rule.cooldown > 0 => index - last < self.rule.cooldown,
            _ => false,
        }
    }

    fn evaluate_at(&self, index: usize) -> Option<SignalEvent> {
        let bars = self.series.bars();
        let window = &bars[index - self.rule.lookback..index];
        let today = &bars[index];

        let mut feature_values = BTreeMap::new();
        for predicate in &self.rule.predicates {
            let (value, holds) = predicate.evaluate(window, today);
            if !holds {
                return None;
            }
            feature_values.insert(predicate.feature.to_string(), value);
        }

        Some(SignalEvent {
            symbol: self.series.symbol().to_string(),
            trigger_date: today.date,
            bar_index: index,
            feature_values,
            holding_period: self.holding_period,
        })
    }
}

impl Iterator for SignalScan<'_> {
    type Item = SignalEvent;

    fn next(&mut self) -> Option<SignalEvent> {
        while self.next_index < self.end {
            let index = self.next_index;
            self.next_index += 1;

            if self.in_cooldown(index) {
                continue;
            }
            if let Some(event) = self.evaluate_at(index) {
                self.last_trigger = Some(index);
                return Some(event);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feature::Feature;
    use crate::domain::ohlcv::PriceBar;
    use crate::domain::rule::{Comparator, Predicate};

    fn make_series(volumes: &[i64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn spike_rule(lookback: usize) -> SignalRule {
        SignalRule::new(
            "Spike",
            vec![Predicate::new(
                Feature::RelativeVolume(lookback),
                Comparator::Above,
                2.0,
            )],
            lookback,
        )
    }

    fn always_rule(lookback: usize) -> SignalRule {
        SignalRule::new(
            "Always",
            vec![Predicate::new(Feature::Close, Comparator::Above, 0.0)],
            lookback,
        )
    }

    #[test]
    fn detects_single_spike() {
        let mut volumes = vec![1000; 40];
        volumes[25] = 3000;
        let series = make_series(&volumes);
        let rule = spike_rule(10);

        let events: Vec<SignalEvent> = scan(&series, &rule, 5).unwrap().collect();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].bar_index, 25);
        assert_eq!(events[0].symbol, "TEST");
        assert_eq!(events[0].holding_period, 5);
        assert_eq!(
            events[0].trigger_date,
            NaiveDate::from_ymd_opt(2024, 1, 26).unwrap()
        );
        let rel = events[0].feature_values["REL_VOLUME(10)"];
        assert!((rel - 3.0).abs() < 1e-9);
    }

    #[test]
    fn candidate_range_is_lookback_to_n_minus_h() {
        let series = make_series(&[1000; 30]);
        let rule = always_rule(10);

        let indices: Vec<usize> = scan(&series, &rule, 5)
            .unwrap()
            .map(|e| e.bar_index)
            .collect();

        assert_eq!(indices, (10..25).collect::<Vec<_>>());
    }

    #[test]
    fn spike_outside_range_ignored() {
        let mut volumes = vec![1000; 30];
        volumes[27] = 5000;
        let series = make_series(&volumes);
        let rule = spike_rule(10);

        assert_eq!(scan(&series, &rule, 5).unwrap().count(), 0);
    }

    #[test]
    fn lookback_not_less_than_length_fails() {
        let series = make_series(&[1000; 10]);
        let rule = always_rule(10);
        let result = scan(&series, &rule, 1);
        assert!(matches!(
            result,
            Err(EdgecheckError::InsufficientHistory { bars: 10, required: 11, .. })
        ));
    }

    #[test]
    fn empty_candidate_range_fails() {
        let series = make_series(&[1000; 15]);
        let rule = always_rule(10);
        assert!(scan(&series, &rule, 5).is_err());
        assert_eq!(scan(&series, &rule, 4).unwrap().count(), 1);
    }

    #[test]
    fn cooldown_suppresses_nearby_triggers() {
        let series = make_series(&[1000; 30]);
        let rule = always_rule(10).with_cooldown(5);

        let indices: Vec<usize> = scan(&series, &rule, 5)
            .unwrap()
            .map(|e| e.bar_index)
            .collect();

        assert_eq!(indices, vec![10, 15, 20]);
    }

    #[test]
    fn cooldown_only_counts_emitted_triggers() {
        let mut volumes = vec![1000; 40];
        volumes[20] = 4000;
        volumes[22] = 9000;
        volumes[28] = 9000;
        let series = make_series(&volumes);
        let rule = spike_rule(5).with_cooldown(5);

        let indices: Vec<usize> = scan(&series, &rule, 5)
            .unwrap()
            .map(|e| e.bar_index)
            .collect();

        assert_eq!(indices, vec![20, 28]);
    }

    #[test]
    fn scan_is_lazy() {
        let series = make_series(&[1000; 30]);
        let rule = always_rule(10);
        let mut events = scan(&series, &rule, 5).unwrap();
        assert_eq!(events.next().map(|e| e.bar_index), Some(10));
        assert_eq!(events.next().map(|e| e.bar_index), Some(11));
    }

    #[test]
    fn overflowing_holding_period_is_insufficient_history() {
        let series = make_series(&[1000; 40]);
        let rule = always_rule(5);

        let result = scan(&series, &rule, usize::MAX);
        assert!(matches!(
            result,
            Err(EdgecheckError::InsufficientHistory { bars: 40, required: usize::MAX, .. })
        ));

        let rule = always_rule(usize::MAX);
        let result = scan(&series, &rule, 1);
        assert!(matches!(result, Err(EdgecheckError::InsufficientHistory { .. })));
    }
}
