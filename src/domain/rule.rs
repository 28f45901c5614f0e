//! Declarative signal rules.
//!
//! A rule is data, not code: a conjunction of predicates, each comparing one
//! [`Feature`] against a numeric threshold, plus the lookback window the
//! features are computed over and an optional cooldown between triggers.

use crate::domain::error::EdgecheckError;
use crate::domain::feature::Feature;
use crate::domain::ohlcv::PriceBar;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Above,
    AtLeast,
    Below,
    AtMost,
}

impl Comparator {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Above => value > threshold,
            Comparator::AtLeast => value >= threshold,
            Comparator::Below => value < threshold,
            Comparator::AtMost => value <= threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Above => ">",
            Comparator::AtLeast => ">=",
            Comparator::Below => "<",
            Comparator::AtMost => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub feature: Feature,
    pub comparator: Comparator,
    pub threshold: f64,
}

impl Predicate {
    pub fn new(feature: Feature, comparator: Comparator, threshold: f64) -> Self {
        Self {
            feature,
            comparator,
            threshold,
        }
    }

    /// Computes the feature and tests it, returning the computed value alongside.
    pub fn evaluate(&self, window: &[PriceBar], today: &PriceBar) -> (f64, bool) {
        let value = self.feature.compute(window, today);
        (value, self.comparator.holds(value, self.threshold))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.feature,
            self.comparator.symbol(),
            self.threshold
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRule {
    pub name: String,
    pub predicates: Vec<Predicate>,
    /// Lookback window W: features at bar `i` read `bars[i-W..i]`.
    pub lookback: usize,
    /// Minimum bars between consecutive triggers on one instrument; 0 disables.
    pub cooldown: usize,
}

impl SignalRule {
    pub fn new(name: impl Into<String>, predicates: Vec<Predicate>, lookback: usize) -> Self {
        Self {
            name: name.into(),
            predicates,
            lookback,
            cooldown: 0,
        }
    }

    pub fn with_cooldown(mut self, cooldown: usize) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn validate(&self) -> Result<(), EdgecheckError> {
        if self.predicates.is_empty() {
            return Err(EdgecheckError::RuleInvalid {
                reason: format!("rule '{}' has no predicates", self.name),
            });
        }
        if self.lookback == 0 {
            return Err(EdgecheckError::RuleInvalid {
                reason: "lookback must be at least 1".to_string(),
            });
        }
        for predicate in &self.predicates {
            if !predicate.threshold.is_finite() {
                return Err(EdgecheckError::RuleInvalid {
                    reason: format!("non-finite threshold in '{}'", predicate),
                });
            }
            if let Some(period) = predicate.feature.period() {
                if period == 0 || period > self.lookback {
                    return Err(EdgecheckError::RuleInvalid {
                        reason: format!(
                            "{} period must be between 1 and lookback {}",
                            predicate.feature, self.lookback
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// The rule expression in DSL form, without name or lookback.
    pub fn expression(&self) -> String {
        self.predicates
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

impl fmt::Display for SignalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume_spike_rule() -> SignalRule {
        SignalRule::new(
            "Volume Spike",
            vec![
                Predicate::new(Feature::RelativeVolume(20), Comparator::Above, 2.0),
                Predicate::new(Feature::AbsChangePct(1), Comparator::Below, 2.0),
            ],
            20,
        )
    }

    #[test]
    fn comparators() {
        assert!(Comparator::Above.holds(2.1, 2.0));
        assert!(!Comparator::Above.holds(2.0, 2.0));
        assert!(Comparator::AtLeast.holds(2.0, 2.0));
        assert!(Comparator::Below.holds(1.9, 2.0));
        assert!(!Comparator::Below.holds(2.0, 2.0));
        assert!(Comparator::AtMost.holds(2.0, 2.0));
    }

    #[test]
    fn nan_never_satisfies() {
        assert!(!Comparator::Above.holds(f64::NAN, 0.0));
        assert!(!Comparator::AtMost.holds(f64::NAN, 0.0));
    }

    #[test]
    fn valid_rule_passes() {
        assert!(volume_spike_rule().validate().is_ok());
    }

    #[test]
    fn empty_rule_rejected() {
        let rule = SignalRule::new("Empty", vec![], 20);
        assert!(matches!(rule.validate(), Err(EdgecheckError::RuleInvalid { .. })));
    }

    #[test]
    fn zero_lookback_rejected() {
        let rule = SignalRule::new(
            "Clv",
            vec![Predicate::new(Feature::Clv, Comparator::Above, 0.9)],
            0,
        );
        assert!(rule.validate().is_err());
    }

    #[test]
    fn period_longer_than_lookback_rejected() {
        let rule = SignalRule::new(
            "Long",
            vec![Predicate::new(Feature::RelativeVolume(50), Comparator::Above, 2.0)],
            20,
        );
        assert!(matches!(rule.validate(), Err(EdgecheckError::RuleInvalid { reason }) if reason.contains("REL_VOLUME(50)")));
    }

    #[test]
    fn zero_period_rejected() {
        let rule = SignalRule::new(
            "Zero",
            vec![Predicate::new(Feature::Rsi(0), Comparator::Below, 30.0)],
            20,
        );
        assert!(rule.validate().is_err());
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let rule = SignalRule::new(
            "Nan",
            vec![Predicate::new(Feature::Clv, Comparator::Above, f64::NAN)],
            5,
        );
        assert!(rule.validate().is_err());
    }

    #[test]
    fn expression_display() {
        assert_eq!(
            volume_spike_rule().to_string(),
            "REL_VOLUME(20) > 2 AND ABS_CHANGE_PCT(1) < 2"
        );
    }

    #[test]
    fn cooldown_is_opt_in() {
        let rule = volume_spike_rule();
        assert_eq!(rule.cooldown, 0);
        assert_eq!(rule.with_cooldown(5).cooldown, 5);
    }
}
