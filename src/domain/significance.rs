//! Significance of an observed mean return against a null distribution.
//!
//! The test is one-sided: it only asks whether the signal outperforms random
//! entries, never whether it underperforms.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const SIGNIFICANCE_ALPHA: f64 = 0.05;
pub const MARGINAL_ALPHA: f64 = 0.10;
pub const MIN_EFFECT_SIZE: f64 = 2.0;
pub const DEFAULT_MIN_SIGNALS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    RealEdge,
    Marginal,
    NoEdge,
    InsufficientSample,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::RealEdge => "REAL_EDGE",
            Verdict::Marginal => "MARGINAL",
            Verdict::NoEdge => "NO_EDGE",
            Verdict::InsufficientSample => "INSUFFICIENT_SAMPLE",
        };
        f.write_str(label)
    }
}

/// Fraction of the null distribution at or above `observed`. Empty null → 1.0.
pub fn p_value(observed: f64, null_values: &[f64]) -> f64 {
    if null_values.is_empty() {
        return 1.0;
    }
    let at_or_above = null_values.iter().filter(|&&v| v >= observed).count();
    at_or_above as f64 / null_values.len() as f64
}

/// (observed - null_mean) / null_std, or 0.0 when the null has no spread.
pub fn effect_size(observed: f64, null_mean: f64, null_std: f64) -> f64 {
    if null_std == 0.0 || !null_std.is_finite() {
        return 0.0;
    }
    let effect = (observed - null_mean) / null_std;
    if effect.is_finite() { effect } else { 0.0 }
}

/// Three-way classification of a trusted sample.
pub fn classify(p_value: f64, effect_size: f64) -> Verdict {
    if p_value < SIGNIFICANCE_ALPHA && effect_size.abs() > MIN_EFFECT_SIZE {
        Verdict::RealEdge
    } else if (SIGNIFICANCE_ALPHA..MARGINAL_ALPHA).contains(&p_value) {
        Verdict::Marginal
    } else {
        Verdict::NoEdge
    }
}

/// Classification gated on the sample-size floor.
pub fn verdict(sample_size: usize, min_signals: usize, p_value: f64, effect_size: f64) -> Verdict {
    if sample_size < min_signals {
        Verdict::InsufficientSample
    } else {
        classify(p_value, effect_size)
    }
}
