//! Descriptive statistics over signal outcomes.

use super::outcome::Outcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutcomeStats {
    pub count: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
    pub win_rate: f64,
    pub mean_return: f64,
    pub median_return: f64,
    pub std_return: f64,
    pub best_return: f64,
    pub worst_return: f64,
    pub avg_holding_days: f64,
    pub truncated: usize,
}

impl OutcomeStats {
    pub fn compute(outcomes: &[Outcome]) -> Self {
        if outcomes.is_empty() {
            return Self::default();
        }

        let returns: Vec<f64> = outcomes.iter().map(|o| o.return_pct).collect();
        let count = returns.len();

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut breakeven = 0usize;
        for &r in &returns {
            if r > 0.0 {
                wins += 1;
            } else if r < 0.0 {
                losses += 1;
            } else {
                breakeven += 1;
            }
        }

        let mean_return = mean(&returns);
        let variance =
            returns.iter().map(|r| (r - mean_return).powi(2)).sum::<f64>() / count as f64;

        let best_return = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst_return = returns.iter().copied().fold(f64::INFINITY, f64::min);

        let total_holding: usize = outcomes.iter().map(|o| o.holding_days).sum();
        let truncated = outcomes.iter().filter(|o| o.is_truncated()).count();

        OutcomeStats {
            count,
            wins,
            losses,
            breakeven,
            win_rate: wins as f64 / count as f64,
            mean_return,
            median_return: median(&returns),
            std_return: variance.sqrt(),
            best_return,
            worst_return,
            avg_holding_days: total_holding as f64 / count as f64,
            truncated,
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
