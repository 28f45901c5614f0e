//! Signal features: pure functions over a lookback window.
//!
//! Every feature is evaluated at bar `i` from `window = bars[i-W..i]` (the W bars
//! strictly before the trigger bar) and `today = bars[i]`. Features with a period
//! `n` read only the last `n` bars of the window.
//!
//! Divisions by zero never fail; each feature substitutes a neutral value:
//!
//! | Feature             | Neutral value                  |
//! |---------------------|--------------------------------|
//! | `REL_VOLUME(n)`     | 1.0 when the average volume is 0 |
//! | `CHANGE_PCT(n)`     | 0.0 when the base close is <= 0 |
//! | `ABS_CHANGE_PCT(n)` | 0.0 when the base close is <= 0 |
//! | `CLV`               | 0.5 when high == low           |
//! | `RSI(n)`            | 100 with no losses, 50 with no movement |
//! | `DIST_FROM_HIGH(n)` | 0.0 when the high is <= 0      |
//! | `UP_DOWN_VOLUME(n)` | 1.0 when down-volume is 0      |

use crate::domain::ohlcv::PriceBar;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    RelativeVolume(usize),
    ChangePct(usize),
    AbsChangePct(usize),
    Clv,
    Rsi(usize),
    DistanceFromHigh(usize),
    UpDownVolume(usize),
    Volume,
    Close,
}

impl Feature {
    /// Number of window bars the feature reads, if it takes a period.
    pub fn period(&self) -> Option<usize> {
        match self {
            Feature::RelativeVolume(n)
            | Feature::ChangePct(n)
            | Feature::AbsChangePct(n)
            | Feature::Rsi(n)
            | Feature::DistanceFromHigh(n)
            | Feature::UpDownVolume(n) => Some(*n),
            Feature::Clv | Feature::Volume | Feature::Close => None,
        }
    }

    /// Evaluates the feature. `window` must hold at least `period()` bars.
    pub fn compute(&self, window: &[PriceBar], today: &PriceBar) -> f64 {
        match self {
            Feature::RelativeVolume(n) => relative_volume(tail(window, *n), today),
            Feature::ChangePct(n) => change_pct(tail(window, *n), today),
            Feature::AbsChangePct(n) => change_pct(tail(window, *n), today).abs(),
            Feature::Clv => today.clv(),
            Feature::Rsi(n) => rsi(tail(window, *n), today),
            Feature::DistanceFromHigh(n) => distance_from_high(tail(window, *n), today),
            Feature::UpDownVolume(n) => up_down_volume(tail(window, *n), today),
            Feature::Volume => today.volume as f64,
            Feature::Close => today.close,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::RelativeVolume(n) => write!(f, "REL_VOLUME({n})"),
            Feature::ChangePct(n) => write!(f, "CHANGE_PCT({n})"),
            Feature::AbsChangePct(n) => write!(f, "ABS_CHANGE_PCT({n})"),
            Feature::Clv => write!(f, "CLV"),
            Feature::Rsi(n) => write!(f, "RSI({n})"),
            Feature::DistanceFromHigh(n) => write!(f, "DIST_FROM_HIGH({n})"),
            Feature::UpDownVolume(n) => write!(f, "UP_DOWN_VOLUME({n})"),
            Feature::Volume => write!(f, "VOLUME"),
            Feature::Close => write!(f, "CLOSE"),
        }
    }
}

fn tail(window: &[PriceBar], n: usize) -> &[PriceBar] {
    &window[window.len().saturating_sub(n)..]
}

fn relative_volume(window: &[PriceBar], today: &PriceBar) -> f64 {
    if window.is_empty() {
        return 1.0;
    }
    let avg = window.iter().map(|b| b.volume as f64).sum::<f64>() / window.len() as f64;
    if avg > 0.0 {
        today.volume as f64 / avg
    } else {
        1.0
    }
}

fn change_pct(window: &[PriceBar], today: &PriceBar) -> f64 {
    match window.first() {
        Some(base) => today.change_pct(base.close),
        None => 0.0,
    }
}

/// Closes from the start of `window` through `today`, as consecutive pairs.
fn close_steps<'a>(
    window: &'a [PriceBar],
    today: &'a PriceBar,
) -> impl Iterator<Item = (&'a PriceBar, &'a PriceBar)> {
    let following = window.iter().skip(1).chain(std::iter::once(today));
    window.iter().zip(following)
}

fn rsi(window: &[PriceBar], today: &PriceBar) -> f64 {
    if window.is_empty() {
        return 50.0;
    }
    let mut gains = 0.0;
    let mut losses = 0.0;
    for (prev, curr) in close_steps(window, today) {
        let change = curr.close - prev.close;
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }
    let steps = window.len() as f64;
    let avg_gain = gains / steps;
    let avg_loss = losses / steps;
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

fn distance_from_high(window: &[PriceBar], today: &PriceBar) -> f64 {
    let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    if high > 0.0 {
        (today.close - high) / high * 100.0
    } else {
        0.0
    }
}

fn up_down_volume(window: &[PriceBar], today: &PriceBar) -> f64 {
    let mut up = 0.0;
    let mut down = 0.0;
    for (prev, curr) in close_steps(window, today) {
        if curr.close > prev.close {
            up += curr.volume as f64;
        } else if curr.close < prev.close {
            down += curr.volume as f64;
        }
    }
    if down > 0.0 { up / down } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, close: f64, volume: i64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        }
    }

    fn flat_window(len: usize, close: f64, volume: i64) -> Vec<PriceBar> {
        (0..len)
            .map(|i| make_bar(i as u32 + 1, close, volume))
            .collect()
    }

    #[test]
    fn relative_volume_against_trailing_average() {
        let window = flat_window(20, 100.0, 1000);
        let today = make_bar(21, 100.0, 3000);
        let value = Feature::RelativeVolume(20).compute(&window, &today);
        assert!((value - 3.0).abs() < 1e-9);
    }

    #[test]
    fn relative_volume_uses_only_last_n_bars() {
        let mut window = flat_window(20, 100.0, 5000);
        for bar in window.iter_mut().skip(15) {
            bar.volume = 1000;
        }
        let today = make_bar(21, 100.0, 2000);
        let value = Feature::RelativeVolume(5).compute(&window, &today);
        assert!((value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn relative_volume_zero_average_is_neutral() {
        let window = flat_window(10, 100.0, 0);
        let today = make_bar(11, 100.0, 500);
        assert_eq!(Feature::RelativeVolume(10).compute(&window, &today), 1.0);
    }

    #[test]
    fn change_pct_over_period() {
        let window: Vec<PriceBar> = (0..5).map(|i| make_bar(i + 1, 100.0 + i as f64, 1000)).collect();
        let today = make_bar(6, 110.0, 1000);
        // Base is window[3] = 103 for n=2: (110 - 103) / 103 * 100
        let expected = (110.0 - 103.0) / 103.0 * 100.0;
        assert!((Feature::ChangePct(2).compute(&window, &today) - expected).abs() < 1e-9);
    }

    #[test]
    fn abs_change_pct_is_absolute() {
        let window = flat_window(3, 100.0, 1000);
        let today = make_bar(4, 97.0, 1000);
        assert!((Feature::ChangePct(1).compute(&window, &today) + 3.0).abs() < 1e-9);
        assert!((Feature::AbsChangePct(1).compute(&window, &today) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn change_pct_zero_base_is_neutral() {
        let mut window = flat_window(3, 0.0, 1000);
        for bar in window.iter_mut() {
            bar.low = 0.0;
        }
        let today = make_bar(4, 5.0, 1000);
        assert_eq!(Feature::ChangePct(1).compute(&window, &today), 0.0);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let window: Vec<PriceBar> = (0..14).map(|i| make_bar(i + 1, 100.0 + i as f64, 1000)).collect();
        let today = make_bar(15, 120.0, 1000);
        assert_eq!(Feature::Rsi(14).compute(&window, &today), 100.0);
    }

    #[test]
    fn rsi_no_movement_is_50() {
        let window = flat_window(14, 100.0, 1000);
        let today = make_bar(15, 100.0, 1000);
        assert_eq!(Feature::Rsi(14).compute(&window, &today), 50.0);
    }

    #[test]
    fn rsi_balanced_moves_is_50() {
        // +2, -2 across two steps
        let window = vec![make_bar(1, 100.0, 1000), make_bar(2, 102.0, 1000)];
        let today = make_bar(3, 100.0, 1000);
        assert!((Feature::Rsi(2).compute(&window, &today) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn distance_from_high_is_negative_below_high() {
        let window = flat_window(10, 100.0, 1000); // highs at 101
        let today = make_bar(11, 90.9, 1000);
        let expected = (90.9 - 101.0) / 101.0 * 100.0;
        assert!((Feature::DistanceFromHigh(10).compute(&window, &today) - expected).abs() < 1e-9);
    }

    #[test]
    fn up_down_volume_ratio() {
        let window = vec![
            make_bar(1, 100.0, 1000),
            make_bar(2, 101.0, 3000),
            make_bar(3, 100.0, 1000),
        ];
        let today = make_bar(4, 102.0, 1000);
        // up: 3000 + 1000, down: 1000
        assert!((Feature::UpDownVolume(3).compute(&window, &today) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn up_down_volume_no_down_volume_is_neutral() {
        let window: Vec<PriceBar> = (0..5).map(|i| make_bar(i + 1, 100.0 + i as f64, 1000)).collect();
        let today = make_bar(6, 110.0, 1000);
        assert_eq!(Feature::UpDownVolume(5).compute(&window, &today), 1.0);
    }

    #[test]
    fn raw_fields_and_clv() {
        let window = flat_window(1, 100.0, 1000);
        let today = PriceBar {
            high: 110.0,
            low: 100.0,
            close: 108.0,
            ..make_bar(2, 108.0, 4200)
        };
        assert_eq!(Feature::Volume.compute(&window, &today), 4200.0);
        assert_eq!(Feature::Close.compute(&window, &today), 108.0);
        assert!((Feature::Clv.compute(&window, &today) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn display_names() {
        assert_eq!(Feature::RelativeVolume(20).to_string(), "REL_VOLUME(20)");
        assert_eq!(Feature::AbsChangePct(1).to_string(), "ABS_CHANGE_PCT(1)");
        assert_eq!(Feature::Clv.to_string(), "CLV");
        assert_eq!(Feature::Clv.period(), None);
        assert_eq!(Feature::Rsi(14).period(), Some(14));
    }
}
