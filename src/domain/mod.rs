//! Core domain types and logic.

pub mod ohlcv;
pub mod price_series;
pub mod feature;
pub mod rule;
pub mod rule_parser;
pub mod detector;
pub mod outcome;
pub mod population;
pub mod null_sampler;
pub mod significance;
pub mod metrics;
pub mod evaluator;
pub mod universe;
pub mod config_validation;
pub mod error;
