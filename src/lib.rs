//! edgecheck — Monte Carlo significance testing for trading-signal backtests.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], and a thin [`cli`] on top.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
