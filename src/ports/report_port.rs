//! Report sink port.

use crate::domain::error::EdgecheckError;
use crate::domain::evaluator::BacktestResult;
use std::path::Path;

/// Port for rendering a finished evaluation.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), EdgecheckError>;
}
