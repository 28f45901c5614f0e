//! JSON report adapter implementing ReportPort.
//!
//! Writes the whole `BacktestResult` (headline numbers, every outcome, the
//! skipped instruments and the seed) as pretty-printed JSON, so a run can be
//! inspected or replayed later.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::error::EdgecheckError;
use crate::domain::evaluator::BacktestResult;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), EdgecheckError> {
        let file = File::create(output_path).map_err(|e| EdgecheckError::Report {
            reason: format!("failed to create {}: {}", output_path.display(), e),
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, result).map_err(|e| EdgecheckError::Report {
            reason: format!("failed to serialize result: {}", e),
        })?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
