//! Domain error types.

/// A parse error with position information for rule parsing.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for edgecheck.
#[derive(Debug, thiserror::Error)]
pub enum EdgecheckError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("invalid rule: {reason}")]
    RuleInvalid { reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("insufficient history for {symbol}: have {bars} bars, need more than {required}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        required: usize,
    },

    #[error("bar index {index} out of range for {symbol} ({len} bars)")]
    OutOfRangeIndex {
        symbol: String,
        index: usize,
        len: usize,
    },

    #[error("universe is empty")]
    EmptyUniverse,

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EdgecheckError {
    /// Errors local to one instrument; the evaluator skips the instrument and continues.
    pub fn is_instrument_local(&self) -> bool {
        matches!(
            self,
            EdgecheckError::DataUnavailable { .. }
                | EdgecheckError::InvalidSeries { .. }
                | EdgecheckError::InsufficientHistory { .. }
        )
    }
}

impl From<&EdgecheckError> for std::process::ExitCode {
    fn from(err: &EdgecheckError) -> Self {
        let code: u8 = match err {
            EdgecheckError::Io(_) | EdgecheckError::Report { .. } => 1,
            EdgecheckError::ConfigParse { .. }
            | EdgecheckError::ConfigMissing { .. }
            | EdgecheckError::ConfigInvalid { .. } => 2,
            EdgecheckError::DataUnavailable { .. } | EdgecheckError::InvalidSeries { .. } => 3,
            EdgecheckError::RuleParse(_) | EdgecheckError::RuleInvalid { .. } => 4,
            EdgecheckError::InsufficientHistory { .. } | EdgecheckError::EmptyUniverse => 5,
            EdgecheckError::OutOfRangeIndex { .. } | EdgecheckError::InvalidParameter { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
