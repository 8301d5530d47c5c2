//! Domain error types.

/// Top-level error type for simplestocks.
#[derive(Debug, thiserror::Error)]
pub enum StocksError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("unknown stock symbol {symbol}")]
    NotFound { symbol: String },

    #[error("no data: {reason}")]
    NoData { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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
    Io(#[from] std::io::Error),
}

impl StocksError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        StocksError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn no_data(reason: impl Into<String>) -> Self {
        StocksError::NoData {
            reason: reason.into(),
        }
    }
}

impl From<&StocksError> for std::process::ExitCode {
    fn from(err: &StocksError) -> Self {
        let code: u8 = match err {
            StocksError::Io(_) => 1,
            StocksError::ConfigParse { .. }
            | StocksError::ConfigMissing { .. }
            | StocksError::ConfigInvalid { .. } => 2,
            StocksError::Database { .. } | StocksError::DatabaseQuery { .. } => 3,
            StocksError::InvalidInput { .. } => 4,
            StocksError::NotFound { .. } => 5,
            StocksError::NoData { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
