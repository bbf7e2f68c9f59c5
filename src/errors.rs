use thiserror::Error;

/// Typed failure taxonomy for the analysis pipeline.
///
/// Every stage returns `Result<_, AnalysisError>`; the first failure in
/// pipeline order is what the caller sees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    // -- Upstream -----------------------------------------------------------
    #[error("{0}")]
    DataSource(String),

    // -- Input shape --------------------------------------------------------
    #[error("{0}")]
    Schema(String),

    #[error("no price data in the requested window for {symbol}")]
    EmptySeries { symbol: String },

    #[error("Not enough data to {stage}: need {required} rows, have {actual}")]
    InsufficientHistory {
        stage: &'static str,
        required: usize,
        actual: usize,
    },

    // -- Arithmetic ---------------------------------------------------------
    #[error("computation failed: {0}")]
    Computation(String),
}

impl AnalysisError {
    /// Stable name of the error class, suitable for logs and API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataSource(_) => "DataSourceError",
            Self::Schema(_) => "SchemaError",
            Self::EmptySeries { .. } => "EmptySeriesError",
            Self::InsufficientHistory { .. } => "InsufficientHistoryError",
            Self::Computation(_) => "ComputationError",
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::DataSource(format!("invalid JSON response: {err}"))
        } else {
            Self::DataSource(format!("request failed: {err}"))
        }
    }
}
