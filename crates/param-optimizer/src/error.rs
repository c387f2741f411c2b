use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Parameter grid is empty")]
    EmptyGrid,

    #[error("Parameter grid has more points than can be enumerated")]
    GridTooLarge,

    #[error("No candidate values for parameter '{0}'")]
    EmptyCandidates(String),

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Result records disagree on parameter keys: expected {expected:?}, found {found:?}")]
    MismatchedKeys {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type OptimizerResult<T> = Result<T, OptimizerError>;
