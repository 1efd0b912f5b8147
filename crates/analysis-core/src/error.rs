use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Unsupported response shape: {0}")]
    UnsupportedShape(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Render error: {0}")]
    RenderError(String),
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::IoError(err.to_string())
    }
}
