use std::fmt;

#[derive(Debug)]
pub enum FillError {
    ConfigError(String),
    RequestError(String),
    DimensionMismatch(String),
    FontLoadError(String),
    InferenceError(String),
    ResponseError(String),
}

impl fmt::Display for FillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            FillError::RequestError(msg) => write!(f, "Request error: {}", msg),
            FillError::DimensionMismatch(msg) => write!(f, "Dimension mismatch: {}", msg),
            FillError::FontLoadError(msg) => write!(f, "Font load error: {}", msg),
            FillError::InferenceError(msg) => write!(f, "Inference error: {}", msg),
            FillError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl std::error::Error for FillError {}

pub type Result<T> = std::result::Result<T, FillError>;
