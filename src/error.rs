use serde::Serialize;
use thiserror::Error;

/// Category code attached to every failure reported by the analyzer entry point.
pub const ERROR_CODE: &str = "ERROR";

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Serialization Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Vision Error: {0}")]
    Vision(#[from] VisionError),
    #[error("Analyzer Error: {0}")]
    Analyzer(#[from] AnalyzerError),
    #[error("Invalid board: {0}")]
    InvalidBoard(String),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
    #[error("Pipeline step timed out")]
    Timeout,
}

// Image processing error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisionError {
    #[error("Gaussian kernel size must be odd and positive, got {0}")]
    InvalidKernel(u32),
    #[error("Adaptive threshold block size must be odd and greater than 1, got {0}")]
    InvalidBlockSize(u32),
    #[error("Image has no pixels")]
    EmptyImage,
    #[error("Failed to compute perspective transform for board corners")]
    DegenerateQuad,
}

/// Failure surfaced through the analyzer's completion handle.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{code}: {message}")]
pub struct AnalyzerError {
    pub code: &'static str,
    pub message: String,
}

impl AnalyzerError {
    pub const LOAD_FAILED: &'static str = "Failed to load image";

    pub fn load_failed() -> Self {
        Self {
            code: ERROR_CODE,
            message: Self::LOAD_FAILED.to_string(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self {
            code: ERROR_CODE,
            message: message.into(),
        }
    }

    pub fn is_load_failure(&self) -> bool {
        self.message == Self::LOAD_FAILED
    }
}

impl From<VisionError> for AnalyzerError {
    fn from(err: VisionError) -> Self {
        Self::processing(err.to_string())
    }
}
