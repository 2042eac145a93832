pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod vision;

pub use common::Frame;
pub use config::Settings;
pub use error::{AnalyzerError, AppError, VisionError};

pub use engine::{Board, Cell, Color, Position, Strategist};
pub use pipeline::{Advice, AnalyzerService, ProcessingPipeline};
pub use vision::{AnalysisResponse, Completion, ImageAnalyzer, Recognition, Recognizer};
