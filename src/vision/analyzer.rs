use super::preprocess::Preprocessor;
use crate::common::frame::Frame;
use crate::config::VisionSettings;
use crate::engine::board::Cell;
use crate::error::AnalyzerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Result object reported on success. `board` is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub board: Vec<Vec<Cell>>,
}

impl AnalysisResponse {
    pub fn empty_success() -> Self {
        Self {
            success: true,
            board: Vec::new(),
        }
    }
}

/// One-shot completion handle for an analysis request.
pub trait Completion: Send {
    fn resolve(self, response: AnalysisResponse);
    fn reject(self, code: &'static str, message: String);
}

impl Completion for oneshot::Sender<Result<AnalysisResponse, AnalyzerError>> {
    fn resolve(self, response: AnalysisResponse) {
        if self.send(Ok(response)).is_err() {
            debug!("Analysis receiver dropped before resolve");
        }
    }

    fn reject(self, code: &'static str, message: String) {
        if self.send(Err(AnalyzerError { code, message })).is_err() {
            debug!("Analysis receiver dropped before reject");
        }
    }
}

/// Loads an image and runs grayscale, blur and adaptive threshold over it.
#[derive(Debug, Clone, Default)]
pub struct ImageAnalyzer {
    preprocessor: Preprocessor,
}

impl ImageAnalyzer {
    pub fn new(settings: &VisionSettings) -> Self {
        Self {
            preprocessor: Preprocessor::from_settings(settings),
        }
    }

    pub fn with_preprocessor(preprocessor: Preprocessor) -> Self {
        Self { preprocessor }
    }

    pub fn analyze(&self, path: impl AsRef<Path>) -> Result<AnalysisResponse, AnalyzerError> {
        let frame = Frame::load(path.as_ref())?;
        let processed = self.preprocessor.run(frame.image())?;
        debug!(
            frame_id = %frame.id(),
            foreground = processed.foreground_ratio(),
            "Image analysed"
        );
        Ok(AnalysisResponse::empty_success())
    }

    /// Run [`analyze`](Self::analyze) and report through `completion` exactly once.
    pub fn analyze_image(&self, path: impl AsRef<Path>, completion: impl Completion) {
        match self.analyze(path) {
            Ok(response) => completion.resolve(response),
            Err(err) => {
                warn!(error = %err, "Image analysis failed");
                completion.reject(err.code, err.message)
            }
        }
    }
}
