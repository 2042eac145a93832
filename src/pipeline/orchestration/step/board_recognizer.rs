use crate::config::VisionSettings;
use crate::error::AppError;
use crate::pipeline::context::frame_context::FrameContext;
use crate::pipeline::context::state::IngestedState;
use crate::pipeline::orchestration::processing_step::RecognitionStep;
use crate::vision::recognizer::{Recognition, Recognizer};
use async_trait::async_trait;
use std::sync::Arc;

/// Runs the recogniser on the blocking pool.
#[derive(Clone)]
pub struct BoardRecognizer {
    recognizer: Arc<Recognizer>,
}

impl BoardRecognizer {
    pub fn new(recognizer: Recognizer) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
        }
    }

    pub fn from_settings(settings: &VisionSettings) -> Self {
        Self::new(Recognizer::new(settings))
    }
}

#[async_trait]
impl RecognitionStep for BoardRecognizer {
    async fn recognize(&self, ctx: &FrameContext<IngestedState>) -> Result<Recognition, AppError> {
        let recognizer = Arc::clone(&self.recognizer);
        let frame = ctx.shared_frame();
        tokio::task::spawn_blocking(move || recognizer.recognize(&frame))
            .await
            .map_err(|e| AppError::Pipeline(format!("recognition task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        "board_recognizer"
    }
}
