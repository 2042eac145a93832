use crate::error::AppError;
use crate::pipeline::context::frame_context::FrameContext;
use crate::pipeline::context::state::{IngestedState, RecognizedState};
use crate::pipeline::domain::advice::Advice;
use crate::vision::recognizer::Recognition;
use async_trait::async_trait;

/// Reads the board out of a freshly ingested frame.
#[async_trait]
pub trait RecognitionStep: Send + Sync {
    async fn recognize(&self, ctx: &FrameContext<IngestedState>) -> Result<Recognition, AppError>;
    fn name(&self) -> &'static str;
}

/// Turns a recognised board into move advice.
#[async_trait]
pub trait AdvisorStep: Send + Sync {
    async fn advise(&self, ctx: &FrameContext<RecognizedState>) -> Result<Advice, AppError>;
    fn name(&self) -> &'static str;
}
