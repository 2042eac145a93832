use crate::config::{AdvisorSettings, SearchSettings};
use crate::error::AppError;
use crate::pipeline::context::frame_context::FrameContext;
use crate::pipeline::context::state::RecognizedState;
use crate::pipeline::domain::advice::{Advice, Advisor};
use crate::pipeline::orchestration::processing_step::AdvisorStep;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Shares one advisor (and its search state) across calls.
#[derive(Clone)]
pub struct MoveAdvisor {
    advisor: Arc<Mutex<Advisor>>,
}

impl MoveAdvisor {
    pub fn new(advisor: Advisor) -> Self {
        Self {
            advisor: Arc::new(Mutex::new(advisor)),
        }
    }

    pub fn from_settings(advisor: &AdvisorSettings, search: &SearchSettings) -> Self {
        Self::new(Advisor::new(advisor, search))
    }
}

#[async_trait]
impl AdvisorStep for MoveAdvisor {
    async fn advise(&self, ctx: &FrameContext<RecognizedState>) -> Result<Advice, AppError> {
        let advisor = Arc::clone(&self.advisor);
        let recognition = ctx.recognition().clone();
        tokio::task::spawn_blocking(move || {
            let mut advisor = advisor
                .lock()
                .map_err(|_| AppError::Pipeline("advisor lock poisoned".to_string()))?;
            Ok(advisor.advise(&recognition))
        })
        .await
        .map_err(|e| AppError::Pipeline(format!("advisor task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        "move_advisor"
    }
}
