use crate::common::frame::Frame;
use crate::config::Settings;
use crate::error::AppError;
use crate::pipeline::context::frame_context::FrameContext;
use crate::pipeline::context::state::{AdvisedState, IngestedState, RecognizedState};
use crate::pipeline::orchestration::processing_step::{AdvisorStep, RecognitionStep};
use crate::pipeline::orchestration::service::{AdvisorService, RecognitionService};
use crate::pipeline::orchestration::step::{BoardRecognizer, MoveAdvisor};
use std::path::Path;
use std::time::Duration;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};
use tracing::{debug, info};

type RecognitionStage = BoxService<FrameContext<IngestedState>, FrameContext<RecognizedState>, BoxError>;
type AdvisorStage = BoxService<FrameContext<RecognizedState>, FrameContext<AdvisedState>, BoxError>;

/// Screenshot in, move advice out.
pub struct ProcessingPipeline {
    recognition: RecognitionStage,
    advisor: AdvisorStage,
}

impl ProcessingPipeline {
    pub fn builder(
        recognizer: impl RecognitionStep + 'static,
        advisor: impl AdvisorStep + 'static,
    ) -> ProcessingPipelineBuilder {
        ProcessingPipelineBuilder {
            recognizer: Box::new(recognizer),
            advisor: Box::new(advisor),
            step_timeout: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let builder = Self::builder(
            BoardRecognizer::from_settings(&settings.vision),
            MoveAdvisor::from_settings(&settings.advisor, &settings.search),
        );
        match settings.advisor.step_timeout() {
            Some(timeout) => builder.step_timeout(timeout).build(),
            None => builder.build(),
        }
    }

    pub async fn recognize(&mut self, frame: Frame) -> Result<FrameContext<RecognizedState>, AppError> {
        let ctx = FrameContext::new(frame);
        self.recognition
            .ready()
            .await
            .map_err(into_app_error)?
            .call(ctx)
            .await
            .map_err(into_app_error)
    }

    pub async fn advise(
        &mut self,
        ctx: FrameContext<RecognizedState>,
    ) -> Result<FrameContext<AdvisedState>, AppError> {
        self.advisor
            .ready()
            .await
            .map_err(into_app_error)?
            .call(ctx)
            .await
            .map_err(into_app_error)
    }

    pub async fn process(&mut self, frame: Frame) -> Result<FrameContext<AdvisedState>, AppError> {
        let recognized = self.recognize(frame).await?;
        debug!(elapsed_ms = recognized.elapsed().as_millis() as u64, "Recognition stage done");
        let advised = self.advise(recognized).await?;
        info!(
            frame_id = %advised.frame().id(),
            has_move = advised.advice().has_move,
            elapsed_ms = advised.elapsed().as_millis() as u64,
            "Frame processed"
        );
        Ok(advised)
    }

    pub async fn process_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<FrameContext<AdvisedState>, AppError> {
        let frame = Frame::load(path)?;
        self.process(frame).await
    }
}

pub struct ProcessingPipelineBuilder {
    recognizer: Box<dyn RecognitionStep>,
    advisor: Box<dyn AdvisorStep>,
    step_timeout: Option<Duration>,
}

impl ProcessingPipelineBuilder {
    pub fn step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = Some(step_timeout);
        self
    }

    pub fn build(self) -> ProcessingPipeline {
        let recognition = ServiceBuilder::new()
            .option_layer(self.step_timeout.map(TimeoutLayer::new))
            .service(RecognitionService::new(self.recognizer));
        let advisor = ServiceBuilder::new()
            .option_layer(self.step_timeout.map(TimeoutLayer::new))
            .service(AdvisorService::new(self.advisor));

        ProcessingPipeline {
            recognition: BoxService::new(recognition),
            advisor: BoxService::new(advisor),
        }
    }
}

fn into_app_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        return AppError::Timeout;
    }
    match err.downcast::<AppError>() {
        Ok(app) => *app,
        Err(other) => AppError::Pipeline(other.to_string()),
    }
}
