pub mod context;
pub mod domain;
pub mod orchestration;

pub use context::{FrameContext, FrameMetrics};
pub use domain::{Advice, Advisor, MoveAdvice};
pub use orchestration::service::{AdvisorService, AnalyzerService, RecognitionService};
pub use orchestration::step::{BoardRecognizer, MoveAdvisor};
pub use orchestration::{AdvisorStep, ProcessingPipeline, ProcessingPipelineBuilder, RecognitionStep};
