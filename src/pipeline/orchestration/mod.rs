pub mod processing_pipeline;
pub mod processing_step;
pub mod service;
pub mod step;

pub use processing_pipeline::{ProcessingPipeline, ProcessingPipelineBuilder};
pub use processing_step::{AdvisorStep, RecognitionStep};
