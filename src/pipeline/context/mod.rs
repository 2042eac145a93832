pub mod frame_context;
pub mod metrics;
pub mod state;

pub use frame_context::FrameContext;
pub use metrics::FrameMetrics;
pub use state::{AdvisedState, IngestedState, ProcessingState, RecognizedState};
