use crate::pipeline::domain::advice::Advice;
use crate::vision::recognizer::Recognition;

// Markers for how far a frame has travelled through the pipeline
pub struct IngestedState;

pub struct RecognizedState {
    pub(super) recognition: Recognition,
}

pub struct AdvisedState {
    pub(super) recognition: Recognition,
    pub(super) advice: Advice,
}

pub trait ProcessingState: 'static {
    fn state_name() -> &'static str;
}

impl ProcessingState for IngestedState {
    fn state_name() -> &'static str {
        "Ingested"
    }
}

impl ProcessingState for RecognizedState {
    fn state_name() -> &'static str {
        "Recognized"
    }
}

impl ProcessingState for AdvisedState {
    fn state_name() -> &'static str {
        "Advised"
    }
}
