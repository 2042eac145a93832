use std::time::Duration;

/// Wall-clock time from ingestion to the end of each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    recognition_duration: Option<Duration>,
    advice_duration: Option<Duration>,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_recognition_duration(&mut self, duration: Duration) {
        self.recognition_duration = Some(duration);
    }

    pub fn record_advice_duration(&mut self, duration: Duration) {
        self.advice_duration = Some(duration);
    }

    pub fn recognition_duration(&self) -> Option<Duration> {
        self.recognition_duration
    }

    pub fn advice_duration(&self) -> Option<Duration> {
        self.advice_duration
    }
}
