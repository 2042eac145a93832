use crate::common::frame::Frame;
use crate::pipeline::context::metrics::FrameMetrics;
use crate::pipeline::context::state::{
    AdvisedState, IngestedState, ProcessingState, RecognizedState,
};
use crate::pipeline::domain::advice::Advice;
use crate::vision::recognizer::Recognition;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Stage is tracked in the type; transitions consume the context
pub struct FrameContext<S> {
    frame: Arc<Frame>,
    metrics: FrameMetrics,
    processing_start: Instant,
    state: S,
}

impl<S: ProcessingState> FrameContext<S> {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Owned handle for moving the frame onto the blocking pool.
    pub(crate) fn shared_frame(&self) -> Arc<Frame> {
        Arc::clone(&self.frame)
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    pub fn elapsed(&self) -> Duration {
        self.processing_start.elapsed()
    }

    pub fn stage(&self) -> &'static str {
        S::state_name()
    }
}

impl<S: ProcessingState> fmt::Debug for FrameContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameContext")
            .field("frame_id", &self.frame.id())
            .field("stage", &S::state_name())
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl FrameContext<IngestedState> {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame: Arc::new(frame),
            metrics: FrameMetrics::new(),
            processing_start: Instant::now(),
            state: IngestedState,
        }
    }

    pub fn into_recognized(mut self, recognition: Recognition) -> FrameContext<RecognizedState> {
        self.metrics.record_recognition_duration(self.elapsed());
        FrameContext {
            frame: self.frame,
            metrics: self.metrics,
            processing_start: self.processing_start,
            state: RecognizedState { recognition },
        }
    }
}

impl FrameContext<RecognizedState> {
    pub fn recognition(&self) -> &Recognition {
        &self.state.recognition
    }

    pub fn into_advised(mut self, advice: Advice) -> FrameContext<AdvisedState> {
        self.metrics.record_advice_duration(self.elapsed());
        FrameContext {
            frame: self.frame,
            metrics: self.metrics,
            processing_start: self.processing_start,
            state: AdvisedState {
                recognition: self.state.recognition,
                advice,
            },
        }
    }
}

impl FrameContext<AdvisedState> {
    pub fn recognition(&self) -> &Recognition {
        &self.state.recognition
    }

    pub fn advice(&self) -> &Advice {
        &self.state.advice
    }

    pub fn into_advice(self) -> Advice {
        self.state.advice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::Board;
    use crate::vision::geometry::BoardQuad;
    use crate::vision::recognizer::ScreenSize;
    use crate::vision::LocateSource;
    use image::{DynamicImage, RgbImage};

    fn recognition() -> Recognition {
        Recognition {
            board: Board::new(),
            player_color: None,
            screen_size: ScreenSize { width: 8, height: 8 },
            board_rect: BoardQuad::full_image(8, 8),
            source: LocateSource::FullImage,
        }
    }

    #[test]
    fn transitions_record_stage_timings() {
        let ctx = FrameContext::new(Frame::new(DynamicImage::ImageRgb8(RgbImage::new(8, 8))));
        let id = ctx.frame().id();
        assert_eq!(ctx.stage(), "Ingested");
        assert_eq!(ctx.metrics().recognition_duration(), None);

        let ctx = ctx.into_recognized(recognition());
        assert_eq!(ctx.stage(), "Recognized");
        let recognised_after = ctx.metrics().recognition_duration().unwrap();

        let ctx = ctx.into_advised(Advice::no_moves(ScreenSize { width: 8, height: 8 }));
        assert_eq!(ctx.stage(), "Advised");
        assert_eq!(ctx.frame().id(), id);
        assert!(ctx.metrics().advice_duration().unwrap() >= recognised_after);
        assert_eq!(ctx.recognition().board, Board::new());
        assert!(!ctx.into_advice().has_move);
    }

    #[test]
    fn debug_names_frame_and_stage() {
        let ctx = FrameContext::new(Frame::new(DynamicImage::ImageRgb8(RgbImage::new(4, 4))));
        let id = ctx.frame().id();
        let rendered = format!("{:?}", ctx.into_recognized(recognition()));
        assert!(rendered.contains(&id.to_string()), "{rendered}");
        assert!(rendered.contains("stage: \"Recognized\""), "{rendered}");
    }
}
