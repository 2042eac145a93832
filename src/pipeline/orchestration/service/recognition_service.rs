use std::pin::Pin;
use std::sync::Arc;

use crate::pipeline::context::frame_context::FrameContext;
use crate::pipeline::context::state::{IngestedState, RecognizedState};
use crate::pipeline::orchestration::processing_step::RecognitionStep;
use futures::task::{Context, Poll};
use futures::Future;
use tower::{BoxError, Service};
use tracing::debug;

#[derive(Clone)]
pub struct RecognitionService {
    inner: Arc<dyn RecognitionStep>,
}

impl RecognitionService {
    pub fn new(inner: Box<dyn RecognitionStep>) -> Self {
        Self {
            inner: Arc::from(inner),
        }
    }
}

impl Service<FrameContext<IngestedState>> for RecognitionService {
    type Response = FrameContext<RecognizedState>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: FrameContext<IngestedState>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            debug!(step = inner.name(), frame_id = %req.frame().id(), "Recognising frame");
            let recognition = inner.recognize(&req).await?;
            Ok::<_, BoxError>(req.into_recognized(recognition))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Frame;
    use crate::engine::board::Board;
    use crate::error::AppError;
    use crate::vision::geometry::BoardQuad;
    use crate::vision::recognizer::{Recognition, ScreenSize};
    use crate::vision::LocateSource;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageBuffer, Rgb};

    struct FixedBoard;

    #[async_trait]
    impl RecognitionStep for FixedBoard {
        async fn recognize(
            &self,
            ctx: &FrameContext<IngestedState>,
        ) -> Result<Recognition, AppError> {
            let (width, height) = ctx.frame().dimensions();
            Ok(Recognition {
                board: Board::new(),
                player_color: None,
                screen_size: ScreenSize { width, height },
                board_rect: BoardQuad::full_image(width, height),
                source: LocateSource::FullImage,
            })
        }

        fn name(&self) -> &'static str {
            "fixed_board"
        }
    }

    #[tokio::test]
    async fn test_recognition_service() {
        let mut service = RecognitionService::new(Box::new(FixedBoard));
        let ctx = FrameContext::new(Frame::new(DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(100, 60, Rgb([255, 255, 255])),
        )));
        let response = service.call(ctx).await.unwrap();
        assert_eq!(response.recognition().screen_size.width, 100);
        assert!(response.metrics().recognition_duration().is_some());
    }
}
