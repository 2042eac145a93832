use std::pin::Pin;
use std::sync::Arc;

use crate::pipeline::context::frame_context::FrameContext;
use crate::pipeline::context::state::{AdvisedState, RecognizedState};
use crate::pipeline::orchestration::processing_step::AdvisorStep;
use futures::task::{Context, Poll};
use futures::Future;
use tower::{BoxError, Service};
use tracing::debug;

#[derive(Clone)]
pub struct AdvisorService {
    inner: Arc<dyn AdvisorStep>,
}

impl AdvisorService {
    pub fn new(inner: Box<dyn AdvisorStep>) -> Self {
        Self {
            inner: Arc::from(inner),
        }
    }
}

impl Service<FrameContext<RecognizedState>> for AdvisorService {
    type Response = FrameContext<AdvisedState>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: FrameContext<RecognizedState>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            debug!(step = inner.name(), frame_id = %req.frame().id(), "Advising move");
            let advice = inner.advise(&req).await?;
            Ok::<_, BoxError>(req.into_advised(advice))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Frame;
    use crate::config::{AdvisorSettings, SearchSettings, StrategyKind};
    use crate::engine::board::{Board, Color};
    use crate::pipeline::orchestration::step::MoveAdvisor;
    use crate::vision::geometry::BoardQuad;
    use crate::vision::recognizer::{Recognition, ScreenSize};
    use crate::vision::LocateSource;
    use image::{DynamicImage, RgbImage};

    #[tokio::test]
    async fn test_advisor_service() {
        let advisor = MoveAdvisor::from_settings(
            &AdvisorSettings {
                strategy: StrategyKind::Greedy,
                ..AdvisorSettings::default()
            },
            &SearchSettings::default(),
        );
        let mut service = AdvisorService::new(Box::new(advisor));

        let ctx = FrameContext::new(Frame::new(DynamicImage::ImageRgb8(RgbImage::new(
            800, 800,
        ))))
        .into_recognized(Recognition {
            board: Board::new(),
            player_color: Some(Color::Black),
            screen_size: ScreenSize {
                width: 800,
                height: 800,
            },
            board_rect: BoardQuad::full_image(801, 801),
            source: LocateSource::FullImage,
        });

        let response = service.call(ctx).await.unwrap();
        let advice = response.advice();
        assert!(advice.has_move);
        assert_eq!(advice.board.as_ref().unwrap().player_color, Color::Black);
        assert!(response.metrics().advice_duration().is_some());
    }
}
