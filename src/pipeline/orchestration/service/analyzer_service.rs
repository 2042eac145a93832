use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::VisionSettings;
use crate::error::AnalyzerError;
use crate::vision::analyzer::{AnalysisResponse, ImageAnalyzer};
use futures::task::{Context, Poll};
use futures::Future;
use tower::Service;

/// `analyze` as a tower service; decoding and thresholding run on the blocking pool.
#[derive(Clone, Default)]
pub struct AnalyzerService {
    inner: Arc<ImageAnalyzer>,
}

impl AnalyzerService {
    pub fn new(analyzer: ImageAnalyzer) -> Self {
        Self {
            inner: Arc::new(analyzer),
        }
    }

    pub fn from_settings(settings: &VisionSettings) -> Self {
        Self::new(ImageAnalyzer::new(settings))
    }
}

impl Service<PathBuf> for AnalyzerService {
    type Response = AnalysisResponse;
    type Error = AnalyzerError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, path: PathBuf) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            tokio::task::spawn_blocking(move || inner.analyze(&path))
                .await
                .map_err(|e| AnalyzerError::processing(e.to_string()))?
        })
    }
}
