use crate::error::{AnalyzerError, AppError};
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A decoded screenshot plus where and when it came from.
#[derive(Clone)]
pub struct Frame {
    frame_id: Uuid,
    source: Option<PathBuf>,
    image: Arc<DynamicImage>,
    loaded_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            source: None,
            image: Arc::new(image),
            loaded_at: Utc::now(),
        }
    }

    /// Decode `path`, picking the codec from the file's leading bytes rather than
    /// its extension. Missing, unreadable, undecodable and zero-sized images all
    /// report the same load failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        let image = Self::decode(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "Image decode failed");
            AnalyzerError::load_failed()
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(AnalyzerError::load_failed());
        }

        let mut frame = Self::new(image);
        frame.source = Some(path.to_path_buf());
        Ok(frame)
    }

    fn decode(path: &Path) -> Result<DynamicImage, AppError> {
        Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
    }

    pub fn id(&self) -> Uuid {
        self.frame_id
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("frame_id", &self.frame_id)
            .field("source", &self.source)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}
