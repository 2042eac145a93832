pub mod analyzer;
pub mod board_locator;
pub mod cell_classifier;
pub mod color;
pub mod geometry;
pub mod player_color;
pub mod preprocess;
pub mod recognizer;
pub mod region;

pub use analyzer::{AnalysisResponse, Completion, ImageAnalyzer};
pub use board_locator::{BoardLocation, BoardLocator, LocateSource};
pub use geometry::{BoardQuad, PointF};
pub use preprocess::{Preprocessed, Preprocessor};
pub use recognizer::{Recognition, Recognizer, ScreenSize};
pub use region::ImageRegion;
