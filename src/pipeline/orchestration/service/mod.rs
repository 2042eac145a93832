pub mod advisor_service;
pub mod analyzer_service;
pub mod recognition_service;

pub use advisor_service::AdvisorService;
pub use analyzer_service::AnalyzerService;
pub use recognition_service::RecognitionService;
