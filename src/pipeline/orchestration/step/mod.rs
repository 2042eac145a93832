pub mod board_recognizer;
pub mod move_advisor;

pub use board_recognizer::BoardRecognizer;
pub use move_advisor::MoveAdvisor;
