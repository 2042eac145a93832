pub mod advice;

pub use advice::{Advice, Advisor, BoardSummary, MoveAdvice, ScreenPoint};
