mod evaluation;
pub mod evaluator;
mod prompts;

pub use evaluation::{EvaluationParseError, EvaluationRecord, FALLBACK_SCORE, MAX_SCORE};
pub use evaluator::{Evaluation, EvaluationError, EvaluationInput, ResponseEvaluator};
pub use prompts::{truncate_chars, EvaluationPrompts};
