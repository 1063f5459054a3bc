use interviewer_oracle::{Oracle, OracleError};
use tracing::{debug, warn};

use crate::{EvaluationParseError, EvaluationPrompts, EvaluationRecord};

/// Inputs required to evaluate one answer.
#[derive(Clone, Copy)]
pub struct EvaluationInput<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    /// Interview stage the answer belongs to (e.g. "theory")
    pub step_kind: &'a str,
    pub experience_level: &'a str,
}

/// An evaluation together with how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub record: EvaluationRecord,
    /// True when the oracle reply was unusable and the fallback record was substituted
    pub fallback: bool,
}

/// Scores answers by asking the oracle
pub struct ResponseEvaluator<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> ResponseEvaluator<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Evaluate an answer, degrading to [`EvaluationRecord::fallback`] on any
    /// oracle or parse failure.
    pub async fn evaluate(&self, input: EvaluationInput<'_>) -> Evaluation {
        match self.try_evaluate(input).await {
            Ok(record) => Evaluation {
                record,
                fallback: false,
            },
            Err(e) => {
                warn!(error = %e, step = input.step_kind, "Using fallback evaluation");
                Evaluation {
                    record: EvaluationRecord::fallback(),
                    fallback: true,
                }
            }
        }
    }

    /// Evaluate an answer, surfacing oracle and parse failures
    pub async fn try_evaluate(
        &self,
        input: EvaluationInput<'_>,
    ) -> Result<EvaluationRecord, EvaluationError> {
        let prompt = EvaluationPrompts::build_evaluation_prompt(
            input.question,
            input.answer,
            input.step_kind,
            input.experience_level,
        );

        debug!(
            prompt_len = prompt.len(),
            step = input.step_kind,
            "Running answer evaluation"
        );

        let reply = self.oracle.complete(&prompt).await?;
        let record = EvaluationRecord::parse(&reply)?;

        debug!(score = record.score, "Answer evaluated");
        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Oracle error: {0}")]
    OracleError(#[from] OracleError),

    #[error("Failed to parse evaluation: {0}")]
    ParseError(#[from] EvaluationParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use interviewer_oracle::OracleType;

    struct FixedOracle(Result<&'static str, ()>);

    #[async_trait]
    impl Oracle for FixedOracle {
        fn name(&self) -> &str {
            "fixed"
        }

        fn oracle_type(&self) -> OracleType {
            OracleType::Command
        }

        async fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
            self.0
                .map(str::to_string)
                .map_err(|_| OracleError::RequestFailed("offline".to_string()))
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    fn input<'a>(question: &'a str, answer: &'a str) -> EvaluationInput<'a> {
        EvaluationInput {
            question,
            answer,
            step_kind: "practical",
            experience_level: "advanced",
        }
    }

    #[tokio::test]
    async fn test_evaluate_parses_oracle_reply() {
        let oracle = FixedOracle(Ok(
            r#"{"score": 9, "feedback": "Excellent", "strengths": ["SUMIFS"], "improvements": []}"#,
        ));
        let evaluator = ResponseEvaluator::new(&oracle);

        let evaluation = evaluator.evaluate(input("Q", "A")).await;
        assert!(!evaluation.fallback);
        assert_eq!(evaluation.record.score, 9.0);
        assert_eq!(evaluation.record.strengths, vec!["SUMIFS"]);
    }

    #[tokio::test]
    async fn test_genuine_reply_matching_fallback_is_not_flagged() {
        let oracle = FixedOracle(Ok(
            r#"{"score": 7, "feedback": "Response evaluated", "strengths": ["Provided a response"], "improvements": ["Could provide more detail"]}"#,
        ));
        let evaluator = ResponseEvaluator::new(&oracle);

        let evaluation = evaluator.evaluate(input("Q", "A")).await;
        assert_eq!(evaluation.record, EvaluationRecord::fallback());
        assert!(!evaluation.fallback);
    }

    #[tokio::test]
    async fn test_malformed_reply_always_yields_fallback() {
        let oracle = FixedOracle(Ok("Great answer, I'd give it a solid eight!"));
        let evaluator = ResponseEvaluator::new(&oracle);

        for (q, a) in [
            ("What is a pivot table?", "A summary tool."),
            ("", ""),
            ("Explain INDIRECT", "{not json"),
        ] {
            let evaluation = evaluator.evaluate(input(q, a)).await;
            assert!(evaluation.fallback);
            assert_eq!(evaluation.record, EvaluationRecord::fallback());
        }
    }

    #[tokio::test]
    async fn test_oracle_failure_yields_fallback() {
        let oracle = FixedOracle(Err(()));
        let evaluator = ResponseEvaluator::new(&oracle);

        assert!(matches!(
            evaluator.try_evaluate(input("Q", "A")).await,
            Err(EvaluationError::OracleError(_))
        ));
        let evaluation = evaluator.evaluate(input("Q", "A")).await;
        assert!(evaluation.fallback);
        assert_eq!(evaluation.record, EvaluationRecord::fallback());
    }
}
