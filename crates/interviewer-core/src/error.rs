use thiserror::Error;

use interviewer_db::DbError;
use interviewer_oracle::OracleError;

use crate::Step;

#[derive(Error, Debug)]
pub enum InterviewError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Interview has not been started for conversation {0}")]
    NotStarted(String),

    #[error("Interview already started for conversation {0}")]
    AlreadyStarted(String),

    #[error("Invalid interview transition: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("Question generation failed for step {step}: {source}")]
    QuestionGeneration {
        step: Step,
        #[source]
        source: OracleError,
    },

    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for InterviewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => InterviewError::NotFound(id),
            StoreError::NoInterview(id) => InterviewError::NotStarted(id),
            other => InterviewError::Store(other),
        }
    }
}

/// A transition request that would break the interview's structural rules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Answer submitted for step {submitted} but the current step is {expected}")]
    StepMismatch { expected: Step, submitted: Step },

    #[error("Step {0} has already been answered")]
    DuplicateStep(Step),

    #[error("Interview is already complete")]
    InterviewComplete,

    #[error("No question was issued for step {0}")]
    MissingQuestion(Step),

    #[error("Question counter {counter} exceeds the total of {total}")]
    CounterExceeded { counter: u32, total: u32 },

    #[error("Inconsistent interview state: {0}")]
    Inconsistent(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("No interview state for conversation {0}")]
    NoInterview(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}
