mod approval;
mod candidate;
mod error;
mod machine;
mod questions;
mod report;
mod service;
mod state;
mod step;
mod store;

pub use approval::{
    ApprovalDecision, ApprovalError, ApprovalGate, ApprovalOutcome, AutoApprove,
    DEFAULT_APPROVAL_TIMEOUT,
};
pub use candidate::{CandidateInfo, ExperienceLevel, DEFAULT_CANDIDATE_NAME};
pub use error::{InterviewError, InvariantViolation, StoreError};
pub use machine::{InterviewMachine, Started, StepResult};
pub use questions::{QuestionGenerator, QuestionPrompts};
pub use report::{BreakdownEntry, Report, ReportBuilder, VisualIndicator};
pub use service::{InterviewService, ReportStatus};
pub use state::{ChatMessage, InterviewState, QaPair, Role};
pub use step::{Step, TOTAL_QUESTIONS};
pub use store::{
    Conversation, ConversationStatus, ConversationSummary, InterviewStore, MemoryStore,
    INTERVIEW_TYPE,
};
