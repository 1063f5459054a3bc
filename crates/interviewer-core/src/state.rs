use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use interviewer_evaluator::EvaluationRecord;

use crate::approval::ApprovalOutcome;
use crate::error::InvariantViolation;
use crate::report::Report;
use crate::step::{Step, TOTAL_QUESTIONS};
use crate::CandidateInfo;

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// The step a question or answer belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    pub timestamp: DateTime<Utc>,
}

/// A question the candidate answered, kept in answer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaPair {
    pub step: Step,
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// Full state of one interview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewState {
    pub conversation_id: String,
    pub current_step: Step,
    pub completed_steps: Vec<Step>,
    pub candidate_info: CandidateInfo,
    pub qa_pairs: Vec<QaPair>,
    pub evaluations: BTreeMap<Step, EvaluationRecord>,
    pub current_question_number: u32,
    pub total_questions: u32,
    pub is_complete: bool,
    pub final_results: Option<Report>,
    pub approval_outcome: Option<ApprovalOutcome>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl InterviewState {
    pub fn new(conversation_id: &str, candidate_info: CandidateInfo) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            current_step: Step::first(),
            completed_steps: Vec::new(),
            candidate_info,
            qa_pairs: Vec::new(),
            evaluations: BTreeMap::new(),
            current_question_number: 1,
            total_questions: TOTAL_QUESTIONS,
            is_complete: false,
            final_results: None,
            approval_outcome: None,
            messages: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn push_message(&mut self, role: Role, content: &str, step: Option<Step>) {
        self.messages.push(ChatMessage {
            role,
            content: content.to_string(),
            step,
            timestamp: Utc::now(),
        });
    }

    /// The most recent question issued for `step`
    pub fn issued_question(&self, step: Step) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && m.step == Some(step))
            .map(|m| m.content.as_str())
    }

    /// The question currently awaiting an answer, if any
    pub fn pending_question(&self) -> Option<&str> {
        if self.is_complete {
            return None;
        }
        self.issued_question(self.current_step)
    }

    pub fn questions_remaining(&self) -> u32 {
        self.total_questions
            .saturating_sub(self.current_question_number)
    }

    /// Check structural consistency, e.g. after loading from storage
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.current_question_number > self.total_questions + 1 {
            return Err(InvariantViolation::CounterExceeded {
                counter: self.current_question_number,
                total: self.total_questions,
            });
        }

        let expected_prefix = &Step::SEQUENCE[..self.completed_steps.len().min(Step::SEQUENCE.len())];
        if self.completed_steps.len() > Step::SEQUENCE.len()
            || self.completed_steps.as_slice() != expected_prefix
        {
            return Err(InvariantViolation::Inconsistent(
                "completed steps are not a prefix of the step sequence".to_string(),
            ));
        }

        if self.qa_pairs.len() != self.completed_steps.len() {
            return Err(InvariantViolation::Inconsistent(format!(
                "{} answers recorded for {} completed steps",
                self.qa_pairs.len(),
                self.completed_steps.len()
            )));
        }

        if self
            .evaluations
            .keys()
            .any(|step| !self.completed_steps.contains(step))
        {
            return Err(InvariantViolation::Inconsistent(
                "evaluation recorded for an unanswered step".to_string(),
            ));
        }

        if !self.is_complete && self.completed_steps.contains(&self.current_step) {
            return Err(InvariantViolation::DuplicateStep(self.current_step));
        }

        if self.is_complete && self.final_results.is_some() {
            let released = self
                .approval_outcome
                .as_ref()
                .map(ApprovalOutcome::releases_results)
                .unwrap_or(false);
            if !released {
                return Err(InvariantViolation::Inconsistent(
                    "results published without approval".to_string(),
                ));
            }
        }

        Ok(())
    }
}
