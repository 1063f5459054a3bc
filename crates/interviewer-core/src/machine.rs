use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use interviewer_evaluator::{EvaluationInput, ResponseEvaluator};
use interviewer_logging::{LogEvent, Logger};
use interviewer_oracle::Oracle;

use crate::approval::{ApprovalGate, ApprovalOutcome, AutoApprove, DEFAULT_APPROVAL_TIMEOUT};
use crate::error::{InterviewError, InvariantViolation};
use crate::questions::QuestionGenerator;
use crate::report::{Report, ReportBuilder};
use crate::state::{InterviewState, QaPair, Role};
use crate::{CandidateInfo, Step};

const PREVIEW_CHARS: usize = 100;

/// Result of starting an interview
#[derive(Debug, Clone)]
pub struct Started {
    pub question: String,
    pub state: InterviewState,
}

/// Result of processing one answer
#[derive(Debug, Clone)]
pub enum StepResult {
    Continue {
        state: InterviewState,
        next_step: Step,
        next_question: String,
        questions_remaining: u32,
    },
    Completed {
        state: InterviewState,
        /// None when the approval gate rejected the draft
        report: Option<Report>,
        approval: ApprovalOutcome,
    },
}

impl StepResult {
    pub fn state(&self) -> &InterviewState {
        match self {
            StepResult::Continue { state, .. } | StepResult::Completed { state, .. } => state,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, StepResult::Completed { .. })
    }
}

/// Drives an interview through its fixed step sequence.
///
/// Transitions never mutate the input state: `advance` works on a copy and
/// returns it only once every oracle call has succeeded.
pub struct InterviewMachine {
    oracle: Arc<dyn Oracle>,
    approval_gate: Arc<dyn ApprovalGate>,
    approval_timeout: Duration,
    logger: Arc<Logger>,
}

impl InterviewMachine {
    pub fn new(oracle: Arc<dyn Oracle>, logger: Arc<Logger>) -> Self {
        Self {
            oracle,
            approval_gate: Arc::new(AutoApprove),
            approval_timeout: DEFAULT_APPROVAL_TIMEOUT,
            logger,
        }
    }

    pub fn with_approval_gate(mut self, gate: Arc<dyn ApprovalGate>, timeout: Duration) -> Self {
        self.approval_gate = gate;
        self.approval_timeout = timeout;
        self
    }

    /// Derive candidate info from the opening message and ask the intro question
    pub async fn start(
        &self,
        conversation_id: &str,
        opening_message: &str,
    ) -> Result<Started, InterviewError> {
        let candidate = CandidateInfo::from_opening_message(opening_message);
        let mut state = InterviewState::new(conversation_id, candidate);

        self.logger.log(&LogEvent::InterviewStarted {
            conversation_id: conversation_id.to_string(),
            experience_level: state.candidate_info.experience_level.to_string(),
            candidate_name: state.candidate_info.name.clone(),
        });

        let question = self
            .generate_question(&state, Step::first(), state.current_question_number)
            .await?;

        state.push_message(Role::User, opening_message, None);
        state.push_message(Role::Assistant, &question, Some(Step::first()));

        Ok(Started { question, state })
    }

    /// Record the answer to `current_step`, evaluate it and move on
    pub async fn advance(
        &self,
        state: &InterviewState,
        answer: &str,
        current_step: Step,
    ) -> Result<StepResult, InterviewError> {
        Self::check_transition(state, current_step)?;

        let question = state
            .issued_question(current_step)
            .ok_or(InvariantViolation::MissingQuestion(current_step))?
            .to_string();

        self.logger.log(&LogEvent::AnswerReceived {
            conversation_id: state.conversation_id.clone(),
            step: current_step.to_string(),
            answer_len: answer.chars().count(),
        });

        let mut next = state.clone();
        next.push_message(Role::User, answer, Some(current_step));
        next.qa_pairs.push(QaPair {
            step: current_step,
            question: question.clone(),
            answer: answer.to_string(),
            timestamp: Utc::now(),
        });

        let evaluation = ResponseEvaluator::new(self.oracle.as_ref())
            .evaluate(EvaluationInput {
                question: &question,
                answer,
                step_kind: current_step.as_str(),
                experience_level: next.candidate_info.experience_level.as_str(),
            })
            .await;

        self.logger.log(&LogEvent::AnswerEvaluated {
            conversation_id: next.conversation_id.clone(),
            step: current_step.to_string(),
            score: evaluation.record.score,
            fallback: evaluation.fallback,
        });

        next.evaluations.insert(current_step, evaluation.record);
        next.completed_steps.push(current_step);

        let answered_number = next.current_question_number;
        next.current_question_number += 1;

        match current_step.next() {
            Some(next_step) if answered_number < next.total_questions => {
                let next_question = self
                    .generate_question(&next, next_step, next.current_question_number)
                    .await?;

                next.current_step = next_step;
                next.push_message(Role::Assistant, &next_question, Some(next_step));
                let questions_remaining = next.questions_remaining();

                Ok(StepResult::Continue {
                    state: next,
                    next_step,
                    next_question,
                    questions_remaining,
                })
            }
            _ => Ok(self.finalize(next).await),
        }
    }

    fn check_transition(state: &InterviewState, current_step: Step) -> Result<(), InvariantViolation> {
        if state.is_complete {
            return Err(InvariantViolation::InterviewComplete);
        }
        if state.current_question_number > state.total_questions {
            return Err(InvariantViolation::CounterExceeded {
                counter: state.current_question_number,
                total: state.total_questions,
            });
        }
        if state.completed_steps.contains(&current_step) {
            return Err(InvariantViolation::DuplicateStep(current_step));
        }
        if current_step != state.current_step {
            return Err(InvariantViolation::StepMismatch {
                expected: state.current_step,
                submitted: current_step,
            });
        }
        Ok(())
    }

    async fn generate_question(
        &self,
        state: &InterviewState,
        step: Step,
        question_number: u32,
    ) -> Result<String, InterviewError> {
        let result = QuestionGenerator::new(self.oracle.as_ref())
            .generate(step, &state.candidate_info, question_number)
            .await;

        match result {
            Ok(question) => {
                self.logger.log(&LogEvent::QuestionIssued {
                    conversation_id: state.conversation_id.clone(),
                    step: step.to_string(),
                    question_number,
                    question_preview: question.chars().take(PREVIEW_CHARS).collect(),
                });
                Ok(question)
            }
            Err(source) => {
                self.logger.log(&LogEvent::ErrorEncountered {
                    conversation_id: state.conversation_id.clone(),
                    step: Some(step.to_string()),
                    error: source.to_string(),
                });
                Err(InterviewError::QuestionGeneration { step, source })
            }
        }
    }

    /// Build the report, run it past the approval gate and close the interview
    async fn finalize(&self, mut state: InterviewState) -> StepResult {
        let draft = ReportBuilder::build(&state.qa_pairs, &state.evaluations, &state.candidate_info);
        let approval = self.request_approval(&state.conversation_id, &draft).await;

        self.logger.log(&LogEvent::ApprovalDecided {
            conversation_id: state.conversation_id.clone(),
            outcome: approval.as_str().to_string(),
        });

        let released = approval.releases_results();
        self.logger.log(&LogEvent::InterviewCompleted {
            conversation_id: state.conversation_id.clone(),
            overall_score: draft.overall_score,
            indicator: draft.visual_indicator.label().to_string(),
            released,
        });

        let report = released.then_some(draft);
        let closing = match &report {
            Some(report) => format!(
                "Thank you, the interview is complete. Overall score: {}",
                report.score_line()
            ),
            None => "Thank you, the interview is complete. Your results are under review."
                .to_string(),
        };

        state.is_complete = true;
        state.completed_at = Some(Utc::now());
        state.final_results = report.clone();
        state.approval_outcome = Some(approval.clone());
        state.push_message(Role::Assistant, &closing, None);

        info!(
            conversation_id = %state.conversation_id,
            approval = approval.as_str(),
            "Interview completed"
        );

        StepResult::Completed {
            state,
            report,
            approval,
        }
    }

    async fn request_approval(&self, conversation_id: &str, draft: &Report) -> ApprovalOutcome {
        debug!(conversation_id, gate = self.approval_gate.name(), "Requesting approval");

        match tokio::time::timeout(self.approval_timeout, self.approval_gate.approve(draft)).await {
            Ok(Ok(decision)) if decision.approved => ApprovalOutcome::Approved,
            Ok(Ok(decision)) => ApprovalOutcome::Rejected {
                reason: decision
                    .reason
                    .unwrap_or_else(|| "Rejected by reviewer".to_string()),
            },
            Ok(Err(e)) => {
                warn!(conversation_id, error = %e, "Approval gate failed, releasing results");
                ApprovalOutcome::BypassedDueToError {
                    error: e.to_string(),
                }
            }
            Err(_) => {
                warn!(conversation_id, "Approval gate timed out, releasing results");
                ApprovalOutcome::BypassedDueToError {
                    error: format!(
                        "approval timed out after {}s",
                        self.approval_timeout.as_secs_f64()
                    ),
                }
            }
        }
    }
}
