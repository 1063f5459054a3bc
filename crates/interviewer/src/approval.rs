use async_trait::async_trait;
use colored::Colorize;
use dialoguer::{Confirm, Input};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use interviewer_core::{ApprovalDecision, ApprovalError, ApprovalGate, AutoApprove, Report};

/// What the reviewer is shown for one draft report
#[derive(Debug, Clone)]
pub struct ReviewPrompt {
    pub id: u64,
    pub title: String,
    pub score_line: String,
    pub rationale: String,
}

struct ReviewRequest {
    prompt: ReviewPrompt,
    reply: oneshot::Sender<Result<ApprovalDecision, ApprovalError>>,
}

/// Asks a reviewer at the terminal before releasing a report.
///
/// All reviews run one after another on a single reviewer thread. A review
/// whose caller has stopped waiting (the approval timed out) is skipped if
/// it has not been shown yet, and its answer is discarded if it has.
pub struct ConsoleApproval {
    requests: mpsc::Sender<ReviewRequest>,
    next_id: AtomicU64,
}

impl ConsoleApproval {
    pub fn new() -> std::io::Result<Self> {
        Self::with_reviewer(prompt_reviewer)
    }

    /// Run reviews through `reviewer` instead of terminal prompts
    pub fn with_reviewer<F>(mut reviewer: F) -> std::io::Result<Self>
    where
        F: FnMut(&ReviewPrompt) -> Result<ApprovalDecision, ApprovalError> + Send + 'static,
    {
        let (requests, queue) = mpsc::channel::<ReviewRequest>();

        std::thread::Builder::new()
            .name("report-reviewer".to_string())
            .spawn(move || {
                for request in queue {
                    if request.reply.is_closed() {
                        debug!(review = request.prompt.id, "Skipping review that timed out");
                        continue;
                    }

                    let decision = reviewer(&request.prompt);
                    if request.reply.send(decision).is_err() {
                        warn!(
                            review = request.prompt.id,
                            "Review answered after the approval timed out, decision discarded"
                        );
                        eprintln!(
                            "{}",
                            "This review had already timed out; the report was released without it."
                                .bright_yellow()
                        );
                    }
                }
            })?;

        Ok(Self {
            requests,
            next_id: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl ApprovalGate for ConsoleApproval {
    fn name(&self) -> &str {
        "console"
    }

    async fn approve(&self, draft: &Report) -> Result<ApprovalDecision, ApprovalError> {
        let (reply, decision) = oneshot::channel();
        let request = ReviewRequest {
            prompt: ReviewPrompt {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                title: draft.title.clone(),
                score_line: draft.score_line(),
                rationale: draft.rationale.clone(),
            },
            reply,
        };

        self.requests
            .send(request)
            .map_err(|_| ApprovalError::Unavailable("reviewer thread stopped".to_string()))?;

        decision.await.map_err(|_| ApprovalError::Interrupted)?
    }
}

fn prompt_reviewer(prompt: &ReviewPrompt) -> Result<ApprovalDecision, ApprovalError> {
    eprintln!();
    eprintln!("{}", "=== Report Review ===".bright_blue().bold());
    eprintln!("{}  {}", "Title:".dimmed(), prompt.title);
    eprintln!("{}  {}", "Score:".dimmed(), prompt.score_line);
    eprintln!("{}  {}", "Rationale:".dimmed(), prompt.rationale);
    eprintln!();

    let approved = Confirm::new()
        .with_prompt("Release this report to the candidate?")
        .default(true)
        .interact()
        .map_err(|e| ApprovalError::Unavailable(e.to_string()))?;

    if approved {
        return Ok(ApprovalDecision::approve());
    }

    let reason: String = Input::new()
        .with_prompt("Reason for withholding")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| ApprovalError::Unavailable(e.to_string()))?;

    let reason = reason.trim();
    Ok(ApprovalDecision::reject(if reason.is_empty() {
        "Withheld by reviewer"
    } else {
        reason
    }))
}

/// Build the gate named by `mode` ("auto" or "console")
pub fn create_gate(mode: &str) -> anyhow::Result<Arc<dyn ApprovalGate>> {
    match mode.to_lowercase().as_str() {
        "auto" => Ok(Arc::new(AutoApprove)),
        "console" => Ok(Arc::new(ConsoleApproval::new().map_err(|e| {
            anyhow::anyhow!("Failed to start the reviewer thread: {}", e)
        })?)),
        other => anyhow::bail!("Unknown approval mode: {} (expected auto or console)", other),
    }
}
