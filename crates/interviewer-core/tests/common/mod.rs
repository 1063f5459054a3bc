#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use interviewer_core::{
    ApprovalDecision, ApprovalError, ApprovalGate, InterviewMachine, InterviewService,
    InterviewStore, MemoryStore, Report,
};
use interviewer_logging::{LogFormat, Logger};
use interviewer_oracle::{Oracle, OracleError, OracleType};

/// Oracle double: questions are numbered, evaluations replay a script
#[derive(Default)]
pub struct ScriptedOracle {
    evaluations: Mutex<VecDeque<String>>,
    questions_asked: AtomicUsize,
    failing_questions: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluation replies carrying these scores, in order
    pub fn with_scores(scores: &[f64]) -> Self {
        let oracle = Self::new();
        for score in scores {
            oracle.push_evaluation(&format!(
                r#"{{"score": {}, "feedback": "Scored {}", "strengths": ["accurate"], "improvements": ["depth"]}}"#,
                score, score
            ));
        }
        oracle
    }

    pub fn push_evaluation(&self, reply: &str) {
        self.evaluations
            .lock()
            .unwrap()
            .push_back(reply.to_string());
    }

    /// Make the next `count` question requests fail
    pub fn fail_next_questions(&self, count: usize) {
        self.failing_questions.store(count, Ordering::SeqCst);
    }

    pub fn questions_asked(&self) -> usize {
        self.questions_asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    fn oracle_type(&self) -> OracleType {
        OracleType::Command
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        if prompt.contains("Scoring Rubric") {
            return Ok(self
                .evaluations
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "no idea, sorry".to_string()));
        }

        let failing = self.failing_questions.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_questions.store(failing - 1, Ordering::SeqCst);
            return Err(OracleError::RequestFailed("scripted outage".to_string()));
        }

        let n = self.questions_asked.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("Question #{}", n))
    }

    async fn is_available(&self) -> bool {
        true
    }
}

pub struct RejectingGate;

#[async_trait]
impl ApprovalGate for RejectingGate {
    fn name(&self) -> &str {
        "rejecting"
    }

    async fn approve(&self, _draft: &Report) -> Result<ApprovalDecision, ApprovalError> {
        Ok(ApprovalDecision::reject("Scores need a second look"))
    }
}

pub struct FailingGate;

#[async_trait]
impl ApprovalGate for FailingGate {
    fn name(&self) -> &str {
        "failing"
    }

    async fn approve(&self, _draft: &Report) -> Result<ApprovalDecision, ApprovalError> {
        Err(ApprovalError::Unavailable("reviewer queue offline".to_string()))
    }
}

pub struct SlowGate;

#[async_trait]
impl ApprovalGate for SlowGate {
    fn name(&self) -> &str {
        "slow"
    }

    async fn approve(&self, _draft: &Report) -> Result<ApprovalDecision, ApprovalError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ApprovalDecision::approve())
    }
}

pub fn quiet_logger() -> Arc<Logger> {
    Arc::new(Logger::new(LogFormat::Compact).without_console())
}

pub fn machine(oracle: Arc<ScriptedOracle>) -> InterviewMachine {
    InterviewMachine::new(oracle, quiet_logger())
}

pub fn service(oracle: Arc<ScriptedOracle>) -> InterviewService {
    let store: Arc<dyn InterviewStore> = Arc::new(MemoryStore::new());
    InterviewService::new(store, machine(oracle))
}

pub fn service_with_gate(
    oracle: Arc<ScriptedOracle>,
    gate: Arc<dyn ApprovalGate>,
    timeout: Duration,
) -> InterviewService {
    let store: Arc<dyn InterviewStore> = Arc::new(MemoryStore::new());
    InterviewService::new(store, machine(oracle).with_approval_gate(gate, timeout))
}

pub const OPENING: &str = "Hi, I'm Sam. Intermediate, I use VLOOKUP and pivot tables daily";
