use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::approval::ApprovalOutcome;
use crate::error::InterviewError;
use crate::machine::{InterviewMachine, Started, StepResult};
use crate::report::Report;
use crate::store::{Conversation, ConversationStatus, ConversationSummary, InterviewStore};
use crate::Step;

type LockMap = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Exclusive access to one conversation.
///
/// Dropping it releases the conversation and removes its map entry once no
/// other request holds or waits on it.
struct ConversationLock<'a> {
    locks: &'a LockMap,
    conversation_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ConversationLock<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        drop(self.guard.take());
        if locks
            .get(&self.conversation_id)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(&self.conversation_id);
        }
    }
}

/// Where a conversation's report stands
#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    InProgress,
    /// The interview finished but the approval gate rejected the report
    Withheld(ApprovalOutcome),
    Published(Report),
}

/// Conversation-level operations on top of the state machine.
///
/// `start` and `advance` for one conversation run one at a time; a state is
/// saved only after a transition has fully succeeded.
pub struct InterviewService {
    store: Arc<dyn InterviewStore>,
    machine: InterviewMachine,
    locks: LockMap,
}

impl InterviewService {
    pub fn new(store: Arc<dyn InterviewStore>, machine: InterviewMachine) -> Self {
        Self {
            store,
            machine,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &dyn InterviewStore {
        self.store.as_ref()
    }

    async fn lock_conversation(&self, conversation_id: &str) -> ConversationLock<'_> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(conversation_id.to_string())
                .or_default()
                .clone()
        };
        let guard = mutex.lock_owned().await;

        ConversationLock {
            locks: &self.locks,
            conversation_id: conversation_id.to_string(),
            guard: Some(guard),
        }
    }

    pub fn create_conversation(&self, email: &str) -> Result<Conversation, InterviewError> {
        let conversation = self.store.create(email)?;
        info!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    pub fn list_conversations(&self) -> Result<Vec<ConversationSummary>, InterviewError> {
        Ok(self
            .store
            .list()?
            .iter()
            .map(Conversation::summary)
            .collect())
    }

    pub fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, InterviewError> {
        Ok(self.store.get(conversation_id)?)
    }

    pub fn update_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<(), InterviewError> {
        self.store.update_status(conversation_id, status)?;
        Ok(())
    }

    /// Begin the interview of an existing conversation
    pub async fn start_interview(
        &self,
        conversation_id: &str,
        opening_message: &str,
    ) -> Result<Started, InterviewError> {
        let _lock = self.lock_conversation(conversation_id).await;

        let conversation = self.store.get(conversation_id)?;
        if conversation.state.is_some() {
            return Err(InterviewError::AlreadyStarted(conversation_id.to_string()));
        }

        let started = self.machine.start(conversation_id, opening_message).await?;
        self.store.save(&started.state)?;
        debug!(conversation_id, "Interview state saved");
        Ok(started)
    }

    /// Submit the answer to `step`, saving the new state on success
    pub async fn submit_answer(
        &self,
        conversation_id: &str,
        step: Step,
        answer: &str,
    ) -> Result<StepResult, InterviewError> {
        let _lock = self.lock_conversation(conversation_id).await;

        let state = self.store.load(conversation_id)?;
        state.check_invariants()?;

        let result = self.machine.advance(&state, answer, step).await?;
        self.store.save(result.state())?;
        debug!(conversation_id, step = %step, "Interview state saved");
        Ok(result)
    }

    pub fn report(&self, conversation_id: &str) -> Result<ReportStatus, InterviewError> {
        let state = self.store.load(conversation_id)?;

        Ok(match (state.is_complete, state.final_results, state.approval_outcome) {
            (false, _, _) => ReportStatus::InProgress,
            (true, Some(report), _) => ReportStatus::Published(report),
            (true, None, outcome) => ReportStatus::Withheld(
                outcome.unwrap_or(ApprovalOutcome::Rejected {
                    reason: "Rejected by reviewer".to_string(),
                }),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use interviewer_logging::{LogFormat, Logger};
    use interviewer_oracle::{Oracle, OracleError, OracleType};

    use crate::store::MemoryStore;
    use crate::Step;

    struct FixedOracle;

    #[async_trait]
    impl Oracle for FixedOracle {
        fn name(&self) -> &str {
            "fixed"
        }

        fn oracle_type(&self) -> OracleType {
            OracleType::Command
        }

        async fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
            Ok("What does VLOOKUP return when no match is found?".to_string())
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    fn service() -> InterviewService {
        let logger = Arc::new(Logger::new(LogFormat::Compact).without_console());
        let machine = InterviewMachine::new(Arc::new(FixedOracle), logger);
        InterviewService::new(Arc::new(MemoryStore::new()), machine)
    }

    fn lock_entries(service: &InterviewService) -> usize {
        service.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_unknown_conversations_leave_no_locks() {
        let service = service();

        for i in 0..100 {
            let id = format!("missing-{}", i);
            assert!(matches!(
                service.start_interview(&id, "hello").await,
                Err(InterviewError::NotFound(_))
            ));
            assert!(matches!(
                service.submit_answer(&id, Step::Intro, "hi").await,
                Err(InterviewError::NotFound(_))
            ));
        }

        assert_eq!(lock_entries(&service), 0);
    }

    #[tokio::test]
    async fn test_lock_released_after_successful_transition() {
        let service = service();
        let conversation = service.create_conversation("ada@example.com").unwrap();

        service
            .start_interview(&conversation.id, "I'm Ada, advanced")
            .await
            .unwrap();
        service
            .submit_answer(&conversation.id, Step::Intro, "Ten years of models")
            .await
            .unwrap();

        assert_eq!(lock_entries(&service), 0);
        assert_eq!(
            service.report(&conversation.id).unwrap(),
            ReportStatus::InProgress
        );
    }

    #[tokio::test]
    async fn test_held_lock_survives_other_release() {
        let service = service();

        let first = service.lock_conversation("conv-1").await;
        let waiting = service.lock_conversation("conv-1");
        tokio::pin!(waiting);
        assert!(still_pending(waiting.as_mut()).await);
        assert_eq!(lock_entries(&service), 1);

        drop(first);
        let second = waiting.await;
        assert_eq!(lock_entries(&service), 1);

        drop(second);
        assert_eq!(lock_entries(&service), 0);
    }

    async fn still_pending<F: std::future::Future + Unpin>(fut: F) -> bool {
        tokio::time::timeout(std::time::Duration::from_millis(20), fut)
            .await
            .is_err()
    }
}
