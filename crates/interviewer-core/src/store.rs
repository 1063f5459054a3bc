use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use interviewer_db::{ConversationRecord, Database};

use crate::error::StoreError;
use crate::state::InterviewState;

pub const INTERVIEW_TYPE: &str = "excel";

/// Lifecycle status of a conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl ConversationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Completed => "completed",
            ConversationStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ConversationStatus::Active),
            "completed" => Ok(ConversationStatus::Completed),
            "archived" => Ok(ConversationStatus::Archived),
            _ => Err(format!("Unknown conversation status: {}", s)),
        }
    }
}

/// A conversation and its interview, if one has started
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub email: String,
    pub status: ConversationStatus,
    pub interview_type: String,
    pub state: Option<InterviewState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            status: ConversationStatus::Active,
            interview_type: INTERVIEW_TYPE.to_string(),
            state: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            conversation_id: self.id.clone(),
            email: self.email.clone(),
            status: self.status,
            interview_type: self.interview_type.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            interview_completed: self.state.as_ref().is_some_and(|s| s.is_complete),
            message_count: self.state.as_ref().map_or(0, |s| s.messages.len()),
        }
    }

    fn from_record(record: ConversationRecord) -> Result<Self, StoreError> {
        let status = record
            .status
            .parse::<ConversationStatus>()
            .map_err(StoreError::Corrupt)?;
        let state = record
            .state
            .as_deref()
            .map(serde_json::from_str::<InterviewState>)
            .transpose()?;

        Ok(Self {
            id: record.id,
            email: record.email,
            status,
            interview_type: record.interview_type,
            state,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn to_record(&self) -> Result<ConversationRecord, StoreError> {
        let state = self.state.as_ref().map(serde_json::to_string).transpose()?;
        Ok(ConversationRecord {
            id: self.id.clone(),
            email: self.email.clone(),
            status: self.status.as_str().to_string(),
            interview_type: self.interview_type.clone(),
            state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Listing view of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub email: String,
    pub status: ConversationStatus,
    pub interview_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub interview_completed: bool,
    pub message_count: usize,
}

/// Persistence for conversations and their interview state
pub trait InterviewStore: Send + Sync {
    fn create(&self, email: &str) -> Result<Conversation, StoreError>;

    /// Fails with `NotFound` for unknown ids
    fn get(&self, id: &str) -> Result<Conversation, StoreError>;

    /// All conversations, newest first
    fn list(&self) -> Result<Vec<Conversation>, StoreError>;

    /// Persist the state of an existing conversation. A complete interview
    /// marks the conversation completed.
    fn save(&self, state: &InterviewState) -> Result<(), StoreError>;

    fn update_status(&self, id: &str, status: ConversationStatus) -> Result<(), StoreError>;

    fn load(&self, id: &str) -> Result<InterviewState, StoreError> {
        self.get(id)?
            .state
            .ok_or_else(|| StoreError::NoInterview(id.to_string()))
    }
}

fn apply_state(conversation: &mut Conversation, state: &InterviewState) {
    conversation.state = Some(state.clone());
    if state.is_complete {
        conversation.status = ConversationStatus::Completed;
    }
    conversation.updated_at = Utc::now();
}

impl InterviewStore for Database {
    fn create(&self, email: &str) -> Result<Conversation, StoreError> {
        let record = self.conversations().create(email)?;
        Conversation::from_record(record)
    }

    fn get(&self, id: &str) -> Result<Conversation, StoreError> {
        let record = self
            .conversations()
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Conversation::from_record(record)
    }

    fn list(&self) -> Result<Vec<Conversation>, StoreError> {
        let records = self.conversations().list()?;
        records.into_iter().map(Conversation::from_record).collect()
    }

    fn save(&self, state: &InterviewState) -> Result<(), StoreError> {
        let mut conversation = self.get(&state.conversation_id)?;
        apply_state(&mut conversation, state);
        let record = conversation.to_record()?;
        self.conversations().save(&record)?;
        Ok(())
    }

    fn update_status(&self, id: &str, status: ConversationStatus) -> Result<(), StoreError> {
        if self.conversations().update_status(id, status.as_str())? {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }
}

/// In-process store, used by tests and one-off CLI sessions
#[derive(Default)]
pub struct MemoryStore {
    conversations: Mutex<HashMap<String, Conversation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_map<T>(&self, f: impl FnOnce(&mut HashMap<String, Conversation>) -> T) -> T {
        let mut map = self
            .conversations
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        f(&mut map)
    }
}

impl InterviewStore for MemoryStore {
    fn create(&self, email: &str) -> Result<Conversation, StoreError> {
        let conversation = Conversation::new(email);
        self.with_map(|map| map.insert(conversation.id.clone(), conversation.clone()));
        Ok(conversation)
    }

    fn get(&self, id: &str) -> Result<Conversation, StoreError> {
        self.with_map(|map| map.get(id).cloned())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<Conversation>, StoreError> {
        let mut all: Vec<Conversation> = self.with_map(|map| map.values().cloned().collect());
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    fn save(&self, state: &InterviewState) -> Result<(), StoreError> {
        self.with_map(|map| match map.get_mut(&state.conversation_id) {
            Some(conversation) => {
                apply_state(conversation, state);
                Ok(())
            }
            None => Err(StoreError::NotFound(state.conversation_id.clone())),
        })
    }

    fn update_status(&self, id: &str, status: ConversationStatus) -> Result<(), StoreError> {
        self.with_map(|map| match map.get_mut(id) {
            Some(conversation) => {
                conversation.status = status;
                conversation.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        })
    }
}
