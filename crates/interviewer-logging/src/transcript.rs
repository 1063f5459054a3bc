use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Represents each line type in the transcript JSONL file.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptLine {
    InterviewStart {
        timestamp: DateTime<Utc>,
        conversation_id: String,
        opening_message: String,
        experience_level: String,
        candidate_name: Option<String>,
    },
    Exchange {
        step: String,
        question: String,
        answer: String,
        score: f64,
        feedback: String,
        timestamp: DateTime<Utc>,
    },
    InterviewEnd {
        overall_score: Option<f64>,
        indicator: Option<String>,
        approval: String,
        timestamp: DateTime<Utc>,
    },
}

/// Writes an interview transcript as JSONL to ~/.local/share/interviewer/transcripts/.
pub struct TranscriptWriter {
    file: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl TranscriptWriter {
    /// Create a transcript in the default data directory.
    pub fn new(conversation_id: &str) -> io::Result<Self> {
        Self::in_dir(&Self::transcripts_dir()?, conversation_id)
    }

    /// Create a transcript in `dir`. The file name is the current UTC
    /// timestamp plus a short hash of the conversation id.
    pub fn in_dir(dir: &Path, conversation_id: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        let timestamp_str = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();

        let mut hasher = Sha256::new();
        hasher.update(conversation_id.as_bytes());
        let hash = hex::encode(hasher.finalize());
        let short_hash = &hash[..6];

        let path = dir.join(format!("{}_{}.jsonl", timestamp_str, short_hash));
        let file = File::create(&path)?;

        Ok(Self {
            file: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    /// Returns the path to the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_start(
        &self,
        conversation_id: &str,
        opening_message: &str,
        experience_level: &str,
        candidate_name: Option<&str>,
    ) {
        self.write_line(&TranscriptLine::InterviewStart {
            timestamp: Utc::now(),
            conversation_id: conversation_id.to_string(),
            opening_message: opening_message.to_string(),
            experience_level: experience_level.to_string(),
            candidate_name: candidate_name.map(String::from),
        });
    }

    /// Write one question/answer exchange. Takes plain fields so this crate
    /// stays independent of the interview types.
    pub fn write_exchange(
        &self,
        step: &str,
        question: &str,
        answer: &str,
        score: f64,
        feedback: &str,
        timestamp: DateTime<Utc>,
    ) {
        self.write_line(&TranscriptLine::Exchange {
            step: step.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            score,
            feedback: feedback.to_string(),
            timestamp,
        });
    }

    pub fn write_end(&self, overall_score: Option<f64>, indicator: Option<&str>, approval: &str) {
        self.write_line(&TranscriptLine::InterviewEnd {
            overall_score,
            indicator: indicator.map(String::from),
            approval: approval.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn write_line(&self, line: &TranscriptLine) {
        if let Ok(json) = serde_json::to_string(line) {
            if let Ok(mut writer) = self.file.lock() {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
    }

    fn transcripts_dir() -> io::Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine data directory",
            )
        })?;
        Ok(data_dir.join("interviewer").join("transcripts"))
    }
}
