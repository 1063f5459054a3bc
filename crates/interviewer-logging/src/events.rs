use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured log events for an interview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    InterviewStarted {
        conversation_id: String,
        experience_level: String,
        candidate_name: Option<String>,
    },
    QuestionIssued {
        conversation_id: String,
        step: String,
        question_number: u32,
        question_preview: String,
    },
    AnswerReceived {
        conversation_id: String,
        step: String,
        answer_len: usize,
    },
    AnswerEvaluated {
        conversation_id: String,
        step: String,
        score: f64,
        /// True when the neutral fallback record was used
        fallback: bool,
    },
    ApprovalDecided {
        conversation_id: String,
        outcome: String,
    },
    InterviewCompleted {
        conversation_id: String,
        overall_score: f64,
        indicator: String,
        /// False when the approval gate withheld the results
        released: bool,
    },
    ErrorEncountered {
        conversation_id: String,
        step: Option<String>,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

/// Logger for interview events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    console: bool,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            console: true,
            file_writer: None,
        }
    }

    /// A logger that only writes to its file (if any); used by tests and the server
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            console: true,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if !self.console {
            return;
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::InterviewStarted {
                conversation_id,
                experience_level,
                candidate_name,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}",
                    "│".bright_blue(),
                    "Excel interview".bold().bright_white()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Candidate:".dimmed(),
                    candidate_name.as_deref().unwrap_or("Candidate").dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Level:".dimmed(),
                    experience_level.dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Conversation:".dimmed(),
                    conversation_id.dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::QuestionIssued {
                step,
                question_number,
                ..
            } => {
                let header = format!("─ Question {} ({}) ", question_number, step);
                let padding = "─".repeat(67usize.saturating_sub(header.chars().count()));
                let _ = writeln!(
                    stderr,
                    "{}{}{}",
                    "┌".bright_blue(),
                    header.bright_blue().bold(),
                    padding.bright_blue()
                );
            }
            LogEvent::AnswerReceived { answer_len, .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} ({} chars)",
                    "▶".bright_cyan(),
                    "ANSWER".bright_cyan().bold(),
                    answer_len
                );
            }
            LogEvent::AnswerEvaluated {
                score, fallback, ..
            } => {
                if *fallback {
                    let _ = writeln!(
                        stderr,
                        "    {} Score {:.1}/10 (fallback evaluation)",
                        "~".bright_yellow(),
                        score
                    );
                } else {
                    let _ = writeln!(
                        stderr,
                        "    {} Score {:.1}/10",
                        "✓".bright_green(),
                        score
                    );
                }
                let _ = writeln!(
                    stderr,
                    "{}",
                    "└─────────────────────────────────────────────────────────────────────┘"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::ApprovalDecided { outcome, .. } => {
                let styled = if outcome == "approved" {
                    format!("✓ Approval: {}", outcome).bright_green().to_string()
                } else if outcome == "rejected" {
                    format!("✗ Approval: {}", outcome).bright_red().to_string()
                } else {
                    format!("→ Approval: {}", outcome).bright_yellow().to_string()
                };
                let _ = writeln!(stderr, "  {}", styled);
            }
            LogEvent::InterviewCompleted { .. } => {
                // The final report is printed by the caller
            }
            LogEvent::ErrorEncountered { step, error, .. } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Error{}: {}",
                    "✗".bright_red(),
                    step.as_ref()
                        .map(|s| format!(" at {}", s))
                        .unwrap_or_default(),
                    error.bright_red()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::InterviewStarted {
                conversation_id,
                experience_level,
                ..
            } => format!(
                "[{}] interview:start {} level={}",
                timestamp, conversation_id, experience_level
            ),
            LogEvent::QuestionIssued {
                step,
                question_number,
                ..
            } => format!("[{}] question:{}:{}", timestamp, question_number, step),
            LogEvent::AnswerReceived {
                step, answer_len, ..
            } => format!("[{}] answer:{} {}c", timestamp, step, answer_len),
            LogEvent::AnswerEvaluated {
                step,
                score,
                fallback,
                ..
            } => format!(
                "[{}] eval:{} {:.1}{}",
                timestamp,
                step,
                score,
                if *fallback { " (fallback)" } else { "" }
            ),
            LogEvent::ApprovalDecided { outcome, .. } => {
                format!("[{}] approval:{}", timestamp, outcome)
            }
            LogEvent::InterviewCompleted {
                overall_score,
                indicator,
                released,
                ..
            } => format!(
                "[{}] interview:done {:.1} {}{}",
                timestamp,
                overall_score,
                indicator,
                if *released { "" } else { " (withheld)" }
            ),
            LogEvent::ErrorEncountered { step, error, .. } => format!(
                "[{}] error:{}:{}",
                timestamp,
                step.as_deref().unwrap_or("-"),
                error
            ),
        };
        let _ = writeln!(stderr, "{}", msg);
    }
}
