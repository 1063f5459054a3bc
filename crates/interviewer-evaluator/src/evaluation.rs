use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const FALLBACK_SCORE: f64 = 7.0;
pub const MAX_SCORE: f64 = 10.0;

/// Structured score for a single answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Score in `[0, 10]`
    pub score: f64,
    pub feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

#[derive(Error, Debug)]
pub enum EvaluationParseError {
    #[error("Evaluation reply was empty")]
    Empty,

    #[error("No JSON object found in evaluation reply")]
    NoJsonFound { raw: String },

    #[error("Failed to parse evaluation JSON: {source}")]
    Json {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Score {score} is outside 0-10")]
    ScoreOutOfRange { raw: String, score: f64 },
}

impl EvaluationParseError {
    /// The unparsed reply text, if any
    pub fn raw(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::NoJsonFound { raw } | Self::Json { raw, .. } | Self::ScoreOutOfRange { raw, .. } => {
                raw
            }
        }
    }
}

impl EvaluationRecord {
    /// Neutral record used whenever the oracle reply cannot be used
    pub fn fallback() -> Self {
        Self {
            score: FALLBACK_SCORE,
            feedback: "Response evaluated".to_string(),
            strengths: vec!["Provided a response".to_string()],
            improvements: vec!["Could provide more detail".to_string()],
        }
    }

    /// Parse an evaluation from the oracle's reply text
    ///
    /// Accepts bare JSON, JSON wrapped in a code fence, or JSON embedded in
    /// surrounding prose:
    /// ```text
    /// {"score": 8, "feedback": "...", "strengths": [...], "improvements": [...]}
    /// ```
    pub fn parse(reply: &str) -> Result<Self, EvaluationParseError> {
        debug!(reply_len = reply.len(), "Parsing evaluation reply");

        let trimmed = reply.trim();
        if trimmed.is_empty() {
            return Err(EvaluationParseError::Empty);
        }

        let unfenced = strip_code_fence(trimmed);
        let json_str = extract_json_object(unfenced).ok_or_else(|| {
            EvaluationParseError::NoJsonFound {
                raw: reply.to_string(),
            }
        })?;

        let record: EvaluationRecord =
            serde_json::from_str(json_str).map_err(|source| EvaluationParseError::Json {
                raw: reply.to_string(),
                source,
            })?;

        if !record.score.is_finite() || !(0.0..=MAX_SCORE).contains(&record.score) {
            return Err(EvaluationParseError::ScoreOutOfRange {
                raw: reply.to_string(),
                score: record.score,
            });
        }

        Ok(record)
    }

    /// Short description of the evaluation for logging
    pub fn short_description(&self) -> String {
        format!("{:.1}/10", self.score)
    }
}

/// Remove a surrounding Markdown code fence (with optional language tag)
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line, e.g. ```json
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
