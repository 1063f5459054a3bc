use serde::{Deserialize, Serialize};

use crate::error::InvariantViolation;

/// Number of answerable steps in an interview
pub const TOTAL_QUESTIONS: u32 = 6;

/// One stage of the fixed interview sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Intro,
    Theory,
    Practical,
    Advanced,
    Advanced2,
    Advanced3,
}

impl Step {
    /// The full sequence, in interview order
    pub const SEQUENCE: [Step; TOTAL_QUESTIONS as usize] = [
        Step::Intro,
        Step::Theory,
        Step::Practical,
        Step::Advanced,
        Step::Advanced2,
        Step::Advanced3,
    ];

    pub fn first() -> Self {
        Step::Intro
    }

    /// Zero-based position in the sequence
    pub fn index(self) -> usize {
        match self {
            Step::Intro => 0,
            Step::Theory => 1,
            Step::Practical => 2,
            Step::Advanced => 3,
            Step::Advanced2 => 4,
            Step::Advanced3 => 5,
        }
    }

    /// The question number this step is asked as (1-based)
    pub fn question_number(self) -> u32 {
        self.index() as u32 + 1
    }

    /// The successor step, or None after the last one
    pub fn next(self) -> Option<Step> {
        Self::SEQUENCE.get(self.index() + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Intro => "intro",
            Step::Theory => "theory",
            Step::Practical => "practical",
            Step::Advanced => "advanced",
            Step::Advanced2 => "advanced2",
            Step::Advanced3 => "advanced3",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Step {
    type Err = InvariantViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SEQUENCE
            .into_iter()
            .find(|step| step.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvariantViolation::UnknownStep(s.to_string()))
    }
}
