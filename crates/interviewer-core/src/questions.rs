use tracing::debug;

use interviewer_oracle::{Oracle, OracleError};

use crate::{CandidateInfo, ExperienceLevel, Step};

const PLAIN_TEXT_RULE: &str =
    "Respond with the question only, in plain text without markdown formatting.";

/// Prompt templates for question generation
pub struct QuestionPrompts;

impl QuestionPrompts {
    /// Prompt for the given step
    pub fn for_step(step: Step, candidate: &CandidateInfo, question_number: u32) -> String {
        let level = candidate.experience_level;
        match step {
            Step::Intro => Self::intro(candidate),
            Step::Theory => Self::theory(level, question_number),
            Step::Practical => Self::practical(level, question_number),
            Step::Advanced | Step::Advanced2 | Step::Advanced3 => {
                let mut prompt = Self::advanced(level, question_number);
                if let Some(focus) = Self::advanced_focus(step) {
                    prompt.push_str("\n\nFocus this question on ");
                    prompt.push_str(focus);
                    prompt.push('.');
                }
                prompt
            }
        }
    }

    /// Topic suffix that keeps the three advanced questions distinct
    pub fn advanced_focus(step: Step) -> Option<&'static str> {
        match step {
            Step::Advanced => Some("VBA programming and automation"),
            Step::Advanced2 => Some("Power Query and data transformation"),
            Step::Advanced3 => Some("dashboards, dynamic reports and performance optimization"),
            _ => None,
        }
    }

    pub fn intro(candidate: &CandidateInfo) -> String {
        format!(
            r#"You are a professional Excel technical interviewer opening an interview.

Candidate: {name}
Stated experience level: {level}

Welcome the candidate, explain that the interview has six questions covering
background, theory, practical scenarios and advanced features, and that answers
may be given in natural language.

Then ask the first question: what their experience with Excel is and what kind
of Excel work they do day to day.

{rule}"#,
            name = candidate.display_name(),
            level = candidate.experience_level,
            rule = PLAIN_TEXT_RULE,
        )
    }

    pub fn theory(level: ExperienceLevel, question_number: u32) -> String {
        format!(
            r#"You are an Excel technical interviewer testing conceptual knowledge.

This is question {number} of the interview. Candidate experience level: {level}.

Pick one topic appropriate to the level: functions and formulas, cell
references, lookup strategies, data analysis concepts or workbook best
practices. Ask a single question that lets the candidate explain both the
concept and when to apply it.

{rule}"#,
            number = question_number,
            level = level,
            rule = PLAIN_TEXT_RULE,
        )
    }

    pub fn practical(level: ExperienceLevel, question_number: u32) -> String {
        format!(
            r#"You are an Excel technical interviewer testing hands-on skills.

This is question {number} of the interview. Candidate experience level: {level}.

Describe a short, realistic business scenario (for example a sales table with
Date, Product, Region, Sales and Cost columns) and ask the candidate how they
would solve it: which formulas, pivot tables, validation or charts they would
use and in what order.

{rule}"#,
            number = question_number,
            level = level,
            rule = PLAIN_TEXT_RULE,
        )
    }

    pub fn advanced(level: ExperienceLevel, question_number: u32) -> String {
        format!(
            r#"You are an Excel technical interviewer testing advanced features.

This is question {number} of the interview. Candidate experience level: {level}.

Ask one scenario question that needs deep knowledge of advanced Excel, such as
VBA, Power Query, dynamic array formulas, interactive dashboards or working with
large workbooks. The candidate should have to explain both the technique and
when it is the right choice.

{rule}"#,
            number = question_number,
            level = level,
            rule = PLAIN_TEXT_RULE,
        )
    }
}

/// Asks the oracle for the question of a step
pub struct QuestionGenerator<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> QuestionGenerator<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    pub async fn generate(
        &self,
        step: Step,
        candidate: &CandidateInfo,
        question_number: u32,
    ) -> Result<String, OracleError> {
        let prompt = QuestionPrompts::for_step(step, candidate, question_number);
        debug!(step = %step, question_number, oracle = self.oracle.name(), "Generating question");

        let question = self.oracle.complete(&prompt).await?;
        let question = question.trim();
        if question.is_empty() {
            return Err(OracleError::EmptyCompletion);
        }
        Ok(question.to_string())
    }
}
