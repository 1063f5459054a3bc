/// Prompt templates for answer evaluation
pub struct EvaluationPrompts;

impl EvaluationPrompts {
    /// Build the evaluation request for a single question/answer pair
    pub fn build_evaluation_prompt(
        question: &str,
        answer: &str,
        step_kind: &str,
        experience_level: &str,
    ) -> String {
        format!(
            r#"You are a senior Excel technical interviewer scoring ONE answer from a candidate.

## Interview Stage
{step_kind}

## Candidate Experience Level
{level}

## Question
{question}

## Candidate Answer
{answer}

---

## Scoring Rubric

- 9-10: Mastery. Detailed, accurate, shows deep understanding.
- 7-8: Solid knowledge. Explains concepts well, handles most scenarios.
- 5-6: Basic understanding. Handles simple tasks, gaps remain.
- 3-4: Limited knowledge. Struggles with the concepts asked about.
- 0-2: Minimal or no relevant understanding.

Judge the answer against what is reasonable for the stated experience level.
Weigh technical accuracy first, then problem-solving approach, then clarity.

## Required Response Format

Respond with ONLY a JSON object, no prose before or after:

{{"score": <number 0-10>, "feedback": "<two or three sentences>", "strengths": ["<strength>", "..."], "improvements": ["<area to improve>", "..."]}}"#,
            step_kind = step_kind,
            level = experience_level,
            question = truncate_chars(question, 4000),
            answer = truncate_chars(answer, 8000),
        )
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_pos, _)) => &text[..byte_pos],
        None => text,
    }
}
