use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use interviewer_evaluator::{truncate_chars, EvaluationRecord, FALLBACK_SCORE};

use crate::state::QaPair;
use crate::{CandidateInfo, Step};

const QUESTION_PREVIEW_CHARS: usize = 120;
const ANSWER_PREVIEW_CHARS: usize = 200;

/// Coarse performance band derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualIndicator {
    Excellent,
    Good,
    Satisfactory,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl VisualIndicator {
    /// Bands: >= 8, >= 6, >= 4, below 4
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            VisualIndicator::Excellent
        } else if score >= 6.0 {
            VisualIndicator::Good
        } else if score >= 4.0 {
            VisualIndicator::Satisfactory
        } else {
            VisualIndicator::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VisualIndicator::Excellent => "Excellent",
            VisualIndicator::Good => "Good",
            VisualIndicator::Satisfactory => "Satisfactory",
            VisualIndicator::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            VisualIndicator::Excellent => "🟢",
            VisualIndicator::Good => "🟡",
            VisualIndicator::Satisfactory => "🟠",
            VisualIndicator::NeedsImprovement => "🔴",
        }
    }
}

impl std::fmt::Display for VisualIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-answer detail in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
    pub step: Step,
    pub question: String,
    pub answer: String,
    pub score: f64,
    /// None when the answer was never evaluated
    pub evaluation: Option<EvaluationRecord>,
}

/// The final interview report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub title: String,
    pub overall_score: f64,
    pub visual_indicator: VisualIndicator,
    pub rationale: String,
    pub summary: String,
    pub detailed_breakdown: Vec<BreakdownEntry>,
    pub candidate_info: CandidateInfo,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    /// e.g. "7.0/10 🟡 Good"
    pub fn score_line(&self) -> String {
        format!(
            "{:.1}/10 {} {}",
            self.overall_score,
            self.visual_indicator.emoji(),
            self.visual_indicator.label()
        )
    }
}

/// Builds reports from recorded answers and evaluations. Never calls the oracle.
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn build(
        qa_pairs: &[QaPair],
        evaluations: &BTreeMap<Step, EvaluationRecord>,
        candidate_info: &CandidateInfo,
    ) -> Report {
        Self::build_at(qa_pairs, evaluations, candidate_info, Utc::now())
    }

    pub fn build_at(
        qa_pairs: &[QaPair],
        evaluations: &BTreeMap<Step, EvaluationRecord>,
        candidate_info: &CandidateInfo,
        generated_at: DateTime<Utc>,
    ) -> Report {
        let overall_score = Self::overall_score(qa_pairs, evaluations);
        let visual_indicator = VisualIndicator::from_score(overall_score);

        let detailed_breakdown: Vec<BreakdownEntry> = qa_pairs
            .iter()
            .map(|pair| {
                let evaluation = evaluations.get(&pair.step).cloned();
                BreakdownEntry {
                    step: pair.step,
                    question: pair.question.clone(),
                    answer: pair.answer.clone(),
                    score: evaluation.as_ref().map_or(FALLBACK_SCORE, |e| e.score),
                    evaluation,
                }
            })
            .collect();

        let title = format!(
            "Excel Interview - {} ({})",
            candidate_info.display_name(),
            candidate_info.experience_level.label()
        );

        let rationale = Self::rationale(overall_score, visual_indicator, &detailed_breakdown);
        let summary = Self::summary(
            &title,
            overall_score,
            visual_indicator,
            &detailed_breakdown,
        );

        Report {
            title,
            overall_score,
            visual_indicator,
            rationale,
            summary,
            detailed_breakdown,
            candidate_info: candidate_info.clone(),
            generated_at,
        }
    }

    /// Mean over every step that has an answer or an evaluation.
    ///
    /// Steps without an evaluation count as the fallback score. With no data
    /// at all the score is the fallback score.
    pub fn overall_score(
        qa_pairs: &[QaPair],
        evaluations: &BTreeMap<Step, EvaluationRecord>,
    ) -> f64 {
        let steps: BTreeSet<Step> = qa_pairs
            .iter()
            .map(|pair| pair.step)
            .chain(evaluations.keys().copied())
            .collect();

        if steps.is_empty() {
            return FALLBACK_SCORE;
        }

        let total: f64 = steps
            .iter()
            .map(|step| evaluations.get(step).map_or(FALLBACK_SCORE, |e| e.score))
            .sum();
        total / steps.len() as f64
    }

    fn rationale(score: f64, indicator: VisualIndicator, breakdown: &[BreakdownEntry]) -> String {
        if breakdown.is_empty() {
            return format!(
                "No answers were recorded, so a neutral score of {:.1}/10 was assigned.",
                score
            );
        }

        let evaluated = breakdown.iter().filter(|e| e.evaluation.is_some()).count();
        let strongest = breakdown
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|e| e.step);
        let weakest = breakdown
            .iter()
            .min_by(|a, b| a.score.total_cmp(&b.score))
            .map(|e| e.step);

        let mut text = format!(
            "Average of {} answer(s) ({} evaluated) is {:.1}/10, rated {}.",
            breakdown.len(),
            evaluated,
            score,
            indicator.label()
        );
        if let (Some(strongest), Some(weakest)) = (strongest, weakest) {
            if strongest != weakest {
                let _ = write!(
                    text,
                    " Strongest area: {}. Weakest area: {}.",
                    strongest, weakest
                );
            }
        }
        text
    }

    fn summary(
        title: &str,
        score: f64,
        indicator: VisualIndicator,
        breakdown: &[BreakdownEntry],
    ) -> String {
        let mut text = format!(
            "{}\nOverall Score: {:.1}/10 {} {}\n",
            title,
            score,
            indicator.emoji(),
            indicator.label()
        );

        if breakdown.is_empty() {
            text.push_str("\nNo interview data was available to evaluate.\n");
            return text;
        }

        for (i, entry) in breakdown.iter().enumerate() {
            let _ = write!(
                text,
                "\n{}. [{}] Q: {}\n   A: {}\n   Score: {:.1}/10",
                i + 1,
                entry.step,
                preview(&entry.question, QUESTION_PREVIEW_CHARS),
                preview(&entry.answer, ANSWER_PREVIEW_CHARS),
                entry.score
            );
            match &entry.evaluation {
                Some(eval) => {
                    let _ = writeln!(text, " - {}", eval.feedback);
                    if !eval.strengths.is_empty() {
                        let _ = writeln!(text, "   Strengths: {}", eval.strengths.join("; "));
                    }
                    if !eval.improvements.is_empty() {
                        let _ = writeln!(
                            text,
                            "   Improvements: {}",
                            eval.improvements.join("; ")
                        );
                    }
                }
                None => text.push_str(" - not evaluated\n"),
            }
        }

        text
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let truncated = truncate_chars(trimmed, max_chars);
    if truncated.len() < trimmed.len() {
        format!("{}...", truncated)
    } else {
        truncated.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExperienceLevel;

    fn pair(step: Step, answer: &str) -> QaPair {
        QaPair {
            step,
            question: format!("{} question?", step),
            answer: answer.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn eval(score: f64) -> EvaluationRecord {
        EvaluationRecord {
            score,
            feedback: format!("scored {}", score),
            strengths: vec!["clear".to_string()],
            improvements: vec![],
        }
    }

    fn candidate() -> CandidateInfo {
        CandidateInfo {
            name: None,
            experience_level: ExperienceLevel::Advanced,
        }
    }

    #[test]
    fn test_indicator_bands() {
        assert_eq!(VisualIndicator::from_score(8.0), VisualIndicator::Excellent);
        assert_eq!(VisualIndicator::from_score(7.99), VisualIndicator::Good);
        assert_eq!(VisualIndicator::from_score(6.0), VisualIndicator::Good);
        assert_eq!(VisualIndicator::from_score(4.0), VisualIndicator::Satisfactory);
        assert_eq!(
            VisualIndicator::from_score(3.99),
            VisualIndicator::NeedsImprovement
        );
        assert_eq!(VisualIndicator::NeedsImprovement.emoji(), "🔴");
    }

    #[test]
    fn test_indicator_serializes_label() {
        let json = serde_json::to_string(&VisualIndicator::NeedsImprovement).unwrap();
        assert_eq!(json, "\"Needs Improvement\"");
    }

    #[test]
    fn test_mean_of_evaluations() {
        let pairs = vec![
            pair(Step::Intro, "a"),
            pair(Step::Theory, "b"),
            pair(Step::Practical, "c"),
            pair(Step::Advanced, "d"),
        ];
        let mut evals = BTreeMap::new();
        evals.insert(Step::Intro, eval(9.0));
        evals.insert(Step::Theory, eval(7.0));
        evals.insert(Step::Practical, eval(5.0));
        evals.insert(Step::Advanced, eval(7.0));

        let report = ReportBuilder::build(&pairs, &evals, &candidate());
        assert!((report.overall_score - 7.0).abs() < 1e-9);
        assert_eq!(report.visual_indicator, VisualIndicator::Good);
        assert_eq!(report.detailed_breakdown.len(), 4);
        assert_eq!(report.title, "Excel Interview - Candidate (Advanced)");
        assert!(report.rationale.contains("Strongest area: intro"));
        assert!(report.rationale.contains("Weakest area: practical"));
    }

    #[test]
    fn test_missing_evaluation_counts_as_fallback() {
        let pairs = vec![pair(Step::Intro, "a"), pair(Step::Theory, "b")];
        let mut evals = BTreeMap::new();
        evals.insert(Step::Intro, eval(3.0));

        let score = ReportBuilder::overall_score(&pairs, &evals);
        assert!((score - 5.0).abs() < 1e-9);

        let report = ReportBuilder::build(&pairs, &evals, &candidate());
        assert!(report.detailed_breakdown[1].evaluation.is_none());
        assert_eq!(report.detailed_breakdown[1].score, FALLBACK_SCORE);
        assert!(report.summary.contains("not evaluated"));
    }

    #[test]
    fn test_empty_data_scores_neutral() {
        let report = ReportBuilder::build(&[], &BTreeMap::new(), &CandidateInfo::default());
        assert_eq!(report.overall_score, FALLBACK_SCORE);
        assert_eq!(report.visual_indicator, VisualIndicator::Good);
        assert!(report.summary.contains("No interview data"));
        assert!(report.detailed_breakdown.is_empty());
    }

    #[test]
    fn test_summary_truncates_long_answers() {
        let long_answer = "é".repeat(500);
        let pairs = vec![pair(Step::Intro, &long_answer)];
        let report = ReportBuilder::build(&pairs, &BTreeMap::new(), &candidate());

        let expected = format!("A: {}...", "é".repeat(ANSWER_PREVIEW_CHARS));
        assert!(report.summary.contains(&expected));
        assert!(!report.summary.contains(&"é".repeat(ANSWER_PREVIEW_CHARS + 1)));
    }

    #[test]
    fn test_score_line() {
        let pairs = vec![pair(Step::Intro, "a")];
        let mut evals = BTreeMap::new();
        evals.insert(Step::Intro, eval(8.5));
        let report = ReportBuilder::build(&pairs, &evals, &candidate());
        assert_eq!(report.score_line(), "8.5/10 🟢 Excellent");
    }
}
