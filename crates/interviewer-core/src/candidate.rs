use serde::{Deserialize, Serialize};

/// Placeholder used whenever the candidate's name is unknown
pub const DEFAULT_CANDIDATE_NAME: &str = "Candidate";

/// Self-reported Excel experience level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Basic,
    #[default]
    Intermediate,
    Advanced,
    Beginner,
    Expert,
}

impl ExperienceLevel {
    /// Keyword vocabulary, in match priority order
    pub const VOCABULARY: [ExperienceLevel; 5] = [
        ExperienceLevel::Basic,
        ExperienceLevel::Intermediate,
        ExperienceLevel::Advanced,
        ExperienceLevel::Beginner,
        ExperienceLevel::Expert,
    ];

    /// First vocabulary keyword found in `text` (case-insensitive), else intermediate
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self::VOCABULARY
            .into_iter()
            .find(|level| lower.contains(level.as_str()))
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Basic => "basic",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Expert => "expert",
        }
    }

    /// Title-cased label for reports
    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Basic => "Basic",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Advanced => "Advanced",
            ExperienceLevel::Beginner => "Beginner",
            ExperienceLevel::Expert => "Expert",
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate details derived once from the opening message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInfo {
    pub name: Option<String>,
    pub experience_level: ExperienceLevel,
}

impl CandidateInfo {
    /// Derive candidate info by keyword matching.
    ///
    /// Names are not extracted: an introduction only yields the placeholder name.
    pub fn from_opening_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let introduces_self = ["name", "i'm", "i am"]
            .iter()
            .any(|marker| lower.contains(marker));

        Self {
            name: introduces_self.then(|| DEFAULT_CANDIDATE_NAME.to_string()),
            experience_level: ExperienceLevel::detect(message),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_CANDIDATE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_level_keywords() {
        assert_eq!(
            ExperienceLevel::detect("intermediate, I use VLOOKUP and pivot tables"),
            ExperienceLevel::Intermediate
        );
        assert_eq!(ExperienceLevel::detect("I'm an EXPERT"), ExperienceLevel::Expert);
        assert_eq!(
            ExperienceLevel::detect("total beginner here"),
            ExperienceLevel::Beginner
        );
        assert_eq!(
            ExperienceLevel::detect("I write macros all day"),
            ExperienceLevel::Intermediate
        );
    }

    #[test]
    fn test_detect_uses_vocabulary_order() {
        // "basic" precedes "expert" in the vocabulary
        assert_eq!(
            ExperienceLevel::detect("expert in basic formulas"),
            ExperienceLevel::Basic
        );
    }

    #[test]
    fn test_name_presence_check() {
        let info = CandidateInfo::from_opening_message("Hi, I am Grace, advanced user");
        assert_eq!(info.name.as_deref(), Some(DEFAULT_CANDIDATE_NAME));
        assert_eq!(info.experience_level, ExperienceLevel::Advanced);

        let anonymous = CandidateInfo::from_opening_message("intermediate, I use VLOOKUP");
        assert_eq!(anonymous.name, None);
        assert_eq!(anonymous.display_name(), DEFAULT_CANDIDATE_NAME);
    }
}
