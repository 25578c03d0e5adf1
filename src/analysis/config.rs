use serde::{Deserialize, Serialize};

/// A forbidden application or site, matched as a lowercase substring of the
/// active window name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForbiddenPattern {
    /// Label recorded on the violation.
    pub name: String,
    pub pattern: String,
}

impl ForbiddenPattern {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_lowercase(),
        }
    }
}

/// Rules the violation analyzer applies to each OCR item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Substring the interview tab's window name always contains.
    pub expected_title: String,
    pub forbidden_patterns: Vec<ForbiddenPattern>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            expected_title: "connecting talent with opportunities".into(),
            forbidden_patterns: vec![
                ForbiddenPattern::new("google", "google"),
                ForbiddenPattern::new("chatgpt", "chatgpt"),
                ForbiddenPattern::new("stackoverflow", "stackoverflow"),
                ForbiddenPattern::new("github", "github"),
                ForbiddenPattern::new("wikipedia", "wikipedia"),
            ],
        }
    }
}
