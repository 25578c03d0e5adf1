use chrono::{DateTime, Utc};

use crate::models::{OcrResult, Violation, TAB_NOT_ACTIVE};

use super::config::{AnalyzerConfig, ForbiddenPattern};

/// Maps one OCR snapshot to the violations it contains.
///
/// Stateless: every call looks at a single snapshot. Accumulating violations
/// across ticks is the session's job.
#[derive(Debug, Clone)]
pub struct ViolationAnalyzer {
    expected_title: String,
    patterns: Vec<ForbiddenPattern>,
}

impl ViolationAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            expected_title: config.expected_title.to_lowercase(),
            patterns: config
                .forbidden_patterns
                .iter()
                .filter(|p| !p.pattern.trim().is_empty())
                .map(|p| ForbiddenPattern {
                    name: p.name.clone(),
                    pattern: p.pattern.to_lowercase(),
                })
                .collect(),
        }
    }

    pub fn analyze(&self, result: &OcrResult, now: DateTime<Utc>) -> Vec<Violation> {
        let mut violations = Vec::new();

        for item in result.ocr_items() {
            // A missing window name cannot prove the interview tab is focused.
            let window_name = item
                .content
                .window_name
                .as_deref()
                .unwrap_or_default()
                .to_lowercase();

            if !window_name.contains(&self.expected_title) {
                violations.push(Violation::new(TAB_NOT_ACTIVE, now));
            }

            for pattern in &self.patterns {
                if window_name.contains(&pattern.pattern) {
                    violations.push(Violation::new(pattern.name.clone(), now));
                }
            }
        }

        violations
    }
}

impl Default for ViolationAnalyzer {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

pub fn is_suspicious(violations: &[Violation]) -> bool {
    !violations.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentBody, ContentItem};

    fn snapshot(windows: &[&str]) -> OcrResult {
        OcrResult {
            data: windows.iter().map(|w| ContentItem::ocr(w)).collect(),
        }
    }

    fn labels(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.label.as_str()).collect()
    }

    #[test]
    fn interview_tab_is_clean() {
        let analyzer = ViolationAnalyzer::default();
        let result = snapshot(&[
            "Shortlist - Connecting Talent With Opportunities",
            "connecting talent with opportunities | Mock interview",
        ]);

        let violations = analyzer.analyze(&result, Utc::now());
        assert!(violations.is_empty());
        assert!(!is_suspicious(&violations));
    }

    #[test]
    fn google_search_is_two_violations() {
        let analyzer = ViolationAnalyzer::default();
        let now = Utc::now();
        let violations = analyzer.analyze(&snapshot(&["Google Search"]), now);

        assert_eq!(labels(&violations), vec![TAB_NOT_ACTIVE, "google"]);
        assert!(violations.iter().all(|v| v.timestamp == now));
        assert!(is_suspicious(&violations));
    }

    #[test]
    fn chatgpt_flagged_even_with_expected_title() {
        let analyzer = ViolationAnalyzer::default();

        let inside = analyzer.analyze(
            &snapshot(&["ChatGPT - connecting talent with opportunities"]),
            Utc::now(),
        );
        assert_eq!(labels(&inside), vec!["chatgpt"]);

        let outside = analyzer.analyze(&snapshot(&["ChatGPT"]), Utc::now());
        assert_eq!(labels(&outside), vec![TAB_NOT_ACTIVE, "chatgpt"]);
    }

    #[test]
    fn one_item_can_match_several_patterns() {
        let analyzer = ViolationAnalyzer::default();
        let violations = analyzer.analyze(
            &snapshot(&["github search results - google chrome"]),
            Utc::now(),
        );
        assert_eq!(labels(&violations), vec![TAB_NOT_ACTIVE, "google", "github"]);
    }

    #[test]
    fn empty_and_non_ocr_content_yield_nothing() {
        let analyzer = ViolationAnalyzer::default();
        assert!(analyzer.analyze(&OcrResult::default(), Utc::now()).is_empty());

        let audio = OcrResult {
            data: vec![ContentItem {
                kind: "Audio".into(),
                content: ContentBody::default(),
            }],
        };
        assert!(analyzer.analyze(&audio, Utc::now()).is_empty());
    }

    #[test]
    fn missing_window_name_counts_as_tab_not_active() {
        let analyzer = ViolationAnalyzer::default();
        let result = OcrResult {
            data: vec![ContentItem {
                kind: "OCR".into(),
                content: ContentBody::default(),
            }],
        };
        assert_eq!(
            labels(&analyzer.analyze(&result, Utc::now())),
            vec![TAB_NOT_ACTIVE]
        );
    }

    #[test]
    fn custom_patterns_are_case_insensitive() {
        let config = AnalyzerConfig {
            expected_title: "Shortlist".into(),
            forbidden_patterns: vec![ForbiddenPattern {
                name: "copilot".into(),
                pattern: "CoPilot".into(),
            }],
        };
        let analyzer = ViolationAnalyzer::new(&config);
        let violations = analyzer.analyze(&snapshot(&["shortlist + copilot chat"]), Utc::now());
        assert_eq!(labels(&violations), vec!["copilot"]);
    }
}
