use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Reddit submission plus its flattened comment tree. Immutable once fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub title: String,
    pub author: String,
    pub body_text: String,
    pub score: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<Comment>,
}

/// One comment from the flattening walk. `depth` records the nesting level
/// (top-level replies are 0); no parent pointer is retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body_text: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub depth: u32,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }
}

/// Per-comment output of the relevance analysis. Scores are optional because
/// the model is not obligated to produce them; render as "N/A" when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAnalysis {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub relevance_score: Option<u8>,
    #[serde(default)]
    pub usefulness_score: Option<u8>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub provides_actionable_advice: bool,
}

/// Structured half of the theme report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThemeCategories {
    #[serde(default)]
    pub major_themes: Vec<String>,
    #[serde(default)]
    pub consensus_viewpoints: Vec<String>,
    #[serde(default)]
    pub significant_disagreements: Vec<String>,
    #[serde(default)]
    pub response_patterns: Vec<String>,
}

/// Best-effort parse result of free-form model text. Both branches must be
/// handled explicitly by callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Structured(T),
    Unstructured(String),
}

impl<T> Parsed<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, Parsed::Structured(_))
    }
}

pub type ThemeReport = Parsed<ThemeCategories>;

/// Final output contract of one analysis run, consumed by the presentation
/// layer. Discarded at the end of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisBundle {
    pub thread: Thread,
    pub summary: String,
    pub comment_analyses: Vec<CommentAnalysis>,
    pub themes: ThemeReport,
}

/// Requested summary length, mapped to a wording directive by the prompt
/// builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl std::str::FromStr for SummaryLength {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(SummaryLength::Short),
            "medium" => Ok(SummaryLength::Medium),
            "long" => Ok(SummaryLength::Long),
            _ => Err(crate::ConfigError::InvalidValue {
                field: "SUMMARY_LENGTH".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_length_parsing() {
        assert_eq!("short".parse::<SummaryLength>().unwrap(), SummaryLength::Short);
        assert_eq!("Medium".parse::<SummaryLength>().unwrap(), SummaryLength::Medium);
        assert_eq!("LONG".parse::<SummaryLength>().unwrap(), SummaryLength::Long);
        assert!("comprehensive".parse::<SummaryLength>().is_err());
    }

    #[test]
    fn test_comment_analysis_tolerates_missing_fields() {
        let analysis: CommentAnalysis = serde_json::from_str(r#"{"author":"alice"}"#).unwrap();
        assert_eq!(analysis.author, "alice");
        assert_eq!(analysis.relevance_score, None);
        assert_eq!(analysis.usefulness_score, None);
        assert!(analysis.key_points.is_empty());
        assert!(!analysis.provides_actionable_advice);
    }
}
