use threadlens_core::{AnalysisBundle, CommentAnalysis, Parsed};

/// Display structures consumed by the presentation layer. Everything is
/// pre-formatted here so templates stay dumb.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub thread: ThreadInfo,
    pub summary: String,
    pub analyses: Vec<AnalysisCard>,
    pub themes: ThemeView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadInfo {
    pub title: String,
    pub author: String,
    pub body_text: String,
    pub score: i64,
    pub url: String,
    pub created_at: String,
    pub comment_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisCard {
    pub author: String,
    pub relevance: String,
    pub usefulness: String,
    pub key_points: Vec<String>,
    pub provides_actionable_advice: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThemeView {
    Categories(Vec<ThemeSection>),
    /// The model declined to produce JSON; shown as free text, not as four
    /// empty categories.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSection {
    pub heading: String,
    pub entries: Vec<String>,
}

/// Pure formatting of a result bundle into display structures. Cannot fail:
/// malformed sub-results degrade (missing scores become "N/A"). Rendering
/// the same bundle twice yields identical views.
pub fn render_report(bundle: &AnalysisBundle) -> ReportView {
    let mut ranked: Vec<&CommentAnalysis> = bundle.comment_analyses.iter().collect();
    // Stable sort: ranked by relevance, ties keep model output order.
    // An absent score ranks below every scored entry.
    ranked.sort_by_key(|a| std::cmp::Reverse(a.relevance_score.unwrap_or(0)));
    let analyses: Vec<AnalysisCard> = ranked.into_iter().map(analysis_card).collect();

    ReportView {
        thread: ThreadInfo {
            title: bundle.thread.title.clone(),
            author: bundle.thread.author.clone(),
            body_text: bundle.thread.body_text.clone(),
            score: bundle.thread.score,
            url: bundle.thread.url.clone(),
            created_at: bundle
                .thread
                .created_at
                .format("%Y-%m-%d %H:%M UTC")
                .to_string(),
            comment_count: bundle.thread.comments.len(),
        },
        summary: bundle.summary.trim().to_string(),
        analyses,
        themes: theme_view(bundle),
    }
}

fn analysis_card(analysis: &CommentAnalysis) -> AnalysisCard {
    AnalysisCard {
        author: analysis.author.clone(),
        relevance: format_score(analysis.relevance_score),
        usefulness: format_score(analysis.usefulness_score),
        key_points: analysis.key_points.clone(),
        provides_actionable_advice: analysis.provides_actionable_advice,
    }
}

fn theme_view(bundle: &AnalysisBundle) -> ThemeView {
    match &bundle.themes {
        Parsed::Structured(themes) => ThemeView::Categories(vec![
            section("Major themes", &themes.major_themes),
            section("Consensus viewpoints", &themes.consensus_viewpoints),
            section("Significant disagreements", &themes.significant_disagreements),
            section("Response patterns", &themes.response_patterns),
        ]),
        Parsed::Unstructured(raw) => ThemeView::Raw(raw.clone()),
    }
}

fn section(heading: &str, entries: &[String]) -> ThemeSection {
    ThemeSection {
        heading: heading.to_string(),
        entries: entries.to_vec(),
    }
}

fn format_score(score: Option<u8>) -> String {
    match score {
        Some(value) => format!("{value}/10"),
        None => "N/A".to_string(),
    }
}
