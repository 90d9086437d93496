use crate::{
    analyze_thread, render_report, AnalysisOutcome, Orchestrator, RunPhase, ThemeView,
};
use async_trait::async_trait;
use chrono::Utc;
use llm_interface::CompletionProvider;
use reddit_client::{RedditApiClient, RedditOAuthConfig, RedditSession, RedditToken, TokenStore};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use threadlens_core::{
    AnalysisBundle, Comment, CoreError, LlmError, Parsed, RedditApiError, SummaryLength, Thread,
    ThemeCategories,
};
use tokio::sync::Mutex;

const SUMMARY_REPLY: &str = "The discussion centers on pricing.";
const RELEVANCE_REPLY: &str = r#"[
    {"author":"alice","relevance_score":4,"usefulness_score":6,
     "key_points":["cites docs"],"provides_actionable_advice":true},
    {"author":"bob","relevance_score":9,"usefulness_score":3,
     "key_points":[],"provides_actionable_advice":false}
]"#;
const THEME_REPLY: &str = r#"{"major_themes":["pricing"],"consensus_viewpoints":[],
    "significant_disagreements":[],"response_patterns":[]}"#;

/// Canned provider: routes on the prompt shape the builders produce.
struct MockProvider {
    fail_themes: bool,
    unparseable_batches: Vec<&'static str>,
}

impl MockProvider {
    fn new() -> Self {
        Self {
            fail_themes: false,
            unparseable_batches: Vec::new(),
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CoreError> {
        if prompt.contains("SUMMARY:") {
            return Ok(SUMMARY_REPLY.to_string());
        }
        if prompt.contains("JSON array") {
            if self
                .unparseable_batches
                .iter()
                .any(|marker| prompt.contains(marker))
            {
                return Ok("I cannot rate these comments.".to_string());
            }
            return Ok(RELEVANCE_REPLY.to_string());
        }
        if self.fail_themes {
            return Err(CoreError::Llm(LlmError::Api {
                message: "rate limited".to_string(),
            }));
        }
        Ok(THEME_REPLY.to_string())
    }
}

fn comment(author: &str, body: &str, depth: u32) -> Comment {
    Comment {
        id: format!("{author}_{depth}"),
        author: author.to_string(),
        body_text: body.to_string(),
        score: 5,
        created_at: Utc::now(),
        depth,
    }
}

fn test_thread(comments: Vec<Comment>) -> Thread {
    Thread {
        title: "A question".to_string(),
        author: "op_user".to_string(),
        body_text: "What do you think?".to_string(),
        score: 12,
        url: "https://www.reddit.com/r/test/comments/abc123/a_question/".to_string(),
        created_at: Utc::now(),
        comments,
    }
}

fn test_session(authenticated: bool) -> Arc<Mutex<RedditSession>> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    let store = TokenStore::new(&path);
    if authenticated {
        store
            .save(&RedditToken {
                access_token: "valid".to_string(),
                refresh_token: None,
                expires_at: SystemTime::now() + Duration::from_secs(3600),
                scope: vec!["read".to_string()],
            })
            .unwrap();
    }
    let config = RedditOAuthConfig::new(
        "test_client_id".to_string(),
        "test_client_secret".to_string(),
        "http://localhost:3000/auth/callback".to_string(),
        "threadlens/0.1 by test_user".to_string(),
    );
    Arc::new(Mutex::new(
        RedditSession::new(&config, TokenStore::new(&path)).unwrap(),
    ))
}

fn test_orchestrator(
    authenticated: bool,
    provider: MockProvider,
) -> Orchestrator<MockProvider> {
    Orchestrator::new(
        test_session(authenticated),
        RedditApiClient::new("threadlens/0.1 test".to_string()).unwrap(),
        provider,
        SummaryLength::Medium,
    )
}

#[tokio::test]
async fn test_analyze_thread_produces_full_bundle() {
    let thread = test_thread(vec![comment("alice", "Great point", 0)]);
    let bundle = analyze_thread(&MockProvider::new(), thread, SummaryLength::Medium)
        .await
        .unwrap();

    assert_eq!(bundle.summary, SUMMARY_REPLY);
    assert_eq!(bundle.comment_analyses.len(), 2);
    match &bundle.themes {
        Parsed::Structured(themes) => assert_eq!(themes.major_themes, vec!["pricing"]),
        Parsed::Unstructured(_) => panic!("Expected structured themes"),
    }
}

#[tokio::test]
async fn test_zero_comments_issue_zero_relevance_batches() {
    let thread = test_thread(vec![]);
    let bundle = analyze_thread(&MockProvider::new(), thread, SummaryLength::Medium)
        .await
        .unwrap();
    assert!(bundle.comment_analyses.is_empty());
}

#[tokio::test]
async fn test_theme_failure_discards_partial_results() {
    let provider = MockProvider {
        fail_themes: true,
        ..MockProvider::new()
    };
    let thread = test_thread(vec![comment("alice", "Great point", 0)]);

    let result = analyze_thread(&provider, thread, SummaryLength::Medium).await;
    match result {
        Err(CoreError::Llm(LlmError::Api { message })) => assert_eq!(message, "rate limited"),
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_batch_is_dropped_not_fatal() {
    // 10 top-level comments -> two batches; the second one (containing c7)
    // replies with prose and is dropped.
    let comments = (0..10)
        .map(|i| comment(&format!("c{i}"), "body", 0))
        .collect();
    let provider = MockProvider {
        unparseable_batches: vec!["u/c7"],
        ..MockProvider::new()
    };

    let bundle = analyze_thread(&provider, test_thread(comments), SummaryLength::Medium)
        .await
        .unwrap();
    // Only the first batch's two canned analyses survive.
    assert_eq!(bundle.comment_analyses.len(), 2);
    assert_eq!(bundle.summary, SUMMARY_REPLY);
}

#[tokio::test]
async fn test_unstructured_theme_reply_is_preserved_as_raw_text() {
    let bundle = AnalysisBundle {
        thread: test_thread(vec![]),
        summary: "s".to_string(),
        comment_analyses: vec![],
        themes: Parsed::Unstructured("I cannot provide structured output".to_string()),
    };

    let view = render_report(&bundle);
    match view.themes {
        ThemeView::Raw(text) => assert_eq!(text, "I cannot provide structured output"),
        ThemeView::Categories(_) => panic!("Expected raw theme fallback"),
    }
}

#[tokio::test]
async fn test_run_without_token_suspends_on_redirect() {
    let orchestrator = test_orchestrator(false, MockProvider::new());

    let outcome = orchestrator
        .run("https://www.reddit.com/r/test/comments/abc123/title/", 25)
        .await
        .unwrap();
    match outcome {
        AnalysisOutcome::AuthorizationRequired { authorize_url } => {
            assert!(authorize_url.starts_with("https://www.reddit.com/api/v1/authorize"));
        }
        AnalysisOutcome::Complete { .. } => panic!("Expected redirect suspension"),
    }
    assert_eq!(orchestrator.phase(), RunPhase::Idle);
}

#[tokio::test]
async fn test_invalid_url_moves_run_to_error_phase() {
    let orchestrator = test_orchestrator(true, MockProvider::new());

    let result = orchestrator.run("https://www.reddit.com/r/test/", 25).await;
    assert!(matches!(
        result,
        Err(CoreError::RedditApi(RedditApiError::InvalidUrl { .. }))
    ));
    match orchestrator.phase() {
        RunPhase::Error(message) => assert!(message.contains("Reddit thread URL")),
        other => panic!("Expected Error phase, got {other:?}"),
    }
}

#[test]
fn test_render_ranks_by_relevance_and_degrades_missing_scores() {
    let bundle = AnalysisBundle {
        thread: test_thread(vec![]),
        summary: " padded summary ".to_string(),
        comment_analyses: vec![
            serde_json::from_str(r#"{"author":"low","relevance_score":2}"#).unwrap(),
            serde_json::from_str(r#"{"author":"unscored"}"#).unwrap(),
            serde_json::from_str(r#"{"author":"high","relevance_score":9,"usefulness_score":8}"#)
                .unwrap(),
        ],
        themes: Parsed::Structured(ThemeCategories::default()),
    };

    let view = render_report(&bundle);
    assert_eq!(view.summary, "padded summary");

    let authors: Vec<&str> = view.analyses.iter().map(|a| a.author.as_str()).collect();
    assert_eq!(authors, vec!["high", "low", "unscored"]);
    assert_eq!(view.analyses[0].relevance, "9/10");
    assert_eq!(view.analyses[0].usefulness, "8/10");
    assert_eq!(view.analyses[2].relevance, "N/A");
    assert_eq!(view.analyses[2].usefulness, "N/A");
}

#[test]
fn test_render_is_idempotent() {
    let bundle = AnalysisBundle {
        thread: test_thread(vec![comment("alice", "Great point", 0)]),
        summary: "A summary.".to_string(),
        comment_analyses: vec![serde_json::from_str(
            r#"{"author":"alice","relevance_score":7,"usefulness_score":7,
                "key_points":["one"],"provides_actionable_advice":false}"#,
        )
        .unwrap()],
        themes: Parsed::Structured(ThemeCategories {
            major_themes: vec!["pricing".to_string()],
            ..ThemeCategories::default()
        }),
    };

    assert_eq!(render_report(&bundle), render_report(&bundle));
}

#[test]
fn test_theme_categories_render_in_fixed_order() {
    let bundle = AnalysisBundle {
        thread: test_thread(vec![]),
        summary: String::new(),
        comment_analyses: vec![],
        themes: Parsed::Structured(ThemeCategories::default()),
    };

    match render_report(&bundle).themes {
        ThemeView::Categories(sections) => {
            let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
            assert_eq!(
                headings,
                vec![
                    "Major themes",
                    "Consensus viewpoints",
                    "Significant disagreements",
                    "Response patterns"
                ]
            );
        }
        ThemeView::Raw(_) => panic!("Expected categories"),
    }
}
