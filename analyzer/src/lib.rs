pub mod render;

pub use render::{render_report, AnalysisCard, ReportView, ThemeSection, ThemeView, ThreadInfo};

use llm_interface::{
    parse_comment_analyses, parse_theme_report, relevance_prompts, summary_prompt, theme_prompt,
    CompletionProvider,
};
use reddit_client::{RedditApiClient, RedditSession};
use std::sync::{Arc, RwLock};
use threadlens_core::{
    AnalysisBundle, CommentAnalysis, CoreError, ErrorExt, Parsed, RedditApiError, SummaryLength,
    Thread,
};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// One analysis run walks Idle → Authenticating → Fetching → Analyzing →
/// Rendering → Idle; `Error` absorbs from any non-terminal phase and holds
/// the message for the UI error region until the next user action.
#[derive(Debug, Clone, PartialEq)]
pub enum RunPhase {
    Idle,
    Authenticating,
    Fetching,
    Analyzing,
    Rendering,
    Error(String),
}

#[derive(Debug)]
pub enum AnalysisOutcome {
    /// All three analyses finished; the rendered view is ready to display.
    Complete {
        bundle: AnalysisBundle,
        view: ReportView,
    },
    /// The run is suspended on the OAuth redirect; send the browser here and
    /// resume on the callback.
    AuthorizationRequired { authorize_url: String },
}

/// Sequences fetch → three concurrent analyses → render, and owns the
/// user-visible run state. One logical run at a time; callers serialize on
/// the shared session.
pub struct Orchestrator<P> {
    session: Arc<Mutex<RedditSession>>,
    reddit_api: RedditApiClient,
    provider: P,
    summary_length: SummaryLength,
    phase: RwLock<RunPhase>,
}

impl<P: CompletionProvider> Orchestrator<P> {
    pub fn new(
        session: Arc<Mutex<RedditSession>>,
        reddit_api: RedditApiClient,
        provider: P,
        summary_length: SummaryLength,
    ) -> Self {
        Self {
            session,
            reddit_api,
            provider,
            summary_length,
            phase: RwLock::new(RunPhase::Idle),
        }
    }

    pub fn session(&self) -> Arc<Mutex<RedditSession>> {
        Arc::clone(&self.session)
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
            .read()
            .map(|phase| phase.clone())
            .unwrap_or(RunPhase::Idle)
    }

    fn set_phase(&self, phase: RunPhase) {
        if let Ok(mut current) = self.phase.write() {
            *current = phase;
        }
    }

    /// Runs one analysis end to end. Errors are terminal for the run: no
    /// retry, no partial results.
    pub async fn run(
        &self,
        thread_url: &str,
        comment_limit: u32,
    ) -> Result<AnalysisOutcome, CoreError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, thread_url, comment_limit, "Starting analysis run");

        self.set_phase(RunPhase::Authenticating);
        let access_token = {
            let mut session = self.session.lock().await;
            if session.is_authenticated() {
                session.access_token()?.to_string()
            } else {
                let authorize_url = session.begin_authorization();
                info!(%run_id, "No valid token, suspending run on OAuth redirect");
                self.set_phase(RunPhase::Idle);
                return Ok(AnalysisOutcome::AuthorizationRequired { authorize_url });
            }
        };

        self.set_phase(RunPhase::Fetching);
        let thread = match self
            .reddit_api
            .fetch_thread(&access_token, thread_url, comment_limit)
            .await
        {
            Ok(thread) => thread,
            Err(e) => {
                if matches!(
                    e,
                    CoreError::RedditApi(
                        RedditApiError::InvalidToken
                            | RedditApiError::AuthenticationFailed { .. }
                    )
                ) {
                    // Next analyze action restarts the redirect flow.
                    self.session.lock().await.invalidate();
                }
                return Err(self.fail(run_id, e));
            }
        };

        self.set_phase(RunPhase::Analyzing);
        let bundle = match analyze_thread(&self.provider, thread, self.summary_length).await {
            Ok(bundle) => bundle,
            Err(e) => return Err(self.fail(run_id, e)),
        };

        self.set_phase(RunPhase::Rendering);
        let view = render_report(&bundle);

        self.set_phase(RunPhase::Idle);
        info!(%run_id, "Analysis run completed");
        Ok(AnalysisOutcome::Complete { bundle, view })
    }

    fn fail(&self, run_id: Uuid, error: CoreError) -> CoreError {
        error.log_error();
        warn!(%run_id, code = %error.error_code(), "Analysis run failed");
        self.set_phase(RunPhase::Error(error.user_friendly_message()));
        error
    }
}

/// The Analyzing stage: fans out summary, batched relevance analysis, and
/// theme extraction concurrently and joins on all three. Any failure of the
/// three top-level operations fails the stage; partial successes are
/// discarded.
pub async fn analyze_thread<P: CompletionProvider>(
    provider: &P,
    thread: Thread,
    summary_length: SummaryLength,
) -> Result<AnalysisBundle, CoreError> {
    let summary_text = summary_prompt(&thread, summary_length);
    let summary_fut = provider.complete(&summary_text);
    let relevance_fut = analyze_relevance(provider, &thread);
    let themes_fut = async {
        let raw = provider.complete(&theme_prompt(&thread)).await?;
        Ok(parse_theme_report(&raw))
    };

    let (summary, comment_analyses, themes) =
        tokio::try_join!(summary_fut, relevance_fut, themes_fut)?;

    Ok(AnalysisBundle {
        thread,
        summary,
        comment_analyses,
        themes,
    })
}

/// Runs every relevance batch. A transport or provider error on any batch
/// fails the whole operation; a batch whose reply cannot be parsed as JSON
/// only drops that batch's contributions.
async fn analyze_relevance<P: CompletionProvider>(
    provider: &P,
    thread: &Thread,
) -> Result<Vec<CommentAnalysis>, CoreError> {
    let prompts = relevance_prompts(thread);
    info!("Issuing {} relevance batch(es)", prompts.len());

    let mut analyses = Vec::new();
    for (batch_index, prompt) in prompts.iter().enumerate() {
        let raw = provider.complete(prompt).await?;
        match parse_comment_analyses(&raw) {
            Parsed::Structured(batch) => analyses.extend(batch),
            Parsed::Unstructured(_) => {
                warn!(batch_index, "Dropping relevance batch with unparseable reply");
            }
        }
    }
    Ok(analyses)
}

#[cfg(test)]
mod tests;
