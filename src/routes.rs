use analyzer::{AnalysisOutcome, Orchestrator, ReportView, ThemeView};
use askama::Template;
use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use llm_interface::OpenRouterClient;
use serde::Deserialize;
use std::sync::Arc;
use threadlens_core::{clamp_comment_limit, AppConfig, ErrorExt, MAX_COMMENT_LIMIT, MIN_COMMENT_LIMIT};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator<OpenRouterClient>>,
    redirect_uri: String,
    default_limit: u32,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator<OpenRouterClient>, config: AppConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            redirect_uri: config.reddit_redirect_uri,
            default_limit: config.comment_limit,
        }
    }

    async fn index_template(&self, error: Option<String>) -> IndexTemplate {
        let authenticated = self.orchestrator.session().lock().await.is_authenticated();
        IndexTemplate {
            error,
            authenticated,
            default_limit: self.default_limit,
            min_limit: MIN_COMMENT_LIMIT,
            max_limit: MAX_COMMENT_LIMIT,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(analyze))
        .route("/analyze", axum::routing::post(analyze))
        .route("/auth/callback", get(auth_callback))
        .with_state(state)
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    error: Option<String>,
    authenticated: bool,
    default_limit: u32,
    min_limit: u32,
    max_limit: u32,
}

#[derive(Template)]
#[template(path = "results.html")]
struct ResultsTemplate {
    view: ReportView,
}

#[derive(Deserialize)]
struct AnalyzeForm {
    reddit_url: String,
    comment_limit: Option<u32>,
}

async fn index(State(state): State<AppState>) -> IndexTemplate {
    state.index_template(None).await
}

async fn analyze(State(state): State<AppState>, Form(form): Form<AnalyzeForm>) -> Response {
    let thread_url = form.reddit_url.trim().to_string();
    if thread_url.is_empty() {
        return state
            .index_template(Some("Reddit URL is required.".to_string()))
            .await
            .into_response();
    }

    let limit = clamp_comment_limit(form.comment_limit.unwrap_or(state.default_limit));
    match state.orchestrator.run(&thread_url, limit).await {
        Ok(AnalysisOutcome::Complete { view, .. }) => ResultsTemplate { view }.into_response(),
        Ok(AnalysisOutcome::AuthorizationRequired { authorize_url }) => {
            info!("Redirecting browser to Reddit authorization");
            Redirect::to(&authorize_url).into_response()
        }
        Err(e) => state
            .index_template(Some(e.user_friendly_message()))
            .await
            .into_response(),
    }
}

async fn auth_callback(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let callback_url = format!("{}?{}", state.redirect_uri, query.unwrap_or_default());
    let session = state.orchestrator.session();
    let result = session.lock().await.complete_authorization(&callback_url).await;

    match result {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => state
            .index_template(Some(e.user_friendly_message()))
            .await
            .into_response(),
    }
}
