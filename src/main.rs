mod routes;

use analyzer::Orchestrator;
use anyhow::Context;
use llm_interface::OpenRouterClient;
use reddit_client::{RedditApiClient, RedditOAuthConfig, RedditSession, TokenStore};
use std::sync::Arc;
use threadlens_core::AppConfig;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "threadlens=debug,analyzer=debug,reddit_client=debug,llm_interface=debug".into()
            }),
        )
        .init();

    tracing::info!("Starting Threadlens - Reddit Thread Analyzer");

    let config = AppConfig::from_env().context("failed to load configuration")?;

    let oauth_config = RedditOAuthConfig::new(
        config.reddit_client_id.clone(),
        config.reddit_client_secret.clone(),
        config.reddit_redirect_uri.clone(),
        config.reddit_user_agent.clone(),
    );
    let token_store = TokenStore::new(config.token_path.clone());
    let session = RedditSession::new(&oauth_config, token_store)
        .context("failed to initialize Reddit session")?;

    let reddit_api = RedditApiClient::new(config.reddit_user_agent.clone())
        .context("failed to build Reddit API client")?;
    let provider = OpenRouterClient::new(
        config.openrouter_api_key.clone(),
        config.openrouter_api_base.clone(),
        config.model.clone(),
    );

    let orchestrator = Orchestrator::new(
        Arc::new(Mutex::new(session)),
        reddit_api,
        provider,
        config.summary_length,
    );

    let bind_address = config.bind_address;
    let app = routes::router(routes::AppState::new(orchestrator, config));

    tracing::info!("Listening on http://{}", bind_address);
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .context("failed to bind listen address")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
