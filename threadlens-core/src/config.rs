use crate::{ConfigError, SummaryLength};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-pro-preview";

/// Bounds of the user-facing comment-limit input.
pub const MIN_COMMENT_LIMIT: u32 = 1;
pub const MAX_COMMENT_LIMIT: u32 = 50;

/// All recognized configuration, loaded from the environment at startup.
///
/// `sentiment_analysis` and `keyword_extraction` are recognized options that
/// no current behavior consumes.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openrouter_api_key: String,
    pub openrouter_api_base: String,
    pub model: String,
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_redirect_uri: String,
    pub reddit_user_agent: String,
    pub comment_limit: u32,
    pub summary_length: SummaryLength,
    pub sentiment_analysis: bool,
    pub keyword_extraction: bool,
    pub token_path: PathBuf,
    pub bind_address: SocketAddr,
}

impl AppConfig {
    /// Loads configuration from environment variables, reading a local `.env`
    /// file first when present. Skipped under test to keep tests hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let openrouter_api_key = require_var("OPENROUTER_API_KEY")?;
        let openrouter_api_base = std::env::var("OPENROUTER_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENROUTER_API_BASE.to_string());
        let model =
            std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let reddit_client_id = require_var("REDDIT_CLIENT_ID")?;
        let reddit_client_secret = require_var("REDDIT_CLIENT_SECRET")?;
        let reddit_redirect_uri = std::env::var("REDDIT_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:3000/auth/callback".to_string());
        let reddit_user_agent = std::env::var("REDDIT_USER_AGENT")
            .unwrap_or_else(|_| "threadlens/0.1 (thread analyzer)".to_string());

        let comment_limit = parse_var("COMMENT_LIMIT", 25u32)?;
        let comment_limit = clamp_comment_limit(comment_limit);

        let summary_length = match std::env::var("SUMMARY_LENGTH") {
            Ok(value) => value.parse::<SummaryLength>()?,
            Err(_) => SummaryLength::default(),
        };

        let sentiment_analysis = parse_var("SENTIMENT_ANALYSIS", false)?;
        let keyword_extraction = parse_var("KEYWORD_EXTRACTION", false)?;

        let token_path = std::env::var("TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("threadlens_token.json"));

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address =
            bind_address_str
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "BIND_ADDRESS".to_string(),
                    value: bind_address_str.clone(),
                })?;

        Ok(Self {
            openrouter_api_key,
            openrouter_api_base,
            model,
            reddit_client_id,
            reddit_client_secret,
            reddit_redirect_uri,
            reddit_user_agent,
            comment_limit,
            summary_length,
            sentiment_analysis,
            keyword_extraction,
            token_path,
            bind_address,
        })
    }
}

/// Clamps a requested comment limit into the accepted 1..=50 range.
pub fn clamp_comment_limit(limit: u32) -> u32 {
    limit.clamp(MIN_COMMENT_LIMIT, MAX_COMMENT_LIMIT)
}

fn require_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvironmentVariable {
        var_name: name.to_string(),
    })
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            field: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}
