use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use threadlens_core::{CoreError, LlmError};
use tracing::{debug, error, info};

pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant that analyzes Reddit threads.";

const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Gemini models respond better with slightly lower temperature.
const GEMINI_TEMPERATURE_CAP: f32 = 0.6;

/// One prompt in, raw completion text out. The seam the orchestrator tests
/// mock.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CoreError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completion client for the OpenRouter endpoint.
///
/// No retries and no request timeout: a hung completion hangs the run, which
/// is a known latent risk carried over deliberately.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http_client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        Self {
            http_client: Client::new(),
            api_key,
            api_base,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str) -> ChatRequest {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_INSTRUCTION.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ];

        let mut temperature = DEFAULT_TEMPERATURE;
        let mut response_format = None;
        if self.model.to_lowercase().contains("gemini") {
            temperature = temperature.min(GEMINI_TEMPERATURE_CAP);
            // Ask for a structured reply when the prompt calls for JSON.
            if messages.iter().any(|m| m.content.contains("JSON")) {
                response_format = Some(ResponseFormat {
                    format_type: "json_object".to_string(),
                });
            }
        }

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature,
            response_format,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterClient {
    async fn complete(&self, prompt: &str) -> Result<String, CoreError> {
        let request = self.build_request(prompt);
        let url = format!("{}/chat/completions", self.api_base);

        info!("Making completion request using model: {}", self.model);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                CoreError::Network(e)
            })?;

        let body: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion response: {}", e);
            CoreError::Llm(LlmError::InvalidResponseFormat {
                provider: "OpenRouter".to_string(),
                details: e.to_string(),
            })
        })?;

        let content = extract_content(body)?;
        debug!("Completion returned {} characters", content.len());
        Ok(content)
    }
}

/// Maps the wire response to the first choice's text, or to the provider's
/// error message.
fn extract_content(response: ChatResponse) -> Result<String, CoreError> {
    if let Some(error) = response.error {
        return Err(CoreError::Llm(LlmError::Api {
            message: error.message,
        }));
    }

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| {
            CoreError::Llm(LlmError::EmptyCompletion {
                provider: "OpenRouter".to_string(),
            })
        })
}
