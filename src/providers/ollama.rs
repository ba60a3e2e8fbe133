use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::language_utils::get_language_name;

use super::{EmbeddingModel, SummarizationModel, TranslationService};

/// Ollama client backing translation, summarization and embeddings.
///
/// Every call is a single attempt bounded by the client timeout; retrying is
/// the stages' business.
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model used for translation prompts
    translation_model: String,
    /// Model used for summaries
    summary_model: String,
    /// Model used for embeddings
    embedding_model: String,
    /// Sampling temperature
    temperature: f32,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    /// Penalty applied to recently repeated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    /// How far back the repeat penalty looks
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_last_n: Option<i32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

/// Batch embeddings request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Model name
    model: String,
    /// Texts to embed
    input: Vec<String>,
}

/// Batch embeddings response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// One vector per input
    pub embeddings: Vec<Vec<f32>>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system message
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Cap the number of generated tokens
    pub fn num_predict(mut self, tokens: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(tokens);
        self
    }

    /// Penalize repeated phrases within the last `window` tokens
    pub fn repeat_penalty(mut self, penalty: f32, window: i32) -> Self {
        let options = self.options.get_or_insert_with(GenerationOptions::default);
        options.repeat_penalty = Some(penalty);
        options.repeat_last_n = Some(window);
        self
    }
}

impl Ollama {
    /// Create a client from an endpoint such as `http://localhost:11434` or `localhost:11434`
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        let base_url = normalize_endpoint(endpoint)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            // Ollama speaks HTTP/1.1
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            base_url,
            client,
            translation_model: "llama3.2:3b".to_string(),
            summary_model: "llama3.2:3b".to_string(),
            embedding_model: "all-minilm".to_string(),
            temperature: 0.2,
        })
    }

    /// Set the model names
    pub fn with_models(
        mut self,
        translation_model: impl Into<String>,
        summary_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        self.translation_model = translation_model.into();
        self.summary_model = summary_model.into();
        self.embedding_model = embedding_model.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a single generation
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, truncate(&response_text, 500));
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: response_text,
            });
        }

        parse_generation(&response_text)
    }
}

#[async_trait]
impl TranslationService for Ollama {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let system_prompt = translation_prompt(source_language, target_language);
        let request = GenerationRequest::new(&self.translation_model, text)
            .system(system_prompt)
            .temperature(self.temperature);

        let response = self.generate(request).await?;
        let translated = response.response.trim().to_string();
        if translated.is_empty() {
            return Err(ProviderError::EmptyResponse("translation".to_string()));
        }
        Ok(translated)
    }
}

#[async_trait]
impl SummarizationModel for Ollama {
    async fn summarize(
        &self,
        text: &str,
        min_tokens: u32,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let system_prompt = format!(
            "You are a news editor. Summarize the article the user sends in one paragraph of \
             roughly {} to {} tokens. Do not repeat phrases. End on a complete sentence. \
             Respond with the summary only.",
            min_tokens, max_tokens
        );
        let request = GenerationRequest::new(&self.summary_model, text)
            .system(system_prompt)
            .temperature(self.temperature)
            .num_predict(max_tokens)
            // Suppress trigram-scale loops
            .repeat_penalty(1.3, 3);

        let response = self.generate(request).await?;
        debug!(
            "Summary generated with {} token(s)",
            response.eval_count.unwrap_or_default()
        );
        Ok(response.response)
    }
}

#[async_trait]
impl EmbeddingModel for Ollama {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: self.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed = response
            .json::<EmbedResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(ProviderError::EmbeddingCountMismatch {
                expected: texts.len(),
                actual: parsed.embeddings.len(),
            });
        }
        Ok(parsed.embeddings)
    }
}

/// System prompt for a translation direction
fn translation_prompt(source_language: &str, target_language: &str) -> String {
    let source = get_language_name(source_language).unwrap_or_else(|_| source_language.to_string());
    let target = get_language_name(target_language).unwrap_or_else(|_| target_language.to_string());
    format!(
        "You are a professional translator. Translate the following text from {} to {}. \
         Preserve paragraph breaks, names and figures. \
         Only respond with the translated text, without any explanations or notes.",
        source, target
    )
}

/// Normalize an endpoint string into a base URL without a trailing slash
fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    if endpoint.trim().is_empty() {
        return Err(ProviderError::ConnectionError("Endpoint cannot be empty".to_string()));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)
    } else {
        Url::parse(&format!("http://{}", endpoint))
    }
    .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint {}: {}", endpoint, e)))?;

    if url.host_str().is_none() {
        return Err(ProviderError::ConnectionError(format!("Invalid host in endpoint: {}", endpoint)));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Parse a generate response, accepting both a single object and JSONL stream output
fn parse_generation(response_text: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(parsed) = serde_json::from_str::<GenerationResponse>(response_text) {
        return Ok(parsed);
    }

    // Streaming output: concatenate every `response` piece
    let mut full_response = String::new();
    let mut model = String::new();
    let mut eval_count = None;
    let mut seen = false;
    for line in response_text.lines().filter(|l| !l.trim().is_empty()) {
        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", e, truncate(response_text, 500))))?;
        if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
            full_response.push_str(part);
            seen = true;
        }
        if let Some(m) = value.get("model").and_then(|v| v.as_str()) {
            model = m.to_string();
        }
        if let Some(count) = value.get("eval_count").and_then(|v| v.as_u64()) {
            eval_count = Some(count);
        }
    }

    if !seen {
        return Err(ProviderError::ParseError(format!(
            "No response field in Ollama output: {}",
            truncate(response_text, 500)
        )));
    }

    Ok(GenerationResponse {
        model,
        response: full_response,
        done: true,
        eval_count,
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
