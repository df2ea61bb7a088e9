use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, GenerationProvider, ProviderError};
use crate::config;

/// OpenAI HTTP client backing both the embedding and generation capabilities.
///
/// Every request carries the client-level timeout; a timeout surfaces as
/// `ProviderError::Timeout` so callers can treat it like any other provider
/// failure and take the fallback path.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    embedding_model: String,
    generation_model: String,
    embedding_dim: usize,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
            embedding_model: config::DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: config::DEFAULT_GENERATION_MODEL.to_string(),
            embedding_dim: config::EMBEDDING_DIM,
        }
    }

    /// Default hosted endpoint with a 60-second request timeout.
    pub fn hosted(api_key: &str) -> Self {
        Self::new("https://api.openai.com/v1", api_key, 60)
    }

    pub fn with_models(mut self, embedding_model: &str, generation_model: &str) -> Self {
        self.embedding_model = embedding_model.to_string();
        self.generation_model = generation_model.to_string();
        self
    }

    fn map_request_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_connect() {
            ProviderError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else {
            ProviderError::HttpClient(e.to_string())
        }
    }

    fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}

// ── Wire types ──────────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl EmbeddingProvider for OpenAiClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| ProviderError::MalformedResponse("Empty embedding data".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let body = EmbeddingsRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let response: EmbeddingsResponse = self.post_json("/embeddings", &body)?;

        if response.data.len() != texts.len() {
            return Err(ProviderError::MalformedResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.embedding_dim
    }
}

impl GenerationProvider for OpenAiClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.generation_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response: ChatResponse = self.post_json("/chat/completions", &body)?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))
    }
}
