use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::AnalyzerConfig;

const ANALYSIS_PROMPT: &str = "What dish is shown in the photo? Give an approximate calorie count for the \
dish and its protein, fat and carbohydrate content in grams.";

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Empty response")]
    EmptyResponse,
}

/// Vision and text inference: image in, human readable nutrition estimate out.
#[async_trait]
pub trait Analyzer: Send + Sync + 'static {
    async fn analyze(&self, image: &[u8]) -> Result<String, AnalyzerError>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat completions client for OpenAI compatible endpoints.
#[derive(Clone)]
pub struct OpenAiAnalyzer {
    client: Client,
    config: AnalyzerConfig,
}

impl OpenAiAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    fn build_request(&self, image: &[u8]) -> Value {
        let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(image));
        json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {"type": "text", "text": ANALYSIS_PROMPT},
                        {"type": "image_url", "image_url": {"url": data_url}}
                    ]
                }
            ],
            "max_tokens": self.config.max_tokens
        })
    }
}

fn parse_completion(body: &str) -> Result<String, AnalyzerError> {
    let completion: ChatCompletion =
        serde_json::from_str(body).map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(AnalyzerError::EmptyResponse)
}

#[async_trait]
impl Analyzer for OpenAiAnalyzer {
    async fn analyze(&self, image: &[u8]) -> Result<String, AnalyzerError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.build_request(image))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalyzerError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let answer = parse_completion(&body)?;
        debug!("Analysis finished ({} chars)", answer.len());
        Ok(answer)
    }
}
