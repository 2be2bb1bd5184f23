//! OpenAI chat-completions client

use crate::error::{Error, Result};
use crate::provider::{with_retries, ChatModel, GenerationParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const SCHEMA_NAME: &str = "structured_output";

/// Blocking client for the `/v1/chat/completions` endpoint.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    params: GenerationParams,
    http: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Creates a client bound to the given key and fixed parameters.
    #[must_use]
    pub fn new(api_key: impl Into<String>, params: GenerationParams) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(params.timeout)
            .build()
            .expect("valid reqwest client config");
        Self {
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: api_key.into(),
            params,
            http,
        }
    }

    /// Overrides the API base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }

    fn complete(&self, request: &ChatCompletionRequest<'_>) -> Result<String> {
        let url = self.completions_url();
        with_retries(self.params.max_retries, || self.send_once(&url, request))
    }

    fn send_once(&self, url: &str, request: &ChatCompletionRequest<'_>) -> Result<String> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<OpenAiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}: {body}"));
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                Error::provider_transient(message)
            } else {
                Error::provider(message)
            });
        }

        let response: ChatCompletionResponse = response
            .json()
            .map_err(|e| Error::provider(format!("malformed OpenAI response: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::provider("no content in OpenAI response"))
    }
}

impl ChatModel for OpenAiClient {
    fn generate_structured(&self, system: &str, user: &str, schema: &Value) -> Result<Value> {
        let request = ChatCompletionRequest {
            model: &self.params.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            response_format: Some(ResponseFormat {
                format_type: "json_schema",
                json_schema: Some(JsonSchemaFormat {
                    name: SCHEMA_NAME,
                    schema,
                }),
            }),
        };

        let content = self.complete(&request)?;
        serde_json::from_str(&content).map_err(|e| Error::decode(e.to_string()))
    }

    fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.params.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            response_format: None,
        };

        self.complete(&request)
    }
}

fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_connect() || err.is_timeout() {
        Error::provider_transient(err.to_string())
    } else {
        Error::provider(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    json_schema: Option<JsonSchemaFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}
