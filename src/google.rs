//! Google Gemini chat client

use crate::error::{Error, Result};
use crate::provider::{with_retries, ChatModel, GenerationParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const JSON_MIME_TYPE: &str = "application/json";

/// Blocking client for the Gemini `generateContent` endpoint.
pub struct GoogleClient {
    base_url: String,
    api_key: String,
    params: GenerationParams,
    http: reqwest::blocking::Client,
}

impl GoogleClient {
    /// Creates a client bound to the given key and fixed parameters.
    #[must_use]
    pub fn new(api_key: impl Into<String>, params: GenerationParams) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(params.timeout)
            .build()
            .expect("valid reqwest client config");
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
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

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.params.model
        )
    }

    fn generate(&self, request: &GenerateContentRequest<'_>) -> Result<String> {
        let url = self.generate_url();
        with_retries(self.params.max_retries, || self.send_once(&url, request))
    }

    fn send_once(&self, url: &str, request: &GenerateContentRequest<'_>) -> Result<String> {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}: {body}"));
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                Error::provider_transient(message)
            } else {
                Error::provider(message)
            });
        }

        let response: GenerateContentResponse = response
            .json()
            .map_err(|e| Error::provider(format!("malformed Gemini response: {e}")))?;

        let candidate = response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or_else(|| Error::provider("no candidates in Gemini response"))?;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(Error::provider(format!("empty Gemini reply: {reason}")));
        }

        Ok(text)
    }
}

impl ChatModel for GoogleClient {
    fn generate_structured(&self, system: &str, user: &str, schema: &Value) -> Result<Value> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: user }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part { text: system }],
            }),
            generation_config: GenerationConfig {
                temperature: self.params.temperature,
                max_output_tokens: self.params.max_tokens,
                response_mime_type: Some(JSON_MIME_TYPE),
                response_schema: Some(schema),
            },
        };

        let text = self.generate(&request)?;
        serde_json::from_str(&text).map_err(|e| Error::decode(e.to_string()))
    }

    fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: None,
            generation_config: GenerationConfig {
                temperature: self.params.temperature,
                max_output_tokens: self.params.max_tokens,
                response_mime_type: None,
                response_schema: None,
            },
        };

        self.generate(&request)
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
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}
