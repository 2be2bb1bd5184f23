use crate::error::{Error, Result};
use crate::google::GoogleClient;
use crate::openai::OpenAiClient;
use dialoguer::Password;
use serde_json::Value;
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Google Gemini
    Google,
    /// OpenAI chat completions
    OpenAi,
}

impl Provider {
    /// Parses a provider identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProvider`] for anything outside the supported
    /// set.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "google" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAi),
            other => Err(Error::unknown_provider(other)),
        }
    }

    /// Returns the environment variable holding this provider's API key.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Google => "GOOGLE_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Returns the interactive prompt text used when the key is absent.
    #[must_use]
    pub const fn key_prompt(self) -> &'static str {
        match self {
            Self::Google => "Enter your Google AI API key",
            Self::OpenAi => "Enter your OpenAI API key",
        }
    }

    /// Returns the model this provider is pinned to.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Google => "gemini-1.5-flash",
            Self::OpenAi => "gpt-3.5-turbo",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Fixed generation parameters shared by every constructed client.
///
/// The values are deliberately not configurable: deterministic sampling,
/// no token or time limits, and a small bounded retry budget.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token limit (unset)
    pub max_tokens: Option<u32>,
    /// Request timeout (unset)
    pub timeout: Option<Duration>,
    /// Extra attempts allowed for transient provider errors
    pub max_retries: u32,
}

impl GenerationParams {
    /// Returns the fixed parameter set for a provider.
    #[must_use]
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            model: provider.default_model().to_string(),
            temperature: 0.0,
            max_tokens: None,
            timeout: None,
            max_retries: 2,
        }
    }
}

/// Narrow chat interface over a hosted model.
///
/// Implementations own transport, authentication and retry; callers see one
/// structured value per request or an error.
pub trait ChatModel {
    /// Submits a (system, user) message pair constrained to `schema` and
    /// returns the parsed structured value.
    ///
    /// # Errors
    ///
    /// Returns a provider error for call failures and a decode error when the
    /// reply is not valid JSON.
    fn generate_structured(&self, system: &str, user: &str, schema: &Value) -> Result<Value>;

    /// Submits a single unconstrained prompt and returns the raw reply text.
    ///
    /// # Errors
    ///
    /// Returns a provider error for call failures.
    fn generate_text(&self, prompt: &str) -> Result<String>;
}

/// Resolves the API key for a provider and constructs its chat client.
///
/// The key comes from the provider's environment variable; when absent, the
/// operator is prompted once (input hidden) and the entered value is cached
/// into the environment for the rest of the process.
///
/// # Errors
///
/// Returns an error when the interactive prompt fails.
pub fn create_client(provider: Provider) -> Result<Box<dyn ChatModel>> {
    let api_key = resolve_api_key(provider)?;
    let params = GenerationParams::for_provider(provider);

    Ok(match provider {
        Provider::Google => Box::new(GoogleClient::new(api_key, params)),
        Provider::OpenAi => Box::new(OpenAiClient::new(api_key, params)),
    })
}

/// Resolves a provider API key from the environment or an interactive prompt.
///
/// # Errors
///
/// Returns an error when the prompt cannot be read.
pub fn resolve_api_key(provider: Provider) -> Result<String> {
    resolve_key(provider.env_var(), || {
        Password::new()
            .with_prompt(provider.key_prompt())
            .interact()
            .map_err(Error::from)
    })
}

fn resolve_key(var: &str, prompt: impl FnOnce() -> Result<String>) -> Result<String> {
    if let Ok(key) = env::var(var) {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let key = prompt()?;
    // Safety: the pipeline is single threaded; nothing reads the environment
    // concurrently with this write.
    unsafe { env::set_var(var, &key) };
    Ok(key)
}

/// Runs `call`, retrying transient failures up to `max_retries` extra times
/// with exponential backoff.
pub(crate) fn with_retries<T>(max_retries: u32, mut call: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 0;
    loop {
        match call() {
            Ok(value) => {
                if attempt > 0 {
                    debug!("request succeeded on retry {attempt}");
                }
                return Ok(value);
            }
            Err(err) if attempt < max_retries && err.is_transient() => {
                attempt += 1;
                warn!("transient provider error, retrying ({attempt}/{max_retries}): {err}");
                std::thread::sleep(Duration::from_millis(250 << attempt));
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_parse_provider() {
        assert_eq!(Provider::parse("google").unwrap(), Provider::Google);
        assert_eq!(Provider::parse("openai").unwrap(), Provider::OpenAi);

        let err = Provider::parse("anthropic").unwrap_err();
        assert!(err.to_string().contains("Unknown provider: anthropic"));
    }

    #[test]
    fn test_fixed_generation_params() {
        let params = GenerationParams::for_provider(Provider::Google);
        assert_eq!(params.model, "gemini-1.5-flash");
        assert_eq!(params.temperature, 0.0);
        assert_eq!(params.max_tokens, None);
        assert_eq!(params.timeout, None);
        assert_eq!(params.max_retries, 2);

        let params = GenerationParams::for_provider(Provider::OpenAi);
        assert_eq!(params.model, "gpt-3.5-turbo");
        assert_eq!(params.max_retries, 2);
    }

    #[test]
    fn test_resolve_key_prompts_once_and_caches() {
        let var = "BATCHFORGE_TEST_KEY_PROMPTED";
        // Safety: test-local variable name, no concurrent readers.
        unsafe { env::remove_var(var) };

        let calls = Cell::new(0);
        let key = resolve_key(var, || {
            calls.set(calls.get() + 1);
            Ok("xyz_key".to_string())
        })
        .unwrap();

        assert_eq!(key, "xyz_key");
        assert_eq!(calls.get(), 1);
        assert_eq!(env::var(var).unwrap(), "xyz_key");

        // Second resolution hits the cached environment value.
        let key = resolve_key(var, || {
            calls.set(calls.get() + 1);
            Ok("other".to_string())
        })
        .unwrap();
        assert_eq!(key, "xyz_key");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_resolve_key_prefers_environment() {
        let var = "BATCHFORGE_TEST_KEY_PRESENT";
        // Safety: test-local variable name, no concurrent readers.
        unsafe { env::set_var(var, "from_env") };

        let key = resolve_key(var, || {
            panic!("prompt must not run when the variable is set")
        })
        .unwrap();
        assert_eq!(key, "from_env");
    }

    #[test]
    fn test_with_retries_gives_up_on_fatal() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retries(2, || {
            calls.set(calls.get() + 1);
            Err(Error::provider("401 unauthorized"))
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_with_retries_retries_transient() {
        let calls = Cell::new(0);
        let result = with_retries(2, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(Error::provider_transient("503"))
            } else {
                Ok(calls.get())
            }
        });

        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_with_retries_exhausts_budget() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retries(2, || {
            calls.set(calls.get() + 1);
            Err(Error::provider_transient("503"))
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }
}
