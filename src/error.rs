use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the batchforge library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Input file does not exist.
    #[error("Error: {path} not found.")]
    NotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// Input file exists but does not contain valid JSON.
    #[error("Error: Could not decode JSON from {path}.")]
    JsonFile {
        /// Path to the malformed file
        path: PathBuf,
        /// Parser error message
        message: String,
    },

    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Provider identifier outside the supported set.
    #[error("Unknown provider: {name}")]
    UnknownProvider {
        /// The unrecognized identifier
        name: String,
    },

    /// LLM provider call failure (network, HTTP status, malformed reply).
    #[error("Provider error: {message}")]
    Provider {
        /// Error message
        message: String,
        /// Whether a retry may succeed
        transient: bool,
    },

    /// Model output could not be decoded into the requested structure.
    #[error("Failed to decode structured output: {message}")]
    Decode {
        /// Error message
        message: String,
    },

    /// Bootstrap response did not contain enough fenced JSON blocks.
    #[error("Expected at least three JSON code blocks in the model response, found {found}")]
    MetaResponse {
        /// Number of blocks actually found
        found: usize,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// Interactive credential prompt failure.
    #[error("Failed to read credential: {message}")]
    Prompt {
        /// Error message
        message: String,
    },

    /// Document conversion failure (missing or failing converter).
    #[error("Conversion failed: {message}")]
    Conversion {
        /// Error message
        message: String,
    },

    /// Converter input with an extension that maps to no direction.
    #[error("Input must be a .pdf or .md/.markdown file: {path}")]
    UnsupportedInput {
        /// The offending input path
        path: PathBuf,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a file-not-found error.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates an invalid-JSON-file error.
    #[must_use]
    pub fn json_file(path: impl Into<PathBuf>, source: &serde_json::Error) -> Self {
        Self::JsonFile {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an unknown-provider error.
    #[must_use]
    pub fn unknown_provider(name: impl Into<String>) -> Self {
        Self::UnknownProvider { name: name.into() }
    }

    /// Creates a non-retryable provider error.
    #[must_use]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            transient: false,
        }
    }

    /// Creates a provider error that a bounded retry may resolve.
    #[must_use]
    pub fn provider_transient(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            transient: true,
        }
    }

    /// Creates a structured-output decoding error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a meta-response error for a block shortfall.
    #[must_use]
    pub const fn meta_response(found: usize) -> Self {
        Self::MetaResponse { found }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: &tera::Error) -> Self {
        Self::Template {
            template: template.into(),
            message: source.to_string(),
        }
    }

    /// Creates a document-conversion error.
    #[must_use]
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }

    /// Creates an unsupported-converter-input error.
    #[must_use]
    pub fn unsupported_input(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedInput { path: path.into() }
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::UnknownProvider { .. })
    }

    /// Returns true if this is a document-conversion error.
    #[must_use]
    pub const fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// Returns true if a bounded retry may resolve this error.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Provider { transient: true, .. })
    }
}

// Conversion implementations for convenient error handling
impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        Self::Template {
            template: "unknown".to_string(),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

impl From<dialoguer::Error> for Error {
    fn from(e: dialoguer::Error) -> Self {
        Self::Prompt {
            message: e.to_string(),
        }
    }
}
