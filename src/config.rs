use crate::error::{Error, Result};
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_PROMPTS_FILE: &str = "prompts.json";
const DEFAULT_BATCH_FILE: &str = "batch_data.json";
const DEFAULT_OUTPUT_FILE: &str = "output.json";

/// System and user prompt templates for one batch job.
///
/// The user template may reference batch-item fields as `{field}` placeholders;
/// substitution happens per item when the chain is invoked.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptPair {
    /// System message template
    pub system: String,
    /// User message template with per-item placeholders
    pub user: String,
}

/// Configuration for one batch generation run.
///
/// Use [`RunConfig::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct RunConfig {
    /// Path to the JSON Schema constraining each result
    pub config_path: PathBuf,

    /// Path to the prompts file (`{"system": ..., "user": ...}`)
    pub prompts_path: PathBuf,

    /// Path to the batch data file (JSON array of input records)
    pub batch_path: PathBuf,

    /// Path the result array is written to
    pub output_path: PathBuf,

    /// LLM provider to submit requests to
    pub provider: Provider,

    /// Render the results as a Markdown report next to the output file
    pub emit_markdown: bool,

    /// Convert the Markdown report to PDF (renders Markdown implicitly)
    pub emit_pdf: bool,
}

impl RunConfig {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use batchforge::{Provider, RunConfig};
    ///
    /// let config = RunConfig::builder()
    ///     .provider(Provider::Google)
    ///     .output_path("results.json")
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the output path has no file name or points at an
    /// existing directory.
    pub fn validate(&self) -> Result<()> {
        if self.output_path.file_name().is_none() {
            return Err(Error::config(format!(
                "Output path has no file name: {}",
                self.output_path.display()
            )));
        }

        if self.output_path.is_dir() {
            return Err(Error::config(format!(
                "Output path is a directory: {}",
                self.output_path.display()
            )));
        }

        Ok(())
    }

    /// Returns the sibling Markdown report path (same basename, `.md`).
    #[must_use]
    pub fn markdown_path(&self) -> PathBuf {
        self.output_path.with_extension("md")
    }

    /// Returns the sibling PDF report path (same basename, `.pdf`).
    #[must_use]
    pub fn pdf_path(&self) -> PathBuf {
        self.output_path.with_extension("pdf")
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            prompts_path: PathBuf::from(DEFAULT_PROMPTS_FILE),
            batch_path: PathBuf::from(DEFAULT_BATCH_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            provider: Provider::Google,
            emit_markdown: false,
            emit_pdf: false,
        }
    }
}

/// Builder for creating a [`RunConfig`].
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    config_path: Option<PathBuf>,
    prompts_path: Option<PathBuf>,
    batch_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    provider: Option<Provider>,
    emit_markdown: bool,
    emit_pdf: bool,
}

impl RunConfigBuilder {
    /// Sets the path to the JSON Schema file.
    #[must_use]
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Sets the path to the prompts file.
    #[must_use]
    pub fn prompts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompts_path = Some(path.into());
        self
    }

    /// Sets the path to the batch data file.
    #[must_use]
    pub fn batch_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.batch_path = Some(path.into());
        self
    }

    /// Sets the output file path.
    #[must_use]
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Sets the LLM provider.
    #[must_use]
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Enables Markdown report rendering.
    #[must_use]
    pub fn emit_markdown(mut self, enabled: bool) -> Self {
        self.emit_markdown = enabled;
        self
    }

    /// Enables PDF report conversion.
    #[must_use]
    pub fn emit_pdf(mut self, enabled: bool) -> Self {
        self.emit_pdf = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<RunConfig> {
        let config = RunConfig {
            config_path: self
                .config_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
            prompts_path: self
                .prompts_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_FILE)),
            batch_path: self
                .batch_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BATCH_FILE)),
            output_path: self
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            provider: self.provider.unwrap_or(Provider::Google),
            emit_markdown: self.emit_markdown,
            emit_pdf: self.emit_pdf,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Loads a JSON file and returns its content.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when the file does not exist,
/// [`Error::JsonFile`] when it is not valid JSON, and [`Error::Io`] for any
/// other read failure.
pub fn load_json(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::not_found(path)
        } else {
            Error::io(path, e)
        }
    })?;

    serde_json::from_str(&text).map_err(|e| Error::json_file(path, &e))
}

/// Loads the prompts file into a [`PromptPair`].
///
/// # Errors
///
/// Returns the underlying [`load_json`] errors, or a configuration error when
/// the document does not contain `system` and `user` strings.
pub fn load_prompts(path: impl AsRef<Path>) -> Result<PromptPair> {
    let path = path.as_ref();
    let value = load_json(path)?;
    serde_json::from_value(value).map_err(|_| {
        Error::config(format!(
            "Prompts file {} must contain 'system' and 'user' strings",
            path.display()
        ))
    })
}

/// Loads the batch data file and checks it is a JSON array.
///
/// # Errors
///
/// Returns the underlying [`load_json`] errors, or a configuration error when
/// the top-level value is not an array.
pub fn load_batch(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    match load_json(path)? {
        Value::Array(items) => Ok(items),
        _ => Err(Error::config(format!(
            "Batch data file {} must contain a JSON array of input records",
            path.display()
        ))),
    }
}

/// Writes a value as JSON with 4-space indentation.
///
/// # Errors
///
/// Returns a serialization error or an IO error with path context.
pub fn write_json_pretty<S: Serialize>(path: impl AsRef<Path>, value: &S) -> Result<()> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    fs::write(path, buf).map_err(|e| Error::io(path, e))
}

/// Extracts the schema's `required` list as the field-display order hint.
///
/// Missing or malformed `required` entries yield an empty hint; the renderer
/// then keeps the result's own field order.
#[must_use]
pub fn required_fields(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
