//! # batchforge
//!
//! Batch structured-output generation against hosted LLM providers.
//!
//! ## Features
//!
//! - Schema-constrained chat calls: one JSON Schema, one structured result
//!   per batch item, in input order
//! - `{field}` prompt templating from per-item records
//! - Google Gemini and OpenAI backends with fixed deterministic parameters
//! - Markdown and PDF report rendering
//! - Idea bootstrap: generate the schema/prompts/batch files from free text
//!
//! ## Quick Start
//!
//! ```no_run
//! use batchforge::{Pipeline, Provider, RunConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = RunConfig::builder()
//!     .provider(Provider::Google)
//!     .output_path("output.json")
//!     .emit_markdown(true)
//!     .build()?;
//!
//! let stats = Pipeline::new(config)?.run()?;
//! stats.print_summary();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Config loader**: reads schema, prompts and batch data JSON files
//! 2. **Provider factory**: resolves credentials and constructs a chat client
//! 3. **Chain**: binds prompts and schema to the client, one call per item
//! 4. **Renderer**: writes the result array, Markdown and (optional) PDF

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod bootstrap;
mod chain;
mod config;
mod error;
mod google;
mod openai;
mod pipeline;
mod provider;
mod render;

pub mod pdfmd;

pub use bootstrap::{generate_from_idea, meta_prompt_template, parse_meta_response};
pub use chain::Chain;
pub use config::{
    load_batch, load_json, load_prompts, required_fields, write_json_pretty, PromptPair,
    RunConfig, RunConfigBuilder,
};
pub use error::{Error, Result};
pub use google::GoogleClient;
pub use openai::OpenAiClient;
pub use pipeline::{Pipeline, RunStats};
pub use provider::{create_client, resolve_api_key, ChatModel, GenerationParams, Provider};
pub use render::render_markdown;

/// Runs the complete batch pipeline with the given configuration.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - An input document is missing or malformed
/// - The provider call or structured decoding fails for any batch item
/// - The output file cannot be written
///
/// # Examples
///
/// ```no_run
/// use batchforge::{run, RunConfig};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = RunConfig::builder().build()?;
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: RunConfig) -> Result<RunStats> {
    Pipeline::new(config)?.run()
}
