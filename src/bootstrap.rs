//! Idea-to-job bootstrap: asks the model to produce the schema, prompts and
//! batch data documents that the main pipeline consumes.

use crate::config::write_json_pretty;
use crate::error::{Error, Result};
use crate::provider::ChatModel;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use tracing::info;

const META_PROMPT: &str = include_str!("../templates/meta_prompt.md");

/// The template file may wrap the actual prompt in one outer fenced block.
static OUTER_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(.*)```").expect("valid regex"));

/// Non-greedy matcher for individual fenced JSON blocks in a model reply.
static JSON_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\n(.*?)\n```").expect("valid regex"));

/// Returns the meta prompt template text.
///
/// When the embedded file contains a fenced block, the block's content is the
/// template; otherwise the whole file is, trimmed either way.
#[must_use]
pub fn meta_prompt_template() -> String {
    OUTER_BLOCK
        .captures(META_PROMPT)
        .and_then(|captures| captures.get(1))
        .map_or_else(
            || META_PROMPT.trim().to_string(),
            |block| block.as_str().trim().to_string(),
        )
}

/// Extracts the three bootstrap documents from a model reply.
///
/// The reply must contain at least three fenced JSON blocks; they are parsed
/// in order as (config, prompts, batch data).
///
/// # Errors
///
/// Returns [`Error::MetaResponse`] when fewer than three blocks are present
/// and a decode error when a block is not valid JSON.
pub fn parse_meta_response(response: &str) -> Result<(Value, Value, Value)> {
    let blocks: Vec<&str> = JSON_BLOCK
        .captures_iter(response)
        .filter_map(|captures| captures.get(1))
        .map(|block| block.as_str())
        .collect();

    if blocks.len() < 3 {
        return Err(Error::meta_response(blocks.len()));
    }

    let parse = |block: &str, name: &str| {
        serde_json::from_str(block)
            .map_err(|e| Error::decode(format!("generated {name} block is not valid JSON: {e}")))
    };

    Ok((
        parse(blocks[0], "config")?,
        parse(blocks[1], "prompts")?,
        parse(blocks[2], "batch data")?,
    ))
}

/// Generates the config, prompts and batch data files from a free-text idea.
///
/// The model reply is parsed in full before anything is written, so a
/// malformed reply leaves no partial files behind.
///
/// # Errors
///
/// Returns provider errors from the model call, [`Error::MetaResponse`] or
/// decode errors for an unusable reply, and IO errors from the writes.
pub fn generate_from_idea(
    client: &dyn ChatModel,
    idea: &str,
    config_path: impl AsRef<Path>,
    prompts_path: impl AsRef<Path>,
    batch_path: impl AsRef<Path>,
) -> Result<()> {
    let prompt = meta_prompt_template().replace("{idea}", idea);

    info!("requesting bootstrap documents from the model");
    let response = client.generate_text(&prompt)?;
    let (config, prompts, batch_data) = parse_meta_response(&response)?;

    write_json_pretty(config_path.as_ref(), &config)?;
    write_json_pretty(prompts_path.as_ref(), &prompts)?;
    write_json_pretty(batch_path.as_ref(), &batch_data)?;

    info!("wrote bootstrap files");
    Ok(())
}
