//! Cluster digest extraction under a token budget.

use scopelabel_core::{DUPLICATE_THRESHOLD, build_digest};
use scopelabel_model::{ChatModel, ModelError};

use crate::prompt::PROMPT_MARGIN;

/// Digest budget for a run: model capacity minus the system prompt and a
/// fixed margin for the closing of the prompt. Computed once per run.
pub fn token_budget(model: &dyn ChatModel, system_prompt: &str) -> Result<usize, ModelError> {
    let prompt_tokens = model.encode(system_prompt)?.len();
    Ok(model
        .max_tokens()
        .saturating_sub(prompt_tokens + PROMPT_MARGIN))
}

/// Resolve a cluster's member texts by record index.
///
/// Null rows and indices past the end of the table contribute nothing; the
/// digest simply omits them.
pub fn cluster_texts<'a>(texts: &'a [Option<String>], indices: &[u64]) -> Vec<&'a str> {
    indices
        .iter()
        .filter_map(|&i| texts.get(i as usize).and_then(|t| t.as_deref()))
        .collect()
}

/// Build a cluster's digest and truncate it to the token budget.
///
/// Truncation is a hard cutoff at the token boundary; it may end mid-item or
/// mid-word, which is accepted behavior.
pub fn extract_digest(
    model: &dyn ChatModel,
    members: &[&str],
    budget: usize,
) -> Result<String, ModelError> {
    let digest = build_digest(members.iter().copied(), DUPLICATE_THRESHOLD);
    let tokens = model.encode(&digest)?;
    if tokens.len() <= budget {
        return Ok(digest);
    }
    model.decode(&tokens[..budget])
}
