//! Labeling engine: builds token-budgeted cluster digests, drives the chat
//! model one cluster at a time, and checkpoints the run table after every
//! cluster so an interrupted run can resume with `--rerun`.

mod error;
mod extract;
mod pipeline;
mod prompt;

pub use error::LabelError;
pub use extract::{cluster_texts, extract_digest, token_budget};
pub use pipeline::{LabelJob, LabelReport, run_label_pipeline};
pub use prompt::{PROMPT_MARGIN, system_prompt, user_prompt};
