use thiserror::Error;

use scopelabel_core::EntryOutOfBounds;
use scopelabel_model::ModelError;
use scopelabel_store::StoreError;

#[derive(Debug, Error)]
pub enum LabelError {
    /// Missing or unreadable source data; fatal before any labeling begins.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Tokenizing the system prompt failed while computing the run budget.
    #[error("encoding system prompt: {0}")]
    Prompt(#[from] ModelError),

    /// A per-cluster model invocation failed; the run aborts here but every
    /// previously checkpointed cluster stays persisted.
    #[error("labeling cluster {cluster} failed: {source}")]
    Model {
        cluster: usize,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    Entry(#[from] EntryOutOfBounds),
}
