//! Storage layer: parquet record tables, cluster membership, and label-run checkpoints.

mod dataset;
mod error;

pub use dataset::{DatasetStore, read_parquet, write_parquet};
pub use error::StoreError;
