//! Label run state: per-cluster entries, completion tracking, and run metadata.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::clean_label;

#[derive(Debug, Error)]
#[error("label entry {index} out of bounds (run has {len} clusters)")]
pub struct EntryOutOfBounds {
    pub index: usize,
    pub len: usize,
}

/// Per-cluster labeling state.
///
/// `label` is always derived from `label_raw` by [`clean_label`]; the two are
/// only ever written together via [`LabelRun::record`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelEntry {
    /// Member record identifiers (row positions in the dataset's input table).
    pub indices: Vec<u64>,
    /// Cleaned label shown in the UI.
    pub label: String,
    /// Verbatim model output.
    pub label_raw: String,
    /// Completion flag; drives resume-skip behavior.
    pub labeled: bool,
}

/// One labeling run over a cluster set: one [`LabelEntry`] per cluster, in
/// cluster order. The persisted form of this table is the resume checkpoint.
#[derive(Debug, Clone)]
pub struct LabelRun {
    pub id: String,
    entries: Vec<LabelEntry>,
}

impl LabelRun {
    /// Fresh run: one unlabeled entry per cluster, in the given order.
    pub fn new(id: impl Into<String>, clusters: Vec<Vec<u64>>) -> Self {
        let entries = clusters
            .into_iter()
            .map(|indices| LabelEntry {
                indices,
                ..LabelEntry::default()
            })
            .collect();
        Self {
            id: id.into(),
            entries,
        }
    }

    /// Rebuild a run from persisted entries (resume path).
    pub fn from_entries(id: impl Into<String>, entries: Vec<LabelEntry>) -> Self {
        Self {
            id: id.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Result<&LabelEntry, EntryOutOfBounds> {
        self.entries.get(index).ok_or(EntryOutOfBounds {
            index,
            len: self.entries.len(),
        })
    }

    /// Record a model reply for one cluster and mark it labeled.
    ///
    /// The cleaned label is computed here so that `label` can never drift
    /// from `label_raw`.
    pub fn record(&mut self, index: usize, raw: impl Into<String>) -> Result<(), EntryOutOfBounds> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(EntryOutOfBounds { index, len })?;
        let raw = raw.into();
        entry.label = clean_label(&raw);
        entry.label_raw = raw;
        entry.labeled = true;
        Ok(())
    }

    /// Index of the first cluster whose `labeled` flag is not set.
    ///
    /// Reported for status when resuming. It does not drive iteration: the
    /// engine always walks the full cluster order and skips on the per-entry
    /// flag.
    pub fn first_unlabeled(&self) -> Option<usize> {
        self.entries.iter().position(|e| !e.labeled)
    }

    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.labeled)
    }
}

/// Immutable record of how a run's labels were produced.
///
/// Written once, next to the run's table, when every cluster is labeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub id: String,
    pub cluster_id: String,
    pub model_id: String,
    pub text_column: String,
    pub context: String,
    pub system_prompt: String,
    pub max_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_cluster_run() -> LabelRun {
        LabelRun::new("cluster-001-labels-001", vec![vec![0, 1], vec![2], vec![3, 4]])
    }

    #[test]
    fn fresh_run_is_unlabeled() {
        let run = three_cluster_run();
        assert_eq!(run.len(), 3);
        assert!(!run.is_complete());
        assert_eq!(run.first_unlabeled(), Some(0));
        assert!(run.entries().iter().all(|e| !e.labeled && e.label.is_empty()));
    }

    #[test]
    fn record_cleans_and_marks() {
        let mut run = three_cluster_run();
        run.record(1, "\"Sports\ncars\"").unwrap();

        let entry = run.entry(1).unwrap();
        assert!(entry.labeled);
        assert_eq!(entry.label, "Sports cars");
        assert_eq!(entry.label_raw, "\"Sports\ncars\"");
        assert_eq!(run.first_unlabeled(), Some(0));
    }

    #[test]
    fn record_out_of_bounds() {
        let mut run = three_cluster_run();
        let err = run.record(3, "label").unwrap_err();
        assert_eq!(err.index, 3);
        assert_eq!(err.len, 3);
    }

    #[test]
    fn complete_when_all_recorded() {
        let mut run = three_cluster_run();
        for i in 0..run.len() {
            run.record(i, format!("label {i}")).unwrap();
        }
        assert!(run.is_complete());
        assert_eq!(run.first_unlabeled(), None);
    }

    #[test]
    fn metadata_json_roundtrip() {
        let meta = RunMetadata {
            id: "cluster-001-labels-003".into(),
            cluster_id: "cluster-001".into(),
            model_id: "gpt-4o-mini".into(),
            text_column: "text".into(),
            context: "support tickets".into(),
            system_prompt: "label the list".into(),
            max_tokens: 4000,
        };
        let json = serde_json::to_string(&meta).unwrap();
        let parsed: RunMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "cluster-001-labels-003");
        assert_eq!(parsed.max_tokens, 4000);
    }
}
