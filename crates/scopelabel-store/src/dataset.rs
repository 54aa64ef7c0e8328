//! Dataset-rooted storage for input records, cluster partitions, and label runs.
//!
//! Layout, per dataset under the data root:
//!
//! ```text
//! <root>/<dataset_id>/input.parquet                                records
//! <root>/<dataset_id>/clusters/<cluster_id>-labels-default.parquet partition
//! <root>/<dataset_id>/clusters/<run_id>.parquet                    label run
//! <root>/<dataset_id>/clusters/<run_id>.json                       run metadata
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, BooleanArray, BooleanBuilder, Int32Array, Int64Array, LargeListArray,
    LargeStringArray, ListArray, ListBuilder, StringArray, StringBuilder, UInt32Array,
    UInt64Array, UInt64Builder,
};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use regex::Regex;
use tracing::info;

use scopelabel_core::schema::runs::label_run_schema;
use scopelabel_core::{LabelEntry, LabelRun, RunMetadata};

use crate::StoreError;

/// File-system store for datasets and their cluster label runs.
///
/// Owns the data root explicitly; nothing here consults process-global state.
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dataset_dir(&self, dataset_id: &str) -> PathBuf {
        self.root.join(dataset_id)
    }

    /// Directory holding the cluster partition and all label runs for a dataset.
    pub fn cluster_dir(&self, dataset_id: &str) -> PathBuf {
        self.dataset_dir(dataset_id).join("clusters")
    }

    // ── Records ──

    /// Load the designated text column from `input.parquet`.
    ///
    /// Row position is the record identifier; null rows are kept as `None` so
    /// positions stay aligned with cluster membership indices.
    pub fn load_texts(
        &self,
        dataset_id: &str,
        text_column: &str,
    ) -> Result<Vec<Option<String>>, StoreError> {
        let path = self.dataset_dir(dataset_id).join("input.parquet");
        let batches = read_parquet(&path)?;

        let mut texts = Vec::new();
        for batch in &batches {
            let col = batch
                .column_by_name(text_column)
                .ok_or_else(|| StoreError::MissingColumn(text_column.to_string()))?;
            if col.as_any().downcast_ref::<StringArray>().is_none()
                && col.as_any().downcast_ref::<LargeStringArray>().is_none()
            {
                return Err(StoreError::BadColumnType {
                    column: text_column.to_string(),
                    expected: "a string column",
                });
            }
            for row in 0..batch.num_rows() {
                texts.push(get_string(col.as_ref(), row));
            }
        }
        info!(dataset_id, rows = texts.len(), "loaded input texts");
        Ok(texts)
    }

    // ── Cluster partition ──

    /// Load member record indices from the default cluster partition,
    /// `clusters/<cluster_id>-labels-default.parquet`, one row per cluster.
    pub fn load_cluster_indices(
        &self,
        dataset_id: &str,
        cluster_id: &str,
    ) -> Result<Vec<Vec<u64>>, StoreError> {
        let path = self
            .cluster_dir(dataset_id)
            .join(format!("{cluster_id}-labels-default.parquet"));
        let batches = read_parquet(&path)?;

        let mut clusters = Vec::new();
        for batch in &batches {
            let col = batch
                .column_by_name("indices")
                .ok_or_else(|| StoreError::MissingColumn("indices".to_string()))?;
            for row in 0..batch.num_rows() {
                clusters.push(get_index_list(col.as_ref(), row)?);
            }
        }
        info!(dataset_id, cluster_id, clusters = clusters.len(), "loaded cluster partition");
        Ok(clusters)
    }

    // ── Label runs ──

    /// Load a persisted label run table (the resume source for `--rerun`).
    pub fn load_label_run(&self, dataset_id: &str, run_id: &str) -> Result<LabelRun, StoreError> {
        let path = self.run_path(dataset_id, run_id);
        let batches = read_parquet(&path)?;

        let mut entries = Vec::new();
        for batch in &batches {
            let indices = batch
                .column_by_name("indices")
                .ok_or_else(|| StoreError::MissingColumn("indices".to_string()))?;
            let label = batch
                .column_by_name("label")
                .ok_or_else(|| StoreError::MissingColumn("label".to_string()))?;
            let label_raw = batch
                .column_by_name("label_raw")
                .ok_or_else(|| StoreError::MissingColumn("label_raw".to_string()))?;
            let labeled = batch
                .column_by_name("labeled")
                .ok_or_else(|| StoreError::MissingColumn("labeled".to_string()))?
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or(StoreError::BadColumnType {
                    column: "labeled".to_string(),
                    expected: "a boolean column",
                })?;

            for row in 0..batch.num_rows() {
                entries.push(LabelEntry {
                    indices: get_index_list(indices.as_ref(), row)?,
                    label: get_string(label.as_ref(), row).unwrap_or_default(),
                    label_raw: get_string(label_raw.as_ref(), row).unwrap_or_default(),
                    labeled: !labeled.is_null(row) && labeled.value(row),
                });
            }
        }
        info!(dataset_id, run_id, clusters = entries.len(), "loaded label run");
        Ok(LabelRun::from_entries(run_id, entries))
    }

    /// Persist a label run table. This is the per-cluster checkpoint: the
    /// table is written to a temp file and renamed into place, so a crash
    /// mid-write never corrupts the previous checkpoint.
    pub fn write_label_run(&self, dataset_id: &str, run: &LabelRun) -> Result<(), StoreError> {
        let path = self.run_path(dataset_id, &run.id);
        let tmp = path.with_extension("parquet.tmp");

        let batch = run_to_batch(run)?;
        write_parquet(&tmp, &[batch])?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Next sequential run id for a cluster set.
    ///
    /// Scans the cluster directory for `<cluster_id>-labels-<number>.parquet`
    /// and assigns max + 1 (first run = 1), zero-padded to 3 digits.
    pub fn next_run_id(&self, dataset_id: &str, cluster_id: &str) -> Result<String, StoreError> {
        let pattern = Regex::new(&format!(
            r"^{}-labels-(\d+)\.parquet$",
            regex::escape(cluster_id)
        ))
        .expect("valid run-file pattern");

        let mut max_number = 0u32;
        for entry in std::fs::read_dir(self.cluster_dir(dataset_id))? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(caps) = pattern.captures(name)
                && let Ok(number) = caps[1].parse::<u32>()
            {
                max_number = max_number.max(number);
            }
        }
        Ok(format!("{cluster_id}-labels-{:03}", max_number + 1))
    }

    // ── Run metadata ──

    /// Write the immutable metadata object for a completed run.
    pub fn write_run_metadata(
        &self,
        dataset_id: &str,
        meta: &RunMetadata,
    ) -> Result<(), StoreError> {
        let path = self.metadata_path(dataset_id, &meta.id);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, meta)?;
        info!(dataset_id, run_id = %meta.id, "wrote run metadata");
        Ok(())
    }

    /// Read a run's metadata object back.
    pub fn load_run_metadata(
        &self,
        dataset_id: &str,
        run_id: &str,
    ) -> Result<RunMetadata, StoreError> {
        let file = File::open(self.metadata_path(dataset_id, run_id))?;
        Ok(serde_json::from_reader(file)?)
    }

    fn run_path(&self, dataset_id: &str, run_id: &str) -> PathBuf {
        self.cluster_dir(dataset_id).join(format!("{run_id}.parquet"))
    }

    fn metadata_path(&self, dataset_id: &str, run_id: &str) -> PathBuf {
        self.cluster_dir(dataset_id).join(format!("{run_id}.json"))
    }
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::ParquetNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

/// Write Arrow RecordBatches to a Parquet file.
pub fn write_parquet(path: &Path, batches: &[RecordBatch]) -> Result<(), StoreError> {
    let schema = batches
        .first()
        .map(|b| b.schema())
        .ok_or_else(|| StoreError::Other("no record batches to write".to_string()))?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;
    Ok(())
}

// ── Arrow conversion helpers ──

fn run_to_batch(run: &LabelRun) -> Result<RecordBatch, StoreError> {
    let mut indices = ListBuilder::new(UInt64Builder::new());
    let mut label = StringBuilder::new();
    let mut label_raw = StringBuilder::new();
    let mut labeled = BooleanBuilder::new();

    for entry in run.entries() {
        for &idx in &entry.indices {
            indices.values().append_value(idx);
        }
        indices.append(true);
        if entry.labeled {
            label.append_value(&entry.label);
            label_raw.append_value(&entry.label_raw);
        } else {
            label.append_null();
            label_raw.append_null();
        }
        labeled.append_value(entry.labeled);
    }

    let batch = RecordBatch::try_new(
        Arc::new(label_run_schema()),
        vec![
            Arc::new(indices.finish()),
            Arc::new(label.finish()),
            Arc::new(label_raw.finish()),
            Arc::new(labeled.finish()),
        ],
    )?;
    Ok(batch)
}

/// Extract a string value from an Arrow column (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

/// Extract one row of a list column as record indices.
///
/// Partition files come from external tooling, so the integer width varies;
/// Int32/Int64/UInt32/UInt64 items are all accepted.
fn get_index_list(col: &dyn Array, row: usize) -> Result<Vec<u64>, StoreError> {
    let bad_type = || StoreError::BadColumnType {
        column: "indices".to_string(),
        expected: "a list of integers",
    };

    if col.is_null(row) {
        return Ok(Vec::new());
    }

    let values: Arc<dyn Array> = if let Some(list) = col.as_any().downcast_ref::<ListArray>() {
        list.value(row)
    } else if let Some(list) = col.as_any().downcast_ref::<LargeListArray>() {
        list.value(row)
    } else {
        return Err(bad_type());
    };

    let arr = values.as_ref();
    let mut out = Vec::with_capacity(arr.len());
    if let Some(a) = arr.as_any().downcast_ref::<UInt64Array>() {
        out.extend((0..a.len()).filter(|&i| !a.is_null(i)).map(|i| a.value(i)));
    } else if let Some(a) = arr.as_any().downcast_ref::<Int64Array>() {
        out.extend((0..a.len()).filter(|&i| !a.is_null(i)).map(|i| a.value(i) as u64));
    } else if let Some(a) = arr.as_any().downcast_ref::<UInt32Array>() {
        out.extend((0..a.len()).filter(|&i| !a.is_null(i)).map(|i| a.value(i) as u64));
    } else if let Some(a) = arr.as_any().downcast_ref::<Int32Array>() {
        out.extend((0..a.len()).filter(|&i| !a.is_null(i)).map(|i| a.value(i) as u64));
    } else {
        return Err(bad_type());
    }
    Ok(out)
}
