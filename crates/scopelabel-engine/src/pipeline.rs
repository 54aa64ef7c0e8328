//! The labeling run itself: resolve the run id, build digests, then walk
//! clusters in order, checkpointing the table after every labeled cluster.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info};

use scopelabel_core::{ChatMessage, LabelRun, RunMetadata};
use scopelabel_model::ChatModel;
use scopelabel_store::DatasetStore;

use crate::error::LabelError;
use crate::extract::{cluster_texts, extract_digest, token_budget};
use crate::prompt;

/// Courtesy pause between cluster iterations, as a nod to provider rate
/// limits. Not load-bearing for correctness.
const ITERATION_PAUSE: Duration = Duration::from_millis(10);

/// What to label and how to resume.
#[derive(Debug, Clone)]
pub struct LabelJob {
    pub dataset_id: String,
    pub text_column: String,
    pub cluster_id: String,
    /// Free-form hint about what distinguishes clusters in this dataset.
    pub context: String,
    /// Existing run id to resume; `None` starts a fresh sequential run.
    pub rerun: Option<String>,
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct LabelReport {
    pub run_id: String,
    pub labeled: usize,
    pub skipped: usize,
}

/// Label every cluster in the job's cluster set, one at a time.
///
/// Strictly sequential: the next cluster is not started until the current
/// one's checkpoint write completes. Any model failure aborts the run
/// immediately; clusters checkpointed before the failure stay persisted and a
/// rerun with the same id skips them. There is no retry or backoff.
pub async fn run_label_pipeline(
    store: &DatasetStore,
    model: &dyn ChatModel,
    job: &LabelJob,
) -> Result<LabelReport, LabelError> {
    let texts = store.load_texts(&job.dataset_id, &job.text_column)?;

    let mut run = match &job.rerun {
        Some(run_id) => {
            let run = store.load_label_run(&job.dataset_id, run_id)?;
            // Status only. Iteration always covers the full cluster order;
            // skipping is driven by each entry's `labeled` flag.
            match run.first_unlabeled() {
                Some(row) => info!(run_id = %run.id, first_unlabeled = row, "resuming label run"),
                None => info!(run_id = %run.id, "resuming label run, nothing left unlabeled"),
            }
            run
        }
        None => {
            let run_id = store.next_run_id(&job.dataset_id, &job.cluster_id)?;
            let clusters = store.load_cluster_indices(&job.dataset_id, &job.cluster_id)?;
            LabelRun::new(run_id, clusters)
        }
    };
    info!(run_id = %run.id, clusters = run.len(), "running label pipeline");

    let system_prompt = prompt::system_prompt(&job.context);
    let budget = token_budget(model, &system_prompt)?;

    // All digests are built up front, in cluster order, before any model call.
    let mut digests = Vec::with_capacity(run.len());
    for (i, entry) in run.entries().iter().enumerate() {
        let members = cluster_texts(&texts, &entry.indices);
        let digest = extract_digest(model, &members, budget)
            .map_err(|source| LabelError::Model { cluster: i, source })?;
        digests.push(digest);
    }

    let mut labeled = 0usize;
    let mut skipped = 0usize;
    for i in 0..run.len() {
        sleep(ITERATION_PAUSE).await;

        let entry = run.entry(i)?;
        if entry.labeled {
            info!(cluster = i, label = %entry.label, "skipping already labeled cluster");
            skipped += 1;
            continue;
        }

        let messages = [
            ChatMessage::system(system_prompt.clone()),
            ChatMessage::user(prompt::user_prompt(&digests[i])),
        ];
        let raw = match model.chat(&messages).await {
            Ok(raw) => raw,
            Err(source) => {
                error!(cluster = i, digest = %digests[i], %source, "model invocation failed");
                return Err(LabelError::Model { cluster: i, source });
            }
        };

        run.record(i, raw)?;
        store.write_label_run(&job.dataset_id, &run)?;
        info!(cluster = i, label = %run.entry(i)?.label, "labeled cluster");
        labeled += 1;
    }

    let meta = RunMetadata {
        id: run.id.clone(),
        cluster_id: job.cluster_id.clone(),
        model_id: model.model_id().to_string(),
        text_column: job.text_column.clone(),
        context: job.context.clone(),
        system_prompt,
        max_tokens: budget,
    };
    store.write_run_metadata(&job.dataset_id, &meta)?;

    info!(run_id = %run.id, labeled, skipped, "label run complete");
    Ok(LabelReport {
        run_id: run.id,
        labeled,
        skipped,
    })
}
