use std::path::PathBuf;

use clap::Parser;

use scopelabel_engine::{LabelJob, run_label_pipeline};
use scopelabel_model::{ModelConfig, OpenAiChat};
use scopelabel_store::DatasetStore;

/// Label each cluster in a pre-computed partition with a chat model.
#[derive(Parser)]
#[command(name = "scopelabel", version)]
struct Args {
    /// Dataset identifier (directory name under the data root).
    dataset_id: String,

    /// Column of `input.parquet` holding the text to label.
    text_column: String,

    /// Cluster-set identifier, e.g. `cluster-001`.
    cluster_id: String,

    /// Chat model identifier.
    model_id: String,

    /// Free-form context that disambiguates what makes clusters distinct.
    context: String,

    /// Resume an existing label run instead of starting a new one.
    #[arg(long)]
    rerun: Option<String>,

    /// Data root holding one directory per dataset.
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory of model assets; the tokenizer is expected at
    /// `<model-dir>/<model_id>/tokenizer.json`.
    #[arg(long, env = "MODEL_DIR", default_value = "models")]
    model_dir: PathBuf,

    /// OpenAI-compatible API base URL.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    base_url: String,

    /// API key; omit for unauthenticated local servers.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model context capacity in tokens.
    #[arg(long, default_value_t = 4096)]
    model_max_tokens: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "label run failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let store = DatasetStore::new(&args.data_dir);

    let config = ModelConfig {
        model_id: args.model_id.clone(),
        base_url: args.base_url,
        api_key: args.api_key,
        max_tokens: args.model_max_tokens,
        tokenizer_path: args.model_dir.join(&args.model_id).join("tokenizer.json"),
    };
    let model = OpenAiChat::load(&config)?;

    let job = LabelJob {
        dataset_id: args.dataset_id,
        text_column: args.text_column,
        cluster_id: args.cluster_id,
        context: args.context,
        rerun: args.rerun,
    };

    let report = run_label_pipeline(&store, &model, &job).await?;
    tracing::info!(
        run_id = %report.run_id,
        labeled = report.labeled,
        skipped = report.skipped,
        "done"
    );
    Ok(())
}
