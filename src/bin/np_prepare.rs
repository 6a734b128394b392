

use std::path::PathBuf;

use clap::Parser;
use np_semseg::dataset::{read_raw_rows, write_feature_table};
use np_semseg::features::LookupPolicy;
use np_semseg::{ExtractionPipeline, PipelineConfig, Services};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "np-prepare")]
#[command(about = "Build the noun-phrase feature table from a raw phrase CSV", long_about = None)]
struct Args {
    /// TOML config file; NPSEG_* environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raw noun-phrase CSV (phrase[,label])
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    w2v_model: Option<PathBuf>,

    #[arg(long)]
    wordnet: Option<PathBuf>,

    #[arg(long)]
    http_proxy: Option<String>,

    #[arg(long)]
    https_proxy: Option<String>,

    #[arg(long)]
    workers: Option<usize>,

    /// Drop phrases whose lookups fail instead of failing the batch
    #[arg(long)]
    skip_failed: bool,

    /// Count failed lookups as misses instead of aborting the phrase
    #[arg(long)]
    lookup_failures_as_miss: bool,
}

impl Args {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(data) = self.data {
            config.data_path = data;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if self.w2v_model.is_some() {
            config.w2v_path = self.w2v_model;
        }
        if self.wordnet.is_some() {
            config.wordnet_path = self.wordnet;
        }
        if self.http_proxy.is_some() {
            config.http_proxy = self.http_proxy;
        }
        if self.https_proxy.is_some() {
            config.https_proxy = self.https_proxy;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.skip_failed {
            config.skip_failed_phrases = true;
        }
        if self.lookup_failures_as_miss {
            config.on_lookup_failure = LookupPolicy::TreatAsMiss;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("np_semseg=info".parse()?))
        .init();

    let args = Args::parse();
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    if !config.data_path.exists() {
        anyhow::bail!("data file not found: {}", config.data_path.display());
    }

    let services = Services::init(&config).await?;
    let pipeline = ExtractionPipeline::from_config(services, &config).with_progress(true);

    let rows = read_raw_rows(&config.data_path).await?;
    let vectors = pipeline
        .extract_labeled(&rows, config.skip_failed_phrases)
        .await?;
    write_feature_table(&config.output_path, &vectors).await?;

    info!(
        "Prepared {}/{} phrases into {}",
        vectors.len(),
        rows.len(),
        config.output_path.display()
    );
    Ok(())
}
