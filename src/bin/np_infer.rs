

use std::path::PathBuf;

use clap::Parser;
use np_semseg::eval::{apply_inference_defaults, run_inference, InferenceJob, RemoteClassifier};
use np_semseg::PipelineConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "np-infer")]
#[command(about = "Classify a prepared feature table with a trained model", long_about = None)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prepared feature-table CSV [default: datasets/prepared_data.csv]
    #[arg(long)]
    data: Option<PathBuf>,

    /// Trained model file, passed to the classifier service
    #[arg(long)]
    model: Option<PathBuf>,

    /// Results CSV, one label per row [default: datasets/inference_data.csv]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Model server base URL
    #[arg(long)]
    classifier_url: Option<String>,

    /// Print accuracy, precision and recall when the table is labeled
    #[arg(long)]
    print_stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("np_semseg=info".parse()?))
        .init();

    let args = Args::parse();
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    apply_inference_defaults(&mut config);
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if args.model.is_some() {
        config.model_path = args.model;
    }
    if args.classifier_url.is_some() {
        config.classifier_url = args.classifier_url;
    }
    config.validate()?;

    let url = config
        .classifier_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("classifier_url is required for inference"))?;
    let classifier = RemoteClassifier::new(url, config.lookup_timeout())?;
    let job = InferenceJob::from_config(&config, args.print_stats)?;

    let outcome = run_inference(&classifier, &job).await?;
    if let Some(report) = outcome.report {
        print!("{}", report);
    }
    println!("Results of inference saved in {}", job.output_path.display());
    Ok(())
}
