use std::env;
use std::path::PathBuf;

use clap::Parser;
use egg_classifier::config::{ClassifierConfig, DEFAULT_CONFIG_PATH};
use egg_classifier::inference::{AnalysisObserver, ClassifierService};
use egg_classifier::preview::render_preview;
use shared::{AnalysisStatus, PredictionResult};

#[derive(Parser, Debug)]
#[command(author, version, about = "Classify an egg image as fertile or infertile")]
struct Args {
    /// Image to classify (JPEG or PNG)
    image: PathBuf,

    /// Model file, overrides the config
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// After a successful analysis, write an aspect-preserving preview here
    #[arg(long)]
    preview: Option<PathBuf>,
}

struct ConsoleObserver {
    json: bool,
}

impl AnalysisObserver for ConsoleObserver {
    fn on_status(&mut self, status: &AnalysisStatus) {
        match status {
            AnalysisStatus::Failed(_) | AnalysisStatus::InferenceFailed(_) => log::error!("{}", status),
            _ => log::info!("{}", status),
        }
    }

    fn on_result(&mut self, result: &PredictionResult) {
        if self.json {
            match serde_json::to_string_pretty(result) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("Failed to serialize result: {}", e),
            }
        } else {
            println!("{}", result.verdict);
            println!("{}", result.confidence_label());
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| env::var("CLASSIFIER_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = ClassifierConfig::load_or_default(&config_path)?;
    if let Some(model) = args.model {
        config.model.path = model;
    }

    let service = ClassifierService::new(&config);
    log::info!("{}", AnalysisStatus::Ready);

    let mut observer = ConsoleObserver { json: args.json };
    service.analyze(&args.image, &mut observer)?;

    if let Some(preview_path) = &args.preview {
        let preview = render_preview(&args.image, config.preview.max_size)?;
        preview.save(preview_path)?;
        log::info!(
            "Preview {}x{} written to {}",
            preview.width(),
            preview.height(),
            preview_path.display()
        );
    }

    if !args.json {
        println!("{}", service.mode().footer());
    }
    Ok(())
}
