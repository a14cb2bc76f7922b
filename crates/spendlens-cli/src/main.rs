//! Command-line front end: classify notifications, inspect preprocessing,
//! list known categories.

mod display;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use spendlens_ai::ModelGeneration;
use spendlens_core::{preprocess, CascadeConfig};
use spendlens_engine::CascadeClassifier;
use spendlens_rules::{RuleEngine, RuleTable};

#[derive(Parser)]
#[command(name = "spendlens", version, about = "Hybrid transaction classifier")]
struct Cli {
    /// Custom rule table: JSON array of rule specs.
    #[arg(long, global = true, env = "SPENDLENS_RULES")]
    rules: Option<PathBuf>,

    /// Trained generation file (labels + thresholds + centroids).
    #[arg(long, global = true, env = "SPENDLENS_GENERATION")]
    generation: Option<PathBuf>,

    /// Directory with the exported classifier (model.onnx, tokenizer.json,
    /// labels.json).
    #[cfg(feature = "onnx")]
    #[arg(long, global = true, env = "SPENDLENS_CLASSIFIER_DIR")]
    classifier_dir: Option<PathBuf>,

    /// Directory with the sentence-embedding model (model.onnx,
    /// tokenizer.json).
    #[cfg(feature = "onnx")]
    #[arg(long, global = true, env = "SPENDLENS_EMBEDDER_DIR")]
    embedder_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one notification text.
    Classify {
        text: String,
        /// Emit the full decision as JSON instead of the card view.
        #[arg(long)]
        json: bool,
    },
    /// Classify notifications from a file, one per line.
    Batch {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List known category labels.
    Labels,
    /// Show extracted amount, recipient, and clean text for one notification.
    Extract { text: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::debug!("spendlens v{}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();
    let engine = build_engine(&cli)?;

    match &cli.command {
        Command::Classify { text, json } => {
            let decision = engine.classify(text)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                display::print_decision(&decision);
            }
        }
        Command::Batch { file, json } => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            let texts: Vec<&str> = content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            let decisions = engine.classify_batch(&texts)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&decisions)?);
            } else {
                for (text, decision) in texts.iter().zip(&decisions) {
                    display::print_summary_line(text, decision);
                }
            }
        }
        Command::Labels => {
            for label in engine.labels() {
                println!("{label}");
            }
        }
        Command::Extract { text } => {
            let amount = preprocess::extract_amount(text)
                .map_or_else(|| "-".to_string(), |a| format!("{a:.2}"));
            println!("amount     {amount}");
            println!("recipient  {}", preprocess::extract_recipient(text));
            println!("clean      {}", preprocess::clean(text));
        }
    }
    Ok(())
}

fn build_engine(cli: &Cli) -> anyhow::Result<CascadeClassifier> {
    let table = match &cli.rules {
        Some(path) => RuleTable::from_json_file(path)
            .with_context(|| format!("loading rule table {}", path.display()))?,
        None => RuleTable::builtin(),
    };

    #[allow(unused_mut)]
    let mut engine = CascadeClassifier::new(RuleEngine::new(table), CascadeConfig::default());

    #[cfg(feature = "onnx")]
    {
        use spendlens_ai::{OnnxEmbedder, OnnxTextClassifier};
        use std::sync::Arc;

        if let Some(dir) = &cli.classifier_dir {
            let classifier = OnnxTextClassifier::load(dir)
                .with_context(|| format!("loading classifier from {}", dir.display()))?;
            engine = engine.with_classifier(Arc::new(classifier));
        }
        if let Some(dir) = &cli.embedder_dir {
            let embedder = OnnxEmbedder::load(dir)
                .with_context(|| format!("loading embedder from {}", dir.display()))?;
            engine = engine.with_embedder(Arc::new(embedder));
        }
    }

    if let Some(path) = &cli.generation {
        let generation = ModelGeneration::load(path)
            .with_context(|| format!("loading generation {}", path.display()))?;
        engine.install_generation(&generation)?;
    }

    Ok(engine)
}
