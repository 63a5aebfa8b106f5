use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use bitconv_common::NetworkConfig;
use bitconv_infer::{EvalReport, InferenceRuntime, TestSet};

/// Images per progress-bar tick during evaluation.
const EVAL_CHUNK: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "bitconv", about = "Unified CLI for bitconv")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate classification accuracy over a labelled test set.
    Eval(EvalArgs),
    /// Classify a single image and print the ten class scores.
    Classify(ClassifyArgs),
    /// Write a default config.json into a model directory.
    InitConfig(InitConfigArgs),
}

// ── Eval ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct EvalArgs {
    #[arg(long, default_value = "model")]
    model_dir: PathBuf,
    #[arg(long)]
    images: PathBuf,
    #[arg(long)]
    labels: PathBuf,
    /// Evaluate only the first N images.
    #[arg(long)]
    limit: Option<usize>,
    /// Worker threads; 0 uses every core.
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

// ── Classify ───────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct ClassifyArgs {
    #[arg(long, default_value = "model")]
    model_dir: PathBuf,
    #[arg(long)]
    images: PathBuf,
    /// Zero-based index of the image within the file.
    #[arg(long, default_value_t = 0)]
    index: usize,
}

#[derive(Parser, Debug)]
struct InitConfigArgs {
    #[arg(long, default_value = "model")]
    model_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Eval(args) => cmd_eval(args),
        Command::Classify(args) => cmd_classify(args),
        Command::InitConfig(args) => cmd_init_config(args),
    }
}

// ── Command implementations ────────────────────────────────────────────────────

fn cmd_eval(args: EvalArgs) -> Result<()> {
    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()?;
    }

    eprintln!("Loading model from {} ...", args.model_dir.display());
    let runtime = InferenceRuntime::load(&args.model_dir)?;
    let pixels = runtime.config().image_size * runtime.config().image_size;
    let set = TestSet::load(&args.images, &args.labels, pixels, args.limit)?;
    eprintln!("Evaluating {} images", set.len());

    let bar = ProgressBar::new(set.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}] {msg}")?,
    );

    let mut report = EvalReport::default();
    for (images, labels) in set
        .images
        .chunks(EVAL_CHUNK)
        .zip(set.labels.chunks(EVAL_CHUNK))
    {
        report.merge(runtime.evaluate(images, labels)?);
        bar.inc(images.len() as u64);
        bar.set_message(format!("{:.2}%", report.accuracy() * 100.0));
    }
    bar.finish();

    println!(
        "accuracy {:.4} ({}/{})",
        report.accuracy(),
        report.correct,
        report.total
    );
    Ok(())
}

fn cmd_classify(args: ClassifyArgs) -> Result<()> {
    eprintln!("Loading model from {} ...", args.model_dir.display());
    let runtime = InferenceRuntime::load(&args.model_dir)?;
    let pixels = runtime.config().image_size * runtime.config().image_size;

    let text = std::fs::read_to_string(&args.images)?;
    let values: Vec<i8> = text
        .split_whitespace()
        .map(|tok| {
            tok.parse::<i8>()
                .map_err(|_| anyhow::anyhow!("bad pixel {tok:?}"))
        })
        .collect::<Result<_>>()?;
    let image = values
        .chunks(pixels)
        .nth(args.index)
        .ok_or_else(|| anyhow::anyhow!("image index {} out of range", args.index))?;
    if image.len() != pixels {
        anyhow::bail!("trailing partial image at index {}", args.index);
    }

    let scores = runtime.classify(image)?;
    for (class, score) in scores.iter().enumerate() {
        println!("class {class}: {score:+.6}");
    }
    println!("predicted: {}", bitconv_infer::argmax(&scores));
    Ok(())
}

fn cmd_init_config(args: InitConfigArgs) -> Result<()> {
    std::fs::create_dir_all(&args.model_dir)?;
    let path = args.model_dir.join("config.json");
    let config = NetworkConfig::default();
    config.save(&path)?;
    eprintln!("Created default config at {}", path.display());
    Ok(())
}
