use anyhow::{bail, Context};
use clap::Parser;
use kirinuki::batch::{BatchProcessor, BatchSource};
use kirinuki::config::Config;
use kirinuki::encoder::OutputFormat;
use std::path::PathBuf;

/// Kirinuki - crop, transform, filter and encode images in batch
#[derive(Parser, Debug)]
#[command(name = "kirinuki")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "kirinuki.yaml")]
    config: PathBuf,

    /// Directory for encoded outputs
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Scale the configured crop onto every image by its natural size
    #[arg(long)]
    apply_to_all: bool,

    /// Override the configured output format (png, jpeg, webp)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Validate configuration and exit
    #[arg(long)]
    test: bool,

    /// Input images
    #[arg(required_unless_present = "test")]
    images: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    // Load configuration from file
    let mut config = Config::from_file(&args.config).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // Initialize logging subsystem
    if let Err(e) = kirinuki::logging::init_subscriber(&config.logging) {
        eprintln!("Failed to initialize logging subsystem: {}", e);
        std::process::exit(1);
    }

    tracing::info!(
        config_file = %args.config.display(),
        format = config.output.format.as_str(),
        shape = config.edit.shape.as_str(),
        filters = config.edit.filters.len(),
        workers = config.batch.workers,
        "Configuration loaded successfully"
    );

    if args.test {
        println!("Configuration OK");
        return;
    }

    match run(&args, &config) {
        Ok(failed) if failed == 0 => {}
        Ok(_) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Run the batch and write outputs; returns the number of failed images
fn run(args: &Args, config: &Config) -> anyhow::Result<usize> {
    if args.apply_to_all && config.edit.crop.is_some() && config.edit.reference.is_none() {
        bail!("--apply-to-all needs edit.reference alongside edit.crop");
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create output directory {}", args.out_dir.display()))?;

    let job = config
        .edit
        .to_job(config.output, args.apply_to_all)
        .context("Invalid edit configuration")?;
    let processor = BatchProcessor::new(
        config.batch.clone(),
        config.limits.source.clone(),
        config.limits.pipeline_options(),
    );

    let sources: Vec<BatchSource> = args.images.iter().cloned().map(BatchSource::File).collect();
    let report = processor.run(&sources, &job).context("Batch rejected")?;

    for (item, processed) in report.successes() {
        let path = args.out_dir.join(&item.file_name);
        std::fs::write(&path, &processed.encoded.data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "ok    {} -> {} ({}x{}, {} bytes)",
            item.name,
            path.display(),
            processed.encoded.width,
            processed.encoded.height,
            processed.encoded.len()
        );
    }
    for (item, error) in report.failures() {
        println!("fail  {} [{}] {}", item.name, error.kind(), error);
    }

    println!(
        "{} of {} images processed in {} ms",
        report.succeeded(),
        report.total(),
        report.elapsed.as_millis()
    );

    Ok(report.failed())
}
