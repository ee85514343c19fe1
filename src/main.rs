// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use pharmavigil::{
    CaseReport, ClassificationBackend, Config, DocumentLoader, GroqChatClient, Pipeline,
    Validator, connect_store,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "pharmavigil")]
#[command(version = "0.1.0")]
#[command(about = "LLM-backed classification pipeline for medical safety reports", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single safety report through the four-stage pipeline
    Process {
        /// Path to a .txt or .pdf report
        file: PathBuf,

        /// Skip the model backend and run heuristics only
        #[arg(long)]
        fast: bool,

        /// Write the final report JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        pretty: bool,
    },

    /// Process every report in a directory
    Batch {
        /// Directory containing .txt/.pdf reports
        dir: PathBuf,

        #[arg(long)]
        fast: bool,

        /// Directory for the per-report JSON outputs
        #[arg(short, long, default_value = "./reports")]
        output: PathBuf,
    },

    /// Search stored cases by semantic similarity
    Search {
        query: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Show stored case statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    pharmavigil::utils::logging::init_logger(cli.color, cli.verbose);

    info!("PharmaVigil safety-report pipeline");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Process {
            file,
            fast,
            output,
            pretty,
        } => {
            cmd_process(config, &file, fast, output, pretty).await?;
        }
        Commands::Batch { dir, fast, output } => {
            cmd_batch(config, &dir, fast, &output).await?;
        }
        Commands::Search { query, limit } => {
            cmd_search(&config, &query, limit).await?;
        }
        Commands::Stats => {
            cmd_stats(&config).await?;
        }
    }

    Ok(())
}

async fn build_pipeline(config: &Config) -> Pipeline {
    let model: Option<Arc<dyn ClassificationBackend>> = GroqChatClient::from_config(&config.model)
        .map(|client| Arc::new(client) as Arc<dyn ClassificationBackend>);

    if model.is_none() && !config.pipeline.fast_mode {
        warn!("No model API key configured, running heuristics only");
    }

    let store = connect_store(&config.store, config.model.api_key.clone()).await;

    Pipeline::new(config, model, store)
}

async fn cmd_process(
    mut config: Config,
    file: &Path,
    fast: bool,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    if fast {
        config.pipeline.fast_mode = true;
    }

    Validator::validate_file_path(file).context("Invalid report path")?;

    let start_time = Instant::now();
    let loader = DocumentLoader::new(config.pipeline.max_file_size_mb);
    let document = loader
        .load_path(file, None)
        .context("Failed to load document")?;

    let pipeline = build_pipeline(&config).await;
    let report = pipeline
        .process(document)
        .await
        .context("Pipeline run failed")?;

    let degraded = pipeline.degraded_stages();
    if !degraded.is_empty() {
        warn!("Stages downgraded to heuristics: {}", degraded.join(", "));
    }

    let json = render_report(&report, pretty)?;
    match output {
        Some(path) => {
            std::fs::write(&path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    info!(
        "Processed {} in {:.2}s",
        file.display(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

async fn cmd_batch(mut config: Config, dir: &Path, fast: bool, output: &Path) -> Result<()> {
    if fast {
        config.pipeline.fast_mode = true;
    }

    Validator::validate_directory(dir).context("Invalid report directory")?;
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| Validator::is_report_extension(path))
        .collect();

    info!("Found {} reports to process", files.len());
    if files.is_empty() {
        warn!("No .txt or .pdf reports found in {}", dir.display());
        return Ok(());
    }

    let start_time = Instant::now();
    let pipeline = Arc::new(build_pipeline(&config).await);
    let loader = Arc::new(DocumentLoader::new(config.pipeline.max_file_size_mb));
    let parallel_workers = config.pipeline.parallel_workers.max(1);

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let results: Vec<(PathBuf, Result<CaseReport>)> = stream::iter(files.into_iter().map(|path| {
        let pipeline = Arc::clone(&pipeline);
        let loader = Arc::clone(&loader);
        let progress = progress.clone();

        async move {
            progress.set_message(path.display().to_string());
            let result = async {
                let document = loader.load_path(&path, None)?;
                let report = pipeline.process(document).await?;
                Ok::<_, pharmavigil::PipelineError>(report)
            }
            .await
            .map_err(anyhow::Error::from);
            progress.inc(1);
            (path, result)
        }
    }))
    .buffer_unordered(parallel_workers)
    .collect()
    .await;

    progress.finish_with_message("done");

    let mut processed = 0usize;
    let mut failed = 0usize;

    for (path, result) in results {
        match result {
            Ok(report) => {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("report");
                let out_path = output.join(format!("{}.report.json", stem));
                std::fs::write(&out_path, render_report(&report, true)?)
                    .with_context(|| format!("Failed to write {}", out_path.display()))?;
                processed += 1;
            }
            Err(e) => {
                warn!("Failed to process {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    let degraded = pipeline.degraded_stages();
    if !degraded.is_empty() {
        warn!("Stages downgraded to heuristics: {}", degraded.join(", "));
    }

    info!(
        "Batch complete in {:.2}s: {} processed, {} failed",
        start_time.elapsed().as_secs_f64(),
        processed,
        failed
    );
    Ok(())
}

async fn cmd_search(config: &Config, query: &str, limit: usize) -> Result<()> {
    info!("Searching stored cases for: {}", query);

    let store = connect_store(&config.store, config.model.api_key.clone()).await;
    let hits = store
        .similarity_search(query, limit)
        .await
        .context("Similarity search failed")?;

    if hits.is_empty() {
        println!("\nNo stored cases match \"{}\"\n", query);
        return Ok(());
    }

    println!("\nSearch Results for: \"{}\"\n", query);
    println!("{}", "=".repeat(80));

    for (idx, hit) in hits.iter().enumerate() {
        println!(
            "\n{}. Case {} (Score: {:.4})",
            idx + 1,
            hit.case_id,
            hit.score
        );
        println!("   Drug: {}", hit.drug_name);
        println!("   Event: {}", hit.event_description);
        if let Some(distance) = hit.distance {
            println!("   Distance: {:.4}", distance);
        }
        println!("   {}", Validator::truncate_text(&hit.case_text, 300));
    }

    println!("\n{}", "=".repeat(80));
    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    let store = connect_store(&config.store, config.model.api_key.clone()).await;
    let count = store.count().await.context("Failed to count cases")?;
    info!("Store backend: {}", store.name());
    info!("Stored cases: {}", count);
    Ok(())
}

fn render_report(report: &CaseReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}
