//! Briefly CLI - abstractive text and webpage summarisation
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::{bail, Context};
use briefly::{ui, Config, Controller, ModelLoader, Outcome, Summarizer, SummaryConfig, WebSource};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "briefly")]
#[command(author, version, about = "TUI for abstractive text and webpage summarisation", long_about = None)]
struct Cli {
    /// Path to a briefly.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise text, a file piped on stdin, or a webpage by URL
    Summarise {
        /// URL of the article to summarise
        #[arg(long, conflicts_with = "text")]
        url: Option<String>,
        /// Text to summarise (reads stdin when neither --url nor --text is given)
        #[arg(long)]
        text: Option<String>,
        /// Maximum summary length in tokens
        #[arg(long)]
        max_length: Option<usize>,
        /// Minimum summary length in tokens
        #[arg(long)]
        min_length: Option<usize>,
        /// Show raw extracted text instead of summary
        #[arg(long)]
        raw: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::Summarise {
            url,
            text,
            max_length,
            min_length,
            raw,
        }) => {
            init_logging(None)?;
            let bounds = SummaryConfig::new(
                max_length.unwrap_or(config.generation.max_length),
                min_length.unwrap_or(config.generation.min_length),
            );
            summarise(&config, url, text, bounds, raw).await?;
        }
        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
        }
        None => {
            // Default: launch the TUI. The terminal belongs to the UI, so logs go to a file.
            init_logging(Some(config.logging.file.as_path()))?;
            let mut controller = build_controller(&config)?;
            ui::run(&mut controller, SummaryConfig::from(&config.generation)).await?;
        }
    }

    Ok(())
}

fn init_logging(file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = file {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    builder.init();
    Ok(())
}

fn build_controller(config: &Config) -> anyhow::Result<Controller<briefly::model::T5Model>> {
    println!("Loading model {}...", config.model.repo);
    let mut loader = ModelLoader::new(config.model.clone());
    loader
        .load()
        .context("failed to load the summarisation model")?;
    let handle = loader.into_handle()?;
    let summarizer = Summarizer::new(handle, config.model.prefix.clone(), config.generation.clone());
    Ok(Controller::new(summarizer, WebSource::new(config.scraper.clone())))
}

async fn summarise(
    config: &Config,
    url: Option<String>,
    text: Option<String>,
    bounds: SummaryConfig,
    raw: bool,
) -> anyhow::Result<()> {
    let (title, input) = match (url, text) {
        (Some(url), _) => {
            println!("Fetching: {}", url);
            let article = briefly::scraper::fetch_article(&url, &config.scraper)
                .await
                .with_context(|| format!("Failed to extract article from {}", url))?;
            (article.title, article.text)
        }
        (None, Some(text)) => (None, text),
        (None, None) => (None, std::io::read_to_string(std::io::stdin())?),
    };

    if raw {
        println!("\n=== {} ===\n", title.as_deref().unwrap_or("No title"));
        println!("{}", input);
        println!("\n--- Extracted {} characters ---", input.len());
        return Ok(());
    }

    let mut controller = build_controller(config)?;
    println!("Summarising {} characters...\n", input.len());
    match controller.summarize(&input, &bounds)? {
        Outcome::Summarized { summary, stats } => {
            if let Some(title) = title {
                println!("=== {} ===\n", title);
            }
            println!("{}", "Summary".bold());
            println!("  {}\n", summary);
            println!("{}", "Statistics".bold());
            println!("  Original Length: {} words", stats.original_words);
            println!("  Summary Length:  {} words", stats.summary_words);
            println!("  Reduction:       {}", stats.reduction_display());
        }
        Outcome::Idle => bail!("nothing to summarise: the input is empty"),
        other => bail!("unexpected outcome: {:?}", other),
    }

    Ok(())
}
