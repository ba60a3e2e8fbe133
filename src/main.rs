// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use newsdigest::app_config::{self, Config};
use newsdigest::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a digest from a JSON file of articles (default command)
    Run(RunArgs),

    /// Generate shell completions for newsdigest
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// JSON file with the scraped articles
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[command(flatten)]
    options: RunOptions,
}

#[derive(clap::Args, Debug, Clone)]
struct RunOptions {
    /// Directory for the digest (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Source language code (e.g., 'pt')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Pivot language code the models work in (e.g., 'en')
    #[arg(short, long)]
    pivot_language: Option<String>,

    /// Similarity above which two summaries are duplicates
    #[arg(long)]
    threshold: Option<f64>,

    /// Seed for reproducible dedup tie-breaks
    #[arg(long)]
    seed: Option<u64>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Also write the run report next to the digest
    #[arg(long)]
    report: bool,
}

/// newsdigest - translate, summarize and de-duplicate the day's news
#[derive(Parser, Debug)]
#[command(name = "newsdigest")]
#[command(version)]
#[command(about = "News digest pipeline: translate, summarize, de-duplicate, back-translate")]
#[command(long_about = "newsdigest reads scraped articles, translates them into a pivot language, summarizes them,
drops near-duplicate stories and renders the remaining summaries back into the source language.

EXAMPLES:
    newsdigest articles.json                         # Run with conf.json
    newsdigest run articles.json -o out/ --report    # Write digest and run report to out/
    newsdigest articles.json --threshold 0.8         # Looser duplicate detection
    newsdigest articles.json --seed 7                # Reproducible dedup
    newsdigest completions bash > newsdigest.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON file with the scraped articles
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    #[command(flatten)]
    options: RunOptions,
}

// Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Filtering happens through log::max_level so it can be raised later
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "newsdigest", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Run(args)) => run(args).await,
        None => {
            let input = cli
                .input
                .ok_or_else(|| anyhow!("INPUT is required when no subcommand is specified"))?;
            run(RunArgs {
                input,
                options: cli.options,
            })
            .await
        }
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let options = &args.options;
    if let Some(level) = options.log_level {
        log::set_max_level(app_config::LogLevel::from(level).to_level_filter());
    }

    let config = load_config(options)?;
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let output_dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => args
            .input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf(),
    };

    let controller = Controller::with_config(config)?;
    let digest = controller
        .run(args.input.clone(), output_dir, options.report)
        .await?;
    info!("Digest written to {}", digest.display());
    Ok(())
}

/// Load or create the configuration, then apply command-line overrides
fn load_config(options: &RunOptions) -> Result<Config> {
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config
            .save(config_path)
            .context("Failed to write default config")?;
        config
    };

    if let Some(source) = &options.source_language {
        config.source_language = source.clone();
    }
    if let Some(pivot) = &options.pivot_language {
        config.pivot_language = pivot.clone();
    }
    if let Some(threshold) = options.threshold {
        config.pipeline.similarity_threshold = threshold;
    }
    if options.seed.is_some() {
        config.pipeline.dedup_seed = options.seed;
    }
    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}
