// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use doctran::app_config::{Config, LogLevel};
use doctran::document::PageUnit;
use doctran::export;
use doctran::ingest;
use doctran::pipeline::{CacheStore, PageOutcome, ProgressFn, TranslationPipeline};
use doctran::providers::openai::OpenAI;
use doctran::translator::{PageTranslator, TextTranslator, VisionTranslator};
use doctran::RetryPolicy;

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    /// Translated text only
    Text,
    /// Original and translation side by side
    Bilingual,
    /// Both documents
    Both,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a document (default command)
    #[command(alias = "translate")]
    Translate(TranslateArgs),

    /// Generate shell completions for doctran
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input document: a text file (pages separated by form feeds) or a
    /// directory of rendered page images
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Source language (e.g. 'English', 'German')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language (e.g. 'Serbian', 'French')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Provider endpoint URL (for OpenAI-compatible servers)
    #[arg(long)]
    endpoint: Option<String>,

    /// Output directory for translated documents and the page cache
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Both)]
    format: OutputFormat,

    /// Resume from previously translated pages
    #[arg(short, long)]
    resume: bool,

    /// Number of parallel workers (1 = sequential)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Sleep between pages in sequential mode, in seconds
    #[arg(long)]
    sleep: Option<f64>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// doctran - AI document translation
///
/// Translates multi-page documents page by page using AI providers, with a
/// durable cache that lets interrupted runs resume without losing work.
#[derive(Parser, Debug)]
#[command(name = "doctran")]
#[command(version = "0.1.0")]
#[command(about = "AI-powered document translation with a resumable pipeline")]
#[command(long_about = "doctran splits a document into pages, translates them in parallel \
against an OpenAI-compatible provider, and reassembles the ordered output.

EXAMPLES:
    doctran book.txt -s English -t Serbian      # Translate a text document
    doctran pages/ -s English -t French         # Translate rendered page images
    doctran book.txt -r                         # Resume an interrupted run
    doctran book.txt -w 1 --sleep 1.5           # Sequential with a courtesy delay
    doctran completions bash > doctran.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different file with --config-path. If the config file doesn't exist, a
    default one will be created automatically. The provider API key comes
    from the config or the OPENAI_API_KEY environment variable.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input document: a text file (pages separated by form feeds) or a
    /// directory of rendered page images
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Source language (e.g. 'English', 'German')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language (e.g. 'Serbian', 'French')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Provider endpoint URL (for OpenAI-compatible servers)
    #[arg(long)]
    endpoint: Option<String>,

    /// Output directory for translated documents and the page cache
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Both)]
    format: OutputFormat,

    /// Resume from previously translated pages
    #[arg(short, long)]
    resume: bool,

    /// Number of parallel workers (1 = sequential)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Sleep between pages in sequential mode, in seconds
    #[arg(long)]
    sleep: Option<f64>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// Custom stderr logger with timestamps and level colors
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default; the level is
    // updated after the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "doctran", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let args = TranslateArgs {
                input_path,
                source_language: cli.source_language,
                target_language: cli.target_language,
                model: cli.model,
                endpoint: cli.endpoint,
                output_dir: cli.output_dir,
                format: cli.format,
                resume: cli.resume,
                workers: cli.workers,
                sleep: cli.sleep,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_translate(args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    // Load or create configuration
    let config_path = Path::new(&options.config_path);
    let mut config = if config_path.exists() {
        Config::from_file(config_path)?
    } else {
        warn!(
            "Config file not found at '{}', creating default config.",
            options.config_path
        );
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    // Override config with CLI options if provided
    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(model) = &options.model {
        config.provider.text_model = model.clone();
        config.provider.vision_model = model.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        config.provider.endpoint = endpoint.clone();
    }
    if let Some(workers) = options.workers {
        config.pipeline.workers = workers;
    }
    if let Some(sleep) = options.sleep {
        config.pipeline.sleep_ms = (sleep * 1000.0) as u64;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    // Ingest the document into page units
    if !options.input_path.exists() {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    let (units, is_image_document) = if options.input_path.is_dir() {
        (ingest::pages_from_image_dir(&options.input_path)?, true)
    } else {
        (ingest::pages_from_text_file(&options.input_path)?, false)
    };

    if units.is_empty() {
        warn!("No pages found in {:?}, nothing to do", options.input_path);
        return Ok(());
    }

    let total_pages = units.len();
    info!(
        "📄 Ingested {} {} pages from {:?}",
        total_pages,
        if is_image_document { "image" } else { "text" },
        options.input_path
    );

    // Build the translator and the pipeline
    let output_dir = options.output_dir.clone().unwrap_or_else(|| {
        let stem = options
            .input_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        PathBuf::from(format!("{}_translated", stem))
    });
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let api_key = config.resolve_api_key()?;
    let client = OpenAI::new_with_config(api_key, &config.provider.endpoint, config.provider.timeout_secs)?;
    let retry = RetryPolicy::new(
        config.pipeline.max_retries,
        Duration::from_millis(config.pipeline.retry_initial_delay_ms),
        config.pipeline.retry_backoff_factor,
    );

    let translator: Arc<dyn PageTranslator> = if is_image_document {
        Arc::new(VisionTranslator::new(
            client,
            &config.provider.vision_model,
            &config.source_language,
            &config.target_language,
            retry,
        ))
    } else {
        Arc::new(TextTranslator::new(
            client,
            &config.provider.text_model,
            &config.source_language,
            &config.target_language,
            retry,
        ))
    };

    let cache = CacheStore::new(output_dir.join("translation_cache.json"));
    let pipeline = TranslationPipeline::new(
        translator,
        cache,
        config.pipeline.workers,
        Duration::from_millis(config.pipeline.sleep_ms),
    );

    // Ctrl-C triggers graceful shutdown: no new pages start, completed work
    // is flushed before the run returns
    let cancel = pipeline.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight pages...");
            cancel.cancel();
        }
    });

    info!(
        "🚀 doctran: {} -> {} with {} ({} workers)",
        config.source_language,
        config.target_language,
        if is_image_document {
            &config.provider.vision_model
        } else {
            &config.provider.text_model
        },
        config.pipeline.workers
    );

    let start_time = std::time::Instant::now();
    let output = run_with_progress(&pipeline, units, options.resume).await?;

    for failure in &output.failures {
        warn!("Page {} failed: {}", failure.index, failure.error);
    }

    if output.interrupted {
        warn!(
            "Run interrupted: {}/{} pages translated and persisted; rerun with --resume to continue",
            output.pages.len(),
            total_pages
        );
    } else if !output.is_complete(total_pages) {
        warn!(
            "Run finished with gaps: {}/{} pages translated; rerun with --resume to retry failed pages",
            output.pages.len(),
            total_pages
        );
    }

    // Write output documents
    let target = config.target_language.to_lowercase();
    if matches!(options.format, OutputFormat::Text | OutputFormat::Both) {
        export::write_translated_text(&output.pages, output_dir.join(format!("{}.txt", target)))?;
    }
    if matches!(options.format, OutputFormat::Bilingual | OutputFormat::Both) {
        export::write_bilingual_text(
            &output.pages,
            output_dir.join("bilingual.txt"),
            &config.source_language,
            &config.target_language,
        )?;
    }

    info!(
        "Translation complete: {}/{} pages in {}",
        output.pages.len(),
        total_pages,
        format_duration(start_time.elapsed())
    );

    Ok(())
}

/// Run the pipeline with an indicatif progress bar wired to the progress
/// callback
async fn run_with_progress(
    pipeline: &TranslationPipeline,
    units: Vec<PageUnit>,
    resume: bool,
) -> Result<doctran::PipelineOutput> {
    let total_pages = units.len() as u64;
    let progress_bar = ProgressBar::new(total_pages);
    let template_result = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg} {eta}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(template_result.progress_chars("█▓▒░"));
    progress_bar.set_message("Translating");

    let pb = progress_bar.clone();
    let progress: ProgressFn = Arc::new(move |processed, _total, outcome| {
        pb.set_position(processed as u64);
        match outcome {
            PageOutcome::Translated(page) => {
                pb.set_message(format!("page {} done", page.index));
            }
            PageOutcome::Failed(failure) => {
                pb.set_message(format!("page {} failed", failure.index));
            }
        }
    });

    let result = pipeline.run(units, resume, Some(progress)).await;
    progress_bar.finish_and_clear();

    result.map_err(Into::into)
}

/// Format a duration as a compact human-readable string
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
