// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use gameloc::app_config::{self, Config, ProviderKind};
use gameloc::app_controller::Controller;

/// CLI Wrapper for ProviderKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProvider {
    Microsoft,
    Baidu,
    Tencent,
}

impl From<CliProvider> for ProviderKind {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::Microsoft => ProviderKind::Microsoft,
            CliProvider::Baidu => ProviderKind::Baidu,
            CliProvider::Tencent => ProviderKind::Tencent,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
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

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the text fields of game JSON documents
    Translate(TranslateArgs),

    /// Generate shell completions for gameloc
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// JSON document or directory of documents to translate in place
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Distinct texts per provider request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Only use these providers (repeatable), overriding `enabled` in the config
    #[arg(short, long, value_enum)]
    provider: Vec<CliProvider>,

    /// Source language code (e.g., 'ja', 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh-Hans', 'en')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Translation cache file
    #[arg(long, env = "GAMELOC_CACHE")]
    cache: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Scan and report without calling any provider or writing documents
    #[arg(long)]
    dry_run: bool,
}

/// gameloc - batch machine translation for game data
///
/// Extracts the text fields of game JSON documents, translates them through
/// Microsoft, Baidu or Tencent machine translation, and writes them back.
#[derive(Parser, Debug)]
#[command(name = "gameloc")]
#[command(version)]
#[command(about = "Batch machine translation for game JSON data")]
#[command(long_about = "gameloc extracts the text fields of game JSON documents, translates them with
machine translation providers and writes the results back in place.

EXAMPLES:
    gameloc translate data/                      # Translate every JSON document under data/
    gameloc translate -p baidu -p tencent data/  # Only use Baidu and Tencent
    gameloc translate -s ja -t en skills.json    # Translate from Japanese to English
    gameloc translate --dry-run data/            # Count texts without translating
    gameloc completions bash > gameloc.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    microsoft - Microsoft Translator (subscription key and region)
    baidu     - Baidu Fanyi (app id and key)
    tencent   - Tencent Cloud TMT (SecretId and SecretKey)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Filtering happens through `log::set_max_level`, which is raised later from the config
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "gameloc", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => {
            let result = run_translate(args).await;
            if let Err(e) = &result {
                error!("{:#}", e);
            }
            result
        }
    }
}

/// Apply command line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if !options.provider.is_empty() {
        let selected: Vec<ProviderKind> = options.provider.iter().cloned().map(Into::into).collect();
        for provider in &mut config.translation.providers {
            provider.enabled = selected.contains(&provider.provider_type);
        }
    }

    if let Some(batch_size) = options.batch_size {
        config.translation.common.batch_size = batch_size;
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(cache) = &options.cache {
        config.cache_path = Some(cache.clone());
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config_path = Path::new(&options.config_path);
    if !config_path.exists() {
        warn!("Config file not found at '{}', creating default config.", config_path.display());
    }
    let mut config = Config::load_or_create(config_path)?;
    apply_overrides(&mut config, &options);
    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    let summary = controller
        .run(&options.input_path, options.dry_run)
        .await
        .with_context(|| format!("Translation of {} failed", options.input_path.display()))?;

    if !options.dry_run && !summary.is_complete() {
        warn!(
            "{} batch(es) were not translated, run again to retry them",
            summary.failures.len() + summary.aborted.len()
        );
    } else {
        info!("All texts processed");
    }
    Ok(())
}
