use anyhow::Context;
use clap::Parser;
use crash_relay::collectors::LineCollector;
use crash_relay::config::Config;
use crash_relay::error::ConfigError;
use crash_relay::events::Severity;
use crash_relay::notifier::{JsonLinesNotifier, NoopNotifier, Notifier};
use crash_relay::stream::{install_panic_hook, LogBridge, LogStream};
use crash_relay::Reporter;
use log::{error, info, warn, LevelFilter};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line arguments for the crash relay
#[derive(Parser)]
#[command(
    name = "crash-relay",
    about = "Forward error entries from a text log to a crash-reporting backend",
    long_about = "Reads a text log on stdin, classifies each entry by severity and writes a \
                  JSON crash report to stdout for every entry at or above the notify level."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging output on stderr")]
    verbose: bool,

    /// Override the configured API key
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,

    /// Override the configured notify level
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Lowest severity to report: log, warning, assert, error or exception"
    )]
    notify_level: Option<Severity>,

    /// Disable automatic forwarding of log entries
    #[arg(long)]
    no_auto_notify: bool,

    /// Classify entries without writing any reports
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to defaults in load_config
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        if let Some(ref api_key) = self.api_key {
            if api_key.trim().is_empty() {
                return Err("--api-key must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Apply command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref api_key) = self.api_key {
            config.reporter.api_key = api_key.clone();
        }
        if let Some(notify_level) = self.notify_level {
            config.reporter.notify_level = notify_level;
        }
        if self.no_auto_notify {
            config.reporter.auto_notify = false;
        }
    }
}

/// Load configuration from file or use defaults
///
/// # Arguments
///
/// * `config_path` - Optional path to configuration file
///
/// # Returns
///
/// Loaded configuration, or the default configuration if the file is
/// missing or invalid
fn load_config(config_path: Option<&Path>) -> Config {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(config) => config,
                Err(ConfigError::ReadError(_)) => {
                    warn!(
                        "Configuration file '{}' not found or unreadable, using defaults",
                        path.display()
                    );
                    Config::default()
                }
                Err(e) => {
                    error!("Configuration error in '{}': {}", path.display(), e);
                    warn!("Using default configuration due to invalid config file");
                    Config::default()
                }
            }
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    }
}

/// Route `log` output through the global log stream and on to env_logger
fn init_logging(verbose: bool) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    let logger = builder.build();
    let filter = logger.filter();

    LogBridge::new(LogStream::global())
        .with_inner(Box::new(logger))
        .install(filter)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    cli.validate().map_err(anyhow::Error::msg)?;

    let mut config = load_config(cli.config.as_deref());
    cli.apply_overrides(&mut config);
    config
        .validate()
        .context("invalid configuration after command-line overrides")?;

    let json_notifier = (!cli.dry_run).then(|| {
        Arc::new(JsonLinesNotifier::with_max_stack_trace_len(
            io::stdout(),
            config.output.max_stack_trace_len,
        ))
    });
    let notifier: Arc<dyn Notifier> = match &json_notifier {
        Some(notifier) => Arc::clone(notifier) as Arc<dyn Notifier>,
        None => Arc::new(NoopNotifier),
    };
    let stream = LogStream::global();

    let mut reporter = Reporter::new(config.reporter.clone(), notifier, Arc::clone(&stream));
    reporter.start();
    reporter.apply_metadata(&config.metadata);
    reporter.attach();
    install_panic_hook(Arc::clone(&stream));

    let entries = LineCollector::collect(io::stdin().lock(), &stream)
        .context("failed to read log from stdin")?;

    reporter.detach();
    match json_notifier {
        Some(notifier) => info!(
            "Processed {} log entries, sent {} reports",
            entries,
            notifier.reports_written()
        ),
        None => info!("Dry run processed {} log entries", entries),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting crash relay");

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
