//! Harvester CLI
//!
//! Scrapes every profile in the targets file, then writes the results workbook.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};
use harvester::{
    error::Result,
    models::{Config, load_targets},
    pipeline::{self, ConcurrentCollector},
    storage::ExportSummary,
    utils::{
        fs::{ensure_dirs, open_with_default_app, stamped_path},
        log::TeeWriter,
    },
};

/// Harvester - X.com profile scraper
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Scrape X.com profile timelines into an Excel workbook"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "harvester.toml")]
    config: PathBuf,

    /// Target list (one profile URL per line)
    #[arg(long)]
    targets: Option<PathBuf>,

    /// Session cookies exported from a logged-in browser
    #[arg(long)]
    cookies: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Cap on reveal passes per target
    #[arg(long)]
    max_passes: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Do not open the log and workbook when the run ends
    #[arg(long)]
    no_open: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Scrape all targets and export the results (default)
    Run,

    /// Validate configuration and selectors
    Validate,

    /// Print the loaded target list
    Targets,
}

impl Cli {
    /// Apply command-line overrides on top of the file configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(targets) = &self.targets {
            config.paths.targets_file = targets.to_string_lossy().into_owned();
        }
        if let Some(cookies) = &self.cookies {
            config.paths.cookies_file = cookies.to_string_lossy().into_owned();
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(max_passes) = self.max_passes {
            config.scroll.max_passes = max_passes;
        }
    }
}

/// Initialize logging based on verbosity flag, duplicating output to `log_file`.
fn init_logging(verbose: bool, log_file: Option<&Path>) {
    let level = if verbose { "debug" } else { "info" };

    let tee = match log_file.map(TeeWriter::create) {
        Some(Ok(tee)) => tee,
        Some(Err(e)) => {
            eprintln!("Cannot create log file ({e}); logging to stderr only");
            TeeWriter::new(None)
        }
        None => TeeWriter::new(None),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(tee)))
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    let (mut config, load_error) = Config::load_or_default(&cli.config);
    cli.apply(&mut config);

    let timestamp = Local::now().format("%Y%m%d%H%M%S").to_string();
    let mut dirs_error = None;
    let log_path = match command {
        Command::Run => match ensure_dirs(&[
            &config.paths.image_dir,
            &config.paths.results_dir,
            &config.paths.log_dir,
        ]) {
            Ok(()) => Some(stamped_path(
                Path::new(&config.paths.log_dir),
                "scraper_log",
                &timestamp,
                "txt",
            )),
            Err(e) => {
                dirs_error = Some(e);
                None
            }
        },
        _ => None,
    };
    init_logging(cli.verbose, log_path.as_deref());

    if let Some(e) = &dirs_error {
        log::error!("Cannot create output directories: {e}");
    }

    match load_error {
        None => log::info!("Loaded configuration from {}", cli.config.display()),
        Some(e) => log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
    }

    match command {
        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (timeouts, limits and site selectors)");
        }

        Command::Targets => {
            let targets = load_targets(&config.paths.targets_file)?;
            log::info!(
                "{} targets in {}",
                targets.len(),
                config.paths.targets_file
            );
            for (index, url) in targets.iter().enumerate() {
                println!("{}\t{}", pipeline::task_label(index), url);
            }
        }

        Command::Run => {
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                // Still leave an empty workbook behind.
                let _ = export(&ConcurrentCollector::new(), &config, &timestamp).await;
                return Err(e);
            }
            run(&config, &timestamp, log_path.as_deref(), cli.no_open).await?;
        }
    }

    Ok(())
}

/// Scrape, then export whatever was collected, even after a failure or Ctrl-C.
async fn run(config: &Config, timestamp: &str, log_path: Option<&Path>, no_open: bool) -> Result<()> {
    log::info!("Harvester starting...");

    let collector = ConcurrentCollector::new();
    let harvest = pipeline::run_harvest(config, &collector).await;
    match &harvest {
        Ok(outcome) if outcome.interrupted => log::info!("Script interrupted by user."),
        Ok(outcome) => log::info!("Finished scraping {} targets", outcome.targets),
        Err(e) => log::error!("Scraping aborted: {e}"),
    }

    let exported = export(&collector, config, timestamp).await;
    if let Ok(summary) = &exported {
        log::info!(
            "Run summary: {} targets, {} records, {} authors, {} images downloaded, {} missing",
            harvest.as_ref().map(|o| o.targets).unwrap_or(0),
            summary.record_rows,
            summary.author_rows,
            summary.images_downloaded,
            summary.images_missing
        );
    }

    if !no_open {
        log::logger().flush();
        if let Some(path) = log_path {
            open_with_default_app(path);
        }
        if let Ok(summary) = &exported {
            open_with_default_app(&summary.path);
        }
    }

    harvest?;
    exported?;
    Ok(())
}

/// Write the results workbook and log where it went.
async fn export(collector: &ConcurrentCollector, config: &Config, timestamp: &str) -> Result<ExportSummary> {
    let exported =
        pipeline::export_results(collector, Path::new(&config.paths.results_dir), timestamp).await;
    match &exported {
        Ok(summary) => log::info!("Results saved to Excel: {}", summary.path.display()),
        Err(e) => log::error!("Failed to write results workbook: {e}"),
    }
    exported
}
