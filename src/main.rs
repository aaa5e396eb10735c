// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use subsync::app_config::{Config, LogLevel};
use subsync::app_controller::Controller;
use subsync::catalog::MediaKind;
use subsync::language_utils;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
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

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMediaKind {
    Movie,
    Episode,
}

impl From<CliMediaKind> for MediaKind {
    fn from(kind: CliMediaKind) -> Self {
        match kind {
            CliMediaKind::Movie => MediaKind::Movie,
            CliMediaKind::Episode => MediaKind::Episode,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate subtitles for everything the catalog reports as wanted
    Wanted {
        /// Target language code (e.g., 'nl', 'fr')
        #[arg(short, long)]
        target_language: Option<String>,

        /// Number of items processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Translate the subtitles of a single local video
    Translate {
        /// Video file to process
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        /// Target language code
        #[arg(short, long)]
        target_language: Option<String>,

        /// Force overwrite of an existing subtitle in the target language
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Show where a catalog entry resolves on the local filesystem
    Resolve(ResolveArgs),

    /// Show sync history
    Stats {
        /// Window in days
        #[arg(long, default_value_t = 30)]
        days: i64,
    },

    /// Test the catalog connection and every enabled backend
    Check,

    /// Generate shell completions for subsync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct ResolveArgs {
    #[arg(long, value_enum)]
    kind: CliMediaKind,

    /// Movie title or series title
    #[arg(long)]
    title: String,

    #[arg(long)]
    year: Option<u16>,

    /// Path as reported by the catalog
    #[arg(long)]
    path: Option<String>,

    #[arg(long, requires = "episode")]
    season: Option<u32>,

    #[arg(long, requires = "season")]
    episode: Option<u32>,
}

/// subsync - translate missing subtitles for a Bazarr library
#[derive(Parser, Debug)]
#[command(name = "subsync")]
#[command(version)]
#[command(about = "Fill missing subtitles by translating the ones you have")]
#[command(long_about = "subsync asks Bazarr which movies and episodes lack subtitles, finds the local
video files, picks an existing subtitle in a source language and translates it.

EXAMPLES:
    subsync wanted                              # Process the wanted list
    subsync wanted -t fr -w 4                   # French, four items at a time
    subsync translate -f movie.mkv              # Translate one video, overwriting
    subsync resolve --kind movie --title Heat --year 1995
    subsync stats --days 7                      # Last week's runs
    subsync completions bash > subsync.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in subsync.json by default. If the file doesn't
    exist, a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "subsync.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger; the effective level is set later with log::set_max_level
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for the level
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
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let _ = writeln!(
            std::io::stderr(),
            "\x1B[{}m{} {:<5} {}\x1B[0m",
            Self::color_for_level(record.level()),
            now,
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let cli = CommandLineOptions::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: CommandLineOptions) -> Result<ExitCode> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subsync", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    // Apply the command line level before the config is read so loading is logged at it
    if let Some(level) = cli.log_level {
        log::set_max_level(LogLevel::from(level).into());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    match &cli.command {
        Commands::Wanted {
            target_language,
            workers,
        } => {
            if let Some(target) = target_language {
                config.target_language = target.clone();
            }
            if let Some(workers) = workers {
                config.sync.max_workers = *workers;
            }
        }
        Commands::Translate { target_language, .. } => {
            if let Some(target) = target_language {
                config.target_language = target.clone();
            }
        }
        _ => {}
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.into());

    let target_language = language_utils::normalize_to_part1_or_part2t(&config.target_language)?;
    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Wanted { .. } => {
            let cancel = controller.cancel_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, finishing items in flight");
                    cancel.cancel();
                }
            });

            let summary = controller.run_wanted(&target_language).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Translate {
            video,
            force_overwrite,
            ..
        } => {
            // Item failures are logged, not reflected in the exit code
            controller.translate_file(&video, &target_language, force_overwrite).await?;
        }
        Commands::Resolve(args) => {
            let episode = args.season.zip(args.episode);
            let resolved = controller
                .resolve(args.kind.into(), &args.title, args.year, args.path, episode)
                .await?;
            match resolved {
                Some(resolved) => println!("{} ({:?})", resolved.path.display(), resolved.method),
                None => {
                    info!("No local file found for '{}'", args.title);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Stats { days } => {
            if days <= 0 {
                return Err(anyhow!("--days must be positive"));
            }
            println!("{}", controller.statistics(days).await?);
        }
        Commands::Check => {
            if !controller.check().await {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Completions { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}
