//! spanner-dump CLI - export a Spanner database as SQL statements.

use clap::Parser;
use spanner_dump::{Config, DumpError, Dumper, SnapshotSource, SourceConfig};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "spanner-dump")]
#[command(about = "Export a Spanner database as DDL and INSERT statements")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the JSON snapshot to dump (overrides source.snapshot)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Write the dump to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not output DDL
    #[arg(long)]
    no_ddl: bool,

    /// Do not output data
    #[arg(long)]
    no_data: bool,

    /// Read timestamp, RFC 3339 (e.g. 2018-01-23T03:00:00Z)
    #[arg(long)]
    timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// Rows per INSERT statement [default: 100]
    #[arg(long)]
    bulk_size: Option<usize>,

    /// Comma separated tables to dump (default: all tables)
    #[arg(long, value_delimiter = ',')]
    tables: Vec<String>,

    /// Print the dump summary as JSON to stderr
    #[arg(long)]
    summary_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "warn")]
    verbosity: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DumpError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = resolve_config(&cli)?;
    let cancel_token = setup_signal_handler();

    let source = SnapshotSource::open(&config.source.snapshot).await?;
    info!("Opened snapshot {:?}", config.source.snapshot);

    let out: Box<dyn Write> = match cli.output {
        Some(ref path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut dumper = Dumper::new(source, BufWriter::new(out), config.dump);
    let summary = dumper.run(&cancel_token).await?;

    if cli.summary_json {
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

/// Merge the config file (if any) with command line overrides and validate.
fn resolve_config(cli: &Cli) -> Result<Config, DumpError> {
    let mut config = match (&cli.config, &cli.snapshot) {
        (Some(path), _) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        (None, Some(snapshot)) => Config {
            source: SourceConfig {
                snapshot: snapshot.clone(),
            },
            dump: Default::default(),
        },
        (None, None) => {
            return Err(DumpError::Config(
                "either --config or --snapshot is required".into(),
            ))
        }
    };

    if let Some(ref snapshot) = cli.snapshot {
        config.source.snapshot = snapshot.clone();
    }
    if cli.no_ddl {
        config.dump.no_ddl = true;
    }
    if cli.no_data {
        config.dump.no_data = true;
    }
    if let Some(ts) = cli.timestamp {
        config.dump.timestamp = Some(ts);
    }
    if let Some(n) = cli.bulk_size {
        config.dump.bulk_size = Some(n);
    }
    if !cli.tables.is_empty() {
        config.dump.tables = cli.tables.iter().map(|t| t.trim().to_string()).collect();
    }

    config.validate()?;
    Ok(config)
}

/// Logs always go to stderr; stdout carries only the dump.
/// `RUST_LOG` takes precedence over `--verbosity`.
fn setup_logging(verbosity: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(verbosity)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn verbosity_directive(verbosity: &str) -> &'static str {
    match verbosity.to_lowercase().as_str() {
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => "warn",
    }
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            let mut stream = match signal(kind) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to set up {} handler: {}", name, e);
                    return;
                }
            };
            stream.recv().await;
            eprintln!("\nReceived {}. Stopping dump...", name);
            token.cancel();
        });
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to set up Ctrl-C handler: {}", e);
            return;
        }
        eprintln!("\nReceived Ctrl-C. Stopping dump...");
        token.cancel();
    });

    cancel_token
}
