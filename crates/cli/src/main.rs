use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use engine::{scan_file, GcEvent, ScanOptions};

mod conf;
mod export;

#[derive(Parser)]
#[command(name = "heaptail", about = "Reconstruct typed collection events from JVM GC logs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a GC log and print one event per line
    Events {
        log: PathBuf,
        /// RFC 3339 wall-clock time of JVM start; inferred from the file
        /// name when omitted
        #[arg(long)]
        time_origin: Option<String>,
    },
    /// Parse a GC log and export the events
    Export {
        log: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        #[arg(long)]
        time_origin: Option<String>,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "engine=warn,cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Events { log, time_origin } => {
            let events = parse(&log, time_origin.as_deref())?;
            let mut out = io::stdout().lock();
            for event in &events {
                print_event(&mut out, event)?;
            }
        }
        Command::Export {
            log,
            format,
            time_origin,
            output,
        } => {
            let events = parse(&log, time_origin.as_deref())?;
            let mut out: Box<dyn Write> = match output {
                Some(path) => Box::new(
                    File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };
            match format {
                Format::Csv => export::write_csv(&mut out, &events)?,
                Format::Json => export::write_json(&mut out, &events)?,
            }
        }
    }

    Ok(())
}

fn parse(log: &PathBuf, time_origin: Option<&str>) -> Result<Vec<GcEvent>> {
    let origin = conf::resolve_time_origin(time_origin, log)?;
    if let Some(epoch_ms) = origin {
        info!(epoch_ms, "time origin resolved");
    }

    let events = scan_file(
        log,
        ScanOptions {
            time_origin: origin,
            ..Default::default()
        },
    )
    .with_context(|| format!("parsing {}", log.display()))?;

    info!(count = events.len(), "events parsed");
    Ok(events)
}

fn print_event(out: &mut impl Write, event: &GcEvent) -> Result<()> {
    let when = match event.time_ms() {
        Ok(ms) => ms.to_string(),
        Err(_) => event.offset_literal().unwrap_or("-").to_string(),
    };
    writeln!(
        out,
        "{:>12}  {:<26} {:>8} ms  (line {})",
        when,
        event.collection_type().as_str(),
        event.duration_ms(),
        event.line(),
    )?;
    Ok(())
}
