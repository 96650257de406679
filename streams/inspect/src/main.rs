//! Stream Inspect - Query a pod's streams from the command line
//!
//! Thin operator front end over `stream-core`. Every command prints JSON
//! lines on stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Every stream visible to the session
//! stream-inspect list
//!
//! # Rooms and group chats, including deactivated ones
//! stream-inspect list --type room --type mim --include-inactive
//!
//! # One stream, by id or by any JSON reference shape
//! stream-inspect show iWyZBIOdQQzQj0tKOLRivX___qu6YeyZdA
//! stream-inspect show '{"stream-obj": "iWyZBIOdQQzQj0tKOLRivX___qu6YeyZdA"}'
//!
//! # Stream type and members
//! stream-inspect classify '{"roomSystemInfo": {"id": "S1"}}'
//! stream-inspect members S1
//!
//! # Verbose logging
//! RUST_LOG=debug stream-inspect list
//! ```
//!
//! Pod URL and tokens come from `streams.toml` and the `STREAMS_*`
//! environment variables; `--pod-url`, `--session-token`, `--timeout-ms` and
//! `--page-size` override both.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use stream_core::{
    load_config_from_path, resolve_identifier, ConfigOverrides, Connection, StreamAccessor,
    PodConnection, StreamType,
};

/// Stream Inspect - Look up pod streams as canonical records
#[derive(Parser, Debug)]
#[command(name = "stream-inspect")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(
        short = 'c',
        long,
        env = "STREAMS_CONFIG",
        value_name = "FILE",
        global = true
    )]
    config: Option<PathBuf>,

    /// Pod base URL (overrides file and environment)
    #[arg(long, value_name = "URL", global = true)]
    pod_url: Option<String>,

    /// Session token (overrides file and environment)
    #[arg(long, value_name = "TOKEN", global = true)]
    session_token: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    timeout_ms: Option<u64>,

    /// Streams requested per listing page
    #[arg(long, value_name = "N", global = true)]
    page_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short = 'l',
        long,
        env = "STREAMS_LOG_LEVEL",
        default_value = "warn",
        global = true
    )]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List streams visible to the session
    List {
        /// Only streams of this type (repeatable)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        types: Vec<StreamType>,

        /// Include deactivated streams
        #[arg(long)]
        include_inactive: bool,

        /// Print pod descriptors instead of canonical records
        #[arg(long)]
        native: bool,
    },

    /// Fetch one stream
    Show {
        /// Stream id or JSON reference
        reference: String,

        /// Print the pod descriptor instead of the canonical record
        #[arg(long)]
        native: bool,
    },

    /// Print a stream's type
    Classify {
        /// Stream id or JSON reference
        reference: String,
    },

    /// List the users participating in a stream
    Members {
        /// Stream id or JSON reference
        reference: String,
    },
}

/// Initialize logging on stderr with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("stream_inspect={level},stream_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

/// Command-line settings that take priority over file and environment
fn overrides(args: &Args) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::new();
    if let Some(url) = args.pod_url.clone() {
        overrides = overrides.with_pod_url(url);
    }
    if let Some(token) = args.session_token.clone() {
        overrides = overrides.with_session_token(token);
    }
    if let Some(ms) = args.timeout_ms {
        overrides = overrides.with_timeout_ms(ms);
    }
    if let Some(page_size) = args.page_size {
        overrides = overrides.with_page_size(page_size);
    }
    overrides
}

/// Interpret a command-line stream reference
///
/// Arguments that look like JSON (an object, array, quoted string or `null`)
/// are parsed; anything else is a raw stream id.
fn parse_reference(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    let looks_like_json = trimmed == "null"
        || trimmed.starts_with('{')
        || trimmed.starts_with('[')
        || trimmed.starts_with('"');

    if looks_like_json {
        serde_json::from_str(trimmed)
            .with_context(|| format!("Invalid JSON stream reference: {raw}"))
    } else {
        Ok(Value::String(raw.to_string()))
    }
}

/// Write one JSON line
fn emit<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

async fn run<C, W>(
    command: Command,
    accessor: &StreamAccessor,
    connection: &C,
    include_inactive_default: bool,
    out: &mut W,
) -> Result<()>
where
    C: Connection + ?Sized,
    W: Write,
{
    match command {
        Command::List {
            types,
            include_inactive,
            native,
        } => {
            let include_inactive = include_inactive || include_inactive_default;
            let listing = if types.is_empty() && !include_inactive {
                accessor.list_streams(connection).await?
            } else {
                accessor
                    .list_streams_of_types(connection, &types, include_inactive)
                    .await?
            };
            info!(count = listing.len(), "Listed streams");

            if native {
                for descriptor in listing.native() {
                    emit(out, descriptor)?;
                }
            } else {
                for record in listing.iter() {
                    emit(out, &record)?;
                }
            }
        }
        Command::Show { reference, native } => {
            let reference = parse_reference(&reference)?;
            if native {
                let descriptor = accessor.fetch_native_stream(connection, &reference).await?;
                emit(out, &descriptor)?;
            } else {
                let record = accessor.fetch_stream(connection, &reference).await?;
                emit(out, &record)?;
            }
        }
        Command::Classify { reference } => {
            let reference = parse_reference(&reference)?;
            let stream_id = resolve_identifier(&reference)?;
            let stream_type = accessor.classify(connection, &reference).await?;
            emit(out, &json!({ "stream-id": stream_id, "type": stream_type }))?;
        }
        Command::Members { reference } => {
            let reference = parse_reference(&reference)?;
            let members = accessor.list_stream_members(connection, &reference).await?;
            info!(count = members.len(), "Listed members");
            for user in members.iter() {
                emit(out, &user)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let mut config =
        load_config_from_path(args.config.clone()).context("Failed to load configuration")?;

    overrides(&args).apply(&mut config);
    config.validate().context("Invalid configuration")?;

    debug!(config = ?config, "Configuration resolved");
    info!(pod = %config.pod_url, source = %config.source(), "Using pod");

    let connection = PodConnection::new(&config).context("Failed to create pod connection")?;
    let accessor = StreamAccessor::new();

    let mut out = io::stdout().lock();
    run(
        args.command,
        &accessor,
        &connection,
        config.include_inactive,
        &mut out,
    )
    .await
}
