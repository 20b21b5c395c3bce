//! Dayline CLI
//!
//! Command-line tools for the dayline sync server.
//!
//! # Commands
//!
//! - `serve` - Run the HTTP sync server
//! - `migrate` - Create or upgrade the database schema
//! - `token` - Issue a bearer token for an owner
//! - `snapshot` / `delta` / `push` - Run sync operations against a database file
//! - `inspect` - Display row counts per table

mod commands;
mod error;

use clap::{Parser, Subcommand};
use dayline_sync_server::ServerConfig;
use error::{CliError, CliResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Dayline sync server and database tools.
#[derive(Parser)]
#[command(name = "dayline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database file
    #[arg(global = true, short, long, env = "DAYLINE_DB")]
    db: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP sync server
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "DAYLINE_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Secret for signing and checking bearer tokens
        #[arg(long, env = "DAYLINE_AUTH_SECRET", hide_env_values = true)]
        auth_secret: Option<String>,

        /// Reject requests without a valid bearer token
        #[arg(long, env = "DAYLINE_REQUIRE_AUTH")]
        require_auth: bool,

        /// Maximum items per push request
        #[arg(long, default_value_t = dayline_sync_engine::DEFAULT_MAX_PUSH_BATCH)]
        max_push_batch: usize,

        /// Timeout in seconds for snapshot, delta and status requests
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Report unreadable buckets instead of failing reads
        #[arg(long)]
        tolerate_bucket_failures: bool,
    },

    /// Create or upgrade the database schema
    Migrate,

    /// Issue a bearer token
    Token {
        /// Owner id (a new one is generated if omitted)
        #[arg(short, long)]
        owner: Option<String>,

        /// Secret the server validates tokens with
        #[arg(long, env = "DAYLINE_AUTH_SECRET", hide_env_values = true)]
        auth_secret: String,

        /// Token lifetime in days
        #[arg(long, default_value_t = 30)]
        expiry_days: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print an owner's complete state
    Snapshot {
        /// Owner id
        #[arg(short, long)]
        owner: String,
    },

    /// Print an owner's changes since a cursor
    Delta {
        /// Owner id
        #[arg(short, long)]
        owner: String,

        /// Cursor from a previous read (RFC 3339)
        #[arg(short, long)]
        since: Option<String>,
    },

    /// Apply a push request read from a file or stdin
    Push {
        /// Owner id
        #[arg(short, long)]
        owner: String,

        /// JSON file holding `{"items": [...]}`
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Display row counts per table
    Inspect {
        /// Limit counts to one owner
        #[arg(short, long)]
        owner: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(cli)?;
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    let db = cli.db;
    let require_db = |command: &'static str| db.clone().ok_or(CliError::DatabaseRequired(command));

    match cli.command {
        Commands::Serve {
            bind,
            auth_secret,
            require_auth,
            max_push_batch,
            timeout,
            tolerate_bucket_failures,
        } => {
            let mut config = ServerConfig::new(bind)
                .with_max_push_batch(max_push_batch)
                .with_request_timeout(Duration::from_secs(timeout))
                .with_tolerate_bucket_failures(tolerate_bucket_failures);
            if let Some(path) = db.clone() {
                config = config.with_database_path(path);
            }
            if let Some(secret) = auth_secret {
                config = config.with_auth(secret.into_bytes());
                config.require_auth = require_auth;
            } else if require_auth {
                return Err(CliError::InvalidArgument(
                    "--require-auth needs --auth-secret or DAYLINE_AUTH_SECRET".into(),
                ));
            }
            commands::serve::run(config)
        }
        Commands::Migrate => commands::migrate::run(&require_db("migrate")?),
        Commands::Token {
            owner,
            auth_secret,
            expiry_days,
            format,
        } => commands::token::run(
            &auth_secret,
            owner.as_deref(),
            Duration::from_secs(expiry_days * 24 * 60 * 60),
            &format,
        ),
        Commands::Snapshot { owner } => commands::snapshot::run(&require_db("snapshot")?, &owner),
        Commands::Delta { owner, since } => {
            commands::delta::run(&require_db("delta")?, &owner, since.as_deref())
        }
        Commands::Push { owner, file } => {
            commands::push::run(&require_db("push")?, &owner, file.as_deref())
        }
        Commands::Inspect { owner, format } => {
            commands::inspect::run(&require_db("inspect")?, owner.as_deref(), &format)
        }
        Commands::Version => {
            println!("Dayline CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Schema version {}", dayline_store::CURRENT_VERSION);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_push_arguments() {
        let cli = Cli::parse_from(["dayline", "--db", "day.db", "push", "--owner", "abc", "-f", "in.json"]);
        assert_eq!(cli.db, Some(PathBuf::from("day.db")));
        match cli.command {
            Commands::Push { owner, file } => {
                assert_eq!(owner, "abc");
                assert_eq!(file, Some(PathBuf::from("in.json")));
            }
            _ => panic!("expected push"),
        }
    }

    #[test]
    fn commands_need_a_database() {
        let cli = Cli::parse_from(["dayline", "snapshot", "--owner", "abc"]);
        if std::env::var_os("DAYLINE_DB").is_none() {
            let err = run(cli).unwrap_err();
            assert!(matches!(err, CliError::DatabaseRequired("snapshot")));
        }
    }
}
