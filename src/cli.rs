use crate::logging::ApplicationMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_ABOUT: &str = r#"
Taskdeck - personal task lists behind a login

Every account sees only its own tasks. Run `taskdeck serve` to start the web app
and JSON API, or `taskdeck migrate` to prepare the database ahead of a deploy.

Configuration is read from the environment:
  TASKDECK_DATABASE_URL       sqlite://taskdeck.db
  TASKDECK_STORE_KEY          required for serve, at least 16 characters
  TASKDECK_PUBLIC_URL         http://127.0.0.1:3030
  TASKDECK_DISABLE_INDEXING   false
  TASKDECK_SESSION_TTL_HOURS  168
  TASKDECK_LOG_LEVEL          info
  TASKDECK_LOG_JSON           false
"#;

#[derive(Parser, Clone, Debug)]
#[command(name = "taskdeck")]
#[command(about = "Multi-user task lists with sessions and per-account data isolation")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output (-q)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write logs to a daily-rotated file instead of stdout
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Days to keep rotated log files next to --log-file
    #[arg(long, default_value_t = 7, global = true)]
    pub log_retention_days: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run the web app and JSON API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 3030)]
        port: u16,
    },

    /// Create or upgrade the database schema, then exit
    Migrate,

    /// Delete expired sessions, then exit
    PurgeSessions,
}

impl Cli {
    /// True when any logging flag was given on the command line.
    pub fn has_log_flags(&self) -> bool {
        self.verbose > 0 || self.quiet || self.json
    }

    /// Logging preset for the chosen subcommand.
    pub fn application_mode(&self) -> ApplicationMode {
        match self.command {
            Commands::Serve { .. } => ApplicationMode::Server,
            Commands::Migrate | Commands::PurgeSessions => ApplicationMode::Cli,
        }
    }
}
