use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use taskdeck::auth::AuthService;
use taskdeck::cli::{Cli, Commands};
use taskdeck::config::AppConfig;
use taskdeck::db::{create_pool, run_migrations};
use taskdeck::logging::{cleanup_old_logs, init_logging, LoggingConfig};
use taskdeck::web::server::WebServer;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Command-line flags win over TASKDECK_LOG_* for this run
    let mut log_config = if cli.has_log_flags() {
        LoggingConfig::from_args(cli.quiet, cli.verbose > 0, cli.json)
    } else {
        LoggingConfig::from_env(cli.application_mode())
    };
    log_config.file_output = cli.log_file.clone();

    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Some(dir) = cli.log_file.as_deref().and_then(|f| f.parent()) {
        if let Err(e) = cleanup_old_logs(dir, cli.log_retention_days) {
            tracing::warn!("Failed to clean up old logs: {}", e);
        }
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Serve { host, port } => {
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("Invalid listen address {}:{}", host, port))?;
            WebServer::new(addr, config).run().await?;
        },

        Commands::Migrate => {
            let db_path = config.database_path();
            let pool = create_pool(&db_path)
                .await
                .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            println!("Database ready at {}", db_path.display());
        },

        Commands::PurgeSessions => {
            let store_key = config.require_store_key()?.to_string();
            let db_path = config.database_path();
            let pool = create_pool(&db_path)
                .await
                .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            let auth = AuthService::new(pool, store_key, config.session_ttl);
            let purged = auth
                .purge_expired_sessions()
                .await
                .context("Failed to purge sessions")?;
            println!("Removed {} expired session(s)", purged);
        },
    }

    Ok(())
}
