//! membergate — session and credential lifecycle service for the member
//! CRM backend.
//!
//! The CRM's lead and dashboard layers are external collaborators: they
//! call into this service only to obtain an authenticated principal. All
//! protocol state (refresh-token records, revoked history) lives here.

mod auth;
mod config;
mod gateway;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "membergate", version, about = "Session and credential lifecycle service")]
struct Cli {
    /// Path to the config file (defaults to ./membergate.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (the default).
    Serve {
        /// Bind host (overrides config).
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the bootstrap admin account. Runs out of band, once per
    /// deployment; every later account is created by this admin over HTTP.
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            gateway::run_gateway(&host, port, config).await
        }
        Command::CreateAdmin {
            username,
            email,
            password,
            full_name,
        } => {
            std::fs::create_dir_all(&config.workspace_dir)?;
            let store = Arc::new(auth::SessionStore::open(&config.db_path())?);
            let codec = auth::TokenCodec::new(
                &config.auth.token_secret,
                config.auth.access_ttl_secs,
            );
            let service =
                auth::AuthService::new(store, codec, config.auth.refresh_ttl_secs);

            match service.create_admin(&username, &email, &password, full_name.as_deref()) {
                Ok(admin) => {
                    println!("✔ Admin account created: {} <{}>", admin.username, admin.email);
                    Ok(())
                }
                Err(e) => anyhow::bail!("admin creation failed: {e}"),
            }
        }
    }
}
