//! The `switchboard` binary: serve the gateway, mint the Gmail token, or
//! inspect the registered tool surface.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use switchboard_gmail::GmailConfig;
use switchboard_server::{build_registry, server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "switchboard", about = "Switchboard — Gmail/Jira/Slack tool gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
    /// Gmail credential management
    Gmail {
        #[command(subcommand)]
        action: GmailAction,
    },
    /// Inspect registered tools
    Tools {
        #[command(subcommand)]
        action: ToolsAction,
    },
}

#[derive(Subcommand)]
enum GmailAction {
    /// Run the interactive consent flow and write the token store
    Auth,
}

#[derive(Subcommand)]
enum ToolsAction {
    /// List registered tools
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { host, port } => {
            let registry = Arc::new(build_registry()?);
            let router = server::build_router(registry);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(addr = %addr, "Switchboard listening");
            axum::serve(listener, router).await?;
        }
        Commands::Gmail { action: GmailAction::Auth } => {
            let config = GmailConfig::from_env();
            let credentials_path = config.credentials_path.clone().ok_or_else(|| {
                anyhow::anyhow!("GMAIL_CREDENTIALS_JSON is not set; nothing to authorize")
            })?;
            let token = switchboard_gmail::flow::run_consent_flow(&credentials_path).await?;
            switchboard_gmail::auth::save_token(&config, &token).await?;
            println!("Wrote {}", config.token_path.display());
        }
        Commands::Tools { action: ToolsAction::List } => {
            let registry = build_registry()?;
            for descriptor in registry.descriptors() {
                println!("{:<24} {}", descriptor.name, descriptor.description);
            }
        }
    }
    Ok(())
}
