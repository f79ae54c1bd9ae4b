//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use ledgercast_core::{transaction::seeded_dataset, MockTransactionSource};
use ledgercast_web::{AppState, BroadcastConfig, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long, env = "LEDGERCAST_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "LEDGERCAST_PORT", default_value = "8000")]
    pub port: u16,

    /// Seconds between transaction pushes
    #[arg(long, env = "LEDGERCAST_TICK_SECS", default_value = "5")]
    pub tick_secs: u64,

    /// Seconds before a stalled client send is abandoned
    #[arg(long, env = "LEDGERCAST_SEND_TIMEOUT_SECS", default_value = "10")]
    pub send_timeout_secs: u64,

    /// Comma-separated origins allowed to connect (default: any)
    #[arg(long, env = "LEDGERCAST_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file used with --log
    #[arg(long, default_value = "ledgercast.log")]
    pub log_file: PathBuf,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            allowed_origins: self
                .allowed_origins
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        }
    }
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let broadcast = BroadcastConfig::from_secs(args.tick_secs, args.send_timeout_secs)?;
    let config = args.server_config();

    println!();
    println!(
        "  {} {}",
        "Ledgercast".cyan().bold(),
        "Transaction Server".bold()
    );
    println!();
    println!(
        "  {}  ws://{}:{}/ws",
        "WebSocket".green(),
        config.host,
        config.port
    );
    println!(
        "  {}        http://{}:{}/api",
        "API".green(),
        config.host,
        config.port
    );
    println!("  {}       every {}s", "Push".green(), args.tick_secs);
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    let state = AppState::new(seeded_dataset(), broadcast);
    let source = Arc::new(MockTransactionSource::default());
    ledgercast_web::run_server(config, state, source).await?;

    Ok(())
}
