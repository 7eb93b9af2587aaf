mod host;
mod plugin;

use std::env;
use std::path::PathBuf;

use tempmail_apiok::{ApiOkConfig, DEFAULT_BASE_URL, DEFAULT_MAILBOX_TYPE};
use tracing::{error, info};

use crate::host::HostServer;
use crate::plugin::{PluginConfig, TempMailPlugin};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tempmail=info")),
        )
        .compact()
        .init();
}

fn load_api_config() -> Result<ApiOkConfig, String> {
    let api_key = env::var("TEMPMAIL_API_KEY")
        .map_err(|_| "TEMPMAIL_API_KEY env var not set".to_string())?;
    if api_key.trim().is_empty() {
        return Err("TEMPMAIL_API_KEY is empty".to_string());
    }

    let base_url = env::var("TEMPMAIL_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let mailbox_type =
        env::var("TEMPMAIL_MAILBOX_TYPE").unwrap_or_else(|_| DEFAULT_MAILBOX_TYPE.to_string());

    Ok(ApiOkConfig {
        api_key: api_key.trim().to_string(),
        base_url: base_url.trim_end_matches('/').to_string(),
        mailbox_type,
    })
}

fn data_dir() -> PathBuf {
    env::var("TEMPMAIL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".tempmail")
        })
}

async fn run_plugin() -> Result<(), Box<dyn std::error::Error>> {
    let api = match load_api_config() {
        Ok(cfg) => {
            info!(base = %cfg.base_url, "apiok configured");
            Some(cfg)
        }
        Err(e) => {
            info!("temp mail api not configured: {e}");
            None
        }
    };

    let plugin = TempMailPlugin::init(PluginConfig {
        api,
        data_dir: data_dir(),
    })
    .await?;

    let server = HostServer::new(plugin.service().clone());
    let served = server.run().await;
    plugin.shutdown().await;
    served
}

fn print_help() {
    eprintln!("tempmail-bot: temporary mailbox commands for chat bots");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  tempmail-bot run     Serve JSON-line events on stdin/stdout (default)");
    eprintln!("  tempmail-bot help    Show this help");
    eprintln!();
    eprintln!("Input lines:  {{\"origin\": \"<user>\", \"text\": \"<message>\"}}");
    eprintln!("Output lines: {{\"origin\": \"<user>\", \"text\": \"<reply>\"}}");
    eprintln!();
    eprintln!("Environment variables:");
    eprintln!("  TEMPMAIL_API_KEY       apiok.us API key (commands are disabled without it)");
    eprintln!("  TEMPMAIL_API_BASE      API base URL (default: {DEFAULT_BASE_URL})");
    eprintln!("  TEMPMAIL_MAILBOX_TYPE  Mailbox type for generation (default: {DEFAULT_MAILBOX_TYPE})");
    eprintln!("  TEMPMAIL_DATA_DIR      State directory (default: ~/.tempmail)");
    eprintln!("  RUST_LOG               Log level (default: tempmail=info)");
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("run");

    let result = match cmd {
        "run" => run_plugin().await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        unknown => {
            eprintln!("Unknown command: {unknown}");
            eprintln!("Run `tempmail-bot help` for usage");
            return;
        }
    };

    if let Err(e) = result {
        error!(%e, "fatal error");
        std::process::exit(1);
    }
}
