use std::error::Error;

use clap::{Parser, Subcommand};
use devconnect_client::common::NetworkCommand;
use devconnect_client::config::{self, AppConfig, ConfigOverrides};
use devconnect_client::network::{ApiClient, ConnectionManager, NetworkClient};
use devconnect_client::store::AppStore;
use devconnect_client::sync::SyncCoordinator;
use devconnect_client::ui::ChatApp;
use dotenvy::dotenv;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "devconnect", version, about = "DevConnect desktop client")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// REST API base URL (overrides config and environment)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    /// Realtime server origin (overrides config and environment)
    #[arg(long, value_name = "URL")]
    socket_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the effective configuration to the config path and exit
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let flags = ConfigOverrides {
        api_url: cli.api_url,
        socket_url: cli.socket_url,
    };
    let app_config = config::resolve(&cli.config, ConfigOverrides::from_env(), flags)?;

    if let Some(Command::InitConfig) = cli.command {
        config::save_config(&cli.config, &app_config)?;
        log::info!("Wrote config to {}", cli.config);
        return Ok(());
    }

    run_client(app_config)
}

fn run_client(app_config: AppConfig) -> Result<(), Box<dyn Error>> {
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let api = ApiClient::new(&app_config.api_base_url, app_config.request_timeout())?;
    tokio::spawn(NetworkClient::new(api, event_tx, cmd_rx).run());

    let connections = ConnectionManager::new(
        &app_config.socket_url,
        app_config.reconnect_delay(),
        Handle::current(),
    )?;
    let coordinator = SyncCoordinator::new(AppStore::new(app_config.max_messages_per_conversation));

    // Resume a cookie session if there is one.
    cmd_tx.try_send(NetworkCommand::FetchProfile)?;

    log::info!(
        "Client started against {} (realtime {})",
        app_config.api_base_url,
        app_config.socket_url
    );

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "DevConnect",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ChatApp::new(
                cc,
                coordinator,
                connections,
                cmd_tx,
                event_rx,
            )))
        }),
    )?;
    Ok(())
}
