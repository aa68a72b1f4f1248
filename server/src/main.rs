use std::sync::Arc;

use clap::Parser;
use common::config::{ConfigManager, FileContentConfigProvider, Validate};
use common::games::side_stacker::MoveSelectors;
use common::games::side_stacker::bot::AdvisoryClient;
use common::logger;
use tracing::{error, info, warn};

use side_stacker_server::advisory_client::GeminiClient;
use side_stacker_server::broadcaster::Broadcaster;
use side_stacker_server::cleanup_task::CleanupTask;
use side_stacker_server::room_manager::RoomManager;
use side_stacker_server::server_config::ServerConfig;
use side_stacker_server::store::{GameStore, MemoryStore};
use side_stacker_server::web_server::{WebServerState, run_web_server};

#[derive(Parser)]
#[command(name = "side_stacker_server", version)]
struct Args {
    /// YAML config file; defaults are used when it does not exist.
    #[arg(long, default_value = "side_stacker.yaml")]
    config: String,

    /// Overrides `listen_addr` from the config file.
    #[arg(long)]
    listen: Option<String>,

    #[arg(long)]
    log_prefix: Option<String>,

    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_logger(args.log_prefix, args.log_json);

    let config_manager: ConfigManager<FileContentConfigProvider, ServerConfig> =
        ConfigManager::from_yaml_file(&args.config);
    let mut config = config_manager.get_config()?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
        config.validate()?;
    }

    let gemini = GeminiClient::from_config(&config.advisory);
    if !gemini.has_api_key() {
        warn!(
            env = %config.advisory.api_key_env,
            "advisory API key not set, hard difficulty will play random moves"
        );
    }
    let advisory: Arc<dyn AdvisoryClient> = Arc::new(gemini);
    let selectors = MoveSelectors::new(advisory, config.advisory_timeout());

    let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
    let room_manager = RoomManager::new(config.clone(), store, Broadcaster::new(), selectors);

    let cleanup_task = CleanupTask::new(
        room_manager.clone(),
        config.cleanup_interval(),
        config.idle_timeout(),
    );
    tokio::spawn(async move {
        cleanup_task.run().await;
    });

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    };

    run_web_server(
        &config.listen_addr,
        config.static_dir.clone(),
        WebServerState { room_manager },
        shutdown_signal,
    )
    .await?;

    info!("server shut down gracefully");
    Ok(())
}
