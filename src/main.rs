mod api;
mod config;
mod datastore;
mod log;
mod model;

use dotenv::dotenv;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tracing::{error, event, info, Level};
use tracing_subscriber::EnvFilter;

use api::{Server, ServerConfig};
use config::{Config, StorageConfig};
use datastore::{MemoryTaskStore, SqliteTaskStore, TaskDataStore};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    let env_filter = EnvFilter::try_from_env(log::LOG_ENV);
    log::setup(env_filter, config.log.as_ref())?;

    event!(Level::INFO, "Starting tasklist: {}", env!("CARGO_PKG_VERSION"));

    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, term.clone())?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, term.clone())?;

    let server_config = ServerConfig {
        host: config.listen.host(),
        port: config.listen.port,
    };
    let runtime = api::build_runtime()?;

    let result = match &config.storage {
        StorageConfig::Memory => {
            runtime.block_on(serve(server_config, MemoryTaskStore::new(), term))
        }
        StorageConfig::Sqlite { path } => match SqliteTaskStore::open(path) {
            Ok(datastore) => runtime.block_on(serve(server_config, datastore, term)),
            Err(err) => {
                error!(reason = %err, path = %path.display(), "Unable to open task database.");
                Err(err.into())
            }
        },
    };

    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn serve<D: TaskDataStore>(
    config: ServerConfig,
    datastore: D,
    term: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let server = Server::new(config, Arc::new(datastore));
    server.start(wait_for_termination(term)).await
}

async fn wait_for_termination(term: Arc<AtomicBool>) {
    while !term.load(Ordering::Acquire) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    info!("Termination requested, draining connections...");
}

#[cfg(test)]
mod e2e_tests;
