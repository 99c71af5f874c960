mod cli;

use std::sync::Arc;

use crate::cli::CLI;
use clap::Parser;
use linkdir_core::DocumentStore;
use linkdir_directory::{DirectoryConfig, DirectoryService};
use linkdir_gateway::{App, AppState};
use linkdir_storage::{FileSystemStore, Seed, Store};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    linkdir_telemetry::init(config.log_format.into())?;

    info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        mode = %config.mode,
        rename_policy = %config.rename_policy,
        read_policy = %config.read_policy,
        "starting link directory"
    );

    let backend = FileSystemStore::open(&config.data_dir).await?;
    let store = Store::new(
        Arc::new(backend) as Arc<dyn DocumentStore>,
        config.read_policy.into(),
    );
    let directory = DirectoryService::new(
        store,
        DirectoryConfig::builder()
            .rename_policy(config.rename_policy.into())
            .build(),
    );

    let seed = match &config.seed_dir {
        Some(dir) => Seed::from_dir(dir).await?,
        None => Seed::empty(),
    };
    directory.bootstrap(&seed).await?;

    let app = App::router(AppState::new(Arc::new(directory), seed, config.mode.into()));
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
