use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;

use pulsedb::api::rest::RestApi;
use pulsedb::config::load_config;
use pulsedb::error::PulseError;
use pulsedb::protocol::Reconciler;
use pulsedb::store::{FileStore, RecordStore};

#[tokio::main]
async fn main() -> Result<(), PulseError> {
    let config = load_config(Path::new("config.yaml"))?;

    println!("Starting PulseDB with storage path: {}", config.storage.path);

    let store: Arc<dyn RecordStore> = Arc::new(FileStore::new(&config.storage.path)?);
    let reconciler = Arc::new(Reconciler::new());
    let api = RestApi::new(reconciler, Arc::clone(&store));

    println!("Starting server on {}:{}", config.api.host, config.api.port);

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port)
        .parse()
        .map_err(|e| PulseError::Io(format!("Invalid listen address: {}", e)))?;

    // Create a channel for shutdown signal
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let routes = api.routes();
    let (_, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async move {
        shutdown_rx.await.ok();
        println!("Shutting down server...");
    });

    let server_handle = tokio::spawn(server);

    // Wait for Ctrl+C
    signal::ctrl_c().await?;
    println!("Ctrl+C received, starting graceful shutdown");

    shutdown_tx.send(()).ok();

    server_handle
        .await
        .map_err(|e| PulseError::Io(e.to_string()))?;

    println!("Server shutdown complete");
    Ok(())
}
