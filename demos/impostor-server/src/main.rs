//! Runs the Impostor Protocol backend.
//!
//! ```text
//! PORT=9000 RUST_LOG=debug cargo run -p impostor-server
//! ```
//!
//! Rooms live in memory and are gone when the process exits.

use std::process::ExitCode;
use std::sync::Arc;

use impostor::{ImpostorError, ImpostorServerBuilder, ServerConfig};
use impostor_store::MemoryStore;
use impostor_words::{WordTable, topic_names};

#[tokio::main]
async fn main() -> ExitCode {
    impostor::logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ImpostorError> {
    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        topics = ?topic_names().collect::<Vec<_>>(),
        "starting impostor server"
    );

    let server = ImpostorServerBuilder::new()
        .config(config)
        .build(Arc::new(MemoryStore::new()), WordTable::new())
        .await?;
    tracing::info!(addr = %server.local_addr()?, "ready for players");
    server.run().await
}
