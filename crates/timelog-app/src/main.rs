//! Timelog action binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Open the JSON record store
//! 3. Read hub events as JSON lines from stdin
//! 4. Write each reply event as a JSON line to stdout
//! 5. Save the record store, also when the stream fails
//!
//! Logs go to stderr so stdout carries only replies.

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use timelog_action::{ActionController, MemoryGateway, QueryGateway};
use timelog_core::config::PluginConfig;
use timelog_core::events::Event;

use cli::CliArgs;

/// Serve events until `reader` is exhausted. Returns the number of replies.
async fn run_event_loop<G, R, W>(
    controller: &ActionController<G>,
    reader: R,
    mut writer: W,
) -> std::io::Result<usize>
where
    G: QueryGateway,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut replies = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let event: Event = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed event");
                continue;
            }
        };
        tracing::debug!(event_id = %event.id, topic = %event.topic, "Event received");

        let Some(data) = controller.handle(&event).await else {
            continue;
        };

        let reply = event.reply(data);
        let mut encoded = serde_json::to_vec(&reply)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        replies += 1;
    }

    Ok(replies)
}

/// Run the event loop, then write the store back even if the loop failed.
///
/// Commits acknowledged before a broken stream must still reach disk.
async fn serve<R, W>(
    controller: &ActionController<MemoryGateway>,
    store: &MemoryGateway,
    store_path: &Path,
    reader: R,
    writer: W,
) -> Result<usize, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let outcome = run_event_loop(controller, reader, writer).await;
    if let Err(ref e) = outcome {
        tracing::error!(error = %e, "Event stream failed");
    }
    store.save(store_path)?;
    Ok(outcome?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = PluginConfig::load_or_default(&config_file);

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting timelog-action v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Store.
    let store_path = args.resolve_store_path(&config.store.path);
    let store = if store_path.exists() {
        MemoryGateway::load(&store_path)?
    } else {
        tracing::warn!(path = %store_path.display(), "Record store not found, starting empty");
        MemoryGateway::new()
    };
    let store = Arc::new(store);

    let controller = ActionController::new(Arc::clone(&store), config.action.clone());
    for subscription in controller.subscriptions() {
        tracing::info!(subscription = %subscription, "Subscribed");
    }

    // Event loop.
    let stdin = BufReader::new(tokio::io::stdin());
    let replies = serve(
        &controller,
        &store,
        &store_path,
        stdin,
        tokio::io::stdout(),
    )
    .await?;
    tracing::info!(replies, "Event stream closed");
    Ok(())
}
