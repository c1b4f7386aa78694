use panel_proto::config::Config;
use panel_sync::engine::SyncEngine;
use tokio::sync::{broadcast, watch};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,panel_sync=debug")),
        )
        .init();

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    let engine = SyncEngine::new(config)?;
    let handle = engine.handle();

    // Stand-in for the control surface: re-read the snapshot on every
    // notification and log what a button panel would render.
    let mut updates = handle.subscribe();
    let sink = handle.clone();
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(msg) => {
                    let snap = sink.snapshot().await;
                    info!(
                        "{:?}: connected={} sounds={} playing={}/{} [{}]",
                        msg,
                        snap.connected,
                        snap.sounds.len(),
                        snap.playing_count(),
                        snap.sounds.len(),
                        snap.playing_names().join(", "),
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    info!("sink lagged, skipped {skipped} updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine_task = tokio::spawn(engine.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("ctrl-c received, shutting down");
    let _ = shutdown_tx.send(true);
    engine_task.await??;

    Ok(())
}
