//! SyncEngine — the polling core that mirrors the sound server.
//!
//! Three independently scheduled loops share one [`SnapshotStore`]:
//!
//! ```text
//!   connection loop (coarse)  ── probe ───────┐
//!   catalog loop    (fine)    ── full diff ───┼──▶ SnapshotStore ──▶ broadcast
//!   playback loop   (medium)  ── status sweep ┘        ▲
//!                                                      │
//!   PanelHandle commands (toggle / stop-all) ──────────┘
//! ```
//!
//! Every loop tick makes at most one store call and sends at most one
//! notification, and only when the tick actually changed the snapshot.
//! Each loop runs its tick body inline, so a tick can never overlap its
//! predecessor; backlogged ticks are skipped, never queued.

use std::sync::Arc;

use panel_proto::config::Config;
use panel_proto::protocol::SyncMessage;
use panel_proto::state::{catalog_changed, SnapshotStore};
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::{ClientError, SoundClient};
use crate::handle::PanelHandle;

/// Connection lifecycle during startup.
///
/// Transitions:
///   Disconnected -> Connecting -> Connected
///   Connecting -> Disconnected (connect failed; retried at the
///   connection cadence)
///
/// Once `Connected`, the supervisor hands connectivity over to the
/// connection loop, which tracks it as the snapshot's `connected` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Clone)]
pub struct SyncEngine {
    config: Config,
    client: Arc<SoundClient>,
    store: Arc<SnapshotStore>,
    notify_tx: broadcast::Sender<SyncMessage>,
}

impl SyncEngine {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let client = Arc::new(SoundClient::new(&config.server)?);
        let (notify_tx, _) = broadcast::channel(64);
        Ok(Self {
            config,
            client,
            store: Arc::new(SnapshotStore::new()),
            notify_tx,
        })
    }

    /// Consumer-facing handle: snapshot reads, notifications, commands.
    pub fn handle(&self) -> PanelHandle {
        PanelHandle::new(
            Arc::clone(&self.client),
            Arc::clone(&self.store),
            self.notify_tx.clone(),
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncMessage> {
        self.notify_tx.subscribe()
    }

    fn notify(&self, msg: SyncMessage) {
        // No receivers is fine — the surface may not have attached yet.
        let _ = self.notify_tx.send(msg);
    }

    /// Run until `shutdown` flips (or its sender goes away).
    ///
    /// Retries the connect sequence at the connection cadence until the
    /// server answers, then starts the three polling loops.  On shutdown
    /// every loop finishes its current tick body before exiting, so no
    /// half-applied tick is left behind.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        info!("sync engine starting against {}", self.client.base_url());

        let mut link = LinkState::Disconnected;
        let mut retry = interval(self.config.poll.connection_interval());
        retry.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while link != LinkState::Connected {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("shutdown before first connect");
                    return Ok(());
                }
                _ = retry.tick() => {
                    link = LinkState::Connecting;
                    match self.connect().await {
                        Ok(count) => {
                            info!("connected — found {count} sounds");
                            link = LinkState::Connected;
                        }
                        Err(e) => {
                            warn!("connect failed: {e}");
                            link = LinkState::Disconnected;
                        }
                    }
                }
            }
        }

        let connection = tokio::spawn(self.clone().connection_loop(shutdown.clone()));
        let catalog = tokio::spawn(self.clone().catalog_loop(shutdown.clone()));
        let playback = tokio::spawn(self.playback_loop(shutdown));

        let _ = connection.await;
        let _ = catalog.await;
        let _ = playback.await;
        info!("sync engine stopped");
        Ok(())
    }

    /// Startup sequence: catalog, connectivity flag, one priming playback
    /// pass, then a single notification.  Only this path ever clears the
    /// snapshot; transient loss after a successful connect keeps stale
    /// data visible.
    async fn connect(&self) -> Result<usize, ClientError> {
        match self.client.fetch_catalog().await {
            Err(e) => {
                if self.store.clear_disconnected().await {
                    self.notify(SyncMessage::ConnectivityChanged(false));
                }
                Err(e)
            }
            Ok(catalog) => {
                let count = catalog.len();
                let old = self.store.snapshot().await.sounds;
                if catalog_changed(&old, &catalog) {
                    self.store.replace_catalog(catalog).await;
                }
                self.store.set_connected(true).await;
                // Prime playback before announcing, so the first render
                // does not flash an all-stopped panel.
                self.playback_pass().await;
                self.notify(SyncMessage::ConnectivityChanged(true));
                Ok(count)
            }
        }
    }

    /// One full status sweep over the current catalog, fanned out
    /// concurrently.  A failed probe reads as "not playing".  Returns true
    /// when any flag changed.
    async fn playback_pass(&self) -> bool {
        let sounds = self.store.snapshot().await.sounds;
        if sounds.is_empty() {
            return false;
        }
        let probes = sounds.iter().map(|s| {
            let client = Arc::clone(&self.client);
            let id = s.id;
            async move {
                match client.fetch_status(id).await {
                    Ok(playing) => (id, playing),
                    Err(e) => {
                        debug!("status for sound {id} failed ({e}), treating as stopped");
                        (id, false)
                    }
                }
            }
        });
        let readings = futures_util::future::join_all(probes).await;
        self.store.apply_playback(&readings).await
    }

    /// Coarse liveness probe.  Keeps running while disconnected — this is
    /// the recovery path after transient loss.
    async fn connection_loop(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.poll.connection_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    let up = self.client.probe().await.is_ok();
                    if self.store.set_connected(up).await {
                        if up {
                            info!("server reachable again");
                        } else {
                            warn!("lost contact with server");
                        }
                        self.notify(SyncMessage::ConnectivityChanged(up));
                    }
                }
            }
        }
    }

    /// Fine-grained catalog diff.  The connection loop owns connectivity;
    /// fetch failures here are not a signal.
    async fn catalog_loop(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.poll.catalog_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    if !self.store.snapshot().await.connected {
                        continue;
                    }
                    match self.client.fetch_catalog().await {
                        Ok(new) => {
                            let old = self.store.snapshot().await.sounds;
                            if catalog_changed(&old, &new) {
                                info!("catalog changed: {} -> {} sounds", old.len(), new.len());
                                self.store.replace_catalog(new).await;
                                self.notify(SyncMessage::CatalogReplaced);
                            }
                        }
                        Err(e) => debug!("catalog poll failed: {e}"),
                    }
                }
            }
        }
    }

    /// Per-sound status sweep, the most expensive loop (one request per
    /// sound per tick).
    async fn playback_loop(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.poll.playback_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    if !self.store.snapshot().await.connected {
                        continue;
                    }
                    if self.playback_pass().await {
                        self.notify(SyncMessage::PlaybackChanged);
                    }
                }
            }
        }
    }
}
