use std::sync::Arc;

use panel_proto::protocol::{PlayAction, SyncMessage};
use panel_proto::state::{Snapshot, SnapshotStore};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::client::SoundClient;

/// Cheaply cloneable consumer handle: snapshot reads, change
/// notifications, and the two user-triggered commands.
///
/// Commands never return errors.  A failed or refused command is logged
/// and the snapshot left untouched; the next playback pass reconciles
/// whatever the server actually did.
#[derive(Clone)]
pub struct PanelHandle {
    client: Arc<SoundClient>,
    store: Arc<SnapshotStore>,
    notify_tx: broadcast::Sender<SyncMessage>,
}

impl PanelHandle {
    pub(crate) fn new(
        client: Arc<SoundClient>,
        store: Arc<SnapshotStore>,
        notify_tx: broadcast::Sender<SyncMessage>,
    ) -> Self {
        Self {
            client,
            store,
            notify_tx,
        }
    }

    /// Read-only view of the current synchronized state.
    pub async fn snapshot(&self) -> Snapshot {
        self.store.snapshot().await
    }

    /// Change notifications; pull a fresh snapshot on every message.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncMessage> {
        self.notify_tx.subscribe()
    }

    /// Toggle one sound.  On a confirmed toggle the local flag flips
    /// immediately instead of waiting for the next playback tick.
    pub async fn toggle(&self, id: u64) {
        match self.client.toggle(id).await {
            Ok(reply) if reply.success => {
                let playing = reply.action == Some(PlayAction::Playing);
                info!(
                    "{} sound '{}'",
                    if playing { "playing" } else { "stopped" },
                    reply.name.as_deref().unwrap_or("?"),
                );
                if self.store.set_playing(id, playing).await {
                    let _ = self.notify_tx.send(SyncMessage::PlaybackChanged);
                }
            }
            Ok(reply) => {
                warn!(
                    "toggle of sound {id} refused: {}",
                    reply.message.as_deref().unwrap_or("no reason given"),
                );
            }
            Err(e) => warn!("toggle of sound {id} failed: {e}"),
        }
    }

    /// Stop every sound.
    pub async fn stop_all(&self) {
        match self.client.stop_all().await {
            Ok(reply) if reply.success => {
                info!("all sounds stopped");
                if self.store.stop_all_playing().await {
                    let _ = self.notify_tx.send(SyncMessage::PlaybackChanged);
                }
            }
            Ok(reply) => {
                warn!(
                    "stop-all refused: {}",
                    reply.message.as_deref().unwrap_or("no reason given"),
                );
            }
            Err(e) => warn!("stop-all failed: {e}"),
        }
    }
}
