use crate::protocol::Sound;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The synchronized view of the sound server.  `rev` is a monotonically
/// increasing counter incremented every time the snapshot changes; consumers
/// can use it to detect missed updates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub rev: u64,
    /// Whether the last connectivity probe succeeded.
    pub connected: bool,
    /// Server-reported catalog, order preserved as received.
    pub sounds: Vec<Sound>,
    /// Per-sound playing flag, keyed by `Sound.id`.  Keys always match the
    /// current catalog; a catalog replacement resets every flag to false.
    pub playing: HashMap<u64, bool>,
}

impl Snapshot {
    /// Playing flag for one sound; unknown ids read as not playing.
    pub fn is_playing(&self, id: u64) -> bool {
        self.playing.get(&id).copied().unwrap_or(false)
    }

    /// Number of sounds currently playing.
    pub fn playing_count(&self) -> usize {
        self.playing.values().filter(|p| **p).count()
    }

    pub fn any_playing(&self) -> bool {
        self.playing.values().any(|p| *p)
    }

    /// Display names of the currently playing sounds, in catalog order.
    pub fn playing_names(&self) -> Vec<&str> {
        self.sounds
            .iter()
            .filter(|s| self.is_playing(s.id))
            .map(|s| s.display_name())
            .collect()
    }
}

/// Pure catalog diff: true when the two lists describe different button sets.
///
/// Entries are matched by id; a matched pair counts as changed when any of
/// the server-controlled fields differ.  Order alone is not a change.
pub fn catalog_changed(old: &[Sound], new: &[Sound]) -> bool {
    if old.len() != new.len() {
        return true;
    }
    new.iter().any(|n| match old.iter().find(|o| o.id == n.id) {
        Some(o) => o != n,
        None => true,
    })
}

/// Owner of the live [`Snapshot`].
///
/// All mutation goes through these methods; each one reports whether it
/// actually changed anything so callers can notify consumers only on real
/// changes, and bumps `rev` only when it did.  Loop ticks make a single
/// store call per tick, so readers never observe a half-applied tick.
pub struct SnapshotStore {
    state: Arc<RwLock<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let state = Snapshot {
            rev: 1,
            ..Snapshot::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Clone of the current snapshot (the consumer-facing read).
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    /// Flip the connectivity flag.  Returns true when the value changed.
    pub async fn set_connected(&self, up: bool) -> bool {
        let mut state = self.state.write().await;
        if state.connected == up {
            return false;
        }
        state.connected = up;
        state.rev += 1;
        true
    }

    /// Replace the catalog, resetting every playing flag to false for the
    /// new id set.  Nothing is known about playback until the next status
    /// pass, and ids absent from the new catalog must not linger.
    pub async fn replace_catalog(&self, sounds: Vec<Sound>) {
        let mut state = self.state.write().await;
        state.playing = sounds.iter().map(|s| (s.id, false)).collect();
        state.sounds = sounds;
        state.rev += 1;
    }

    /// Apply one full playback pass.  Readings for ids no longer in the
    /// catalog are dropped (the catalog may have been replaced while the
    /// pass was in flight).  Returns true when any flag changed.
    pub async fn apply_playback(&self, readings: &[(u64, bool)]) -> bool {
        let mut state = self.state.write().await;
        let mut changed = false;
        for &(id, playing) in readings {
            if let Some(slot) = state.playing.get_mut(&id) {
                if *slot != playing {
                    *slot = playing;
                    changed = true;
                }
            }
        }
        if changed {
            state.rev += 1;
        }
        changed
    }

    /// Optimistic single-sound update after a confirmed toggle.  Unknown ids
    /// are ignored so the playing map never grows past the catalog.
    pub async fn set_playing(&self, id: u64, playing: bool) -> bool {
        let mut state = self.state.write().await;
        match state.playing.get_mut(&id) {
            Some(slot) if *slot != playing => {
                *slot = playing;
                state.rev += 1;
                true
            }
            _ => false,
        }
    }

    /// Mark every sound stopped (after a confirmed stop-all).
    pub async fn stop_all_playing(&self) -> bool {
        let mut state = self.state.write().await;
        let mut changed = false;
        for slot in state.playing.values_mut() {
            if *slot {
                *slot = false;
                changed = true;
            }
        }
        if changed {
            state.rev += 1;
        }
        changed
    }

    /// Failed-connect path: drop everything.  Transient connectivity loss
    /// after a successful connect must NOT come through here — stale data
    /// stays visible until the server answers again.
    pub async fn clear_disconnected(&self) -> bool {
        let mut state = self.state.write().await;
        let changed = state.connected || !state.sounds.is_empty() || !state.playing.is_empty();
        if changed {
            state.connected = false;
            state.sounds.clear();
            state.playing.clear();
            state.rev += 1;
        }
        changed
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
