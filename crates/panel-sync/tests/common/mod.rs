//! In-process stand-in for a SoundByte server, scriptable from tests.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use panel_proto::protocol::Sound;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct ServerState {
    pub sounds: Mutex<Vec<Sound>>,
    pub playing: Mutex<HashSet<u64>>,
    /// Every endpoint answers 500 while set — a full outage.
    pub offline: AtomicBool,
    /// Only the per-sound status endpoint fails while set.
    pub status_broken: AtomicBool,
}

pub struct MockServer {
    pub state: Arc<ServerState>,
    pub addr: SocketAddr,
}

impl MockServer {
    pub async fn start(sounds: Vec<Sound>) -> Self {
        let state = Arc::new(ServerState {
            sounds: Mutex::new(sounds),
            ..ServerState::default()
        });

        let app = Router::new()
            .route("/api/sounds", get(list_sounds))
            .route("/api/status/:id", get(sound_status))
            .route("/api/play/:id", get(play_sound))
            .route("/api/stop", post(stop_all))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { state, addr }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub async fn set_playing(&self, id: u64, playing: bool) {
        let mut set = self.state.playing.lock().await;
        if playing {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    pub async fn set_sounds(&self, sounds: Vec<Sound>) {
        *self.state.sounds.lock().await = sounds;
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_status_broken(&self, broken: bool) {
        self.state.status_broken.store(broken, Ordering::SeqCst);
    }
}

pub fn sound(id: u64, name: &str) -> Sound {
    Sound {
        id,
        name: name.to_string(),
        short_name: None,
        color: None,
        text_color: None,
    }
}

async fn list_sounds(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<Vec<Sound>>, StatusCode> {
    if state.offline.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(state.sounds.lock().await.clone()))
}

async fn sound_status(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    if state.offline.load(Ordering::SeqCst) || state.status_broken.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let playing = state.playing.lock().await.contains(&id);
    Ok(Json(json!({ "isPlaying": playing })))
}

async fn play_sound(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    if state.offline.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let name = {
        let sounds = state.sounds.lock().await;
        match sounds.iter().find(|s| s.id == id) {
            Some(s) => s.name.clone(),
            None => {
                return Ok(Json(json!({ "success": false, "message": "unknown sound" })));
            }
        }
    };
    let mut playing = state.playing.lock().await;
    let action = if playing.contains(&id) {
        playing.remove(&id);
        "stopped"
    } else {
        playing.insert(id);
        "playing"
    };
    Ok(Json(json!({ "success": true, "action": action, "name": name })))
}

async fn stop_all(State(state): State<Arc<ServerState>>) -> Result<Json<Value>, StatusCode> {
    if state.offline.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    state.playing.lock().await.clear();
    Ok(Json(json!({ "success": true })))
}
