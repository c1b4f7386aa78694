use panel_proto::config::ServerConfig;
use panel_proto::protocol::{PlayReply, Sound, StatusReply, StopReply};
use thiserror::Error;

/// Any way a call to the sound server can fail.  Malformed response bodies
/// surface through [`ClientError::Transport`] (reqwest decode errors) and
/// are handled exactly like a dead connection — the next tick retries.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
}

/// Thin wrapper around the sound server's HTTP API.
///
/// No retries in here: every caller is a fixed-cadence loop (or a
/// user command) that simply tries again on its next tick.
pub struct SoundClient {
    http: reqwest::Client,
    base_url: String,
}

impl SoundClient {
    pub fn new(server: &ServerConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(server.request_timeout())
            .timeout(server.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: server.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_ok(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }
        Ok(resp)
    }

    /// Full catalog from `GET /api/sounds`.
    pub async fn fetch_catalog(&self) -> Result<Vec<Sound>, ClientError> {
        Ok(self.get_ok("/api/sounds").await?.json().await?)
    }

    /// Liveness probe.  Same endpoint as the catalog, payload discarded —
    /// reachability is the only question here.
    pub async fn probe(&self) -> Result<(), ClientError> {
        self.get_ok("/api/sounds").await.map(|_| ())
    }

    /// Playing flag of one sound from `GET /api/status/{id}`.
    pub async fn fetch_status(&self, id: u64) -> Result<bool, ClientError> {
        let reply: StatusReply = self
            .get_ok(&format!("/api/status/{id}"))
            .await?
            .json()
            .await?;
        Ok(reply.is_playing)
    }

    /// Toggle one sound via `GET /api/play/{id}`; the server reports which
    /// way the toggle went.
    pub async fn toggle(&self, id: u64) -> Result<PlayReply, ClientError> {
        Ok(self.get_ok(&format!("/api/play/{id}")).await?.json().await?)
    }

    /// `POST /api/stop` — stop every sound.
    pub async fn stop_all(&self) -> Result<StopReply, ClientError> {
        let resp = self
            .http
            .post(format!("{}/api/stop", self.base_url))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }
}
