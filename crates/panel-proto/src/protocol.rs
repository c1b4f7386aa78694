use serde::{Deserialize, Serialize};

/// One catalog entry as reported by the sound server.
///
/// Identity is `id`; the server may re-send the full list at any time and
/// entries are never patched in place.  Equality covers every field the
/// server can change, which is exactly what the catalog diff looks at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sound {
    pub id: u64,
    pub name: String,
    /// Short label for small buttons; falls back to `name` when absent.
    #[serde(rename = "shortName", default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// Styling hints, opaque to the sync layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "textColor", default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

impl Sound {
    /// Label to render on a button face.
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

/// Response body of `GET /api/status/{id}`.
///
/// Servers have been observed to omit `isPlaying` entirely for sounds that
/// never played; a missing field means "not playing".
#[derive(Debug, Clone, Deserialize)]
pub struct StatusReply {
    #[serde(rename = "isPlaying", default)]
    pub is_playing: bool,
}

/// What `GET /api/play/{id}` did — the endpoint is a toggle, so the server
/// reports which way it went.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayAction {
    Playing,
    Stopped,
}

/// Response body of `GET /api/play/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayReply {
    pub success: bool,
    #[serde(default)]
    pub action: Option<PlayAction>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body of `POST /api/stop`.
#[derive(Debug, Clone, Deserialize)]
pub struct StopReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Change notifications broadcast to consumers (the control-surface UI).
///
/// A message means "something in the snapshot changed, pull it again" — the
/// variant only tells the consumer which category of state moved.  The sync
/// engine sends at most one message per loop tick, and only when a tick
/// actually changed the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// The server became reachable/unreachable.
    ConnectivityChanged(bool),
    /// The catalog was replaced (membership or per-sound fields differ).
    CatalogReplaced,
    /// One or more per-sound playing flags changed.
    PlaybackChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_decodes_optional_fields() {
        let full: Sound = serde_json::from_str(
            r##"{"id":3,"name":"Air Horn","shortName":"Horn","color":"#ff0000","textColor":"#ffffff"}"##,
        )
        .unwrap();
        assert_eq!(full.id, 3);
        assert_eq!(full.display_name(), "Horn");
        assert_eq!(full.color.as_deref(), Some("#ff0000"));

        let bare: Sound = serde_json::from_str(r#"{"id":1,"name":"Boom"}"#).unwrap();
        assert_eq!(bare.display_name(), "Boom");
        assert!(bare.short_name.is_none());
        assert!(bare.color.is_none() && bare.text_color.is_none());
    }

    #[test]
    fn test_status_reply_missing_field_is_not_playing() {
        let reply: StatusReply = serde_json::from_str("{}").unwrap();
        assert!(!reply.is_playing);

        let reply: StatusReply = serde_json::from_str(r#"{"isPlaying":true}"#).unwrap();
        assert!(reply.is_playing);
    }

    #[test]
    fn test_play_reply_action_words() {
        let reply: PlayReply =
            serde_json::from_str(r#"{"success":true,"action":"playing","name":"Boom"}"#).unwrap();
        assert!(reply.success);
        assert_eq!(reply.action, Some(PlayAction::Playing));
        assert_eq!(reply.name.as_deref(), Some("Boom"));

        let reply: PlayReply =
            serde_json::from_str(r#"{"success":false,"message":"unknown sound"}"#).unwrap();
        assert!(!reply.success);
        assert!(reply.action.is_none());
    }
}
