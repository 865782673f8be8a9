use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub link: String,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub disliked: bool,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn same_as(&self, other: &Track) -> bool {
        self.link == other.link
    }
}

/// Whether the player currently accepts next/previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Controls {
    #[serde(default)]
    pub next: bool,
    #[serde(default)]
    pub prev: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum PlayerEvent {
    InitControls {
        current_track: Option<Track>,
        #[serde(default)]
        controls: Controls,
    },
    ChangeControls {
        current_track: Option<Track>,
        #[serde(default)]
        controls: Controls,
    },
    ChangeState {
        is_playing: bool,
        current_track: Option<Track>,
    },
    ChangePlaylist {
        current_track: Option<Track>,
        #[serde(default)]
        playlist: Vec<Track>,
    },
}

impl PlayerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitControls { .. } => "initControls",
            Self::ChangeControls { .. } => "changeControls",
            Self::ChangeState { .. } => "changeState",
            Self::ChangePlaylist { .. } => "changePlaylist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerCommand {
    ToggleLike,
    ToggleDislike,
    TogglePause,
    Next,
    Prev,
}

/// Screen rectangle in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_change_state_payload() {
        let raw = r#"{"event":"changeState","payload":{"isPlaying":true,"currentTrack":{"title":"Song","artists":[{"title":"A"},{"title":"B"}],"link":"/track/1","liked":true}}}"#;
        let event: PlayerEvent = serde_json::from_str(raw).expect("parse");

        let PlayerEvent::ChangeState {
            is_playing,
            current_track: Some(track),
        } = event
        else {
            panic!("unexpected event");
        };
        assert!(is_playing);
        assert!(track.liked);
        assert!(!track.disliked);
        assert_eq!(track.artist_names(), "A, B");
    }

    #[test]
    fn missing_current_track_means_none() {
        let raw = r#"{"event":"changePlaylist","payload":{"currentTrack":null}}"#;
        let event: PlayerEvent = serde_json::from_str(raw).expect("parse");
        assert_eq!(
            event,
            PlayerEvent::ChangePlaylist {
                current_track: None,
                playlist: Vec::new(),
            }
        );
        assert_eq!(event.name(), "changePlaylist");
    }

    #[test]
    fn player_commands_use_camel_case_wire_names() {
        let json = serde_json::to_string(&PlayerCommand::ToggleDislike).expect("json");
        assert_eq!(json, "\"toggleDislike\"");
    }
}
