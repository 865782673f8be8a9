use crate::model::{Controls, PlayerEvent, Track};
use crate::playlist;
use crate::text;

pub const NO_TRACK_LABEL: &str = "  –";
pub const TRACK_LABEL_INDENT: &str = "  ";
pub const PLAYLIST_LABEL: &str = "Playlist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemState {
    pub label: String,
    pub enabled: bool,
    pub checked: Option<bool>,
}

impl MenuItemState {
    fn disabled(label: &str) -> Self {
        Self {
            label: label.to_string(),
            enabled: false,
            checked: None,
        }
    }

    fn checkbox(label: &str) -> Self {
        Self {
            label: label.to_string(),
            enabled: false,
            checked: Some(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub index: usize,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaylistMenuState {
    pub entries: Vec<PlaylistEntry>,
}

impl PlaylistMenuState {
    pub fn enabled(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Everything the dock and tray menus show, mutated by player events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenterState {
    pub track_info: MenuItemState,
    pub like: MenuItemState,
    pub dislike: MenuItemState,
    pub play: MenuItemState,
    pub playing: bool,
    pub next: MenuItemState,
    pub previous: MenuItemState,
    pub playlist: PlaylistMenuState,
}

impl Default for PresenterState {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenterState {
    pub fn new() -> Self {
        Self {
            track_info: MenuItemState::disabled(NO_TRACK_LABEL),
            like: MenuItemState::checkbox("Love"),
            dislike: MenuItemState::checkbox("Dislike"),
            play: MenuItemState::disabled("Play"),
            playing: false,
            next: MenuItemState::disabled("Next"),
            previous: MenuItemState::disabled("Previous"),
            playlist: PlaylistMenuState::default(),
        }
    }

    /// Applies one player event. Tray and preference side effects of
    /// `initControls` are the presenter's job, not this state's.
    pub fn apply(&mut self, event: &PlayerEvent, label_max_len: usize) {
        match event {
            PlayerEvent::InitControls {
                current_track,
                controls,
            }
            | PlayerEvent::ChangeControls {
                current_track,
                controls,
            } => {
                self.handle_controls_change(*controls);
                self.handle_track_change(current_track.as_ref(), label_max_len);
            }
            PlayerEvent::ChangeState {
                is_playing,
                current_track,
            } => {
                self.set_playing(*is_playing);
                self.handle_track_change(current_track.as_ref(), label_max_len);
            }
            PlayerEvent::ChangePlaylist {
                current_track,
                playlist,
            } => {
                self.handle_track_change(current_track.as_ref(), label_max_len);
                self.handle_playlist_change(playlist, current_track.as_ref(), label_max_len);
            }
        }
    }

    pub fn handle_controls_change(&mut self, controls: Controls) {
        self.next.enabled = controls.next;
        self.previous.enabled = controls.prev;
    }

    pub fn handle_track_change(&mut self, current: Option<&Track>, label_max_len: usize) {
        let has_track = current.is_some();
        match current {
            Some(track) => {
                self.track_info.label = format!(
                    "{TRACK_LABEL_INDENT}{}",
                    format_track_label(track, label_max_len)
                );
                self.like.checked = Some(track.liked);
                self.like.label = String::from(if track.liked { "Loved" } else { "Love" });
                self.dislike.checked = Some(track.disliked);
                self.dislike.label =
                    String::from(if track.disliked { "Disliked" } else { "Dislike" });
            }
            None => self.track_info.label = NO_TRACK_LABEL.to_string(),
        }

        self.like.enabled = has_track;
        self.dislike.enabled = has_track;
        self.play.enabled = has_track;
        self.next.enabled = has_track;
        self.previous.enabled = has_track;
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.play.label = String::from(if playing { "Pause" } else { "Play" });
    }

    pub fn handle_playlist_change(
        &mut self,
        playlist: &[Track],
        current: Option<&Track>,
        label_max_len: usize,
    ) {
        let entries = match current {
            Some(current) => playlist::playlist_window(playlist, Some(current))
                .into_iter()
                .map(|entry| PlaylistEntry {
                    index: entry.index,
                    label: format_track_label(entry.track, label_max_len),
                    enabled: !entry.track.same_as(current),
                })
                .collect(),
            None => Vec::new(),
        };
        self.playlist = PlaylistMenuState { entries };
    }

    /// Tray title text: the current track while playing and enabled, else empty.
    pub fn tray_title(&self, show_title: bool) -> &str {
        if show_title && self.playing {
            &self.track_info.label
        } else {
            ""
        }
    }
}

pub fn format_track_label(track: &Track, max_len: usize) -> String {
    let label = format!("{} – {}", track.title, track.artist_names());
    text::truncate(&label, max_len)
}
