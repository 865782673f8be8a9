use crate::core::{MenuItemState, PLAYLIST_LABEL, PresenterState};
use crate::model::PlayerCommand;
use serde::{Deserialize, Serialize};

pub const NOW_PLAYING_LABEL: &str = "Now Playing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuAction {
    Player(PlayerCommand),
    PlayTrack(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MenuNode {
    Normal {
        label: String,
        enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<MenuAction>,
    },
    Checkbox {
        label: String,
        enabled: bool,
        checked: bool,
        action: MenuAction,
    },
    Separator,
    Submenu {
        label: String,
        enabled: bool,
        items: Vec<MenuNode>,
    },
}

impl MenuNode {
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Normal { label, .. }
            | Self::Checkbox { label, .. }
            | Self::Submenu { label, .. } => Some(label.as_str()),
            Self::Separator => None,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Self::Normal { enabled, .. }
            | Self::Checkbox { enabled, .. }
            | Self::Submenu { enabled, .. } => *enabled,
            Self::Separator => false,
        }
    }

    /// Every clickable action in this subtree, depth first.
    pub fn actions(&self) -> Vec<MenuAction> {
        match self {
            Self::Normal { action, .. } => action.iter().copied().collect(),
            Self::Checkbox { action, .. } => vec![*action],
            Self::Separator => Vec::new(),
            Self::Submenu { items, .. } => items.iter().flat_map(MenuNode::actions).collect(),
        }
    }
}

fn item(state: &MenuItemState, command: PlayerCommand) -> MenuNode {
    let action = MenuAction::Player(command);
    match state.checked {
        Some(checked) => MenuNode::Checkbox {
            label: state.label.clone(),
            enabled: state.enabled,
            checked,
            action,
        },
        None => MenuNode::Normal {
            label: state.label.clone(),
            enabled: state.enabled,
            action: Some(action),
        },
    }
}

/// Full dock/tray menu for the current state. Rebuilt from scratch on every
/// refresh.
pub fn build_menu(state: &PresenterState) -> Vec<MenuNode> {
    vec![
        MenuNode::Normal {
            label: NOW_PLAYING_LABEL.to_string(),
            enabled: false,
            action: None,
        },
        MenuNode::Normal {
            label: state.track_info.label.clone(),
            enabled: state.track_info.enabled,
            action: None,
        },
        item(&state.like, PlayerCommand::ToggleLike),
        item(&state.dislike, PlayerCommand::ToggleDislike),
        MenuNode::Separator,
        item(&state.play, PlayerCommand::TogglePause),
        item(&state.next, PlayerCommand::Next),
        item(&state.previous, PlayerCommand::Prev),
        MenuNode::Separator,
        build_playlist_menu(state),
    ]
}

fn build_playlist_menu(state: &PresenterState) -> MenuNode {
    let items = state
        .playlist
        .entries
        .iter()
        .map(|entry| MenuNode::Normal {
            label: entry.label.clone(),
            enabled: entry.enabled,
            action: Some(MenuAction::PlayTrack(entry.index)),
        })
        .collect();

    MenuNode::Submenu {
        label: PLAYLIST_LABEL.to_string(),
        enabled: state.playlist.enabled(),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Artist, Track};

    fn track(title: &str, link: &str) -> Track {
        Track {
            title: title.to_string(),
            artists: vec![Artist {
                title: String::from("Band"),
            }],
            link: link.to_string(),
            liked: true,
            disliked: false,
        }
    }

    fn labels(menu: &[MenuNode]) -> Vec<Option<&str>> {
        menu.iter().map(MenuNode::label).collect()
    }

    #[test]
    fn menu_has_fixed_order() {
        let menu = build_menu(&PresenterState::new());
        assert_eq!(
            labels(&menu),
            vec![
                Some("Now Playing"),
                Some("  –"),
                Some("Love"),
                Some("Dislike"),
                None,
                Some("Play"),
                Some("Next"),
                Some("Previous"),
                None,
                Some("Playlist"),
            ]
        );
        assert!(menu.iter().all(|node| !node.enabled()));
    }

    #[test]
    fn like_and_dislike_render_as_checkboxes() {
        let mut state = PresenterState::new();
        state.handle_track_change(Some(&track("Song", "s")), 35);
        let menu = build_menu(&state);

        assert_eq!(
            menu[2],
            MenuNode::Checkbox {
                label: String::from("Loved"),
                enabled: true,
                checked: true,
                action: MenuAction::Player(PlayerCommand::ToggleLike),
            }
        );
        assert!(matches!(
            menu[3],
            MenuNode::Checkbox { checked: false, .. }
        ));
    }

    #[test]
    fn rebuilding_without_changes_is_identical() {
        let mut state = PresenterState::new();
        let playlist = vec![track("A", "a"), track("B", "b")];
        state.handle_track_change(Some(&playlist[0]), 35);
        state.handle_playlist_change(&playlist, Some(&playlist[0]), 35);

        assert_eq!(build_menu(&state), build_menu(&state));
    }

    #[test]
    fn playlist_entries_carry_their_position() {
        let mut state = PresenterState::new();
        let playlist: Vec<Track> = (0..4)
            .map(|n| track(&format!("T{n}"), &format!("{n}")))
            .collect();
        state.handle_playlist_change(&playlist, Some(&playlist[2]), 35);
        let menu = build_menu(&state);

        let MenuNode::Submenu { enabled, items, .. } = &menu[9] else {
            panic!("playlist submenu missing");
        };
        assert!(*enabled);
        assert_eq!(
            menu[9].actions(),
            vec![
                MenuAction::PlayTrack(1),
                MenuAction::PlayTrack(2),
                MenuAction::PlayTrack(3),
            ]
        );
        assert!(!items[1].enabled());
    }

    #[test]
    fn menu_serializes_with_type_tags() {
        let menu = build_menu(&PresenterState::new());
        let json = serde_json::to_value(&menu).expect("json");

        assert_eq!(json[0]["type"], "normal");
        assert!(json[0].get("action").is_none());
        assert_eq!(json[4]["type"], "separator");
        assert_eq!(json[2]["action"]["player"], "toggleLike");
        assert_eq!(json[9]["type"], "submenu");
    }
}
