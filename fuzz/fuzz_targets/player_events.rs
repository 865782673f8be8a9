#![no_main]

use libfuzzer_sys::fuzz_target;
use tunedock::core::PresenterState;
use tunedock::menu::build_menu;
use tunedock::model::{Artist, Controls, PlayerEvent, Track};
use tunedock::playlist::MAX_WINDOW_LEN;

fn track(idx: u8) -> Track {
    Track {
        title: format!("track {idx} {}", "x".repeat(usize::from(idx % 50))),
        artists: vec![Artist {
            title: format!("artist {}", idx % 3),
        }],
        link: format!("/track/{}", idx % 40),
        liked: idx % 2 == 0,
        disliked: idx % 5 == 0,
    }
}

fuzz_target!(|data: &[u8]| {
    let mut state = PresenterState::new();
    let len = data.first().map(|b| usize::from(*b % 40)).unwrap_or(0);
    let playlist: Vec<Track> = (0..len as u8).map(track).collect();

    for pair in data.chunks(2) {
        let byte = pair[0];
        let arg = pair.get(1).copied().unwrap_or(0);
        let current = (arg % 3 != 0).then(|| track(arg));
        let max_len = usize::from(arg % 48);
        let event = match byte % 4 {
            0 => PlayerEvent::InitControls {
                current_track: current,
                controls: Controls {
                    next: arg & 1 == 1,
                    prev: arg & 2 == 2,
                },
            },
            1 => PlayerEvent::ChangeControls {
                current_track: current,
                controls: Controls::default(),
            },
            2 => PlayerEvent::ChangeState {
                is_playing: arg & 1 == 1,
                current_track: current,
            },
            _ => PlayerEvent::ChangePlaylist {
                current_track: current,
                playlist: playlist.clone(),
            },
        };
        state.apply(&event, max_len);

        assert!(state.playlist.entries.len() <= MAX_WINDOW_LEN);
        assert_eq!(build_menu(&state), build_menu(&state));
    }
});
