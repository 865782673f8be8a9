use crate::model::Track;

pub const TRACKS_BEHIND: usize = 1;
pub const TRACKS_AHEAD: usize = 10;
pub const MAX_WINDOW_LEN: usize = TRACKS_BEHIND + TRACKS_AHEAD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedTrack<'a> {
    pub index: usize,
    pub track: &'a Track,
}

/// Slice of `playlist` shown in the tray submenu: one track before the current
/// one and up to ten from it on. When the current track is not in the
/// playlist the first ten entries are used instead.
pub fn playlist_window<'a>(
    playlist: &'a [Track],
    current: Option<&Track>,
) -> Vec<IndexedTrack<'a>> {
    let Some(current) = current else {
        return Vec::new();
    };
    if playlist.is_empty() {
        return Vec::new();
    }

    let indexed = playlist
        .iter()
        .enumerate()
        .map(|(index, track)| IndexedTrack { index, track });

    let Some(position) = playlist.iter().position(|track| track.same_as(current)) else {
        return indexed.take(TRACKS_AHEAD).collect();
    };

    let start = position.saturating_sub(TRACKS_BEHIND);
    let end = (position + TRACKS_AHEAD).min(playlist.len());
    indexed.skip(start).take(end - start).collect()
}
