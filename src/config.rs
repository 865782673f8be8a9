use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_DIR: &str = "tunedock";
const PREFERENCES_FILE: &str = "preferences.json";
const LOG_DIR: &str = "logs";
const TRAY_ICON_ASSET: &str = "static/trayTemplate.png";
const PACKAGED_RESOURCES_DIR: &str = "resources";

pub const DEFAULT_LABEL_MAX_LEN: usize = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    Tray,
    TraySong,
    TraySongLabelLength,
}

impl PreferenceKey {
    pub fn name(self) -> &'static str {
        match self {
            Self::Tray => "tray",
            Self::TraySong => "tray-song",
            Self::TraySongLabelLength => "tray-song-label-length",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(rename = "tray", default)]
    pub tray_enabled: bool,
    #[serde(rename = "tray-song", default)]
    pub show_track_title: bool,
    #[serde(rename = "tray-song-label-length", default = "default_label_max_len")]
    pub label_max_len: usize,
}

fn default_label_max_len() -> usize {
    DEFAULT_LABEL_MAX_LEN
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            tray_enabled: false,
            show_track_title: false,
            label_max_len: default_label_max_len(),
        }
    }
}

impl Preferences {
    pub fn changed_keys(&self, other: &Preferences) -> Vec<PreferenceKey> {
        let mut keys = Vec::new();
        if self.tray_enabled != other.tray_enabled {
            keys.push(PreferenceKey::Tray);
        }
        if self.show_track_title != other.show_track_title {
            keys.push(PreferenceKey::TraySong);
        }
        if self.label_max_len != other.label_max_len {
            keys.push(PreferenceKey::TraySongLabelLength);
        }
        keys
    }
}

/// In-memory view of the preferences file.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    current: Preferences,
}

impl PreferenceStore {
    pub fn in_memory(preferences: Preferences) -> Self {
        Self {
            path: None,
            current: preferences,
        }
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let current = load_preferences_from(&path)?;
        Ok(Self {
            path: Some(path),
            current,
        })
    }

    pub fn get(&self) -> &Preferences {
        &self.current
    }

    /// Replaces the current value and reports which keys differ.
    pub fn replace(&mut self, preferences: Preferences) -> Vec<PreferenceKey> {
        let changed = self.current.changed_keys(&preferences);
        self.current = preferences;
        changed
    }

    pub fn update<F>(&mut self, f: F) -> Vec<PreferenceKey>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut next = self.current.clone();
        f(&mut next);
        self.replace(next)
    }

    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => save_preferences_to(path, &self.current),
            None => Ok(()),
        }
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("TUNEDOCK_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("USERPROFILE")
        .or_else(|_| env::var("HOME"))
        .context("neither USERPROFILE nor HOME is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn preferences_path(root: &Path) -> PathBuf {
    root.join(PREFERENCES_FILE)
}

pub fn log_dir(root: &Path) -> PathBuf {
    root.join(LOG_DIR)
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

pub fn load_preferences_from(path: &Path) -> Result<Preferences> {
    if !path.exists() {
        return Ok(Preferences::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read preferences file {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Preferences::default());
    }
    let preferences: Preferences = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse preferences file {}", path.display()))?;
    Ok(preferences)
}

pub fn save_preferences_to(path: &Path, preferences: &Preferences) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(preferences)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Location of the tray icon image. Development builds read it relative to
/// the working directory, packaged builds from the bundled resources next to
/// the executable.
pub fn tray_icon_path(packaged: bool) -> PathBuf {
    if !packaged {
        return PathBuf::from(TRAY_ICON_ASSET);
    }

    let resources = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(PACKAGED_RESOURCES_DIR)))
        .unwrap_or_else(|| PathBuf::from(PACKAGED_RESOURCES_DIR));
    resources.join(TRAY_ICON_ASSET)
}

/// Watches the preferences file and calls `on_change` with the reloaded value
/// after every write. The returned watcher stops when dropped.
pub fn watch_preferences<F>(path: &Path, on_change: F) -> Result<RecommendedWatcher>
where
    F: Fn(Preferences) + Send + 'static,
{
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    ensure_dir(&dir)?;

    let target = path.to_path_buf();
    let file_name = target.file_name().map(|name| name.to_os_string());
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "preferences watcher error");
                return;
            }
        };
        if !(event.kind.is_modify() || event.kind.is_create()) {
            return;
        }
        let relevant = event
            .paths
            .iter()
            .any(|p| p.file_name().map(|name| name.to_os_string()) == file_name);
        if !relevant {
            return;
        }

        match load_preferences_from(&target) {
            Ok(preferences) => {
                debug!(?preferences, "preferences reloaded");
                on_change(preferences);
            }
            Err(err) => warn!(error = ?err, "ignoring unreadable preferences"),
        }
    })
    .context("failed to create preferences watcher")?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", dir.display()))?;
    Ok(watcher)
}
