use crate::config::{PreferenceKey, PreferenceStore, Preferences};
use crate::core::PresenterState;
use crate::ipc::{CommandDispatcher, DockMenu, HostMessage, ShellMessage};
use crate::menu::{self, MenuAction};
use crate::model::{PlayerEvent, Rect, Size};
use crate::tray::{PopUpWindow, TrayController, TrayEvent, TrayTransition, toggle_pop_up};
use anyhow::Result;
use tracing::{debug, info};

/// Owns the menu state and every surface it is rendered to. All handlers run
/// on the caller's thread and finish with a refresh.
pub struct Presenter {
    state: PresenterState,
    prefs: PreferenceStore,
    tray: TrayController,
    dock: Box<dyn DockMenu>,
    dispatcher: Box<dyn CommandDispatcher>,
    pop_up: Box<dyn PopUpWindow>,
    tray_subscribed: bool,
}

impl Presenter {
    pub fn new(
        prefs: PreferenceStore,
        tray: TrayController,
        dock: Box<dyn DockMenu>,
        dispatcher: Box<dyn CommandDispatcher>,
        pop_up: Box<dyn PopUpWindow>,
    ) -> Self {
        Self {
            state: PresenterState::new(),
            prefs,
            tray,
            dock,
            dispatcher,
            pop_up,
            tray_subscribed: false,
        }
    }

    pub fn state(&self) -> &PresenterState {
        &self.state
    }

    pub fn preferences(&self) -> &Preferences {
        self.prefs.get()
    }

    pub fn tray_active(&self) -> bool {
        self.tray.is_active()
    }

    pub fn handle_host_message(&mut self, message: HostMessage) -> Result<()> {
        match message {
            HostMessage::Player(event) => self.handle_player_event(&event),
            HostMessage::Shell(message) => self.handle_shell_message(message),
        }
    }

    pub fn handle_player_event(&mut self, event: &PlayerEvent) -> Result<()> {
        debug!(event = event.name(), "player event");
        self.state.apply(event, self.prefs.get().label_max_len);

        if let PlayerEvent::InitControls { .. } = event {
            self.tray_subscribed = true;
            self.sync_tray();
        }
        self.refresh()
    }

    pub fn handle_shell_message(&mut self, message: ShellMessage) -> Result<()> {
        match message {
            ShellMessage::RefreshTrayMenu => self.refresh(),
            ShellMessage::MenuClick { action } => self.handle_menu_action(action),
            ShellMessage::PopUpState {
                visible,
                width,
                height,
            } => {
                self.pop_up.update_state(visible, Size { width, height });
                Ok(())
            }
        }
    }

    pub fn handle_tray_event(&mut self, event: TrayEvent) -> Result<()> {
        match event {
            TrayEvent::Clicked { x, y } => {
                let bounds = self.tray.bounds().unwrap_or(Rect {
                    x,
                    y,
                    width: 0,
                    height: 0,
                });
                toggle_pop_up(self.pop_up.as_mut(), bounds)
            }
            TrayEvent::Menu(action) => self.handle_menu_action(action),
        }
    }

    pub fn handle_menu_action(&mut self, action: MenuAction) -> Result<()> {
        debug!(?action, "menu action");
        match action {
            MenuAction::Player(command) => self.dispatcher.player_command(command),
            MenuAction::PlayTrack(index) => self.dispatcher.play_track(index),
        }
    }

    /// Applies a reloaded preferences file. Tray changes only take effect
    /// once the player has sent `initControls`.
    pub fn preferences_changed(&mut self, preferences: Preferences) -> Result<()> {
        let changed = self.prefs.replace(preferences);
        if changed.is_empty() {
            return Ok(());
        }
        debug!(
            keys = ?changed.iter().map(|key| key.name()).collect::<Vec<_>>(),
            "preferences changed"
        );

        let tray_keys = [PreferenceKey::Tray, PreferenceKey::TraySong];
        if self.tray_subscribed && changed.iter().any(|key| tray_keys.contains(key)) {
            self.sync_tray();
        }
        self.refresh()
    }

    /// Rebuilds the menu tree and pushes it to the dock and, if present, the
    /// tray icon.
    pub fn refresh(&mut self) -> Result<()> {
        let menu = menu::build_menu(&self.state);
        debug!(items = menu.len(), tray = self.tray.is_active(), "refresh");
        self.dock.set_menu(&menu)?;
        if self.tray.is_active() {
            let title = self.state.tray_title(self.tray.show_title());
            self.tray.render(&menu, title);
        }
        Ok(())
    }

    pub fn pump(&mut self) {
        self.tray.pump();
    }

    pub fn shutdown(&mut self) {
        if self.tray.is_active() {
            info!("shutting down tray");
        }
        self.tray.shutdown();
    }

    fn sync_tray(&mut self) {
        let prefs = self.prefs.get();
        let transition = self.tray.sync(prefs.tray_enabled, prefs.show_track_title);
        if transition != TrayTransition::Unchanged {
            debug!(?transition, "tray synced");
        }
    }
}
