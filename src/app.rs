use crate::backend;
use crate::config::{self, PreferenceStore, Preferences};
use crate::ipc::{self, HostLink, HostMessage, HostPopUp};
use crate::logging;
use crate::presenter::Presenter;
use crate::tray::{TrayController, TrayEvent, TrayEventSink};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const PUMP_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Clone, Default)]
pub struct AppStartupOptions {
    pub headless: bool,
    pub packaged: bool,
    pub config_dir: Option<PathBuf>,
}

/// Everything the background threads forward to the presenter loop.
#[derive(Debug)]
pub enum AppEvent {
    Host(HostMessage),
    Tray(TrayEvent),
    PreferencesChanged(Preferences),
    HostClosed,
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let root = match options.config_dir {
        Some(dir) => dir,
        None => config::config_root()?,
    };
    let _log_guard = logging::init_logging(&config::log_dir(&root))?;

    let prefs_path = config::preferences_path(&root);
    let prefs = PreferenceStore::open(prefs_path.clone())?;
    info!(
        path = %prefs_path.display(),
        headless = options.headless,
        packaged = options.packaged,
        "starting"
    );

    let (tx, rx) = mpsc::channel();

    let tray_tx = tx.clone();
    let sink: TrayEventSink = Box::new(move |event| {
        let _ = tray_tx.send(AppEvent::Tray(event));
    });
    let tray = TrayController::new(
        backend::platform_backend(sink, options.headless),
        config::tray_icon_path(options.packaged),
    );

    let link = HostLink::new(std::io::stdout());
    let mut presenter = Presenter::new(
        prefs,
        tray,
        Box::new(link.clone()),
        Box::new(link.clone()),
        Box::new(HostPopUp::new(link)),
    );

    let prefs_tx = tx.clone();
    let _watcher = match config::watch_preferences(&prefs_path, move |preferences| {
        let _ = prefs_tx.send(AppEvent::PreferencesChanged(preferences));
    }) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            warn!(error = ?err, "preference changes will not be picked up");
            None
        }
    };

    let host_tx = tx;
    thread::Builder::new()
        .name(String::from("host-reader"))
        .spawn(move || {
            let stdin = std::io::stdin();
            let result = ipc::read_host_messages(stdin.lock(), |message| {
                host_tx.send(AppEvent::Host(message)).is_ok()
            });
            if let Err(err) = result {
                warn!(error = ?err, "host channel failed");
            }
            let _ = host_tx.send(AppEvent::HostClosed);
        })
        .context("failed to spawn host reader")?;

    let result = run_event_loop(&mut presenter, &rx);
    presenter.shutdown();
    info!("stopped");
    result
}

/// Drains `events` until the host closes or every sender is gone, pumping
/// native tray messages between events.
pub fn run_event_loop(presenter: &mut Presenter, events: &Receiver<AppEvent>) -> Result<()> {
    loop {
        presenter.pump();

        let event = match events.recv_timeout(PUMP_INTERVAL) {
            Ok(AppEvent::HostClosed) | Err(RecvTimeoutError::Disconnected) => {
                info!("host closed");
                return Ok(());
            }
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
        };

        if let Err(err) = dispatch(presenter, event) {
            warn!(error = ?err, "event handler failed");
        }
    }
}

fn dispatch(presenter: &mut Presenter, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Host(message) => presenter.handle_host_message(message),
        AppEvent::Tray(event) => presenter.handle_tray_event(event),
        AppEvent::PreferencesChanged(preferences) => presenter.preferences_changed(preferences),
        AppEvent::HostClosed => Ok(()),
    }
}
