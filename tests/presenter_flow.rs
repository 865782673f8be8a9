use std::path::PathBuf;
use std::sync::mpsc;
use tunedock::app::{AppEvent, run_event_loop};
use tunedock::backend::NullTrayBackend;
use tunedock::config::{PreferenceStore, Preferences};
use tunedock::ipc::{self, HostLink, HostMessage, HostPopUp};
use tunedock::menu::MenuAction;
use tunedock::model::PlayerCommand;
use tunedock::presenter::Presenter;
use tunedock::tray::{TrayController, TrayEvent};

fn presenter(prefs: Preferences) -> (Presenter, HostLink<Vec<u8>>) {
    let link = HostLink::new(Vec::new());
    let tray = TrayController::new(
        Box::new(NullTrayBackend::new()),
        PathBuf::from("static/trayTemplate.png"),
    );
    let presenter = Presenter::new(
        PreferenceStore::in_memory(prefs),
        tray,
        Box::new(link.clone()),
        Box::new(link.clone()),
        Box::new(HostPopUp::new(link.clone())),
    );
    (presenter, link)
}

fn sent(link: &HostLink<Vec<u8>>) -> Vec<serde_json::Value> {
    link.with_writer(|buf| {
        String::from_utf8_lossy(buf)
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    })
}

fn host(line: &str) -> AppEvent {
    AppEvent::Host(ipc::parse_host_line(line).expect("host line"))
}

const INIT: &str = r#"{"event":"initControls","payload":{"currentTrack":{"title":"Song","artists":[{"title":"Band"}],"link":"/t/2","liked":true},"controls":{"next":true,"prev":false}}}"#;

const PLAYLIST: &str = r#"{"event":"changePlaylist","payload":{"currentTrack":{"title":"Song","artists":[{"title":"Band"}],"link":"/t/2"},"playlist":[{"title":"One","link":"/t/1"},{"title":"Song","link":"/t/2"},{"title":"Three","link":"/t/3"}]}}"#;

#[test]
fn events_render_dock_menu_and_clicks_become_commands() {
    let (mut presenter, link) = presenter(Preferences {
        tray_enabled: true,
        show_track_title: true,
        ..Preferences::default()
    });

    let (tx, rx) = mpsc::channel();
    tx.send(host(INIT)).expect("send");
    tx.send(host(PLAYLIST)).expect("send");
    tx.send(AppEvent::Tray(TrayEvent::Menu(MenuAction::Player(
        PlayerCommand::ToggleLike,
    ))))
    .expect("send");
    tx.send(host(r#"{"event":"menuClick","payload":{"action":{"playTrack":2}}}"#))
        .expect("send");
    tx.send(AppEvent::HostClosed).expect("send");

    run_event_loop(&mut presenter, &rx).expect("loop");
    assert!(presenter.tray_active());
    presenter.shutdown();
    assert!(!presenter.tray_active());

    let sent = sent(&link);
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0]["channel"], "dockMenu");
    assert_eq!(sent[0]["payload"][1]["label"], "  Song – Band");
    assert_eq!(sent[0]["payload"][2]["label"], "Loved");
    assert_eq!(sent[0]["payload"][2]["checked"], true);

    let playlist = &sent[1]["payload"][9];
    assert_eq!(playlist["type"], "submenu");
    assert_eq!(playlist["enabled"], true);
    let items = playlist["items"].as_array().expect("items");
    assert_eq!(items.len(), 3);
    assert_eq!(items[1]["enabled"], false);
    assert_eq!(items[2]["action"]["playTrack"], 2);

    assert_eq!(sent[2]["channel"], "playerCmd");
    assert_eq!(sent[2]["payload"], "toggleLike");
    assert_eq!(sent[3]["channel"], "playTrack");
    assert_eq!(sent[3]["payload"], 2);
}

#[test]
fn refresh_without_changes_sends_identical_menus() {
    let (mut presenter, link) = presenter(Preferences::default());
    let message = ipc::parse_host_line(r#"{"event":"refreshTrayMenu"}"#).expect("parse");
    presenter.handle_host_message(message.clone()).expect("first");
    presenter.handle_host_message(message).expect("second");

    let sent = sent(&link);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(sent[0]["payload"][1]["label"], "  –");
    assert_eq!(sent[0]["payload"][5]["enabled"], false);
}

#[test]
fn tray_click_asks_host_to_show_popup() {
    let (mut presenter, link) = presenter(Preferences {
        tray_enabled: true,
        ..Preferences::default()
    });
    presenter
        .handle_host_message(ipc::parse_host_line(INIT).expect("parse"))
        .expect("init");
    presenter
        .handle_tray_event(TrayEvent::Clicked { x: 10, y: 10 })
        .expect("click");

    let ops: Vec<String> = sent(&link)
        .iter()
        .filter(|line| line["channel"] == "popUp")
        .map(|line| line["payload"]["op"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        ops,
        vec![
            "setPosition",
            "show",
            "setVisibleOnAllWorkspaces",
            "focus",
            "setVisibleOnAllWorkspaces",
        ]
    );
}

#[test]
fn closed_channel_ends_the_loop() {
    let (mut presenter, _link) = presenter(Preferences::default());
    let (tx, rx) = mpsc::channel::<AppEvent>();
    drop(tx);
    run_event_loop(&mut presenter, &rx).expect("loop");
}

#[test]
fn player_messages_are_not_shell_messages() {
    let message = ipc::parse_host_line(INIT).expect("parse");
    assert!(matches!(message, HostMessage::Player(_)));
}
