use crate::menu::{MenuAction, MenuNode};
use crate::model::{PlayerCommand, PlayerEvent, Position, Size};
use crate::tray::PopUpWindow;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;
use tracing::warn;

pub const DEFAULT_POPUP_SIZE: Size = Size {
    width: 300,
    height: 400,
};

/// One line read from the host process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HostMessage {
    Player(PlayerEvent),
    Shell(ShellMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ShellMessage {
    RefreshTrayMenu,
    MenuClick { action: MenuAction },
    PopUpState {
        visible: bool,
        width: i32,
        height: i32,
    },
}

/// One line written to the host process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "camelCase")]
pub enum HostCommand {
    PlayerCmd(PlayerCommand),
    PlayTrack(usize),
    DockMenu(Vec<MenuNode>),
    PopUp(PopUpCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PopUpCommand {
    SetPosition { x: i32, y: i32, animate: bool },
    Show,
    Hide,
    SetVisibleOnAllWorkspaces { visible: bool },
    Focus,
}

pub fn parse_host_line(line: &str) -> Result<HostMessage> {
    serde_json::from_str(line.trim_end()).context("unrecognised host message")
}

/// Reads newline-delimited host messages until EOF, handing each parsed one
/// to `on_message`. Lines that are not UTF-8 or not a known message are
/// logged and skipped; only an I/O error ends the read early. Also stops
/// when `on_message` returns `false`.
pub fn read_host_messages<R, F>(mut reader: R, mut on_message: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(HostMessage) -> bool,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .context("failed to read from host")?;
        if read == 0 {
            return Ok(());
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, bytes = buf.len(), "skipping host line");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_host_line(line) {
            Ok(message) => {
                if !on_message(message) {
                    return Ok(());
                }
            }
            Err(err) => warn!(error = ?err, line = %line.trim_end(), "skipping host line"),
        }
    }
}

pub fn send_json_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec(value).context("serialize failed")?;
    bytes.push(b'\n');
    writer.write_all(&bytes).context("write to host failed")?;
    writer.flush().context("flush to host failed")?;
    Ok(())
}

pub trait CommandDispatcher {
    fn player_command(&mut self, command: PlayerCommand) -> Result<()>;
    fn play_track(&mut self, index: usize) -> Result<()>;
}

pub trait DockMenu {
    fn set_menu(&mut self, menu: &[MenuNode]) -> Result<()>;
}

/// Shared writer to the host. Dispatcher, dock and popup proxies all write
/// through the same link.
pub struct HostLink<W: Write> {
    writer: Rc<RefCell<W>>,
}

impl<W: Write> Clone for HostLink<W> {
    fn clone(&self) -> Self {
        Self {
            writer: self.writer.clone(),
        }
    }
}

impl<W: Write> HostLink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Rc::new(RefCell::new(writer)),
        }
    }

    pub fn send(&self, command: &HostCommand) -> Result<()> {
        send_json_line(&mut *self.writer.borrow_mut(), command)
    }

    pub fn with_writer<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        f(&self.writer.borrow())
    }
}

impl<W: Write> CommandDispatcher for HostLink<W> {
    fn player_command(&mut self, command: PlayerCommand) -> Result<()> {
        self.send(&HostCommand::PlayerCmd(command))
    }

    fn play_track(&mut self, index: usize) -> Result<()> {
        self.send(&HostCommand::PlayTrack(index))
    }
}

impl<W: Write> DockMenu for HostLink<W> {
    fn set_menu(&mut self, menu: &[MenuNode]) -> Result<()> {
        self.send(&HostCommand::DockMenu(menu.to_vec()))
    }
}

/// Popup window owned by the host. Visibility is tracked locally and
/// corrected whenever the host reports a `popUpState`.
pub struct HostPopUp<W: Write> {
    link: HostLink<W>,
    visible: bool,
    size: Size,
}

impl<W: Write> HostPopUp<W> {
    pub fn new(link: HostLink<W>) -> Self {
        Self {
            link,
            visible: false,
            size: DEFAULT_POPUP_SIZE,
        }
    }

    fn send(&self, command: PopUpCommand) -> Result<()> {
        self.link.send(&HostCommand::PopUp(command))
    }
}

impl<W: Write> PopUpWindow for HostPopUp<W> {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn size(&self) -> Size {
        self.size
    }

    fn set_position(&mut self, position: Position, animate: bool) -> Result<()> {
        self.send(PopUpCommand::SetPosition {
            x: position.x,
            y: position.y,
            animate,
        })
    }

    fn show(&mut self) -> Result<()> {
        self.visible = true;
        self.send(PopUpCommand::Show)
    }

    fn hide(&mut self) -> Result<()> {
        self.visible = false;
        self.send(PopUpCommand::Hide)
    }

    fn set_visible_on_all_workspaces(&mut self, visible: bool) -> Result<()> {
        self.send(PopUpCommand::SetVisibleOnAllWorkspaces { visible })
    }

    fn focus(&mut self) -> Result<()> {
        self.send(PopUpCommand::Focus)
    }

    fn update_state(&mut self, visible: bool, size: Size) {
        self.visible = visible;
        self.size = size;
    }
}
