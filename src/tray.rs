use crate::menu::{MenuAction, MenuNode};
use crate::model::{Position, Rect, Size};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    Clicked { x: i32, y: i32 },
    Menu(MenuAction),
}

pub type TrayEventSink = Box<dyn Fn(TrayEvent) + Send + 'static>;

/// Decoded RGBA pixels of the tray icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl IconImage {
    pub fn load(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("failed to load tray icon {}", path.display()))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    /// Pixels as big-endian ARGB32, the StatusNotifierItem pixmap layout.
    pub fn to_argb(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .flat_map(|px| [px[3], px[0], px[1], px[2]])
            .collect()
    }

    /// Pixels as BGRA, the layout of a 32bpp Windows icon bitmap.
    pub fn to_bgra(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect()
    }
}

pub trait TrayBackend {
    /// Puts an icon in the status area. `icon` is `None` when the image
    /// asset could not be loaded and the platform default should be used.
    fn create_icon(&mut self, icon: Option<&IconImage>) -> Result<()>;
    fn destroy_icon(&mut self);
    fn set_ignore_double_click_events(&mut self, ignore: bool);
    fn set_menu(&mut self, menu: &[MenuNode]);
    fn set_title(&mut self, title: &str);
    fn bounds(&self) -> Option<Rect>;
    fn pump(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayTransition {
    Created,
    Destroyed,
    Unchanged,
}

pub struct TrayController {
    backend: Box<dyn TrayBackend>,
    icon_path: PathBuf,
    active: bool,
    show_title: bool,
}

impl TrayController {
    pub fn new(backend: Box<dyn TrayBackend>, icon_path: PathBuf) -> Self {
        Self {
            backend,
            icon_path,
            active: false,
            show_title: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn show_title(&self) -> bool {
        self.show_title
    }

    /// Creates or destroys the icon so its existence matches `enabled`.
    pub fn sync(&mut self, enabled: bool, show_title: bool) -> TrayTransition {
        if !enabled {
            if !self.active {
                return TrayTransition::Unchanged;
            }
            self.backend.destroy_icon();
            self.active = false;
            info!("tray icon destroyed");
            return TrayTransition::Destroyed;
        }

        self.show_title = show_title;
        if self.active {
            return TrayTransition::Unchanged;
        }

        let icon = match IconImage::load(&self.icon_path) {
            Ok(icon) => Some(icon),
            Err(err) => {
                warn!(error = ?err, "using platform default tray icon");
                None
            }
        };
        if let Err(err) = self.backend.create_icon(icon.as_ref()) {
            warn!(error = ?err, "tray icon unavailable");
            return TrayTransition::Unchanged;
        }
        self.backend.set_ignore_double_click_events(true);
        self.active = true;
        info!(icon = %self.icon_path.display(), "tray icon created");
        TrayTransition::Created
    }

    pub fn render(&mut self, menu: &[MenuNode], title: &str) {
        if !self.active {
            return;
        }
        self.backend.set_menu(menu);
        self.backend.set_title(title);
    }

    pub fn bounds(&self) -> Option<Rect> {
        if !self.active {
            return None;
        }
        self.backend.bounds()
    }

    pub fn pump(&mut self) {
        self.backend.pump();
    }

    pub fn shutdown(&mut self) {
        self.sync(false, false);
    }
}

pub trait PopUpWindow {
    fn is_visible(&self) -> bool;
    fn size(&self) -> Size;
    fn set_position(&mut self, position: Position, animate: bool) -> Result<()>;
    fn show(&mut self) -> Result<()>;
    fn hide(&mut self) -> Result<()>;
    fn set_visible_on_all_workspaces(&mut self, visible: bool) -> Result<()>;
    fn focus(&mut self) -> Result<()>;
    /// Visibility and size as last reported by whoever owns the window.
    fn update_state(&mut self, _visible: bool, _size: Size) {}
}

/// Top-left corner that centres the popup under the tray icon.
pub fn pop_up_position(window: Size, tray: Rect) -> Position {
    let x = f64::from(tray.x) + f64::from(tray.width) / 2.0 - f64::from(window.width) / 2.0;
    let y = f64::from(tray.y) + f64::from(tray.height);
    Position {
        x: round_half_up(x),
        y: round_half_up(y),
    }
}

fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

pub fn toggle_pop_up(window: &mut dyn PopUpWindow, tray: Rect) -> Result<()> {
    if window.is_visible() {
        debug!("hiding popup");
        return window.hide();
    }
    show_pop_up(window, tray)
}

pub fn show_pop_up(window: &mut dyn PopUpWindow, tray: Rect) -> Result<()> {
    let position = pop_up_position(window.size(), tray);
    debug!(x = position.x, y = position.y, "showing popup");
    window.set_position(position, false)?;
    window.show()?;
    // Raising through every workspace pulls the popup onto the active one.
    window.set_visible_on_all_workspaces(true)?;
    window.focus()?;
    window.set_visible_on_all_workspaces(false)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct BackendLog {
        created: usize,
        destroyed: usize,
        ignore_double_click: bool,
        menus: Vec<Vec<MenuNode>>,
        titles: Vec<String>,
    }

    struct TestBackend {
        log: Rc<RefCell<BackendLog>>,
        fail_create: bool,
    }

    impl TrayBackend for TestBackend {
        fn create_icon(&mut self, _icon: Option<&IconImage>) -> Result<()> {
            if self.fail_create {
                anyhow::bail!("no status notifier host");
            }
            self.log.borrow_mut().created += 1;
            Ok(())
        }

        fn destroy_icon(&mut self) {
            self.log.borrow_mut().destroyed += 1;
        }

        fn set_ignore_double_click_events(&mut self, ignore: bool) {
            self.log.borrow_mut().ignore_double_click = ignore;
        }

        fn set_menu(&mut self, menu: &[MenuNode]) {
            self.log.borrow_mut().menus.push(menu.to_vec());
        }

        fn set_title(&mut self, title: &str) {
            self.log.borrow_mut().titles.push(title.to_string());
        }

        fn bounds(&self) -> Option<Rect> {
            Some(Rect {
                x: 10,
                y: 0,
                width: 24,
                height: 24,
            })
        }
    }

    fn controller(fail_create: bool) -> (TrayController, Rc<RefCell<BackendLog>>) {
        let log = Rc::new(RefCell::new(BackendLog::default()));
        let backend = TestBackend {
            log: log.clone(),
            fail_create,
        };
        (
            TrayController::new(Box::new(backend), PathBuf::from("does/not/exist.png")),
            log,
        )
    }

    #[derive(Default)]
    struct TestPopUp {
        visible: bool,
        calls: Vec<String>,
    }

    impl PopUpWindow for TestPopUp {
        fn is_visible(&self) -> bool {
            self.visible
        }

        fn size(&self) -> Size {
            Size {
                width: 300,
                height: 400,
            }
        }

        fn set_position(&mut self, position: Position, animate: bool) -> Result<()> {
            self.calls
                .push(format!("position {} {} {animate}", position.x, position.y));
            Ok(())
        }

        fn show(&mut self) -> Result<()> {
            self.visible = true;
            self.calls.push(String::from("show"));
            Ok(())
        }

        fn hide(&mut self) -> Result<()> {
            self.visible = false;
            self.calls.push(String::from("hide"));
            Ok(())
        }

        fn set_visible_on_all_workspaces(&mut self, visible: bool) -> Result<()> {
            self.calls.push(format!("all-workspaces {visible}"));
            Ok(())
        }

        fn focus(&mut self) -> Result<()> {
            self.calls.push(String::from("focus"));
            Ok(())
        }
    }

    #[test]
    fn enabling_creates_exactly_one_icon() {
        let (mut tray, log) = controller(false);

        assert_eq!(tray.sync(true, false), TrayTransition::Created);
        assert_eq!(tray.sync(true, true), TrayTransition::Unchanged);
        assert_eq!(log.borrow().created, 1);
        assert!(log.borrow().ignore_double_click);
        assert!(tray.show_title());
    }

    #[test]
    fn disabling_destroys_icon_once() {
        let (mut tray, log) = controller(false);
        tray.sync(true, false);

        assert_eq!(tray.sync(false, false), TrayTransition::Destroyed);
        assert_eq!(tray.sync(false, false), TrayTransition::Unchanged);
        assert_eq!(log.borrow().destroyed, 1);
        assert!(!tray.is_active());
        assert_eq!(tray.bounds(), None);
    }

    #[test]
    fn failed_creation_leaves_tray_inactive() {
        let (mut tray, log) = controller(true);
        assert_eq!(tray.sync(true, false), TrayTransition::Unchanged);
        assert!(!tray.is_active());

        tray.render(&[MenuNode::Separator], "title");
        assert!(log.borrow().menus.is_empty());
    }

    #[test]
    fn render_reaches_backend_only_while_active() {
        let (mut tray, log) = controller(false);
        tray.render(&[MenuNode::Separator], "ignored");
        tray.sync(true, false);
        tray.render(&[MenuNode::Separator], "  Song – Band");

        assert_eq!(log.borrow().menus.len(), 1);
        assert_eq!(log.borrow().titles, vec![String::from("  Song – Band")]);
    }

    #[test]
    fn popup_is_centred_under_tray() {
        let position = pop_up_position(
            Size {
                width: 300,
                height: 400,
            },
            Rect {
                x: 100,
                y: 0,
                width: 20,
                height: 22,
            },
        );
        assert_eq!(position, Position { x: -40, y: 22 });
    }

    #[test]
    fn popup_position_rounds_halves_up() {
        let position = pop_up_position(
            Size {
                width: 301,
                height: 10,
            },
            Rect {
                x: 100,
                y: 5,
                width: 20,
                height: 22,
            },
        );
        // 110 - 150.5 = -40.5
        assert_eq!(position, Position { x: -40, y: 27 });
    }

    #[test]
    fn toggle_shows_then_hides() {
        let mut popup = TestPopUp::default();
        let tray = Rect {
            x: 100,
            y: 0,
            width: 20,
            height: 22,
        };

        toggle_pop_up(&mut popup, tray).expect("show");
        assert!(popup.visible);
        assert_eq!(
            popup.calls,
            vec![
                "position -40 22 false",
                "show",
                "all-workspaces true",
                "focus",
                "all-workspaces false",
            ]
        );

        toggle_pop_up(&mut popup, tray).expect("hide");
        assert!(!popup.visible);
        assert_eq!(popup.calls.last().map(String::as_str), Some("hide"));
    }

    #[test]
    fn icon_pixels_are_reordered_per_platform() {
        let icon = IconImage {
            width: 1,
            height: 1,
            rgba: vec![1, 2, 3, 4],
        };
        assert_eq!(icon.to_argb(), vec![4, 1, 2, 3]);
        assert_eq!(icon.to_bgra(), vec![3, 2, 1, 4]);
    }
}
