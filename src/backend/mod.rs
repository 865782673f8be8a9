use crate::menu::MenuNode;
use crate::model::Rect;
use crate::tray::{IconImage, TrayBackend, TrayEventSink};
use anyhow::Result;
use tracing::debug;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(windows)]
mod win32;

#[cfg(target_os = "linux")]
pub use linux::KsniTrayBackend;
#[cfg(windows)]
pub use win32::Win32TrayBackend;

/// Native backend for this platform, or the null backend when `headless` is
/// set or the platform has no status-area support here.
pub fn platform_backend(sink: TrayEventSink, headless: bool) -> Box<dyn TrayBackend> {
    if headless {
        return Box::new(NullTrayBackend::new());
    }

    #[cfg(target_os = "linux")]
    {
        Box::new(KsniTrayBackend::new(sink))
    }
    #[cfg(windows)]
    {
        Box::new(Win32TrayBackend::new(sink))
    }
    #[cfg(not(any(target_os = "linux", windows)))]
    {
        drop(sink);
        Box::new(NullTrayBackend::new())
    }
}

/// Keeps what a real tray would show without touching the desktop.
#[derive(Debug, Default)]
pub struct NullTrayBackend {
    visible: bool,
    menu: Vec<MenuNode>,
    title: String,
}

impl NullTrayBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn menu(&self) -> &[MenuNode] {
        &self.menu
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl TrayBackend for NullTrayBackend {
    fn create_icon(&mut self, _icon: Option<&IconImage>) -> Result<()> {
        self.visible = true;
        Ok(())
    }

    fn destroy_icon(&mut self) {
        self.visible = false;
        self.menu.clear();
        self.title.clear();
    }

    fn set_ignore_double_click_events(&mut self, _ignore: bool) {}

    fn set_menu(&mut self, menu: &[MenuNode]) {
        self.menu = menu.to_vec();
    }

    fn set_title(&mut self, title: &str) {
        if self.title != title {
            debug!(title, "tray title");
        }
        self.title = title.to_string();
    }

    fn bounds(&self) -> Option<Rect> {
        self.visible.then(Rect::default)
    }
}
