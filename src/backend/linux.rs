use crate::menu::{MenuAction, MenuNode};
use crate::model::Rect;
use crate::tray::{IconImage, TrayBackend, TrayEvent, TrayEventSink};
use anyhow::{Result, anyhow};
use ksni::blocking::{Handle, TrayMethods};
use ksni::menu::{CheckmarkItem, StandardItem, SubMenu};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

const TRAY_ID: &str = "tunedock";
const FALLBACK_ICON_NAME: &str = "audio-x-generic";

struct KsniTray {
    sink: Arc<Mutex<TrayEventSink>>,
    icon: Option<ksni::Icon>,
    title: String,
    menu: Vec<MenuNode>,
    last_activation: Arc<Mutex<Option<Rect>>>,
}

impl KsniTray {
    fn emit(&self, event: TrayEvent) {
        match self.sink.lock() {
            Ok(sink) => (*sink)(event),
            Err(_) => warn!(?event, "tray event sink poisoned"),
        }
    }
}

impl ksni::Tray for KsniTray {
    fn id(&self) -> String {
        TRAY_ID.into()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn icon_name(&self) -> String {
        if self.icon.is_some() {
            String::new()
        } else {
            FALLBACK_ICON_NAME.into()
        }
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        self.icon.iter().cloned().collect()
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::ApplicationStatus
    }

    fn activate(&mut self, x: i32, y: i32) {
        debug!(x, y, "tray activated");
        if let Ok(mut last) = self.last_activation.lock() {
            *last = Some(Rect {
                x,
                y,
                width: 0,
                height: 0,
            });
        }
        self.emit(TrayEvent::Clicked { x, y });
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        self.menu.iter().map(to_ksni_item).collect()
    }
}

// ksni treats a single underscore as a mnemonic marker.
fn escape_label(label: &str) -> String {
    label.replace('_', "__")
}

fn activation(action: Option<MenuAction>) -> Box<dyn Fn(&mut KsniTray) + Send + 'static> {
    Box::new(move |tray: &mut KsniTray| {
        if let Some(action) = action {
            tray.emit(TrayEvent::Menu(action));
        }
    })
}

fn to_ksni_item(node: &MenuNode) -> ksni::MenuItem<KsniTray> {
    match node {
        MenuNode::Normal {
            label,
            enabled,
            action,
        } => StandardItem {
            label: escape_label(label),
            enabled: *enabled,
            activate: activation(*action),
            ..Default::default()
        }
        .into(),
        MenuNode::Checkbox {
            label,
            enabled,
            checked,
            action,
        } => CheckmarkItem {
            label: escape_label(label),
            enabled: *enabled,
            checked: *checked,
            activate: activation(Some(*action)),
            ..Default::default()
        }
        .into(),
        MenuNode::Separator => ksni::MenuItem::Separator,
        MenuNode::Submenu {
            label,
            enabled,
            items,
        } => SubMenu {
            label: escape_label(label),
            enabled: *enabled,
            submenu: items.iter().map(to_ksni_item).collect(),
            ..Default::default()
        }
        .into(),
    }
}

/// StatusNotifierItem tray served on ksni's own thread. The last activation
/// point is shared with the service so reading it never touches the bus.
pub struct KsniTrayBackend {
    sink: Arc<Mutex<TrayEventSink>>,
    last_activation: Arc<Mutex<Option<Rect>>>,
    handle: Option<Handle<KsniTray>>,
}

impl KsniTrayBackend {
    pub fn new(sink: TrayEventSink) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
            last_activation: Arc::new(Mutex::new(None)),
            handle: None,
        }
    }

    fn tray(&self, icon: Option<&IconImage>) -> KsniTray {
        KsniTray {
            sink: self.sink.clone(),
            icon: icon.map(|icon| ksni::Icon {
                width: icon.width as i32,
                height: icon.height as i32,
                data: icon.to_argb(),
            }),
            title: String::new(),
            menu: Vec::new(),
            last_activation: self.last_activation.clone(),
        }
    }

    fn update<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut KsniTray) -> R + Send,
        R: Send,
    {
        self.handle.as_ref()?.update(f)
    }
}

impl TrayBackend for KsniTrayBackend {
    fn create_icon(&mut self, icon: Option<&IconImage>) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let handle = self
            .tray(icon)
            .spawn()
            .map_err(|err| anyhow!("failed to register tray icon: {err}"))?;
        self.handle = Some(handle);
        Ok(())
    }

    fn destroy_icon(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.shutdown();
        }
        if let Ok(mut last) = self.last_activation.lock() {
            *last = None;
        }
    }

    // StatusNotifierItem hosts only report single activations.
    fn set_ignore_double_click_events(&mut self, _ignore: bool) {}

    fn set_menu(&mut self, menu: &[MenuNode]) {
        let menu = menu.to_vec();
        self.update(move |tray| tray.menu = menu);
    }

    fn set_title(&mut self, title: &str) {
        let title = title.to_string();
        self.update(move |tray| tray.title = title);
    }

    fn bounds(&self) -> Option<Rect> {
        self.last_activation.lock().ok().and_then(|last| *last)
    }
}

impl Drop for KsniTrayBackend {
    fn drop(&mut self) {
        self.destroy_icon();
    }
}
