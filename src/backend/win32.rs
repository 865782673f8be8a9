use crate::menu::{MenuAction, MenuNode};
use crate::model::Rect;
use crate::tray::{IconImage, TrayBackend, TrayEvent, TrayEventSink};
use anyhow::{Result, bail};
use std::sync::Mutex;
use windows_sys::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows_sys::Win32::UI::WindowsAndMessaging::{HICON, HMENU, WM_APP};

const TRAY_CALLBACK_MSG: u32 = WM_APP + 1;
const TRAY_ICON_ID: u32 = 1;
const DEFAULT_TOOLTIP: &str = "tunedock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NativeTrayMessage {
    Click,
    DoubleClick,
    ContextMenu,
}

static PENDING: Mutex<Vec<NativeTrayMessage>> = Mutex::new(Vec::new());

/// `Shell_NotifyIconW` tray on a hidden message-only window. Native messages
/// are queued by the window procedure and handled in [`TrayBackend::pump`].
pub struct Win32TrayBackend {
    sink: TrayEventSink,
    window: isize,
    icon: isize,
    owns_icon: bool,
    icon_visible: bool,
    ignore_double_click: bool,
    menu: Vec<MenuNode>,
    title: String,
}

impl Win32TrayBackend {
    pub fn new(sink: TrayEventSink) -> Self {
        Self {
            sink,
            window: 0,
            icon: 0,
            owns_icon: false,
            icon_visible: false,
            ignore_double_click: false,
            menu: Vec::new(),
            title: String::new(),
        }
    }

    fn ensure_window(&mut self) -> Option<HWND> {
        use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            CreateWindowExW, RegisterClassW, WNDCLASSW,
        };

        if self.window != 0 {
            return Some(self.window as _);
        }

        let class_name = to_wide("TuneDockTrayWindow");
        let instance = unsafe { GetModuleHandleW(std::ptr::null()) };

        let mut wc: WNDCLASSW = unsafe { std::mem::zeroed() };
        wc.lpfnWndProc = Some(tray_wnd_proc);
        wc.hInstance = instance;
        wc.lpszClassName = class_name.as_ptr();
        unsafe {
            RegisterClassW(&wc);
        }

        self.window = unsafe {
            CreateWindowExW(
                0,
                class_name.as_ptr(),
                class_name.as_ptr(),
                0,
                0,
                0,
                0,
                0,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                instance,
                std::ptr::null_mut(),
            ) as isize
        };

        (self.window != 0).then_some(self.window as _)
    }

    fn load_icon(&mut self, icon: Option<&IconImage>) -> HICON {
        use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
        use windows_sys::Win32::UI::WindowsAndMessaging::{CreateIcon, IDI_APPLICATION, LoadIconW};

        if let Some(icon) = icon {
            let width = icon.width as i32;
            let height = icon.height as i32;
            let mask_stride = (icon.width as usize).div_ceil(32) * 4;
            let and_mask = vec![0u8; mask_stride * icon.height as usize];
            let bgra = icon.to_bgra();
            let handle = unsafe {
                CreateIcon(
                    GetModuleHandleW(std::ptr::null()),
                    width,
                    height,
                    1,
                    32,
                    and_mask.as_ptr(),
                    bgra.as_ptr(),
                )
            };
            if !handle.is_null() {
                self.owns_icon = true;
                return handle;
            }
        }

        self.owns_icon = false;
        unsafe { LoadIconW(std::ptr::null_mut(), IDI_APPLICATION) }
    }

    fn release_icon(&mut self) {
        use windows_sys::Win32::UI::WindowsAndMessaging::DestroyIcon;

        if self.owns_icon && self.icon != 0 {
            unsafe {
                DestroyIcon(self.icon as _);
            }
        }
        self.icon = 0;
        self.owns_icon = false;
    }

    fn notify_data(&self) -> windows_sys::Win32::UI::Shell::NOTIFYICONDATAW {
        use windows_sys::Win32::UI::Shell::NOTIFYICONDATAW;

        let mut nid: NOTIFYICONDATAW = unsafe { std::mem::zeroed() };
        nid.cbSize = std::mem::size_of::<NOTIFYICONDATAW>() as u32;
        nid.hWnd = self.window as _;
        nid.uID = TRAY_ICON_ID;
        nid
    }

    fn write_tooltip(nid: &mut windows_sys::Win32::UI::Shell::NOTIFYICONDATAW, text: &str) {
        let text = if text.trim().is_empty() {
            DEFAULT_TOOLTIP
        } else {
            text.trim()
        };
        let tip = to_wide(text);
        let max_len = nid.szTip.len().saturating_sub(1).min(tip.len());
        nid.szTip[..max_len].copy_from_slice(&tip[..max_len]);
    }

    fn cursor_position() -> POINT {
        use windows_sys::Win32::UI::WindowsAndMessaging::GetCursorPos;

        let mut point = POINT { x: 0, y: 0 };
        unsafe {
            GetCursorPos(&mut point);
        }
        point
    }

    fn show_context_menu(&mut self) {
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            CreatePopupMenu, DestroyMenu, SetForegroundWindow, TPM_NONOTIFY, TPM_RETURNCMD,
            TPM_RIGHTBUTTON, TrackPopupMenu,
        };

        if self.window == 0 || self.menu.is_empty() {
            return;
        }

        let mut actions = Vec::new();
        let chosen = unsafe {
            let menu = CreatePopupMenu();
            if menu.is_null() {
                return;
            }
            append_items(menu, &self.menu, &mut actions);

            let point = Self::cursor_position();
            SetForegroundWindow(self.window as _);
            let chosen = TrackPopupMenu(
                menu,
                TPM_RETURNCMD | TPM_RIGHTBUTTON | TPM_NONOTIFY,
                point.x,
                point.y,
                0,
                self.window as _,
                std::ptr::null(),
            );
            DestroyMenu(menu);
            chosen
        };

        if chosen > 0
            && let Some(action) = actions.get(chosen as usize - 1)
        {
            (self.sink)(TrayEvent::Menu(*action));
        }
    }
}

/// Appends `nodes` to `menu`. Command ids are 1-based positions in `actions`.
unsafe fn append_items(menu: HMENU, nodes: &[MenuNode], actions: &mut Vec<MenuAction>) {
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        AppendMenuW, CreatePopupMenu, MF_CHECKED, MF_GRAYED, MF_POPUP, MF_SEPARATOR, MF_STRING,
    };

    for node in nodes {
        match node {
            MenuNode::Separator => unsafe {
                AppendMenuW(menu, MF_SEPARATOR, 0, std::ptr::null());
            },
            MenuNode::Normal {
                label,
                enabled,
                action,
            } => {
                let mut flags = MF_STRING;
                if !enabled {
                    flags |= MF_GRAYED;
                }
                let id = match action {
                    Some(action) => {
                        actions.push(*action);
                        actions.len()
                    }
                    None => 0,
                };
                let text = to_wide(&escape_label(label));
                unsafe {
                    AppendMenuW(menu, flags, id, text.as_ptr());
                }
            }
            MenuNode::Checkbox {
                label,
                enabled,
                checked,
                action,
            } => {
                let mut flags = MF_STRING;
                if !enabled {
                    flags |= MF_GRAYED;
                }
                if *checked {
                    flags |= MF_CHECKED;
                }
                actions.push(*action);
                let text = to_wide(&escape_label(label));
                unsafe {
                    AppendMenuW(menu, flags, actions.len(), text.as_ptr());
                }
            }
            MenuNode::Submenu {
                label,
                enabled,
                items,
            } => unsafe {
                let submenu = CreatePopupMenu();
                if submenu.is_null() {
                    continue;
                }
                append_items(submenu, items, actions);
                let mut flags = MF_STRING | MF_POPUP;
                if !enabled {
                    flags |= MF_GRAYED;
                }
                let text = to_wide(&escape_label(label));
                AppendMenuW(menu, flags, submenu as usize, text.as_ptr());
            },
        }
    }
}

impl TrayBackend for Win32TrayBackend {
    fn create_icon(&mut self, icon: Option<&IconImage>) -> Result<()> {
        use windows_sys::Win32::UI::Shell::{
            NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, Shell_NotifyIconW,
        };

        if self.icon_visible {
            return Ok(());
        }
        let Some(hwnd) = self.ensure_window() else {
            bail!("failed to create tray message window");
        };

        let handle = self.load_icon(icon);
        self.icon = handle as isize;

        let mut nid = self.notify_data();
        nid.hWnd = hwnd;
        nid.uFlags = NIF_MESSAGE | NIF_ICON | NIF_TIP;
        nid.uCallbackMessage = TRAY_CALLBACK_MSG;
        nid.hIcon = handle;
        Self::write_tooltip(&mut nid, &self.title);

        if unsafe { Shell_NotifyIconW(NIM_ADD, &nid) } == 0 {
            self.release_icon();
            bail!("Shell_NotifyIconW refused the tray icon");
        }
        self.icon_visible = true;
        Ok(())
    }

    fn destroy_icon(&mut self) {
        use windows_sys::Win32::UI::Shell::{NIM_DELETE, Shell_NotifyIconW};

        if !self.icon_visible || self.window == 0 {
            return;
        }

        let nid = self.notify_data();
        unsafe {
            Shell_NotifyIconW(NIM_DELETE, &nid);
        }
        self.release_icon();
        self.icon_visible = false;
        self.menu.clear();
    }

    fn set_ignore_double_click_events(&mut self, ignore: bool) {
        self.ignore_double_click = ignore;
    }

    fn set_menu(&mut self, menu: &[MenuNode]) {
        self.menu = menu.to_vec();
    }

    fn set_title(&mut self, title: &str) {
        use windows_sys::Win32::UI::Shell::{NIF_TIP, NIM_MODIFY, Shell_NotifyIconW};

        if self.title == title {
            return;
        }
        self.title = title.to_string();
        if !self.icon_visible {
            return;
        }

        let mut nid = self.notify_data();
        nid.uFlags = NIF_TIP;
        Self::write_tooltip(&mut nid, title);
        unsafe {
            Shell_NotifyIconW(NIM_MODIFY, &nid);
        }
    }

    fn bounds(&self) -> Option<Rect> {
        use windows_sys::Win32::UI::Shell::{NOTIFYICONIDENTIFIER, Shell_NotifyIconGetRect};

        if !self.icon_visible {
            return None;
        }

        let mut id: NOTIFYICONIDENTIFIER = unsafe { std::mem::zeroed() };
        id.cbSize = std::mem::size_of::<NOTIFYICONIDENTIFIER>() as u32;
        id.hWnd = self.window as _;
        id.uID = TRAY_ICON_ID;
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        };
        let result = unsafe { Shell_NotifyIconGetRect(&id, &mut rect) };
        (result == 0).then(|| Rect {
            x: rect.left,
            y: rect.top,
            width: rect.right - rect.left,
            height: rect.bottom - rect.top,
        })
    }

    fn pump(&mut self) {
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
        };

        unsafe {
            let mut msg: MSG = std::mem::zeroed();
            while PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_REMOVE) != 0 {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }

        let pending: Vec<NativeTrayMessage> = match PENDING.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => return,
        };
        for message in pending {
            match message {
                NativeTrayMessage::DoubleClick if self.ignore_double_click => {}
                NativeTrayMessage::Click | NativeTrayMessage::DoubleClick => {
                    let point = Self::cursor_position();
                    (self.sink)(TrayEvent::Clicked {
                        x: point.x,
                        y: point.y,
                    });
                }
                NativeTrayMessage::ContextMenu => self.show_context_menu(),
            }
        }
    }
}

impl Drop for Win32TrayBackend {
    fn drop(&mut self) {
        self.destroy_icon();
        if self.window != 0 {
            unsafe {
                windows_sys::Win32::UI::WindowsAndMessaging::DestroyWindow(self.window as _);
            }
            self.window = 0;
        }
    }
}

unsafe extern "system" fn tray_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        DefWindowProcW, WM_CONTEXTMENU, WM_LBUTTONDBLCLK, WM_LBUTTONUP, WM_RBUTTONUP,
    };

    if msg == TRAY_CALLBACK_MSG {
        let event = match (lparam as u32) & 0xFFFF {
            WM_LBUTTONUP => Some(NativeTrayMessage::Click),
            WM_LBUTTONDBLCLK => Some(NativeTrayMessage::DoubleClick),
            WM_RBUTTONUP | WM_CONTEXTMENU => Some(NativeTrayMessage::ContextMenu),
            _ => None,
        };
        if let Some(event) = event
            && let Ok(mut queue) = PENDING.lock()
        {
            queue.push(event);
        }
        return 0;
    }

    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

// Win32 menus use `&` as the accelerator prefix.
fn escape_label(label: &str) -> String {
    label.replace('&', "&&")
}

fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}
