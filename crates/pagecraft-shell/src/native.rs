//! Native menu installation
//!
//! Application menus and popups go through `tray-icon`'s menu module on
//! macOS and Windows. Other targets have no native application menu; the
//! bound tree is still kept by the caller so click resolution is the same
//! everywhere.

use crate::bindings::{BoundMenu, BoundNode};
use crate::state::ShellEventSender;
use anyhow::Result;
use winit::window::Window;

pub use imp::NativeMenu;

/// Route native menu clicks to the main loop as `ShellEvent::MenuClicked`
pub fn forward_menu_events(sender: ShellEventSender) {
    imp::forward_menu_events(sender)
}

/// Build and install the application menu, replacing `previous`
pub fn install_app_menu(menus: &[BoundMenu], window: Option<&Window>, previous: Option<NativeMenu>) -> Result<NativeMenu> {
    imp::install_app_menu(menus, window, previous)
}

/// Show a popup at the cursor position over `window`
pub fn show_popup(items: &[BoundNode], window: &Window) -> Result<NativeMenu> {
    imp::show_popup(items, window)
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
mod imp {
    use super::*;
    #[cfg(target_os = "macos")]
    use crate::menu::MenuRole;
    use crate::menu::NativeRole;
    use crate::state::ShellEvent;
    use anyhow::Context;
    use raw_window_handle::{HasWindowHandle, RawWindowHandle};
    use tracing::{debug, warn};
    use tray_icon::menu::{
        accelerator::Accelerator, ContextMenu, IsMenuItem, Menu, MenuEvent, MenuItem, PredefinedMenuItem, Submenu,
    };

    /// Installed native menu. Dropping it releases the native objects.
    pub struct NativeMenu {
        menu: Menu,
        #[cfg(target_os = "windows")]
        hwnd: Option<isize>,
    }

    impl NativeMenu {
        /// Attach the menu bar to a newly created window (Windows menus are per window)
        pub fn attach_window(&mut self, window: &Window) {
            #[cfg(target_os = "windows")]
            {
                if let Some(hwnd) = hwnd_of(window) {
                    // SAFETY: hwnd belongs to a live winit window
                    match unsafe { self.menu.init_for_hwnd(hwnd) } {
                        Ok(()) => self.hwnd = Some(hwnd),
                        Err(e) => warn!("Failed to attach menu to window: {}", e),
                    }
                }
            }
            #[cfg(target_os = "macos")]
            let _ = window;
        }
    }

    enum NativeItem {
        Predefined(PredefinedMenuItem),
        Item(MenuItem),
        Submenu(Submenu),
    }

    impl NativeItem {
        fn as_dyn(&self) -> &dyn IsMenuItem {
            match self {
                NativeItem::Predefined(item) => item,
                NativeItem::Item(item) => item,
                NativeItem::Submenu(item) => item,
            }
        }
    }

    fn parse_accelerator(accelerator: Option<&str>) -> Option<Accelerator> {
        let text = accelerator?;
        match text.parse::<Accelerator>() {
            Ok(accel) => Some(accel),
            Err(e) => {
                warn!(accelerator = text, "Ignoring unparseable accelerator: {}", e);
                None
            }
        }
    }

    fn predefined(role: NativeRole, label: &str) -> PredefinedMenuItem {
        let text = Some(label);
        match role {
            NativeRole::Cut => PredefinedMenuItem::cut(text),
            NativeRole::Copy => PredefinedMenuItem::copy(text),
            NativeRole::Paste => PredefinedMenuItem::paste(text),
            NativeRole::SelectAll => PredefinedMenuItem::select_all(text),
            NativeRole::Minimize => PredefinedMenuItem::minimize(text),
            NativeRole::Close => PredefinedMenuItem::close_window(text),
            NativeRole::About => PredefinedMenuItem::about(text, None),
            NativeRole::Services => PredefinedMenuItem::services(text),
            NativeRole::Hide => PredefinedMenuItem::hide(text),
            NativeRole::HideOthers => PredefinedMenuItem::hide_others(text),
            NativeRole::ShowAll => PredefinedMenuItem::show_all(text),
            NativeRole::BringAllToFront => PredefinedMenuItem::bring_all_to_front(text),
        }
    }

    fn build_node(node: &BoundNode) -> Result<NativeItem> {
        Ok(match node {
            BoundNode::Separator => NativeItem::Predefined(PredefinedMenuItem::separator()),
            BoundNode::Native { label, role, .. } => NativeItem::Predefined(predefined(*role, label)),
            BoundNode::Item { id, entry } => NativeItem::Item(MenuItem::with_id(
                id.clone(),
                &entry.label,
                true,
                parse_accelerator(entry.accelerator.as_deref()),
            )),
            BoundNode::Submenu { label, items } => NativeItem::Submenu(build_submenu(label, items)?),
        })
    }

    fn build_submenu(label: &str, items: &[BoundNode]) -> Result<Submenu> {
        let submenu = Submenu::new(label, true);
        for node in items {
            let item = build_node(node)?;
            submenu
                .append(item.as_dyn())
                .with_context(|| format!("Failed to append to menu {}", label))?;
        }
        Ok(submenu)
    }

    fn build_menu_bar(menus: &[BoundMenu]) -> Result<Menu> {
        let menu = Menu::new();
        for top in menus {
            let submenu = build_submenu(&top.label, &top.items)?;
            #[cfg(target_os = "macos")]
            {
                match top.role {
                    Some(MenuRole::Window) => submenu.set_as_windows_menu_for_nsapp(),
                    Some(MenuRole::Help) => submenu.set_as_help_menu_for_nsapp(),
                    _ => {}
                }
            }
            menu.append(&submenu)
                .with_context(|| format!("Failed to append top-level menu {}", top.label))?;
        }
        Ok(menu)
    }

    #[cfg(target_os = "windows")]
    fn hwnd_of(window: &Window) -> Option<isize> {
        match window.window_handle().ok()?.as_raw() {
            RawWindowHandle::Win32(handle) => Some(handle.hwnd.get()),
            _ => None,
        }
    }

    pub fn install_app_menu(menus: &[BoundMenu], window: Option<&Window>, previous: Option<NativeMenu>) -> Result<NativeMenu> {
        let menu = build_menu_bar(menus)?;

        #[cfg(target_os = "macos")]
        {
            let _ = window;
            menu.init_for_nsapp();
            drop(previous);
            debug!("Application menu installed");
            Ok(NativeMenu { menu })
        }

        #[cfg(target_os = "windows")]
        {
            if let Some(old) = previous {
                if let Some(hwnd) = old.hwnd {
                    // SAFETY: the menu was attached to this window by init_for_hwnd
                    if let Err(e) = unsafe { old.menu.remove_for_hwnd(hwnd) } {
                        warn!("Failed to detach previous menu: {}", e);
                    }
                }
            }
            let mut installed = NativeMenu { menu, hwnd: None };
            if let Some(window) = window {
                installed.attach_window(window);
            }
            debug!("Application menu installed");
            Ok(installed)
        }
    }

    pub fn show_popup(items: &[BoundNode], window: &Window) -> Result<NativeMenu> {
        let menu = Menu::new();
        for node in items {
            let item = build_node(node)?;
            menu.append(item.as_dyn()).context("Failed to build popup menu")?;
        }

        let raw = window.window_handle().context("Window handle unavailable")?.as_raw();
        match raw {
            #[cfg(target_os = "macos")]
            RawWindowHandle::AppKit(handle) => {
                // SAFETY: ns_view belongs to a live winit window on the main thread
                let _ = unsafe { menu.show_context_menu_for_nsview(handle.ns_view.as_ptr() as _, None) };
            }
            #[cfg(target_os = "windows")]
            RawWindowHandle::Win32(handle) => {
                // SAFETY: hwnd belongs to a live winit window on the main thread
                let _ = unsafe { menu.show_context_menu_for_hwnd(handle.hwnd.get(), None) };
            }
            other => anyhow::bail!("Unsupported window handle for popup: {:?}", other),
        }

        Ok(NativeMenu {
            menu,
            #[cfg(target_os = "windows")]
            hwnd: None,
        })
    }

    pub fn forward_menu_events(sender: ShellEventSender) {
        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            debug!("Menu event: {:?}", event.id);
            let _ = sender.send(ShellEvent::MenuClicked(event.id.0));
        }));
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
mod imp {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tracing::{debug, warn};

    static WARNED: AtomicBool = AtomicBool::new(false);

    fn warn_once() {
        if !WARNED.swap(true, Ordering::Relaxed) {
            warn!("Native application menus are not available on this platform");
        }
    }

    /// Placeholder for targets without native menus
    pub struct NativeMenu;

    impl NativeMenu {
        pub fn attach_window(&mut self, _window: &Window) {}
    }

    pub fn install_app_menu(menus: &[BoundMenu], _window: Option<&Window>, _previous: Option<NativeMenu>) -> Result<NativeMenu> {
        warn_once();
        debug!(menus = menus.len(), "Application menu kept without native installation");
        Ok(NativeMenu)
    }

    pub fn show_popup(items: &[BoundNode], _window: &Window) -> Result<NativeMenu> {
        warn_once();
        debug!(items = items.len(), "Popup menu not shown");
        Ok(NativeMenu)
    }

    pub fn forward_menu_events(_sender: ShellEventSender) {}
}
