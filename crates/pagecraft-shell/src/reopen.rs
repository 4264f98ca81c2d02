//! Dock reactivation
//!
//! winit reports `resumed` only once on desktop, so a click on the dock icon
//! after the last window closed never reaches the event loop. On macOS the
//! application delegate gets `applicationShouldHandleReopen:hasVisibleWindows:`
//! added at startup, which forwards a `ShellEvent::Reactivated`.

use crate::state::ShellEvent;

/// Event to forward for a reopen request
pub fn reopen_event(has_visible_windows: bool) -> Option<ShellEvent> {
    if has_visible_windows {
        None
    } else {
        Some(ShellEvent::Reactivated)
    }
}

#[cfg(target_os = "macos")]
pub use imp::install_reopen_handler;

#[cfg(not(target_os = "macos"))]
pub fn install_reopen_handler(_events: crate::state::ShellEventSender) {}

#[cfg(target_os = "macos")]
#[allow(deprecated)] // cocoa crate deprecation warnings
mod imp {
    use super::reopen_event;
    use crate::state::ShellEventSender;
    use cocoa::appkit::NSApp;
    use cocoa::base::{id, nil};
    use objc::runtime::{class_addMethod, object_getClass, Class, Imp, Object, Sel, BOOL, NO, YES};
    use objc::{msg_send, sel, sel_impl, Encode};
    use std::ffi::CString;
    use std::sync::OnceLock;
    use tracing::{debug, info, warn};

    static REOPEN_EVENTS: OnceLock<ShellEventSender> = OnceLock::new();

    extern "C" fn should_handle_reopen(_this: &Object, _cmd: Sel, _app: id, has_visible_windows: BOOL) -> BOOL {
        if let Some(event) = reopen_event(has_visible_windows != NO) {
            debug!("Dock reopen with no visible window");
            if let Some(events) = REOPEN_EVENTS.get() {
                let _ = events.send(event);
            }
        }
        YES
    }

    /// Add the reopen handler to the application delegate winit installed.
    /// Must run after the event loop is created.
    pub fn install_reopen_handler(events: ShellEventSender) {
        if REOPEN_EVENTS.set(events).is_err() {
            return;
        }

        let types = match CString::new(format!("{0}@:@{0}", <BOOL as Encode>::encode().as_str())) {
            Ok(types) => types,
            Err(e) => {
                warn!("Invalid method encoding: {}", e);
                return;
            }
        };

        unsafe {
            let app = NSApp();
            let delegate: id = msg_send![app, delegate];
            if delegate == nil {
                warn!("No application delegate, dock reactivation unavailable");
                return;
            }

            let class = object_getClass(delegate as *const Object) as *mut Class;
            let handler = should_handle_reopen as extern "C" fn(&Object, Sel, id, BOOL) -> BOOL;
            let imp: Imp = std::mem::transmute(handler);
            let added = class_addMethod(
                class,
                sel!(applicationShouldHandleReopen:hasVisibleWindows:),
                imp,
                types.as_ptr(),
            );

            if added == NO {
                warn!("Application delegate already handles reopen, dock reactivation not hooked");
            } else {
                info!("Dock reactivation hooked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reopen_without_windows_reactivates() {
        assert_eq!(reopen_event(false), Some(ShellEvent::Reactivated));
    }

    #[test]
    fn test_reopen_with_visible_window_is_ignored() {
        assert_eq!(reopen_event(true), None);
    }
}
