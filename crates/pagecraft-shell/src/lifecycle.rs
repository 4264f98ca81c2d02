//! Window lifecycle of the shell process

use crate::menu::Platform;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NoWindow,
    WindowOpen,
    WindowClosed,
}

/// What the event loop should do after a lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    CreateWindow,
    Quit,
    Stay,
}

#[derive(Debug)]
pub struct Lifecycle {
    platform: Platform,
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            state: LifecycleState::NoWindow,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn has_window(&self) -> bool {
        self.state == LifecycleState::WindowOpen
    }

    /// Application finished launching
    pub fn ready(&mut self) -> LifecycleAction {
        self.open_if_absent()
    }

    /// Application reactivated (dock click, resume)
    pub fn activate(&mut self) -> LifecycleAction {
        self.open_if_absent()
    }

    /// Window creation failed, stay windowless
    pub fn window_failed(&mut self) {
        self.state = LifecycleState::WindowClosed;
    }

    pub fn window_closed(&mut self) -> LifecycleAction {
        self.state = LifecycleState::WindowClosed;
        if self.platform.quits_when_last_window_closes() {
            LifecycleAction::Quit
        } else {
            debug!("Last window closed, staying alive until reactivated");
            LifecycleAction::Stay
        }
    }

    fn open_if_absent(&mut self) -> LifecycleAction {
        if self.has_window() {
            LifecycleAction::Stay
        } else {
            self.state = LifecycleState::WindowOpen;
            LifecycleAction::CreateWindow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_creates_window_once() {
        let mut lifecycle = Lifecycle::new(Platform::Other);
        assert_eq!(lifecycle.ready(), LifecycleAction::CreateWindow);
        assert_eq!(lifecycle.state(), LifecycleState::WindowOpen);
        assert_eq!(lifecycle.activate(), LifecycleAction::Stay);
        assert_eq!(lifecycle.activate(), LifecycleAction::Stay);
    }

    #[test]
    fn test_close_quits_outside_macos() {
        let mut lifecycle = Lifecycle::new(Platform::Other);
        lifecycle.ready();
        assert_eq!(lifecycle.window_closed(), LifecycleAction::Quit);
    }

    #[test]
    fn test_close_stays_on_macos_and_reactivates() {
        let mut lifecycle = Lifecycle::new(Platform::MacOs);
        lifecycle.ready();
        assert_eq!(lifecycle.window_closed(), LifecycleAction::Stay);
        assert_eq!(lifecycle.state(), LifecycleState::WindowClosed);
        assert_eq!(lifecycle.activate(), LifecycleAction::CreateWindow);
        assert_eq!(lifecycle.activate(), LifecycleAction::Stay);
    }

    #[test]
    fn test_window_failed_allows_retry() {
        let mut lifecycle = Lifecycle::new(Platform::MacOs);
        lifecycle.ready();
        lifecycle.window_failed();
        assert!(!lifecycle.has_window());
        assert_eq!(lifecycle.activate(), LifecycleAction::CreateWindow);
    }
}
