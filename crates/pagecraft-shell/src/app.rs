//! Main-thread application handler
//!
//! Owns the single window, the installed application menu and the current
//! popup. Everything that reaches the main thread arrives as a
//! [`ShellEvent`] drained from the channel whenever the loop is woken.

use crate::bindings::{self, ActionTable, Resolution, APP_MENU_PREFIX, POPUP_PREFIX};
use crate::dialogs;
use crate::lifecycle::{Lifecycle, LifecycleAction};
use crate::menu::{self, MenuAction, MenuSkeleton, Platform};
use crate::native::{self, NativeMenu};
use crate::state::{ShellEvent, ShellState};
use pagecraft_protocol::MenuItemDescriptor;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow},
    window::{Fullscreen, Window, WindowId},
};

/// Click tables of the installed menus. The latest generation wins.
#[derive(Default)]
pub struct MenuSlots {
    app_generation: u64,
    app: Option<ActionTable>,
    popup_generation: u64,
    popup: Option<ActionTable>,
}

impl MenuSlots {
    pub fn next_app_table(&mut self) -> ActionTable {
        self.app_generation += 1;
        ActionTable::new(APP_MENU_PREFIX, self.app_generation)
    }

    pub fn next_popup_table(&mut self) -> ActionTable {
        self.popup_generation += 1;
        ActionTable::new(POPUP_PREFIX, self.popup_generation)
    }

    pub fn set_app(&mut self, table: ActionTable) {
        self.app = Some(table);
    }

    pub fn set_popup(&mut self, table: ActionTable) {
        self.popup = Some(table);
    }

    /// Look up a clicked id. Stale and unknown ids resolve to nothing.
    pub fn resolve(&self, id: &str) -> Option<MenuAction> {
        let table = match bindings::parse_id(id).map(|p| p.prefix) {
            Some(POPUP_PREFIX) => self.popup.as_ref(),
            _ => self.app.as_ref(),
        }?;

        match table.resolve(id) {
            Resolution::Action(action) => Some(action.clone()),
            Resolution::Stale { generation } => {
                debug!(id, generation, current = table.generation(), "Ignoring click from replaced menu");
                None
            }
            Resolution::Unknown => {
                debug!(id, "Ignoring click on unknown menu item");
                None
            }
        }
    }
}

pub struct ShellApp {
    skeleton: MenuSkeleton,
    platform: Platform,
    state: Arc<ShellState>,
    events_rx: mpsc::UnboundedReceiver<ShellEvent>,
    runtime: tokio::runtime::Handle,
    lifecycle: Lifecycle,
    window: Option<Window>,
    slots: MenuSlots,
    app_menu: Option<NativeMenu>,
    popup: Option<NativeMenu>,
    started: bool,
}

impl ShellApp {
    pub fn new(
        skeleton: MenuSkeleton,
        state: Arc<ShellState>,
        events_rx: mpsc::UnboundedReceiver<ShellEvent>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let platform = Platform::current();
        Self {
            skeleton,
            platform,
            state,
            events_rx,
            runtime,
            lifecycle: Lifecycle::new(platform),
            window: None,
            slots: MenuSlots::default(),
            app_menu: None,
            popup: None,
            started: false,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) {
        let mut attributes = Window::default_attributes().with_title(self.skeleton.app_name.clone());
        if let Some(monitor) = event_loop.primary_monitor() {
            attributes = attributes.with_inner_size(monitor.size());
        }

        match event_loop.create_window(attributes) {
            Ok(window) => {
                if let Some(menu) = self.app_menu.as_mut() {
                    menu.attach_window(&window);
                }
                info!("Window created");
                self.window = Some(window);
            }
            Err(e) => {
                error!("Failed to create window: {}", e);
                self.lifecycle.window_failed();
            }
        }
    }

    fn apply(&mut self, action: LifecycleAction, event_loop: &ActiveEventLoop) {
        match action {
            LifecycleAction::CreateWindow => self.create_window(event_loop),
            LifecycleAction::Quit => {
                info!("Last window closed, quitting");
                event_loop.exit();
            }
            LifecycleAction::Stay => {}
        }
    }

    /// Rebuild and reinstall the whole application menu
    fn setup_app_menu(&mut self, items: &[MenuItemDescriptor]) {
        let tree = menu::build(&self.skeleton, items, self.platform);
        let mut table = self.slots.next_app_table();
        let bound = table.bind_menus(&tree.menus);

        match native::install_app_menu(&bound, self.window.as_ref(), self.app_menu.take()) {
            Ok(installed) => {
                info!(
                    generation = table.generation(),
                    insert_items = items.len(),
                    "Application menu rebuilt"
                );
                self.app_menu = Some(installed);
                self.slots.set_app(table);
            }
            Err(e) => error!("Failed to install application menu: {:#}", e),
        }
    }

    fn show_page_context_menu(&mut self, page_id: &str) {
        let Some(window) = self.window.as_ref() else {
            debug!(page_id, "No window, page context menu not shown");
            return;
        };

        let mut table = self.slots.next_popup_table();
        let bound = table.bind(&menu::page_context_menu(page_id));
        // Register before showing: the click may be delivered while the popup is open
        self.slots.set_popup(table);

        match native::show_popup(&bound, window) {
            Ok(popup) => self.popup = Some(popup),
            Err(e) => warn!("Failed to show page context menu: {:#}", e),
        }
    }

    fn perform(&mut self, action: MenuAction, event_loop: &ActiveEventLoop) {
        match action {
            MenuAction::Send(command) => self.state.send_command(&command),
            MenuAction::Native(role) => debug!(?role, "Native menu role handled by the OS"),
            MenuAction::ToggleFullScreen => {
                if let Some(window) = self.window.as_ref() {
                    let next = match window.fullscreen() {
                        Some(_) => None,
                        None => Some(Fullscreen::Borderless(None)),
                    };
                    window.set_fullscreen(next);
                }
            }
            MenuAction::PickImages => {
                dialogs::pick_images(&self.runtime, self.window.as_ref(), Arc::clone(&self.state));
            }
            MenuAction::OpenExternal(url) => {
                if let Err(e) = open::that(&url) {
                    warn!("Failed to open {}: {}", url, e);
                }
            }
            MenuAction::Quit => {
                info!("Quit requested from menu");
                event_loop.exit();
            }
        }
    }

    fn handle_event(&mut self, event: ShellEvent, event_loop: &ActiveEventLoop) {
        match event {
            ShellEvent::FrontConnected => info!("Front process attached"),
            ShellEvent::FrontDisconnected => info!("Front process detached"),
            ShellEvent::SetupAppMenu(items) => self.setup_app_menu(&items),
            ShellEvent::ShowPageContextMenu(page_id) => self.show_page_context_menu(&page_id),
            ShellEvent::MenuClicked(id) => {
                if let Some(action) = self.slots.resolve(&id) {
                    self.perform(action, event_loop);
                }
            }
            ShellEvent::ImagesPicked(picked) => {
                if let Some(command) = dialogs::insert_image_command(picked) {
                    self.state.send_command(&command);
                }
            }
            ShellEvent::Reactivated => {
                let action = self.lifecycle.activate();
                self.apply(action, event_loop);
            }
            ShellEvent::QuitRequested => {
                info!("Shutdown requested");
                event_loop.exit();
            }
        }
    }

    fn drain_events(&mut self, event_loop: &ActiveEventLoop) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event, event_loop);
        }
    }
}

impl ApplicationHandler for ShellApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        let action = if self.started {
            self.lifecycle.activate()
        } else {
            self.started = true;
            // Start with the skeleton only; the front sends its items once connected
            self.setup_app_menu(&[]);
            self.lifecycle.ready()
        };
        self.apply(action, event_loop);
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, _event: ()) {
        self.drain_events(event_loop);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(window_id) {
            return;
        }

        if let WindowEvent::CloseRequested = event {
            self.window = None;
            self.popup = None;
            let action = self.lifecycle.window_closed();
            self.apply(action, event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.drain_events(event_loop);
    }
}
