//! Pagecraft front - headless driver
//!
//! Connects to the shell, publishes the insertable block list and logs every
//! command routed from the native menus.

use anyhow::{Context, Result};
use pagecraft::{CommandPorts, CommandRouter, Config, DocumentStore, EventSender, FrontEvent, ShellClient};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Editor ports that only record what they were asked to do
#[derive(Default)]
struct HeadlessEditor {
    pages: Vec<String>,
    next_page: u32,
}

impl CommandPorts for HeadlessEditor {
    fn on_page_add(&mut self) {
        self.next_page += 1;
        let id = format!("page-{}", self.next_page);
        info!(page = %id, "Page added");
        self.pages.push(id);
    }

    fn on_page_delete(&mut self, page_id: &str) {
        let before = self.pages.len();
        self.pages.retain(|p| p != page_id);
        if self.pages.len() == before {
            warn!(page = page_id, "Delete requested for unknown page");
        } else {
            info!(page = page_id, "Page deleted");
        }
    }

    fn on_insert_node(&mut self, label: &str) {
        info!(block = label, "Insert block");
    }

    fn on_undo(&mut self) {
        info!("Undo");
    }

    fn on_redo(&mut self) {
        info!("Redo");
    }

    fn on_insert_image(&mut self, paths: &[String]) {
        info!(count = paths.len(), "Insert images: {:?}", paths);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config, using defaults: {:#}", e);
            Config::default()
        }
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<FrontEvent>();
    let events = EventSender::new(event_tx);

    let store = DocumentStore::open_default()?;
    match store.load() {
        Ok(Some(document)) => info!(bytes = document.len(), "Loaded last document"),
        Ok(None) => debug!("No stored document"),
        Err(e) => warn!("Failed to load stored document: {}", e),
    }

    let client = ShellClient::connect(&config.bus.shell_addr, events.clone()).context("Failed to start bus client")?;
    let mut router = CommandRouter::new(HeadlessEditor::default(), config.bus.unroutable);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let watcher = store.watcher(Duration::from_millis(config.storage.poll_interval_ms));
        tokio::spawn(watcher.run(events));

        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    let Some(event) = event else { break };
                    match event {
                        FrontEvent::ShellConnected => {
                            info!(items = config.menu.insert_items.len(), "Shell connected, sending insert menu");
                            client.setup_app_menu(&config.menu.insert_items);
                        }
                        FrontEvent::ShellDisconnected => info!("Shell disconnected"),
                        FrontEvent::Command(command) => {
                            router.dispatch(&command);
                        }
                        // Hook for multi-window sync, observed only
                        FrontEvent::StorageChanged => info!("Storage changed"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down...");
                    break;
                }
            }
        }
    });

    let stats = router.stats();
    info!(
        routed = stats.routed,
        unroutable = stats.unroutable,
        invalid = stats.invalid,
        "Front exiting"
    );
    Ok(())
}
