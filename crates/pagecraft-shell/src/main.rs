//! Pagecraft shell - owns the native window, application menu and OS dialogs
//!
//! Hosts the bus endpoint the front process connects to. The winit event
//! loop runs on the main thread (required for native menus on macOS); the
//! bus server runs on a tokio runtime in the background.

mod app;
mod bindings;
mod dialogs;
mod lifecycle;
mod menu;
mod native;
mod reopen;
mod state;
mod ws;

use anyhow::{Context, Result};
use clap::Parser;
use pagecraft_protocol::{BUS_PATH, DEFAULT_SHELL_ADDR};
use state::{ShellEvent, ShellEventSender, ShellState};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use winit::event_loop::EventLoop;

#[derive(Parser)]
#[command(name = "pagecraft-shell", about = "Pagecraft native shell")]
struct Cli {
    /// Bus listen address
    #[arg(long, default_value = DEFAULT_SHELL_ADDR)]
    listen: String,

    /// Application name shown in the window title and application menu
    #[arg(long, default_value = "Pagecraft")]
    app_name: String,

    /// Target of Help > Learn More
    #[arg(long, default_value = menu::DEFAULT_HELP_URL)]
    help_url: String,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("Starting Pagecraft shell on {}", cli.listen);

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ShellEvent>();
    let events = ShellEventSender::new(event_tx, event_loop.create_proxy());
    let state = Arc::new(ShellState::new(events.clone()));

    reopen::install_reopen_handler(events.clone());
    native::forward_menu_events(events);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let listener = runtime
        .block_on(tokio::net::TcpListener::bind(&cli.listen))
        .with_context(|| format!("Failed to bind to {}", cli.listen))?;
    info!("Bus listening on ws://{}{}", cli.listen, BUS_PATH);

    runtime.spawn(run_server(listener, Arc::clone(&state)));

    let mut app = app::ShellApp::new(
        menu::MenuSkeleton::new(cli.app_name, cli.help_url),
        state,
        event_rx,
        runtime.handle().clone(),
    );
    event_loop.run_app(&mut app).context("Event loop failed")?;

    info!("Shell exiting");
    runtime.shutdown_background();
    Ok(())
}

/// Serve the bus endpoint until Ctrl+C or a server error, then ask the main
/// loop to quit
async fn run_server(listener: tokio::net::TcpListener, state: Arc<ShellState>) {
    let router = axum::Router::new()
        .route(BUS_PATH, axum::routing::get(ws::bus_handler))
        .with_state(Arc::clone(&state));

    tokio::select! {
        result = axum::serve(listener, router).into_future() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    state.emit(ShellEvent::QuitRequested);
}
