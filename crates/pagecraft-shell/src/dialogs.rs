//! Native file dialogs

use pagecraft_protocol::FrontCommand;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::state::{ShellEvent, ShellState};

/// Extensions accepted by Insert ▸ Image…
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "gif", "svg"];

/// Open the multi-select image dialog. The result comes back to the main
/// loop as [`ShellEvent::ImagesPicked`].
pub fn pick_images<W>(runtime: &tokio::runtime::Handle, parent: Option<&W>, state: Arc<ShellState>)
where
    W: HasWindowHandle + HasDisplayHandle,
{
    let mut dialog = rfd::AsyncFileDialog::new()
        .set_title("Insert Image")
        .add_filter("Images", IMAGE_EXTENSIONS);
    if let Some(parent) = parent {
        dialog = dialog.set_parent(parent);
    }

    let picking = dialog.pick_files();
    runtime.spawn(async move {
        let picked = picking
            .await
            .map(|files| files.iter().map(|f| f.path().to_path_buf()).collect::<Vec<_>>());
        state.emit(ShellEvent::ImagesPicked(picked.map(paths_to_strings)));
    });
}

fn paths_to_strings(paths: Vec<PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

/// Command to send for a dialog result. Cancelling (or picking nothing)
/// short-circuits the insert.
pub fn insert_image_command(picked: Option<Vec<String>>) -> Option<FrontCommand> {
    match picked {
        Some(paths) if !paths.is_empty() => Some(FrontCommand::InsertImage { paths }),
        _ => {
            debug!("Image dialog cancelled");
            None
        }
    }
}
