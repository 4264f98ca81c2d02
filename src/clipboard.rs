//! Clipboard access

use tracing::{debug, error};

/// Copy `text` to the system clipboard. Failures are logged, never returned.
pub fn copy_to_clipboard(text: &str) {
    let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
    match result {
        Ok(()) => debug!(chars = text.chars().count(), "Copied to clipboard"),
        Err(e) => error!("Could not copy text to clipboard: {}", e),
    }
}
