use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use crate::export;
use crate::model::ResultSet;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Export the current result set's CSV. `path_override` comes from
/// `--export-csv`; otherwise the fixed default name is used.
pub(super) fn export_result_csv(result: &ResultSet, path_override: Option<&Path>) -> Result<PathBuf> {
    export::export_csv(result, path_override)
}

/// Initialize the clipboard manager thread if not already initialized.
/// A dedicated thread processes clipboard writes sequentially and keeps each
/// clipboard instance alive long enough for clipboard managers to read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        // Give clipboard managers time to read before the
                        // instance drops, especially on Linux.
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Copy text to the clipboard. Returns after queuing the write, without
/// blocking the UI thread.
pub(super) fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
