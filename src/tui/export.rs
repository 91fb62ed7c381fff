//! Clipboard copy of artifact paths.
//!
//! Copy failures are cosmetic: they end up on the status line and nothing else.

use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Lazily start the thread that owns clipboard handles.
///
/// On X11/Wayland the copied text lives only as long as the `Clipboard` that set it, so
/// each handle is held for a couple of seconds before being dropped.
fn clipboard_sender() -> &'static std_mpsc::Sender<String> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                match arboard::Clipboard::new() {
                    Ok(mut clipboard) => {
                        if let Err(e) = clipboard.set_text(text) {
                            tracing::warn!(error = %e, "clipboard write failed");
                            continue;
                        }
                        std::thread::sleep(Duration::from_secs(2));
                    }
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });
        tx
    })
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    clipboard_sender()
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("clipboard thread exited"))
}

/// Copy the current page's artifact path and report on the status line.
pub fn copy_current_path(state: &mut UiState) {
    let Some(path) = state.current_artifact_path() else {
        state.info = "Nothing to copy on this page yet".into();
        return;
    };
    state.info = match copy_to_clipboard(&path) {
        Ok(()) => format!("Copied to clipboard: {}", shorten(&path, 60)),
        Err(e) => format!("Clipboard copy failed: {e:#}"),
    };
}

/// Trim `s` to `max` characters, ending in "..." when cut.
pub fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
