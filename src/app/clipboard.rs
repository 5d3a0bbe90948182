//! An abstraction over the system clipboard to enable testing.

use anyhow::Result;
use arboard::Clipboard;

/// Argument that starts the process as a clipboard holder (Linux only).
pub const DAEMON_FLAG: &str = "__clipboard_daemon";

/// Receives the exported document when the user copies instead of saving.
pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: String) -> Result<()>;
}

/// The production implementation backed by `arboard`.
///
/// On Linux the clipboard contents are owned by the process that set them,
/// so the text is handed to a detached copy of this executable which keeps
/// serving it after the command-line process exits.
#[derive(Debug, Default)]
pub struct ArboardClipboard;

impl ClipboardSink for ArboardClipboard {
    fn set_text(&self, text: String) -> Result<()> {
        #[cfg(not(target_os = "linux"))]
        {
            let mut clipboard = Clipboard::new()?;
            clipboard.set_text(text)?;
        }

        #[cfg(target_os = "linux")]
        {
            use std::io::Write;
            use std::process::{Command, Stdio};

            let mut child = Command::new(std::env::current_exe()?)
                .arg(DAEMON_FLAG)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .current_dir("/")
                .spawn()?;

            let Some(mut stdin) = child.stdin.take() else {
                return Err(anyhow::anyhow!("Failed to get stdin for clipboard daemon"));
            };
            stdin.write_all(text.as_bytes())?;
            stdin.flush()?;
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn run_daemon_mode() -> Result<()> {
    use arboard::SetExtLinux;

    let text = std::io::read_to_string(std::io::stdin())?;
    let mut clipboard = Clipboard::new()?;
    // Blocks until another program takes ownership of the clipboard.
    clipboard.set().wait().text(text)?;
    Ok(())
}

/// Runs the clipboard holder when the daemon flag is present.
/// Returns `Ok(true)` if it ran and the process should exit.
pub fn check_and_run_daemon_if_requested() -> Result<bool> {
    if !std::env::args().any(|a| a == DAEMON_FLAG) {
        return Ok(false);
    }

    #[cfg(target_os = "linux")]
    run_daemon_mode()?;

    #[cfg(not(target_os = "linux"))]
    tracing::warn!("{} used on a non-Linux system, ignoring", DAEMON_FLAG);

    Ok(true)
}
