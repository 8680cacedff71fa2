//! Copying single invoice fields to the system clipboard.
//!
//! On X11 and Wayland the clipboard is served by the process that set it, so
//! a short-lived `gstx` keeps serving the value for [`HOLD_TIME`] or until
//! another program (usually a clipboard manager) takes ownership.

use std::time::Duration;

use anyhow::{Context, Result};
use arboard::Clipboard;

/// Longest value we will put on the clipboard.
const MAX_CLIPBOARD_SIZE: usize = 1024 * 1024;

/// How long a copy is served before `gstx` exits.
pub const HOLD_TIME: Duration = Duration::from_secs(15);

/// Something text can be copied into.
pub trait ClipboardProvider {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

impl<P: ClipboardProvider + ?Sized> ClipboardProvider for &mut P {
    fn set_text(&mut self, text: &str) -> Result<()> {
        (**self).set_text(text)
    }
}

/// The desktop clipboard, via arboard.
pub struct SystemClipboard {
    clipboard: Clipboard,
    /// Only X11 and Wayland wait after setting.
    #[cfg_attr(any(target_os = "macos", windows), allow(dead_code))]
    hold: Duration,
}

impl SystemClipboard {
    /// Connect to the clipboard. Fails in headless sessions.
    pub fn open() -> Result<Self> {
        let clipboard = Clipboard::new().context("clipboard is not available")?;
        Ok(Self {
            clipboard,
            hold: HOLD_TIME,
        })
    }
}

#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
))]
impl ClipboardProvider for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        use arboard::SetExtLinux;
        use console::style;
        use std::time::Instant;

        eprintln!(
            "{} Serving clipboard for up to {}s, paste now (a clipboard manager keeps it longer)",
            style("ℹ").blue(),
            self.hold.as_secs()
        );
        self.clipboard
            .set()
            .wait_until(Instant::now() + self.hold)
            .text(text)
            .context("failed to set clipboard contents")
    }
}

#[cfg(not(all(
    unix,
    not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
)))]
impl ClipboardProvider for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.clipboard
            .set_text(text)
            .context("failed to set clipboard contents")
    }
}

fn check_text(text: &str) -> Result<()> {
    if text.is_empty() {
        anyhow::bail!("nothing to copy");
    }
    if text.len() > MAX_CLIPBOARD_SIZE {
        anyhow::bail!(
            "value too large for clipboard ({} bytes, max {})",
            text.len(),
            MAX_CLIPBOARD_SIZE
        );
    }
    Ok(())
}

/// Copy `text` into `provider` after checking it is copyable.
pub fn copy_text<P: ClipboardProvider + ?Sized>(provider: &mut P, text: &str) -> Result<()> {
    check_text(text)?;
    provider.set_text(text)
}

/// In-memory clipboard for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryClipboard {
    pub text: Option<String>,
    pub fail: bool,
}

#[cfg(test)]
impl ClipboardProvider for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.fail {
            anyhow::bail!("clipboard locked");
        }
        self.text = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_gstin() {
        let mut memory = MemoryClipboard::default();

        copy_text(&mut memory, "27AAPFU0939F1ZV").unwrap();

        assert_eq!(memory.text.as_deref(), Some("27AAPFU0939F1ZV"));
    }

    #[test]
    fn test_provider_failure_is_reported() {
        let mut memory = MemoryClipboard {
            fail: true,
            ..MemoryClipboard::default()
        };

        let err = copy_text(&mut memory, "INV-42").unwrap_err();

        assert!(err.to_string().contains("clipboard locked"));
        assert_eq!(memory.text, None);
    }

    #[test]
    fn test_value_size_limits() {
        let mut memory = MemoryClipboard::default();

        assert!(copy_text(&mut memory, "").is_err());
        assert!(copy_text(&mut memory, &"x".repeat(MAX_CLIPBOARD_SIZE + 1)).is_err());
        assert!(memory.text.is_none());
        assert!(copy_text(&mut memory, &"x".repeat(MAX_CLIPBOARD_SIZE)).is_ok());
    }

    #[test]
    fn test_copy_through_trait_object() {
        let mut memory = MemoryClipboard::default();
        let provider: &mut dyn ClipboardProvider = &mut memory;

        copy_text(provider, "ST/2024/118").unwrap();

        assert_eq!(memory.text.as_deref(), Some("ST/2024/118"));
    }
}
