use anyhow::Result;

#[cfg(not(target_os = "android"))]
pub(crate) fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text)?;
    Ok(())
}

/// `arboard` does not build on Android/Termux; report the copy as failed
/// so the badge path still behaves.
#[cfg(target_os = "android")]
pub(crate) fn copy_to_clipboard(_text: &str) -> Result<()> {
    anyhow::bail!("clipboard is unavailable on this platform")
}
