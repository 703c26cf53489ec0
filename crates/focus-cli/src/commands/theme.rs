//! Theme command: show or set the dark mode preference.

use std::io::Write;

use anyhow::{Context, Result};
use focus_core::KeyValueStore;
use focus_core::store::{load_dark_mode, save_dark_mode};

fn describe(dark_mode: Option<bool>) -> &'static str {
    match dark_mode {
        Some(true) => "dark",
        Some(false) => "light",
        None => "system",
    }
}

/// Prints the preference, after replacing it when `update` is given.
///
/// `update` is `Some(None)` to follow the system theme.
pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    mut store: S,
    update: Option<Option<bool>>,
) -> Result<()> {
    if let Some(dark_mode) = update {
        save_dark_mode(&mut store, dark_mode).context("failed to save theme")?;
        tracing::debug!(theme = describe(dark_mode), "theme updated");
    }

    let dark_mode = load_dark_mode(&store).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "discarding unreadable theme");
        None
    });
    writeln!(writer, "Тема: {}", describe(dark_mode))?;
    Ok(())
}
