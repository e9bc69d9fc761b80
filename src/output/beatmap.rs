// Beatmap text output: one onset time per line, four decimals

use std::fs;
use std::path::Path;

use super::OutputError;

/// Format onset times as `0.1234` lines joined by newlines (no trailing newline)
pub fn format_beatmap(onsets: &[f64]) -> String {
    onsets
        .iter()
        .map(|t| format!("{:.4}", t))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the whole beatmap in one call
pub fn write_beatmap(path: &Path, onsets: &[f64]) -> Result<(), OutputError> {
    fs::write(path, format_beatmap(onsets))?;
    Ok(())
}
