//! Terminal rendering of the VU meter.

use crate::audio::level::MAX_LEVEL;

/// Render a level as a fixed-width bar, e.g. `[########------------]  42%`
pub fn render_meter(level: u8, width: usize) -> String {
    let level = level.min(MAX_LEVEL);
    let filled = width * level as usize / MAX_LEVEL as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        level
    )
}

/// One status line: device names followed by the bar
pub fn status_line(input: &str, output: &str, level: u8, width: usize) -> String {
    format!("{} -> {} {}", input, output, render_meter(level, width))
}
