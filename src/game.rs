#![warn(clippy::all, clippy::pedantic)]

// Game board dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 23;

// Simulation timing
pub const UPDATE_RATE: f64 = 60.0; // Logical updates per second
pub const IDLE_SLEEP_MS: u64 = 1; // Back-off when no update is due

// Line clear animation budgets, in simulation frames
pub const BLINK_FRAMES: u32 = 24;
pub const BLINK_INTERVAL: u32 = 6; // Frames per white/natural cycle
pub const DISAPPEAR_FRAMES: u32 = 18;
pub const FADE_FRAMES: u32 = 12;

/// Total number of `update()` calls a line clear animation takes to complete.
pub const LINE_CLEAR_FRAMES: u32 = BLINK_FRAMES + DISAPPEAR_FRAMES + FADE_FRAMES;

// Level progression
pub const LINES_PER_LEVEL: u32 = 20;
pub const STARTING_LEVEL: u32 = 1;

// Game over when any piece cell on this row rests on a settled cell, whatever
// the other cells touch
pub const GAME_OVER_ROW: i32 = 1;

/// Auto-drop delay in seconds for the given level.
#[must_use]
pub fn drop_delay_seconds(level: u32) -> f64 {
    let level = f64::from(level.max(STARTING_LEVEL));
    if level < 10.0 {
        // Levels 1-9: linear decrease
        0.8 - (level - 1.0) * 0.07
    } else if level < 20.0 {
        // Levels 10-19: steeper decrease
        0.2 - (level - 10.0) * 0.01
    } else {
        0.1
    }
}

/// Auto-drop delay expressed in simulation ticks.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn drop_interval_ticks(level: u32) -> u32 {
    ((drop_delay_seconds(level) * UPDATE_RATE).round() as u32).max(1)
}
