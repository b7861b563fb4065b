#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Allow precision loss when casting frame counters to f32 since they stay far below 2^24
    clippy::cast_precision_loss
)]

use log::debug;

use crate::components::{Cell, CellColor, CellState};
use crate::game::{BLINK_FRAMES, BLINK_INTERVAL, DISAPPEAR_FRAMES, FADE_FRAMES};

/// Phases of a line clear, strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Cells alternate between white and their own colour.
    Blinking,
    /// Columns fade out one after another from the centre to the edges.
    Disappearing,
    /// The whole row turns white and fades.
    LineFading,
    Complete,
}

/// Sequencer for one completed row. It does not own the row's cells; the
/// playfield lends it the row slice on every frame.
#[derive(Debug, Clone)]
pub struct LineClearAnimation {
    row: usize,
    width: usize,
    phase: Phase,
    frame_counter: u32,
    disappear_order: Vec<usize>,
}

impl LineClearAnimation {
    #[must_use]
    pub fn new(row: usize, width: usize) -> Self {
        Self {
            row,
            width,
            phase: Phase::Blinking,
            frame_counter: 0,
            disappear_order: center_out_order(width),
        }
    }

    #[must_use]
    pub fn row(&self) -> usize {
        self.row
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn frame(&self) -> u32 {
        self.frame_counter
    }

    #[must_use]
    pub fn disappear_order(&self) -> &[usize] {
        &self.disappear_order
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Moves the animation to another row index after the grid was compacted.
    pub(crate) fn retarget(&mut self, row: usize) {
        self.row = row;
    }

    /// Advances one frame over `cells` (the animated row, indexed by column).
    /// Returns whether the animation is still running.
    pub fn update(&mut self, cells: &mut [Option<Cell>]) -> bool {
        self.frame_counter += 1;
        match self.phase {
            Phase::Blinking => {
                self.update_blinking(cells);
                if self.frame_counter >= BLINK_FRAMES {
                    self.enter(Phase::Disappearing);
                    for cell in cells.iter_mut().flatten() {
                        cell.state = CellState::Settled;
                        cell.overlay = None;
                    }
                }
            }
            Phase::Disappearing => {
                self.update_disappearing(cells);
                if self.frame_counter >= DISAPPEAR_FRAMES {
                    self.enter(Phase::LineFading);
                    for cell in cells.iter_mut().flatten() {
                        cell.overlay = Some(CellColor::White);
                        cell.alpha = 1.0;
                    }
                }
            }
            Phase::LineFading => {
                self.update_line_fading(cells);
                if self.frame_counter >= FADE_FRAMES {
                    self.enter(Phase::Complete);
                    return false;
                }
            }
            Phase::Complete => return false,
        }
        true
    }

    fn enter(&mut self, phase: Phase) {
        debug!("Row {} animation: {:?} -> {:?}", self.row, self.phase, phase);
        self.phase = phase;
        self.frame_counter = 0;
    }

    fn update_blinking(&self, cells: &mut [Option<Cell>]) {
        let show_white = self.frame_counter % BLINK_INTERVAL < BLINK_INTERVAL / 2;
        for cell in cells.iter_mut().flatten() {
            cell.state = CellState::Blinking;
            cell.overlay = show_white.then_some(CellColor::White);
        }
    }

    fn update_disappearing(&self, cells: &mut [Option<Cell>]) {
        let columns = self.disappear_order.len();
        if columns == 0 {
            return;
        }
        let frames = DISAPPEAR_FRAMES as usize;
        let frame = self.frame_counter as usize;
        // ceil((frame + 1) * columns / frames)
        let started = ((frame + 1) * columns).div_ceil(frames).min(columns);

        for (i, &x) in self.disappear_order.iter().take(started).enumerate() {
            let Some(cell) = cells.get_mut(x).and_then(Option::as_mut) else {
                continue;
            };
            let start_frame = i * frames / columns;
            let fade_frames = frames.saturating_sub(start_frame);
            cell.state = CellState::Fading;
            cell.alpha = if fade_frames > 0 {
                let age = frame.saturating_sub(start_frame) as f32;
                (1.0 - age / fade_frames as f32).clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
    }

    fn update_line_fading(&self, cells: &mut [Option<Cell>]) {
        let alpha = (1.0 - self.frame_counter as f32 / FADE_FRAMES as f32).clamp(0.0, 1.0);
        for cell in cells.iter_mut().flatten() {
            cell.state = CellState::Fading;
            cell.alpha = alpha;
            cell.overlay = Some(CellColor::White);
        }
    }
}

/// Column visiting order from the centre outwards, alternating left and right.
#[must_use]
pub fn center_out_order(width: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(width);
    if width == 0 {
        return order;
    }
    let center = width / 2;
    // Even widths start from the two central columns, odd widths from the middle one
    let (left_start, right_start) = if width % 2 == 0 {
        order.push(center - 1);
        order.push(center);
        (center - 1, center)
    } else {
        order.push(center);
        (center, center)
    };

    let mut offset = 1;
    while offset <= left_start || right_start + offset < width {
        if offset <= left_start {
            order.push(left_start - offset);
        }
        if right_start + offset < width {
            order.push(right_start + offset);
        }
        offset += 1;
    }
    order
}
