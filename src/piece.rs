#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Allow truncation when casting from usize to i32 since board dimensions are always small enough to fit in i32
    clippy::cast_possible_truncation,
    // Allow potential wrapping when casting between types as board coordinates are within reasonable ranges
    clippy::cast_possible_wrap,
    // Allow sign loss when going from signed to unsigned types since we validate values are non-negative before casting
    clippy::cast_sign_loss,
    // Movement permission and timer flags are independent pieces of state
    clippy::struct_excessive_bools
)]

use log::trace;

use crate::components::{Cell, CellColor, CellState, Position, TetrominoType};
use crate::game::drop_interval_ticks;

/// Settled cells, `height` rows of `width` optional cells.
pub type Grid = Vec<Vec<Option<Cell>>>;

/// True when `(x, y)` is outside the grid or holds a settled cell.
#[must_use]
pub fn is_blocked(grid: &[Vec<Option<Cell>>], x: i32, y: i32) -> bool {
    if x < 0 || y < 0 {
        return true;
    }
    grid.get(y as usize)
        .and_then(|row| row.get(x as usize))
        .is_none_or(Option::is_some)
}

/// The falling tetromino: four cells sharing one colour.
#[derive(Debug, Clone)]
pub struct Piece {
    kind: TetrominoType,
    color: CellColor,
    body: [Cell; 4],
    pub active: bool,
    pub can_move_left: bool,
    pub can_move_right: bool,
    pub collision: bool,
    paused: bool,
    drop_interval: u32,
    ticks_until_drop: u32,
}

impl Piece {
    /// Spawns a piece at the top centre of a field `width` columns wide.
    #[must_use]
    pub fn new(kind: TetrominoType, color: CellColor, width: usize, level: u32) -> Self {
        let origin_x = (width as i32 / 2 - 2).max(0);
        let cells = kind.get_blocks().map(|(dx, dy)| Position {
            x: origin_x + dx,
            y: dy,
        });
        Self::from_positions(kind, color, cells, level)
    }

    /// Builds a piece whose body sits at `cells`, in the order of the type's
    /// spawn footprint.
    #[must_use]
    pub fn from_positions(
        kind: TetrominoType,
        color: CellColor,
        cells: [Position; 4],
        level: u32,
    ) -> Self {
        let drop_interval = drop_interval_ticks(level);
        Self {
            kind,
            color,
            body: cells.map(|p| Cell::new(p.x, p.y, color)),
            active: true,
            can_move_left: true,
            can_move_right: true,
            collision: false,
            paused: false,
            drop_interval,
            ticks_until_drop: drop_interval,
        }
    }

    #[must_use]
    pub fn kind(&self) -> TetrominoType {
        self.kind
    }

    #[must_use]
    pub fn color(&self) -> CellColor {
        self.color
    }

    #[must_use]
    pub fn body(&self) -> &[Cell; 4] {
        &self.body
    }

    #[must_use]
    pub fn positions(&self) -> [Position; 4] {
        [
            self.body[0].position(),
            self.body[1].position(),
            self.body[2].position(),
            self.body[3].position(),
        ]
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn drop_interval(&self) -> u32 {
        self.drop_interval
    }

    /// Shifts one column left unless a cell would leave the grid or hit a
    /// settled cell. Returns whether the piece moved.
    pub fn move_left(&mut self, grid: &[Vec<Option<Cell>>]) -> bool {
        self.can_move_left = self.body.iter().all(|c| !is_blocked(grid, c.x - 1, c.y));
        if self.can_move_left {
            self.body.iter_mut().for_each(Cell::left);
        }
        self.can_move_left
    }

    /// Shifts one column right unless a cell would leave the grid or hit a
    /// settled cell. Returns whether the piece moved.
    pub fn move_right(&mut self, grid: &[Vec<Option<Cell>>]) -> bool {
        self.can_move_right = self.body.iter().all(|c| !is_blocked(grid, c.x + 1, c.y));
        if self.can_move_right {
            self.body.iter_mut().for_each(Cell::right);
        }
        self.can_move_right
    }

    /// Unconditional one-row shift.
    pub fn move_down(&mut self) {
        self.body.iter_mut().for_each(Cell::down);
    }

    /// One gravity step: locks the piece (clears `active`) when it has a
    /// collision or rests on the floor, otherwise moves it down a row.
    pub fn down(&mut self, height: usize) -> bool {
        if !self.active {
            return false;
        }
        if self.collision || self.at_floor(height) {
            self.active = false;
            trace!("{:?} piece deactivated", self.kind);
            return false;
        }
        self.move_down();
        true
    }

    /// Rotates the body clockwise around the pivot cell. Does not validate
    /// the result; the caller reverts when the new geometry does not fit.
    pub fn rotate(&mut self) {
        let Some(pivot_index) = self.kind.pivot_index() else {
            return;
        };
        let pivot = self.body[pivot_index].position();
        for cell in &mut self.body {
            cell.rotate_about(pivot);
        }
    }

    /// True when every body cell is inside the grid and on an empty slot.
    #[must_use]
    pub fn fits(&self, grid: &[Vec<Option<Cell>>]) -> bool {
        self.body.iter().all(|c| !is_blocked(grid, c.x, c.y))
    }

    #[must_use]
    pub fn at_floor(&self, height: usize) -> bool {
        self.body.iter().any(|c| c.y >= height as i32 - 1)
    }

    /// Row of the first body cell resting on a settled cell, if any.
    #[must_use]
    pub fn blocked_row(&self, grid: &[Vec<Option<Cell>>]) -> Option<i32> {
        let height = grid.len() as i32;
        self.body
            .iter()
            .find(|c| c.y + 1 < height && c.y + 1 >= 0 && is_blocked(grid, c.x, c.y + 1))
            .map(|c| c.y)
    }

    /// Advances the auto-drop timer by one tick. Returns true when a drop is
    /// due; a stopped timer never fires.
    pub fn tick(&mut self) -> bool {
        if !self.active || self.paused {
            return false;
        }
        self.ticks_until_drop = self.ticks_until_drop.saturating_sub(1);
        if self.ticks_until_drop == 0 {
            self.ticks_until_drop = self.drop_interval;
            true
        } else {
            false
        }
    }

    /// Stops the auto-drop timer.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Re-arms the auto-drop timer with a full interval.
    pub fn resume(&mut self) {
        self.paused = false;
        self.ticks_until_drop = self.drop_interval;
    }

    /// Hands the body over to the grid, marking every cell settled.
    #[must_use]
    pub fn into_settled_cells(self) -> [Cell; 4] {
        self.body.map(|mut cell| {
            cell.state = CellState::Settled;
            cell
        })
    }
}
