#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Allow more than 3 bools in structs for input handling where bools represent distinct requests
    clippy::struct_excessive_bools
)]

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Colour of a single cell. `White` is reserved for the line clear overlay and
/// never assigned to a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellColor {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Magenta,
    White,
}

impl CellColor {
    /// Colours a new piece can be drawn in.
    pub const PIECE_COLORS: [Self; 7] = [
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Cyan,
        Self::Blue,
        Self::Magenta,
    ];

    #[must_use]
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::PIECE_COLORS[rng.usize(..Self::PIECE_COLORS.len())]
    }

    /// Single character used when a grid row is written to a save file.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Self::Red => 'r',
            Self::Orange => 'o',
            Self::Yellow => 'y',
            Self::Green => 'g',
            Self::Cyan => 'c',
            Self::Blue => 'b',
            Self::Magenta => 'm',
            Self::White => 'w',
        }
    }

    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'r' => Some(Self::Red),
            'o' => Some(Self::Orange),
            'y' => Some(Self::Yellow),
            'g' => Some(Self::Green),
            'c' => Some(Self::Cyan),
            'b' => Some(Self::Blue),
            'm' => Some(Self::Magenta),
            'w' => Some(Self::White),
            _ => None,
        }
    }

    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Red => (220, 50, 47),
            Self::Orange => (240, 140, 30),
            Self::Yellow => (240, 210, 40),
            Self::Green => (80, 200, 70),
            Self::Cyan => (40, 200, 220),
            Self::Blue => (50, 100, 230),
            Self::Magenta => (200, 60, 200),
            Self::White => (255, 255, 255),
        }
    }
}

/// Life-cycle state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// Part of the falling piece.
    Active,
    /// Locked into the grid.
    Settled,
    Blinking,
    Fading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// One grid-aligned unit of playfield or piece geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    color: CellColor,
    pub state: CellState,
    pub alpha: f32,
    /// Replaces `color` while the cell is blinking or fading.
    pub overlay: Option<CellColor>,
}

impl Cell {
    #[must_use]
    pub fn new(x: i32, y: i32, color: CellColor) -> Self {
        Self {
            x,
            y,
            color,
            state: CellState::Active,
            alpha: 1.0,
            overlay: None,
        }
    }

    #[must_use]
    pub fn settled(x: i32, y: i32, color: CellColor) -> Self {
        let mut cell = Self::new(x, y, color);
        cell.state = CellState::Settled;
        cell
    }

    #[must_use]
    pub fn color(&self) -> CellColor {
        self.color
    }

    /// Colour a renderer should draw: the overlay while animating, otherwise
    /// the natural colour.
    #[must_use]
    pub fn display_color(&self) -> CellColor {
        match self.state {
            CellState::Blinking | CellState::Fading => self.overlay.unwrap_or(self.color),
            CellState::Active | CellState::Settled => self.color,
        }
    }

    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }

    /// Puts a settled cell back to its natural, non-animating look.
    pub fn reset_visual(&mut self) {
        self.state = CellState::Settled;
        self.alpha = 1.0;
        self.overlay = None;
    }

    pub fn left(&mut self) {
        self.x -= 1;
    }

    pub fn right(&mut self) {
        self.x += 1;
    }

    pub fn down(&mut self) {
        self.y += 1;
    }

    /// Rotates the cell a quarter turn clockwise (y grows downwards) around
    /// `pivot`.
    ///
    /// Every relative quadrant (same column, pivot to the left, pivot to the
    /// right, same row) maps `(dx, dy)` to `(-dy, dx)`; the pivot itself stays put.
    pub fn rotate_about(&mut self, pivot: Position) {
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        self.x = pivot.x - dy;
        self.y = pivot.y + dx;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TetrominoType {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl TetrominoType {
    pub const ALL: [Self; 7] = [
        Self::I,
        Self::J,
        Self::L,
        Self::O,
        Self::S,
        Self::T,
        Self::Z,
    ];

    #[must_use]
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::ALL[rng.usize(..Self::ALL.len())]
    }

    /// Spawn footprint relative to the spawn origin, rows 0 and 1 only.
    #[must_use]
    pub fn get_blocks(self) -> [(i32, i32); 4] {
        match self {
            Self::I => [(0, 1), (1, 1), (2, 1), (3, 1)],
            Self::J => [(0, 0), (0, 1), (1, 1), (2, 1)],
            Self::L => [(2, 0), (0, 1), (1, 1), (2, 1)],
            Self::O => [(1, 0), (2, 0), (1, 1), (2, 1)],
            Self::S => [(1, 0), (2, 0), (0, 1), (1, 1)],
            Self::T => [(0, 1), (1, 1), (2, 1), (1, 0)],
            Self::Z => [(0, 0), (1, 0), (1, 1), (2, 1)],
        }
    }

    /// True when `cells`, in footprint order, are this type's shape in one
    /// of its four orientations.
    #[must_use]
    pub fn matches_shape(self, cells: &[Position; 4]) -> bool {
        let relative = |cells: [Position; 4]| {
            let origin = cells[0];
            cells.map(|p| (p.x - origin.x, p.y - origin.y))
        };
        let target = relative(*cells);

        let mut body = self
            .get_blocks()
            .map(|(x, y)| Cell::new(x, y, CellColor::White));
        for _ in 0..4 {
            if relative(body.each_ref().map(Cell::position)) == target {
                return true;
            }
            body.iter_mut()
                .for_each(|cell| cell.rotate_about(Position { x: 0, y: 0 }));
        }
        false
    }

    /// Index into `get_blocks()` of the cell the piece rotates around, `None`
    /// for shapes that never rotate.
    #[must_use]
    pub fn pivot_index(self) -> Option<usize> {
        match self {
            Self::O => None,
            Self::I | Self::T => Some(1),
            Self::S => Some(3),
            Self::J | Self::L | Self::Z => Some(2),
        }
    }
}

/// Logical request delivered by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Down,
    Rotate,
    Pause,
    HardDrop,
    ToggleShadow,
    Restart,
}

/// Poll-and-consume view of pending input requests.
///
/// The simulation asks whether an action is requested and clears it once it
/// has acted on it, so a held key only repeats when the input layer re-arms it.
pub trait InputSource {
    fn is_requested(&self, action: Action) -> bool;
    fn consume(&mut self, action: Action);

    /// Returns whether `action` was requested, clearing it.
    fn take(&mut self, action: Action) -> bool {
        let requested = self.is_requested(action);
        if requested {
            self.consume(action);
        }
        requested
    }
}

// Input state for keyboard controls
#[derive(Resource, Debug, Clone, Default)]
pub struct Input {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub rotate: bool,
    pub pause: bool,
    pub hard_drop: bool,
    pub toggle_shadow: bool,
    pub restart: bool,
}

impl Input {
    /// Arms the flag for `action`.
    pub fn request(&mut self, action: Action) {
        *self.flag_mut(action) = true;
    }

    fn flag_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Left => &mut self.left,
            Action::Right => &mut self.right,
            Action::Down => &mut self.down,
            Action::Rotate => &mut self.rotate,
            Action::Pause => &mut self.pause,
            Action::HardDrop => &mut self.hard_drop,
            Action::ToggleShadow => &mut self.toggle_shadow,
            Action::Restart => &mut self.restart,
        }
    }
}

impl InputSource for Input {
    fn is_requested(&self, action: Action) -> bool {
        match action {
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Down => self.down,
            Action::Rotate => self.rotate,
            Action::Pause => self.pause,
            Action::HardDrop => self.hard_drop,
            Action::ToggleShadow => self.toggle_shadow,
            Action::Restart => self.restart,
        }
    }

    fn consume(&mut self, action: Action) {
        *self.flag_mut(action) = false;
    }
}
