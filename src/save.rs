#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Grid indices are validated against the field size before casting
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

//! Persistence of a running game as a small TOML document.
//!
//! The grid is stored one string per row, one character per column: `.` for
//! an empty slot, otherwise the colour code of the settled cell. Line clear
//! animations are not stored; complete rows found on load start a fresh one.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::components::{Cell, CellColor, Position, TetrominoType};
use crate::config::MIN_FIELD_SIZE;
use crate::piece::{Grid, Piece};
use crate::playfield::Playfield;

pub const SAVE_ENV_VAR: &str = "TETRAFADE_SAVE";

// Fallback save file path
const SAVE_FILE_PATH: &str = "tetrafade-save.toml";

const EMPTY_SLOT: char = '.';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    pub width: usize,
    pub height: usize,
    pub level: u32,
    pub lines: u32,
    pub paused: bool,
    pub shadow_visible: bool,
    pub game_over: bool,
    pub next_type: TetrominoType,
    pub next_color: CellColor,
    pub rows: Vec<String>,
    pub piece: PieceState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceState {
    pub kind: TetrominoType,
    pub color: CellColor,
    /// `[x, y]` of each body cell.
    pub cells: Vec<[i32; 2]>,
}

#[derive(Debug)]
pub enum SaveError {
    Io(io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Invalid(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "save I/O error: {e}"),
            SaveError::Parse(e) => write!(f, "malformed save file: {e}"),
            SaveError::Serialize(e) => write!(f, "could not serialize game: {e}"),
            SaveError::Invalid(msg) => write!(f, "invalid save file: {msg}"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            SaveError::Parse(e) => Some(e),
            SaveError::Serialize(e) => Some(e),
            SaveError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for SaveError {
    fn from(err: io::Error) -> Self {
        SaveError::Io(err)
    }
}

impl From<toml::de::Error> for SaveError {
    fn from(err: toml::de::Error) -> Self {
        SaveError::Parse(err)
    }
}

impl From<toml::ser::Error> for SaveError {
    fn from(err: toml::ser::Error) -> Self {
        SaveError::Serialize(err)
    }
}

fn invalid(msg: impl Into<String>) -> SaveError {
    SaveError::Invalid(msg.into())
}

impl SaveState {
    #[must_use]
    pub fn from_playfield(playfield: &Playfield) -> Self {
        let rows = playfield
            .grid()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|slot| slot.as_ref().map_or(EMPTY_SLOT, |cell| cell.color().code()))
                    .collect()
            })
            .collect();
        let piece = playfield.piece();
        let (next_type, next_color) = playfield.next();

        Self {
            width: playfield.width(),
            height: playfield.height(),
            level: playfield.level(),
            lines: playfield.lines(),
            paused: playfield.is_paused(),
            shadow_visible: playfield.is_shadow_visible(),
            game_over: playfield.is_game_over(),
            next_type,
            next_color,
            rows,
            piece: PieceState {
                kind: piece.kind(),
                color: piece.color(),
                cells: piece.positions().iter().map(|p| [p.x, p.y]).collect(),
            },
        }
    }

    /// Checks every field and rebuilds the playfield it describes.
    pub fn into_playfield(self) -> Result<Playfield, SaveError> {
        if self.width < MIN_FIELD_SIZE || self.height < MIN_FIELD_SIZE {
            return Err(invalid(format!(
                "field {}x{} is too small",
                self.width, self.height
            )));
        }
        if self.rows.len() != self.height {
            return Err(invalid(format!(
                "expected {} rows, found {}",
                self.height,
                self.rows.len()
            )));
        }
        if self.next_color == CellColor::White || self.piece.color == CellColor::White {
            return Err(invalid("white is not a piece colour"));
        }

        let grid = self.parse_grid()?;
        let positions = self.piece_positions(&grid)?;
        let piece = Piece::from_positions(self.piece.kind, self.piece.color, positions, self.level);

        Ok(Playfield::from_parts(
            grid,
            piece,
            (self.next_type, self.next_color),
            self.level,
            self.lines,
            self.paused,
            self.shadow_visible,
            self.game_over,
        ))
    }

    fn parse_grid(&self) -> Result<Grid, SaveError> {
        self.rows
            .iter()
            .enumerate()
            .map(|(y, row)| {
                let slots: Vec<Option<Cell>> = row
                    .chars()
                    .enumerate()
                    .map(|(x, code)| match code {
                        EMPTY_SLOT => Ok(None),
                        code => CellColor::from_code(code)
                            .map(|color| Some(Cell::settled(x as i32, y as i32, color)))
                            .ok_or_else(|| invalid(format!("unknown cell code {code:?} in row {y}"))),
                    })
                    .collect::<Result<_, _>>()?;
                if slots.len() == self.width {
                    Ok(slots)
                } else {
                    Err(invalid(format!(
                        "row {y} has {} columns, expected {}",
                        slots.len(),
                        self.width
                    )))
                }
            })
            .collect()
    }

    fn piece_positions(&self, grid: &Grid) -> Result<[Position; 4], SaveError> {
        let cells: [[i32; 2]; 4] = self
            .piece
            .cells
            .as_slice()
            .try_into()
            .map_err(|_| invalid(format!("piece has {} cells", self.piece.cells.len())))?;

        let mut seen = HashSet::new();
        for [x, y] in cells {
            let inside = (0..self.width as i32).contains(&x) && (0..self.height as i32).contains(&y);
            if !inside {
                return Err(invalid(format!("piece cell ({x}, {y}) is outside the field")));
            }
            if !seen.insert((x, y)) {
                return Err(invalid(format!("piece cell ({x}, {y}) is repeated")));
            }
            // A finished game may legitimately end with the spawn overlapping the stack
            if !self.game_over && grid[y as usize][x as usize].is_some() {
                return Err(invalid(format!("piece cell ({x}, {y}) overlaps the stack")));
            }
        }
        let positions = cells.map(|[x, y]| Position { x, y });
        if !self.piece.kind.matches_shape(&positions) {
            return Err(invalid(format!(
                "piece cells do not form a {:?} piece",
                self.piece.kind
            )));
        }
        Ok(positions)
    }
}

/// Writes `playfield` to `path`, creating parent directories as needed.
pub fn save_game(playfield: &Playfield, path: &Path) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let state = SaveState::from_playfield(playfield);
    fs::write(path, toml::to_string_pretty(&state)?)?;
    info!(
        "Saved game at level {} with {} lines to {}",
        state.level,
        state.lines,
        path.display()
    );
    Ok(())
}

/// Reads and validates the save at `path`.
pub fn read_save(path: &Path) -> Result<Playfield, SaveError> {
    let contents = fs::read_to_string(path)?;
    let state: SaveState = toml::from_str(&contents)?;
    state.into_playfield()
}

/// Restores a previous game for a `width` x `height` field. Any failure,
/// including a size mismatch, yields `None` so the caller starts fresh.
#[must_use]
pub fn load_game(path: &Path, width: usize, height: usize) -> Option<Playfield> {
    if !path.exists() {
        return None;
    }
    match read_save(path) {
        Ok(playfield) if playfield.width() == width && playfield.height() == height => {
            info!("Restored game from {}", path.display());
            Some(playfield)
        }
        Ok(playfield) => {
            warn!(
                "Discarding {}x{} save, field is configured as {width}x{height}",
                playfield.width(),
                playfield.height()
            );
            None
        }
        Err(e) => {
            warn!("Ignoring save file {}: {e}", path.display());
            None
        }
    }
}

#[must_use]
pub fn default_save_path() -> PathBuf {
    if let Ok(path) = std::env::var(SAVE_ENV_VAR) {
        return PathBuf::from(path);
    }
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("tetrafade").join("game.toml")
    } else {
        PathBuf::from(SAVE_FILE_PATH)
    }
}
