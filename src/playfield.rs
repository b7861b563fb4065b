#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Allow truncation when casting from usize to i32 since board dimensions are always small enough to fit in i32
    clippy::cast_possible_truncation,
    // Allow potential wrapping when casting between types as board coordinates are within reasonable ranges
    clippy::cast_possible_wrap,
    // Allow sign loss when going from signed to unsigned types since we validate values are non-negative before casting
    clippy::cast_sign_loss,
    // Pause, shadow and game-over flags are independent pieces of state
    clippy::struct_excessive_bools
)]

use std::collections::{BTreeMap, BTreeSet};

use bevy_ecs::prelude::*;
use log::{debug, info, trace};

use crate::animation::LineClearAnimation;
use crate::components::{Action, Cell, CellColor, InputSource, Position, TetrominoType};
use crate::game::{GAME_OVER_ROW, LINES_PER_LEVEL, STARTING_LEVEL};
use crate::piece::{Grid, Piece, is_blocked};
use crate::sound::{AudioSink, SoundEffect};

/// The game field: settled cells, the falling piece, its shadow, pending line
/// clear animations and the line/level counters.
#[derive(Resource, Debug)]
pub struct Playfield {
    width: usize,
    height: usize,
    grid: Grid,
    shadow: [Cell; 4],
    settled_cells: usize,
    paused: bool,
    shadow_visible: bool,
    piece: Piece,
    next_type: TetrominoType,
    next_color: CellColor,
    level: u32,
    lines: u32,
    game_over: bool,
    /// In-progress animations keyed by the row they claim.
    animations: BTreeMap<usize, LineClearAnimation>,
    rng: fastrand::Rng,
}

impl Playfield {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_rng(width, height, fastrand::Rng::new())
    }

    /// Field whose piece sequence is reproducible for a given seed.
    #[must_use]
    pub fn with_seed(width: usize, height: usize, seed: u64) -> Self {
        Self::with_rng(width, height, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(width: usize, height: usize, mut rng: fastrand::Rng) -> Self {
        let piece = Piece::new(
            TetrominoType::random(&mut rng),
            CellColor::random(&mut rng),
            width,
            STARTING_LEVEL,
        );
        let next_type = TetrominoType::random(&mut rng);
        let next_color = CellColor::random(&mut rng);
        let shadow = piece.body().clone();
        let mut playfield = Self {
            width,
            height,
            grid: vec![vec![None; width]; height],
            shadow,
            settled_cells: 0,
            paused: false,
            shadow_visible: true,
            piece,
            next_type,
            next_color,
            level: STARTING_LEVEL,
            lines: 0,
            game_over: false,
            animations: BTreeMap::new(),
            rng,
        };
        playfield.update_shadow();
        debug!("New {width}x{height} playfield");
        playfield
    }

    /// Rebuilds a field from persisted parts. Counters are taken as given, the
    /// settled-cell count is recomputed, and any complete row gets a fresh
    /// animation.
    #[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
    pub(crate) fn from_parts(
        grid: Grid,
        piece: Piece,
        next: (TetrominoType, CellColor),
        level: u32,
        lines: u32,
        paused: bool,
        shadow_visible: bool,
        game_over: bool,
    ) -> Self {
        let height = grid.len();
        let width = grid.first().map_or(0, Vec::len);
        let settled_cells = grid.iter().flatten().filter(|slot| slot.is_some()).count();
        let shadow = piece.body().clone();
        let mut playfield = Self {
            width,
            height,
            grid,
            shadow,
            settled_cells,
            paused,
            shadow_visible,
            piece,
            next_type: next.0,
            next_color: next.1,
            level: level.max(STARTING_LEVEL),
            lines,
            game_over,
            animations: BTreeMap::new(),
            rng: fastrand::Rng::new(),
        };
        if paused {
            playfield.piece.pause();
        }
        playfield.update_shadow();
        if !game_over {
            playfield.spawn_line_animations();
        }
        playfield
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn grid(&self) -> &[Vec<Option<Cell>>] {
        &self.grid
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.grid.get(y)?.get(x)?.as_ref()
    }

    #[must_use]
    pub fn shadow(&self) -> &[Cell; 4] {
        &self.shadow
    }

    #[must_use]
    pub fn piece(&self) -> &Piece {
        &self.piece
    }

    #[must_use]
    pub fn next(&self) -> (TetrominoType, CellColor) {
        (self.next_type, self.next_color)
    }

    #[must_use]
    pub fn settled_cells(&self) -> usize {
        self.settled_cells
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn lines(&self) -> u32 {
        self.lines
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn is_shadow_visible(&self) -> bool {
        self.shadow_visible
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.animations.is_empty()
    }

    pub fn animations(&self) -> impl Iterator<Item = &LineClearAnimation> {
        self.animations.values()
    }

    /// Rows currently claimed by a line clear animation.
    pub fn claimed_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.animations.keys().copied()
    }

    pub fn set_shadow_visible(&mut self, visible: bool) {
        self.shadow_visible = visible;
    }

    /// Puts a settled cell at `(x, y)`. Returns false when the slot is out of
    /// range or already occupied.
    pub fn place_settled(&mut self, x: usize, y: usize, color: CellColor) -> bool {
        match self.grid.get_mut(y).and_then(|row| row.get_mut(x)) {
            Some(slot @ None) => {
                *slot = Some(Cell::settled(x as i32, y as i32, color));
                self.settled_cells += 1;
                true
            }
            _ => false,
        }
    }

    /// Swaps in a specific falling piece.
    pub fn replace_piece(&mut self, mut piece: Piece) {
        if self.paused || self.is_animating() {
            piece.pause();
        }
        self.piece = piece;
        self.update_shadow();
    }

    /// Advances the simulation by one tick.
    pub fn update(&mut self, input: &mut dyn InputSource, audio: &mut dyn AudioSink) {
        if self.game_over {
            return;
        }
        trace!("Playfield tick");

        if self.is_animating() {
            self.update_animations(audio);
            return;
        }

        if self.process_input(input, audio) {
            return;
        }

        if !self.paused && self.piece.tick() {
            self.refresh_collision();
            self.piece.down(self.height);
        }

        if self.piece.active {
            self.update_shadow();
            self.check_collisions(audio);
            if self.game_over {
                return;
            }
        }

        if !self.piece.active {
            self.lock_piece(audio);
        }
    }

    /// Handles pending requests. Returns true when the tick ended early
    /// (instant drop or game over).
    fn process_input(&mut self, input: &mut dyn InputSource, audio: &mut dyn AudioSink) -> bool {
        // A piece locked by a soft drop earlier in this pass no longer moves
        if input.take(Action::Left) && self.can_steer() {
            self.piece.move_left(&self.grid);
        }
        if input.take(Action::Right) && self.can_steer() {
            self.piece.move_right(&self.grid);
        }
        if input.take(Action::Down) && self.can_steer() {
            self.refresh_collision();
            self.piece.down(self.height);
        }
        if input.take(Action::Rotate) && self.can_steer() {
            self.rotate_piece();
        }
        if input.take(Action::Pause) {
            self.toggle_pause();
        }
        if input.take(Action::ToggleShadow) {
            self.shadow_visible = !self.shadow_visible;
            debug!("Shadow visible: {}", self.shadow_visible);
        }
        if input.take(Action::HardDrop) && !self.paused && self.piece.active {
            self.move_instant_down(audio);
            return true;
        }
        false
    }

    fn can_steer(&self) -> bool {
        !self.paused && self.piece.active
    }

    fn rotate_piece(&mut self) {
        let before = self.piece.clone();
        self.piece.rotate();
        if !self.piece.fits(&self.grid) {
            trace!("Rotation of {:?} rejected", self.piece.kind());
            self.piece = before;
        }
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if self.paused {
            self.piece.pause();
        } else {
            self.piece.resume();
        }
        info!("Game {}", if self.paused { "paused" } else { "resumed" });
    }

    /// Drops the piece as far as it goes, then locks it.
    fn move_instant_down(&mut self, audio: &mut dyn AudioSink) {
        loop {
            self.refresh_collision();
            if !self.piece.down(self.height) {
                break;
            }
        }
        debug!("Instant drop of {:?}", self.piece.kind());
        self.lock_piece(audio);
    }

    fn refresh_collision(&mut self) {
        self.piece.collision = self.piece.blocked_row(&self.grid).is_some();
    }

    fn check_collisions(&mut self, audio: &mut dyn AudioSink) {
        self.piece.collision = self.piece.blocked_row(&self.grid).is_some();
        let blocked_near_spawn = self
            .piece
            .body()
            .iter()
            .any(|c| c.y == GAME_OVER_ROW && is_blocked(&self.grid, c.x, c.y + 1));
        if blocked_near_spawn {
            self.end_game(audio);
        }
    }

    /// Projects the piece straight down to where it would land.
    fn update_shadow(&mut self) {
        let mut shadow = self.piece.body().clone();
        let lands = |cells: &[Cell; 4], grid: &[Vec<Option<Cell>>]| {
            cells.iter().any(|c| is_blocked(grid, c.x, c.y + 1))
        };
        while !lands(&shadow, &self.grid) {
            shadow.iter_mut().for_each(Cell::down);
        }
        self.shadow = shadow;
    }

    fn end_game(&mut self, audio: &mut dyn AudioSink) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        info!(
            "Game over at level {} with {} lines cleared",
            self.level, self.lines
        );
        audio.play_sound(SoundEffect::GameOver);
    }

    /// Moves the piece into the grid, spawns the next one and looks for
    /// completed rows.
    fn lock_piece(&mut self, audio: &mut dyn AudioSink) {
        let next = Piece::new(self.next_type, self.next_color, self.width, self.level);
        let locked = std::mem::replace(&mut self.piece, next);
        debug!("Locking {:?} piece", locked.kind());
        for cell in locked.into_settled_cells() {
            let (x, y) = (cell.x as usize, cell.y as usize);
            if let Some(slot) = self.grid.get_mut(y).and_then(|row| row.get_mut(x)) {
                *slot = Some(cell);
                self.settled_cells += 1;
            }
        }

        self.next_type = TetrominoType::random(&mut self.rng);
        self.next_color = CellColor::random(&mut self.rng);
        if self.paused {
            self.piece.pause();
        }

        if !self.piece.fits(&self.grid) {
            self.end_game(audio);
            return;
        }
        self.update_shadow();

        if !self.is_animating() {
            self.spawn_line_animations();
        }
    }

    /// Starts one animation per complete row that is not claimed yet.
    fn spawn_line_animations(&mut self) {
        for y in (0..self.height).rev() {
            if self.animations.contains_key(&y) || !self.is_row_full(y) {
                continue;
            }
            debug!("Row {y} complete, starting line clear");
            self.animations
                .insert(y, LineClearAnimation::new(y, self.width));
        }
        if self.is_animating() {
            self.piece.pause();
        }
    }

    #[must_use]
    pub fn is_row_full(&self, y: usize) -> bool {
        self.grid
            .get(y)
            .is_some_and(|row| row.iter().all(Option::is_some))
    }

    fn update_animations(&mut self, audio: &mut dyn AudioSink) {
        let mut finished = BTreeSet::new();
        for (&row, animation) in &mut self.animations {
            if !animation.update(&mut self.grid[row]) {
                finished.insert(row);
            }
        }
        if finished.is_empty() {
            return;
        }

        for row in &finished {
            self.animations.remove(row);
        }
        self.remove_rows(&finished);
        audio.play_sound(SoundEffect::LineClear);

        if !self.is_animating() {
            if !self.paused {
                self.piece.resume();
            }
            if self.piece.fits(&self.grid) {
                self.update_shadow();
            } else {
                self.end_game(audio);
            }
        }
    }

    /// Clears `rows` and compacts the grid in one pass: every surviving row
    /// moves down by the number of removed rows below it.
    pub fn remove_rows(&mut self, rows: &BTreeSet<usize>) {
        let rows: BTreeSet<usize> = rows.iter().copied().filter(|&y| y < self.height).collect();
        if rows.is_empty() {
            return;
        }

        for &y in &rows {
            let occupied = self.grid[y].iter().filter(|slot| slot.is_some()).count();
            self.settled_cells = self.settled_cells.saturating_sub(occupied);
            self.grid[y].iter_mut().for_each(|slot| *slot = None);
        }

        let mut write = self.height;
        for read in (0..self.height).rev() {
            if rows.contains(&read) {
                continue;
            }
            write -= 1;
            if write != read {
                self.grid.swap(read, write);
                let animating = self.animations.contains_key(&read);
                for cell in self.grid[write].iter_mut().flatten() {
                    cell.y = write as i32;
                    if !animating {
                        cell.reset_visual();
                    }
                }
            }
        }
        for row in &mut self.grid[..write] {
            row.iter_mut().for_each(|slot| *slot = None);
        }

        // Animations still running keep pointing at their own row
        self.animations.retain(|row, _| !rows.contains(row));
        if !self.animations.is_empty() {
            let pending = std::mem::take(&mut self.animations);
            for (row, mut animation) in pending {
                let shift = rows.range(row..).count();
                animation.retarget(row + shift);
                self.animations.insert(row + shift, animation);
            }
        }

        for _ in &rows {
            self.lines += 1;
            if self.lines % LINES_PER_LEVEL == 0 {
                self.level += 1;
                info!("Level up! Now at level {}", self.level);
            }
        }
        info!(
            "Cleared {} rows, {} lines total",
            rows.len(),
            self.lines
        );
    }

    /// Positions the falling piece occupies.
    #[must_use]
    pub fn piece_positions(&self) -> [Position; 4] {
        self.piece.positions()
    }
}
