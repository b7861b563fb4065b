#![warn(clippy::all, clippy::pedantic)]

pub mod piece_tests;
pub mod save_tests;
pub mod sound_tests;

// Import test utilities
#[cfg(test)]
pub mod test_utils {
    use crate::components::{CellColor, Input, Position, TetrominoType};
    use crate::piece::Piece;
    use crate::playfield::Playfield;
    use crate::sound::{AudioSink, SoundEffect};

    pub const WIDTH: usize = 10;
    pub const HEIGHT: usize = 23;
    pub const FLOOR: usize = HEIGHT - 1;

    // Audio sink that remembers every cue it was asked to play
    #[derive(Debug, Default)]
    pub struct RecordingAudio {
        pub sounds: Vec<SoundEffect>,
    }

    impl RecordingAudio {
        #[must_use]
        pub fn count(&self, effect: SoundEffect) -> usize {
            self.sounds.iter().filter(|&&s| s == effect).count()
        }
    }

    impl AudioSink for RecordingAudio {
        fn play_sound(&mut self, effect: SoundEffect) {
            self.sounds.push(effect);
        }
    }

    // Helper function to create a deterministic 10x23 playfield
    #[must_use]
    pub fn create_test_playfield() -> Playfield {
        Playfield::with_seed(WIDTH, HEIGHT, 7)
    }

    // Helper to build a piece at explicit coordinates
    #[must_use]
    pub fn piece_at(kind: TetrominoType, cells: [(i32, i32); 4]) -> Piece {
        Piece::from_positions(kind, CellColor::Red, cells.map(|(x, y)| Position { x, y }), 1)
    }

    // Fills row `y` with settled cells, leaving the listed columns empty
    pub fn fill_row(playfield: &mut Playfield, y: usize, gaps: &[usize]) {
        for x in 0..playfield.width() {
            if !gaps.contains(&x) {
                playfield.place_settled(x, y, CellColor::Blue);
            }
        }
    }

    // Runs `n` ticks with no pending input
    pub fn run_ticks(playfield: &mut Playfield, audio: &mut RecordingAudio, n: u32) {
        let mut input = Input::default();
        for _ in 0..n {
            playfield.update(&mut input, audio);
        }
    }

    #[must_use]
    pub fn occupied_columns(playfield: &Playfield, y: usize) -> Vec<usize> {
        playfield.grid()[y]
            .iter()
            .enumerate()
            .filter_map(|(x, slot)| slot.as_ref().map(|_| x))
            .collect()
    }

    #[must_use]
    pub fn sorted_positions(positions: [Position; 4]) -> Vec<(i32, i32)> {
        let mut cells: Vec<_> = positions.iter().map(|p| (p.x, p.y)).collect();
        cells.sort_unstable();
        cells
    }
}
