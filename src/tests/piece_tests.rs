#![warn(clippy::all, clippy::pedantic)]

#[cfg(test)]
mod tests {
    use crate::components::{Cell, CellColor, CellState, Position, TetrominoType};
    use crate::game::drop_interval_ticks;
    use crate::piece::{Grid, Piece, is_blocked};
    use crate::tests::test_utils::{HEIGHT, WIDTH, piece_at, sorted_positions};

    fn empty_grid() -> Grid {
        vec![vec![None; WIDTH]; HEIGHT]
    }

    fn settle(grid: &mut Grid, x: usize, y: usize) {
        grid[y][x] = Some(Cell::settled(x as i32, y as i32, CellColor::Blue));
    }

    #[test]
    fn test_spawn_is_centered_in_top_rows() {
        for kind in TetrominoType::ALL {
            let piece = Piece::new(kind, CellColor::Yellow, WIDTH, 1);
            for p in piece.positions() {
                assert!((3..7).contains(&p.x), "{kind:?} spawned at column {}", p.x);
                assert!((0..2).contains(&p.y));
            }
            assert!(piece.body().iter().all(|c| c.color() == CellColor::Yellow));
            assert!(piece.body().iter().all(|c| c.state == CellState::Active));
            assert!(piece.active);
            assert!(!piece.collision);
        }
    }

    #[test]
    fn test_is_blocked_treats_outside_as_wall() {
        let mut grid = empty_grid();
        settle(&mut grid, 2, 2);

        assert!(is_blocked(&grid, -1, 0));
        assert!(is_blocked(&grid, 0, -1));
        assert!(is_blocked(&grid, WIDTH as i32, 0));
        assert!(is_blocked(&grid, 0, HEIGHT as i32));
        assert!(is_blocked(&grid, 2, 2));
        assert!(!is_blocked(&grid, 3, 2));
    }

    #[test]
    fn test_move_left_stops_at_wall() {
        let grid = empty_grid();
        let mut piece = piece_at(TetrominoType::O, [(0, 5), (1, 5), (0, 6), (1, 6)]);

        assert!(!piece.move_left(&grid));
        assert!(!piece.can_move_left);
        assert_eq!(piece.positions()[0], Position { x: 0, y: 5 });
    }

    #[test]
    fn test_move_right_blocked_by_settled_cell() {
        let mut grid = empty_grid();
        settle(&mut grid, 3, 6);
        let mut piece = piece_at(TetrominoType::O, [(1, 5), (2, 5), (1, 6), (2, 6)]);

        assert!(!piece.move_right(&grid));
        assert!(!piece.can_move_right);

        assert!(piece.move_left(&grid));
        assert!(piece.can_move_left);
        assert_eq!(
            sorted_positions(piece.positions()),
            vec![(0, 5), (0, 6), (1, 5), (1, 6)]
        );
    }

    #[test]
    fn test_down_moves_until_floor() {
        let mut piece = piece_at(TetrominoType::O, [(4, 20), (5, 20), (4, 21), (5, 21)]);

        assert!(piece.down(HEIGHT));
        assert!(piece.active);
        assert!(piece.at_floor(HEIGHT));

        assert!(!piece.down(HEIGHT), "Resting on the floor locks the piece");
        assert!(!piece.active);
        assert!(!piece.down(HEIGHT), "Inactive pieces never move");
    }

    #[test]
    fn test_down_with_collision_deactivates() {
        let mut piece = piece_at(TetrominoType::O, [(4, 5), (5, 5), (4, 6), (5, 6)]);
        piece.collision = true;

        assert!(!piece.down(HEIGHT));
        assert!(!piece.active);
        assert_eq!(piece.positions()[0], Position { x: 4, y: 5 });
    }

    #[test]
    fn test_move_down_is_unconditional() {
        let mut piece = piece_at(TetrominoType::O, [(4, 21), (5, 21), (4, 22), (5, 22)]);
        piece.move_down();
        assert_eq!(piece.positions()[3], Position { x: 5, y: 23 });
        assert!(!piece.fits(&empty_grid()));
    }

    #[test]
    fn test_blocked_row_reports_resting_cell() {
        let mut grid = empty_grid();
        let piece = piece_at(TetrominoType::T, [(3, 8), (4, 8), (5, 8), (4, 7)]);
        assert_eq!(piece.blocked_row(&grid), None);

        settle(&mut grid, 5, 9);
        assert_eq!(piece.blocked_row(&grid), Some(8));
    }

    #[test]
    fn test_blocked_row_ignores_floor() {
        let grid = empty_grid();
        let piece = piece_at(TetrominoType::I, [(0, 22), (1, 22), (2, 22), (3, 22)]);
        assert_eq!(piece.blocked_row(&grid), None);
    }

    #[test]
    fn test_o_piece_never_rotates() {
        let mut piece = Piece::new(TetrominoType::O, CellColor::Red, WIDTH, 1);
        let before = piece.positions();
        piece.rotate();
        assert_eq!(piece.positions(), before);
    }

    #[test]
    fn test_rotation_cycles_back() {
        for kind in TetrominoType::ALL {
            let mut piece = Piece::new(kind, CellColor::Red, WIDTH, 1);
            // Move away from the top so intermediate states stay on the field
            for _ in 0..5 {
                piece.move_down();
            }
            let start = piece.positions();
            for _ in 0..4 {
                piece.rotate();
                assert!(piece.fits(&empty_grid()), "{kind:?} rotated off the field");
            }
            assert_eq!(piece.positions(), start, "{kind:?} did not come back");
        }
    }

    #[test]
    fn test_rotation_about_pivot_cell() {
        let mut piece = Piece::new(TetrominoType::T, CellColor::Red, WIDTH, 1);
        piece.move_down();
        // T pivot is the middle of the flat side
        let pivot = piece.positions()[1];

        piece.rotate();

        assert_eq!(piece.positions()[1], pivot);
        assert_eq!(
            sorted_positions(piece.positions()),
            vec![(4, 1), (4, 2), (4, 3), (5, 2)]
        );
    }

    #[test]
    fn test_timer_fires_every_interval() {
        let mut piece = Piece::new(TetrominoType::L, CellColor::Red, WIDTH, 1);
        let interval = drop_interval_ticks(1);
        assert_eq!(piece.drop_interval(), interval);

        let fired: Vec<u32> = (1..=interval * 2).filter(|_| piece.tick()).collect();
        assert_eq!(fired.len(), 2);
    }

    #[test]
    fn test_pause_stops_timer_and_resume_rearms() {
        let mut piece = Piece::new(TetrominoType::L, CellColor::Red, WIDTH, 1);
        let interval = drop_interval_ticks(1);
        for _ in 0..interval - 1 {
            assert!(!piece.tick());
        }

        piece.pause();
        assert!(piece.is_paused());
        for _ in 0..interval * 3 {
            assert!(!piece.tick());
        }
        assert!(piece.active, "Pausing leaves the active flag alone");

        piece.resume();
        for _ in 0..interval - 1 {
            assert!(!piece.tick(), "Resume starts a full interval");
        }
        assert!(piece.tick());
    }

    #[test]
    fn test_higher_level_drops_faster() {
        let slow = Piece::new(TetrominoType::I, CellColor::Red, WIDTH, 1);
        let fast = Piece::new(TetrominoType::I, CellColor::Red, WIDTH, 12);
        assert!(fast.drop_interval() < slow.drop_interval());
    }

    #[test]
    fn test_settled_cells_keep_color() {
        let piece = Piece::new(TetrominoType::S, CellColor::Cyan, WIDTH, 1);
        for cell in piece.into_settled_cells() {
            assert_eq!(cell.state, CellState::Settled);
            assert_eq!(cell.color(), CellColor::Cyan);
        }
    }
}
