#![warn(clippy::all, clippy::pedantic)]

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;

    use tempfile::tempdir;

    use crate::components::{Action, CellColor, Input, TetrominoType};
    use crate::game::LINE_CLEAR_FRAMES;
    use crate::save::{SaveError, SaveState, load_game, read_save, save_game};
    use crate::tests::test_utils::{
        FLOOR, HEIGHT, RecordingAudio, WIDTH, create_test_playfield, fill_row, occupied_columns,
        piece_at, run_ticks,
    };

    #[test]
    fn test_save_and_restore_playfield() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let path = temp_dir.path().join("saves").join("game.toml");
        let mut playfield = create_test_playfield();
        for _ in 0..21 {
            playfield.remove_rows(&BTreeSet::from([FLOOR]));
        }
        playfield.place_settled(0, FLOOR, CellColor::Green);
        playfield.place_settled(9, FLOOR, CellColor::Magenta);
        playfield.place_settled(4, 15, CellColor::Yellow);
        playfield.set_shadow_visible(false);

        save_game(&playfield, &path).expect("Failed to save game");
        let restored = load_game(&path, WIDTH, HEIGHT).expect("Save should load");

        assert_eq!(restored.level(), 2);
        assert_eq!(restored.lines(), 21);
        assert_eq!(restored.settled_cells(), 3);
        assert!(!restored.is_shadow_visible());
        assert_eq!(restored.next(), playfield.next());
        assert_eq!(restored.piece().kind(), playfield.piece().kind());
        assert_eq!(restored.piece().color(), playfield.piece().color());
        assert_eq!(restored.piece_positions(), playfield.piece_positions());
        assert_eq!(
            restored.cell(9, FLOOR).map(crate::components::Cell::color),
            Some(CellColor::Magenta)
        );
        assert_eq!(
            restored.cell(4, 15).map(crate::components::Cell::color),
            Some(CellColor::Yellow)
        );
        assert!(!restored.is_animating());
    }

    #[test]
    fn test_save_state_rows_use_color_codes() {
        let mut playfield = create_test_playfield();
        playfield.place_settled(0, FLOOR, CellColor::Red);
        playfield.place_settled(2, FLOOR, CellColor::Cyan);

        let state = SaveState::from_playfield(&playfield);

        assert_eq!(state.rows.len(), HEIGHT);
        assert_eq!(state.rows[FLOOR], "r.c.......");
        assert_eq!(state.rows[0], "..........");
        assert_eq!(state.piece.cells.len(), 4);
    }

    #[test]
    fn test_paused_game_stays_paused() {
        let mut playfield = create_test_playfield();
        let mut audio = RecordingAudio::default();
        let mut input = Input::default();
        input.request(Action::Pause);
        playfield.update(&mut input, &mut audio);
        assert!(playfield.is_paused());

        let restored = SaveState::from_playfield(&playfield)
            .into_playfield()
            .expect("valid state");

        assert!(restored.is_paused());
        assert!(restored.piece().is_paused());
    }

    #[test]
    fn test_restored_full_rows_are_animated() {
        let mut playfield = create_test_playfield();
        fill_row(&mut playfield, FLOOR, &[]);
        playfield.place_settled(3, FLOOR - 1, CellColor::Orange);
        let mut audio = RecordingAudio::default();

        let mut restored = SaveState::from_playfield(&playfield)
            .into_playfield()
            .expect("valid state");
        assert_eq!(restored.claimed_rows().collect::<Vec<_>>(), vec![FLOOR]);

        run_ticks(&mut restored, &mut audio, LINE_CLEAR_FRAMES);

        assert_eq!(restored.lines(), 1);
        assert_eq!(occupied_columns(&restored, FLOOR), vec![3]);
    }

    #[test]
    fn test_size_mismatch_is_discarded() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let path = temp_dir.path().join("game.toml");
        save_game(&create_test_playfield(), &path).expect("Failed to save game");

        assert!(load_game(&path, 12, HEIGHT).is_none());
        assert!(load_game(&path, WIDTH, HEIGHT).is_some());
    }

    #[test]
    fn test_missing_or_malformed_save_yields_none() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing.toml");
        assert!(load_game(&missing, WIDTH, HEIGHT).is_none());

        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "level = \"high\"").expect("Failed to write save");
        assert!(load_game(&broken, WIDTH, HEIGHT).is_none());
        assert!(matches!(read_save(&broken), Err(SaveError::Parse(_))));
    }

    #[test]
    fn test_unknown_cell_code_is_invalid() {
        let mut state = SaveState::from_playfield(&create_test_playfield());
        state.rows[FLOOR] = "....x.....".into();

        assert!(matches!(state.into_playfield(), Err(SaveError::Invalid(_))));
    }

    #[test]
    fn test_wrong_row_length_is_invalid() {
        let mut state = SaveState::from_playfield(&create_test_playfield());
        state.rows[5] = "....".into();

        assert!(matches!(state.into_playfield(), Err(SaveError::Invalid(_))));
    }

    #[test]
    fn test_piece_overlapping_stack_is_invalid() {
        let mut playfield = create_test_playfield();
        playfield.replace_piece(piece_at(
            TetrominoType::O,
            [(4, 10), (5, 10), (4, 11), (5, 11)],
        ));
        let mut state = SaveState::from_playfield(&playfield);
        state.rows[10] = "....b.....".into();

        assert!(matches!(state.into_playfield(), Err(SaveError::Invalid(_))));
    }

    #[test]
    fn test_piece_outside_field_is_invalid() {
        let mut state = SaveState::from_playfield(&create_test_playfield());
        state.piece.cells[0] = [-1, 0];

        assert!(matches!(state.into_playfield(), Err(SaveError::Invalid(_))));
    }

    #[test]
    fn test_white_piece_is_invalid() {
        let mut state = SaveState::from_playfield(&create_test_playfield());
        state.next_color = CellColor::White;

        assert!(matches!(state.into_playfield(), Err(SaveError::Invalid(_))));
    }

    #[test]
    fn test_scattered_piece_cells_are_invalid() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let path = temp_dir.path().join("game.toml");
        let mut state = SaveState::from_playfield(&create_test_playfield());
        state.piece.cells = vec![[0, 0], [9, 0], [0, 5], [9, 5]];
        fs::write(&path, toml::to_string_pretty(&state).expect("serialize"))
            .expect("Failed to write save");

        assert!(matches!(state.into_playfield(), Err(SaveError::Invalid(_))));
        assert!(load_game(&path, WIDTH, HEIGHT).is_none());
    }

    #[test]
    fn test_piece_of_another_kind_is_invalid() {
        let mut playfield = create_test_playfield();
        playfield.replace_piece(piece_at(
            TetrominoType::O,
            [(4, 10), (5, 10), (4, 11), (5, 11)],
        ));
        let mut state = SaveState::from_playfield(&playfield);
        state.piece.kind = TetrominoType::S;

        assert!(matches!(state.into_playfield(), Err(SaveError::Invalid(_))));
    }

    #[test]
    fn test_rotated_piece_restores() {
        let mut playfield = create_test_playfield();
        playfield.replace_piece(crate::piece::Piece::new(
            TetrominoType::L,
            CellColor::Orange,
            WIDTH,
            1,
        ));
        let mut input = Input::default();
        input.request(Action::Down);
        playfield.update(&mut input, &mut RecordingAudio::default());
        input.request(Action::Rotate);
        playfield.update(&mut input, &mut RecordingAudio::default());

        let state = SaveState::from_playfield(&playfield);
        let restored = state.into_playfield().expect("rotated piece is valid");

        assert_eq!(restored.piece_positions(), playfield.piece_positions());
    }
}
