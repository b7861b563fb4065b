#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Board coordinates are small and validated against the field before casting
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use crate::components::{Cell, CellColor};
use crate::playfield::Playfield;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub const CELL_WIDTH: u16 = 2; // Each cell is 2 characters wide
pub const TITLE_HEIGHT: u16 = 2;
pub const INFO_WIDTH: u16 = 24;

const BLOCK_SYMBOL: &str = "█";
const SHADOW_SYMBOL: &str = "░";

/// Outer size of the bordered board for `playfield`.
#[must_use]
pub fn board_size(playfield: &Playfield) -> (u16, u16) {
    (
        playfield.width() as u16 * CELL_WIDTH + 2,
        playfield.height() as u16 + 2,
    )
}

pub fn render(f: &mut Frame, playfield: &Playfield) {
    let (board_width, board_height) = board_size(playfield);
    let min_total_width = board_width + INFO_WIDTH;
    let min_total_height = board_height + TITLE_HEIGHT;

    if f.area().width < min_total_width || f.area().height < min_total_height {
        let warning_text = Paragraph::new(format!(
            "Terminal too small!\nNeed {min_total_width}x{min_total_height}."
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Tetrafade"));
        f.render_widget(warning_text, centered_rect(80, 50, f.area()));
        return;
    }

    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(board_width),
            Constraint::Length(INFO_WIDTH),
            Constraint::Fill(1),
        ])
        .split(f.area());

    let game_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Length(board_height),
            Constraint::Fill(1),
        ])
        .split(main_layout[0]);

    let title = Paragraph::new("TETRAFADE")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, game_layout[0]);

    render_board(f, playfield, game_layout[1]);
    render_info(f, playfield, main_layout[1]);
}

fn render_board(f: &mut Frame, playfield: &Playfield, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    if playfield.is_shadow_visible() && !playfield.is_game_over() && !playfield.is_animating() {
        for cell in playfield.shadow() {
            draw_cell(f, inner_area, cell, SHADOW_SYMBOL, dim(cell.color(), 0.6));
        }
    }

    for cell in playfield.grid().iter().flatten().flatten() {
        draw_cell(f, inner_area, cell, BLOCK_SYMBOL, cell_color(cell));
    }
    for cell in playfield.piece().body() {
        draw_cell(f, inner_area, cell, BLOCK_SYMBOL, cell_color(cell));
    }

    if playfield.is_game_over() {
        render_overlay(f, inner_area, "GAME OVER", Color::Red);
    } else if playfield.is_paused() {
        render_overlay(f, inner_area, "PAUSED", Color::Yellow);
    }
}

/// Colour of `cell` as drawn: its display colour scaled by its alpha.
#[must_use]
pub fn cell_color(cell: &Cell) -> Color {
    dim(cell.display_color(), cell.alpha)
}

fn dim(color: CellColor, alpha: f32) -> Color {
    let alpha = alpha.clamp(0.0, 1.0);
    let (r, g, b) = color.rgb();
    let scale = |channel: u8| (f32::from(channel) * alpha).round() as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

fn draw_cell(f: &mut Frame, area: Rect, cell: &Cell, symbol: &str, color: Color) {
    if cell.x < 0 || cell.y < 0 {
        return;
    }
    let x = area.left() + cell.x as u16 * CELL_WIDTH;
    let y = area.top() + cell.y as u16;
    if y >= area.bottom() {
        return;
    }
    for dx in 0..CELL_WIDTH {
        if x + dx >= area.right() {
            break;
        }
        if let Some(buf_cell) = f.buffer_mut().cell_mut((x + dx, y)) {
            buf_cell.set_symbol(symbol);
            buf_cell.set_fg(color);
            buf_cell.set_bg(Color::Black);
        }
    }
}

fn render_overlay(f: &mut Frame, area: Rect, text: &str, color: Color) {
    let width = (text.len() as u16 + 2).min(area.width);
    let overlay_area = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height / 2,
        width,
        height: 1,
    };
    f.render_widget(Clear, overlay_area);
    let overlay = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD));
    f.render_widget(overlay, overlay_area);
}

fn render_info(f: &mut Frame, playfield: &Playfield, area: Rect) {
    let info_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Length(4), // Next piece
            Constraint::Length(4), // Level and lines
            Constraint::Min(5),    // Controls
        ])
        .split(area);

    let info_title = Paragraph::new("NEXT")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(info_title, info_layout[0]);

    render_next_piece(f, playfield, info_layout[1]);

    let status = if playfield.is_game_over() {
        "GAME OVER! Enter to restart"
    } else if playfield.is_paused() {
        "Paused"
    } else {
        ""
    };
    let stats = Paragraph::new(format!(
        "Level: {}\nLines: {}\n{status}",
        playfield.level(),
        playfield.lines()
    ))
    .wrap(Wrap { trim: true });
    f.render_widget(stats, info_layout[2]);

    let controls = Paragraph::new(
        "Controls:\n\
        ←/→ a/d: Move\n\
        ↓ s: Soft drop\n\
        ↑ w: Rotate\n\
        Space/Enter: Drop\n\
        P: Pause  G: Shadow\n\
        Q: Save+quit  Esc: Quit",
    )
    .block(Block::default().borders(Borders::TOP))
    .wrap(Wrap { trim: true });
    f.render_widget(controls, info_layout[3]);
}

fn render_next_piece(f: &mut Frame, playfield: &Playfield, area: Rect) {
    let (kind, color) = playfield.next();
    let preview = Rect {
        x: area.x + 2,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(1),
    };
    for (dx, dy) in kind.get_blocks() {
        let cell = Cell::new(dx, dy, color);
        draw_cell(f, preview, &cell, BLOCK_SYMBOL, cell_color(&cell));
    }
}

/// Helper function to create a centered rect using up certain percentage of the available rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
