//! SVG pictures of boards and move sequences.

use peg_core::board::SIZE;
use peg_core::{Board, Cell, Move};

const CELL_SIZE: f32 = 48.0;
const CELL_GAP: f32 = 4.0;
const BOARD_PADDING: f32 = 12.0;
const BOARD_RADIUS: f32 = 12.0;
const IMAGE_PADDING: f32 = 16.0;

// Colors
const BG_COLOR: &str = "#1a1a1a";
const BOARD_BG: &str = "#2a2a2a";
const HOLE_COLOR: &str = "#3a3a3a";
const PEG_GRADIENT_START: &str = "#e74c3c";
const PEG_GRADIENT_END: &str = "#c0392b";
const GOAL_COLOR: &str = "#88cc88";

const HOLE_DIAMETER: f32 = 16.0;
const PEG_DIAMETER: f32 = 36.0;

// Highlight colors
const HIGHLIGHT_SOURCE: &str = "#f39c12";
const HIGHLIGHT_JUMPED: &str = "#7f8c8d";
const HIGHLIGHT_LANDING: &str = "#3498db";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions<'a> {
    /// Highlight the source, jumped and landing cells of this move
    pub next_move: Option<Move>,
    /// Ring the cells where the goal wants a peg
    pub goal: Option<&'a Board>,
    /// Scale factor (1.0 = 48px cells)
    pub scale: f32,
}

fn cell_origin(row: usize, col: usize) -> (f32, f32) {
    let x = IMAGE_PADDING + BOARD_PADDING + col as f32 * (CELL_SIZE + CELL_GAP);
    let y = IMAGE_PADDING + BOARD_PADDING + row as f32 * (CELL_SIZE + CELL_GAP);
    (x, y)
}

/// Generate SVG for a board.
pub fn board_svg(board: &Board, opts: &RenderOptions<'_>) -> String {
    let scale = if opts.scale > 0.0 { opts.scale } else { 1.0 };
    let board_inner = SIZE as f32 * CELL_SIZE + (SIZE - 1) as f32 * CELL_GAP;
    let board_outer = board_inner + 2.0 * BOARD_PADDING;
    let size = board_outer + 2.0 * IMAGE_PADDING;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        size * scale,
        size * scale,
        size,
        size
    ));
    svg.push('\n');

    svg.push_str("  <defs>\n");
    svg.push_str(&format!(
        r#"    <linearGradient id="peg-grad" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" style="stop-color:{}"/>
      <stop offset="100%" style="stop-color:{}"/>
    </linearGradient>
"#,
        PEG_GRADIENT_START, PEG_GRADIENT_END
    ));
    svg.push_str("  </defs>\n");

    svg.push_str(&format!(r#"  <rect width="{}" height="{}" fill="{}"/>"#, size, size, BG_COLOR));
    svg.push('\n');
    svg.push_str(&format!(
        r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}"/>"#,
        IMAGE_PADDING, IMAGE_PADDING, board_outer, board_outer, BOARD_RADIUS, BOARD_BG
    ));
    svg.push('\n');

    let highlights: Vec<((usize, usize), &str)> = match opts.next_move {
        Some(mov) => [
            (Some((mov.row as usize, mov.col as usize)), HIGHLIGHT_SOURCE),
            (mov.jumped(), HIGHLIGHT_JUMPED),
            (mov.landing(), HIGHLIGHT_LANDING),
        ]
        .into_iter()
        .filter_map(|(cell, color)| cell.map(|c| (c, color)))
        .collect(),
        None => Vec::new(),
    };

    for row in 0..SIZE {
        for col in 0..SIZE {
            let cell = board.cell(row, col);
            if cell == Cell::Illegal {
                continue;
            }
            let (x, y) = cell_origin(row, col);
            let cx = x + CELL_SIZE / 2.0;
            let cy = y + CELL_SIZE / 2.0;

            if let Some((_, color)) = highlights.iter().find(|(c, _)| *c == (row, col)) {
                svg.push_str(&format!(
                    r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="6" fill="none" stroke="{}" stroke-width="3"/>"#,
                    x, y, CELL_SIZE, CELL_SIZE, color
                ));
                svg.push('\n');
            }
            if opts.goal.is_some_and(|g| g.is_peg(row, col)) {
                svg.push_str(&format!(
                    r#"  <circle cx="{}" cy="{}" r="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
                    cx,
                    cy,
                    PEG_DIAMETER / 2.0 + 4.0,
                    GOAL_COLOR
                ));
                svg.push('\n');
            }

            let (diameter, fill) = match cell {
                Cell::Peg => (PEG_DIAMETER, "url(#peg-grad)"),
                _ => (HOLE_DIAMETER, HOLE_COLOR),
            };
            svg.push_str(&format!(
                r#"  <circle cx="{}" cy="{}" r="{}" fill="{}" stroke="rgba(0,0,0,0.2)" stroke-width="2"/>"#,
                cx,
                cy,
                diameter / 2.0,
                fill
            ));
            svg.push('\n');
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// One SVG per board of a replayed sequence, each highlighting the move
/// played from it.
pub fn frames_svg(frames: &[(Board, Option<Move>)], goal: Option<&Board>, scale: f32) -> Vec<String> {
    frames
        .iter()
        .map(|(board, next_move)| board_svg(board, &RenderOptions { next_move: *next_move, goal, scale }))
        .collect()
}
