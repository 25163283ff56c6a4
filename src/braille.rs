use ratatui::style::Color;
use spectral_life::FieldView;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

const LIVE_COLOR: Color = Color::Rgb(200, 200, 200);
/// Characters on the grid but with no live cell, so the torus edge is visible
const EMPTY_COLOR: Color = Color::Rgb(64, 64, 64);

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Which part of the grid the canvas shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Grid coordinate under the top-left dot
    pub origin_x: i32,
    pub origin_y: i32,
    /// Grid cells per dot along each axis (1 = one cell per dot)
    pub zoom: u16,
}

impl Viewport {
    /// Grid span covered by a canvas of the given character size
    pub fn span(&self, canvas_width: u16, canvas_height: u16) -> (i32, i32) {
        let zoom = self.zoom.max(1) as i32;
        (
            canvas_width as i32 * 2 * zoom,
            canvas_height as i32 * 4 * zoom,
        )
    }
}

/// Is any cell alive in the `zoom x zoom` block under one dot?
/// `None` when the whole block lies off the grid.
fn sample(view: &FieldView, x: i32, y: i32, zoom: i32) -> Option<bool> {
    let mut on_grid = false;
    for dy in 0..zoom {
        for dx in 0..zoom {
            match view.at(x.saturating_add(dx), y.saturating_add(dy)) {
                Some(true) => return Some(true),
                Some(false) => on_grid = true,
                None => {}
            }
        }
    }
    on_grid.then_some(false)
}

/// Render one copied generation to Braille characters
pub fn render_to_braille(
    view: &FieldView,
    viewport: Viewport,
    canvas_width: u16,
    canvas_height: u16,
) -> Vec<BrailleCell> {
    let zoom = viewport.zoom.max(1) as i32;
    let mut cells = Vec::with_capacity(canvas_width as usize * canvas_height as usize);

    for cy in 0..canvas_height {
        for cx in 0..canvas_width {
            let mut pattern: u8 = 0;
            let mut on_grid = false;

            // Sample the 2x4 dots for this Braille character
            let base_bx = cx as i32 * 2;
            let base_by = cy as i32 * 4;

            for dx in 0..2 {
                for dy in 0..4 {
                    let grid_x = viewport.origin_x + (base_bx + dx as i32) * zoom;
                    let grid_y = viewport.origin_y + (base_by + dy as i32) * zoom;

                    match sample(view, grid_x, grid_y, zoom) {
                        Some(true) => {
                            pattern |= BRAILLE_DOTS[dx][dy];
                            on_grid = true;
                        }
                        Some(false) => on_grid = true,
                        None => {}
                    }
                }
            }

            if !on_grid {
                continue;
            }

            let (char, color) = if pattern != 0 {
                (
                    char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' '),
                    LIVE_COLOR,
                )
            } else {
                ('·', EMPTY_COLOR)
            };

            cells.push(BrailleCell {
                x: cx,
                y: cy,
                char,
                color,
            });
        }
    }

    cells
}
