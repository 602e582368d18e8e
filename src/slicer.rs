//! Piece geometry: fit the image to the board, split the draw area into a grid
//! and map every cell back to a source rectangle inside the image.

use crate::config::{DEFAULT_GRID, MAX_GRID, MIN_GRID};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

/// Measured board rectangle. Zero or non-finite sizes count as unmeasured.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardRect {
    pub width: f64,
    pub height: f64,
}

impl BoardRect {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn or_fallback(self, fallback: (f64, f64)) -> Self {
        let width = if self.width.is_finite() && self.width > 0.0 { self.width } else { fallback.0 };
        let height = if self.height.is_finite() && self.height > 0.0 { self.height } else { fallback.1 };
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSize {
    pub columns: u32,
    pub rows: u32,
}

impl Default for GridSize {
    fn default() -> Self {
        Self { columns: DEFAULT_GRID, rows: DEFAULT_GRID }
    }
}

impl GridSize {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self { columns: clamp_grid(columns), rows: clamp_grid(rows) }
    }

    /// Parse the raw text of the grid inputs. Only the leading integer counts
    /// ("7px" is 7, "2.5" is 2); text without one, or zero, falls back to the
    /// default before clamping.
    pub fn parse(columns: &str, rows: &str, default: u32) -> Self {
        let parse = |s: &str| match leading_int(s) {
            Some(v) if v != 0 => v.clamp(MIN_GRID as i64, MAX_GRID as i64) as u32,
            _ => clamp_grid(default),
        };
        Self { columns: parse(columns), rows: parse(rows) }
    }

    pub fn piece_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

/// Optional sign followed by leading decimal digits. Saturates instead of
/// overflowing.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: Option<i64> = None;
    for d in digits.bytes().take_while(u8::is_ascii_digit) {
        let v = value.unwrap_or(0);
        value = Some(v.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    }
    value.map(|v| if negative { -v } else { v })
}

pub fn clamp_grid(v: u32) -> u32 {
    v.clamp(MIN_GRID, MAX_GRID)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceCell {
    pub row: u32,
    pub column: u32,
    /// Board-local top-left of the solved position.
    pub home: (f64, f64),
    pub src: SourceRect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SliceLayout {
    pub grid: GridSize,
    pub draw_width: f64,
    pub draw_height: f64,
    pub piece_width: f64,
    pub piece_height: f64,
    /// Row-major.
    pub cells: Vec<PieceCell>,
}

/// Compute the full slicing for `image` on `board`.
pub fn compute_layout(image: ImageSize, grid: GridSize, board: BoardRect) -> SliceLayout {
    let grid = GridSize::new(grid.columns, grid.rows);
    let scale = (board.width / image.width).min(board.height / image.height);
    let draw_width = (image.width * scale).round().max(1.0);
    let draw_height = (image.height * scale).round().max(1.0);

    let piece_width = (draw_width / grid.columns as f64).ceil();
    let piece_height = (draw_height / grid.rows as f64).ceil();

    let scale_x = image.width / draw_width;
    let scale_y = image.height / draw_height;

    let mut cells = Vec::with_capacity(grid.piece_count());
    for row in 0..grid.rows {
        for column in 0..grid.columns {
            let left = column as f64 * piece_width;
            let top = row as f64 * piece_height;
            let src = clamp_source(
                SourceRect {
                    x: left * scale_x,
                    y: top * scale_y,
                    w: piece_width * scale_x,
                    h: piece_height * scale_y,
                },
                image,
            );
            cells.push(PieceCell { row, column, home: (left, top), src });
        }
    }

    SliceLayout { grid, draw_width, draw_height, piece_width, piece_height, cells }
}

/// Pull a source rectangle inside `[0, width] x [0, height]`.
pub fn clamp_source(mut r: SourceRect, image: ImageSize) -> SourceRect {
    if r.x < 0.0 {
        r.w += r.x;
        r.x = 0.0;
    }
    if r.y < 0.0 {
        r.h += r.y;
        r.y = 0.0;
    }
    r.x = r.x.min(image.width);
    r.y = r.y.min(image.height);
    if r.x + r.w > image.width {
        r.w = image.width - r.x;
    }
    if r.y + r.h > image.height {
        r.h = image.height - r.y;
    }
    r.w = r.w.max(0.0);
    r.h = r.h.max(0.0);
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(w: f64, h: f64) -> ImageSize {
        ImageSize { width: w, height: h }
    }

    #[test]
    fn fits_without_distortion() {
        let l = compute_layout(img(800.0, 600.0), GridSize::new(3, 2), BoardRect::new(640.0, 480.0));
        assert_eq!((l.draw_width, l.draw_height), (640.0, 480.0));
        assert_eq!(l.piece_width, (640.0f64 / 3.0).ceil());
        assert_eq!(l.piece_height, 240.0);
        assert_eq!(l.cells.len(), 6);
    }

    #[test]
    fn tall_image_limited_by_height() {
        let l = compute_layout(img(100.0, 1000.0), GridSize::new(2, 2), BoardRect::new(640.0, 480.0));
        assert_eq!(l.draw_height, 480.0);
        assert_eq!(l.draw_width, 48.0);
    }

    #[test]
    fn draw_size_never_zero() {
        let l = compute_layout(img(10_000.0, 1.0), GridSize::new(2, 2), BoardRect::new(100.0, 100.0));
        assert_eq!(l.draw_height, 1.0);
        assert!(l.piece_height >= 1.0);
    }

    #[test]
    fn row_major_home_positions() {
        let l = compute_layout(img(300.0, 200.0), GridSize::new(3, 2), BoardRect::new(300.0, 200.0));
        let homes: Vec<_> = l.cells.iter().map(|c| c.home).collect();
        assert_eq!(
            homes,
            vec![(0.0, 0.0), (100.0, 0.0), (200.0, 0.0), (0.0, 100.0), (100.0, 100.0), (200.0, 100.0)]
        );
    }

    #[test]
    fn tiles_without_gaps_for_all_grids() {
        let image = img(1023.0, 767.0);
        for columns in 2..=10 {
            for rows in 2..=10 {
                let l = compute_layout(image, GridSize::new(columns, rows), BoardRect::new(640.0, 480.0));
                assert_eq!(l.cells.len(), (columns * rows) as usize);
                for (i, cell) in l.cells.iter().enumerate() {
                    let r = i as u32 / columns;
                    let c = i as u32 % columns;
                    assert_eq!((cell.row, cell.column), (r, c));
                    assert_eq!(cell.home, (c as f64 * l.piece_width, r as f64 * l.piece_height));
                }
                // Grid covers the draw area, overhang is less than one piece.
                let covered_w = l.piece_width * columns as f64;
                let covered_h = l.piece_height * rows as f64;
                assert!(covered_w >= l.draw_width && covered_w - l.draw_width < columns as f64);
                assert!(covered_h >= l.draw_height && covered_h - l.draw_height < rows as f64);
            }
        }
    }

    #[test]
    fn source_rects_stay_inside_image() {
        let image = img(997.0, 613.0);
        for columns in 2..=10 {
            for rows in 2..=10 {
                let l = compute_layout(image, GridSize::new(columns, rows), BoardRect::new(640.0, 480.0));
                for cell in &l.cells {
                    let s = cell.src;
                    assert!(s.x >= 0.0 && s.y >= 0.0);
                    assert!(s.w >= 0.0 && s.h >= 0.0);
                    assert!(s.x + s.w <= image.width + 1e-9);
                    assert!(s.y + s.h <= image.height + 1e-9);
                }
            }
        }
    }

    #[test]
    fn clamp_negative_origin_shrinks_extent() {
        let r = clamp_source(SourceRect { x: -5.0, y: -2.0, w: 20.0, h: 10.0 }, img(100.0, 100.0));
        assert_eq!(r, SourceRect { x: 0.0, y: 0.0, w: 15.0, h: 8.0 });
    }

    #[test]
    fn clamp_overflow_shrinks_extent() {
        let r = clamp_source(SourceRect { x: 90.0, y: 95.0, w: 20.0, h: 20.0 }, img(100.0, 100.0));
        assert_eq!(r, SourceRect { x: 90.0, y: 95.0, w: 10.0, h: 5.0 });
    }

    #[test]
    fn grid_clamped_and_parsed() {
        assert_eq!(GridSize::new(1, 42), GridSize { columns: 2, rows: 10 });
        assert_eq!(GridSize::parse("abc", "", 3), GridSize { columns: 3, rows: 3 });
        assert_eq!(GridSize::parse(" 7 ", "-4", 3), GridSize { columns: 7, rows: 2 });
        assert_eq!(GridSize::parse("0", "11", 3), GridSize { columns: 3, rows: 10 });
        assert_eq!(GridSize::parse("2.5", "7px", 3), GridSize { columns: 2, rows: 7 });
        assert_eq!(GridSize::parse("1e1", "99999999999999999999", 3), GridSize { columns: 2, rows: 10 });
        assert_eq!(GridSize::parse("+4", "-", 3), GridSize { columns: 4, rows: 3 });
    }

    #[test]
    fn board_fallback() {
        let b = BoardRect::new(0.0, f64::NAN).or_fallback((640.0, 480.0));
        assert_eq!(b, BoardRect::new(640.0, 480.0));
        let b = BoardRect::new(320.0, 0.0).or_fallback((640.0, 480.0));
        assert_eq!(b, BoardRect::new(320.0, 480.0));
    }
}
