//! Board controller: the piece set, its stacking order, scattering and the
//! drag / snap state machine.
//!
//! Positions are board-local pixels (relative to the wrapper that holds the
//! piece canvases). Nothing in here touches the DOM; the view reads piece
//! state back after every transition and mirrors it into styles.

pub mod input;

use rand::Rng;

use crate::slicer::{BoardRect, SliceLayout};

// --- Pieces -----------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PieceState {
    /// Sitting at its home position before a game starts (or after reset).
    Home,
    /// Loose on the board, draggable.
    Scattered,
    /// Following the pointer.
    Dragging,
    /// Snapped home during play. Terminal.
    Placed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    pub index: usize,
    pub home: (f64, f64),
    pub size: (f64, f64),
    pub position: (f64, f64),
    pub rotation: f64,
    pub state: PieceState,
    pub interactive: bool,
}

impl Piece {
    fn new(index: usize, home: (f64, f64), size: (f64, f64)) -> Self {
        Self {
            index,
            home,
            size,
            position: home,
            rotation: 0.0,
            state: PieceState::Home,
            interactive: false,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.state == PieceState::Placed
    }

    pub fn distance_from_home(&self) -> f64 {
        (self.position.0 - self.home.0).hypot(self.position.1 - self.home.1)
    }

    fn send_home(&mut self) {
        self.position = self.home;
        self.rotation = 0.0;
    }
}

/// Scatter tuning, taken from the puzzle config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterParams {
    pub board: BoardRect,
    pub margin_factor: f64,
    pub max_rotation_deg: f64,
}

impl ScatterParams {
    pub fn margin(&self) -> f64 {
        self.board.width.min(self.board.height) * self.margin_factor
    }

    /// Inclusive bounds of a scattered piece's top-left corner.
    pub fn bounds_for(&self, size: (f64, f64)) -> ((f64, f64), (f64, f64)) {
        let margin = self.margin();
        let half_x = (self.board.width + margin) / 2.0;
        let half_y = (self.board.height + margin) / 2.0;
        let cx = (self.board.width - size.0) / 2.0;
        let cy = (self.board.height - size.1) / 2.0;
        (
            ((cx - half_x).floor(), (cx + half_x).ceil()),
            ((cy - half_y).floor(), (cy + half_y).ceil()),
        )
    }
}

// --- Drag state -------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct DragSession {
    piece: usize,
    pointer_start: (f64, f64),
    piece_start: (f64, f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropResult {
    pub index: usize,
    pub snapped: bool,
}

/// Runtime board state for one sliced image.
#[derive(Debug)]
pub struct Board {
    pieces: Vec<Piece>,
    /// Piece indices, bottom to top.
    z_order: Vec<usize>,
    drag: Option<DragSession>,
    snap_threshold: f64,
}

impl Board {
    pub fn empty(snap_threshold: f64) -> Self {
        Self { pieces: Vec::new(), z_order: Vec::new(), drag: None, snap_threshold }
    }

    pub fn from_layout(layout: &SliceLayout, snap_threshold: f64) -> Self {
        let size = (layout.piece_width, layout.piece_height);
        let pieces: Vec<Piece> = layout
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| Piece::new(i, cell.home, size))
            .collect();
        let z_order = (0..pieces.len()).collect();
        Self { pieces, z_order, drag: None, snap_threshold }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, index: usize) -> Option<&Piece> {
        self.pieces.get(index)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn z_order(&self) -> &[usize] {
        &self.z_order
    }

    pub fn dragging(&self) -> Option<usize> {
        self.drag.map(|d| d.piece)
    }

    pub fn placed_count(&self) -> usize {
        self.pieces.iter().filter(|p| p.is_placed()).count()
    }

    /// True once every piece is placed. An empty board is never complete.
    pub fn all_placed(&self) -> bool {
        !self.pieces.is_empty() && self.pieces.iter().all(Piece::is_placed)
    }

    /// Throw every piece around the board centre with a random tilt.
    pub fn scatter<R: Rng + ?Sized>(&mut self, rng: &mut R, params: ScatterParams) {
        let margin = params.margin();
        let (bw, bh) = (params.board.width, params.board.height);
        self.drag = None;
        for p in &mut self.pieces {
            let rand_x = (rng.r#gen::<f64>() - 0.5) * (bw + margin);
            let rand_y = (rng.r#gen::<f64>() - 0.5) * (bh + margin);
            let center_left = (bw - p.size.0) / 2.0;
            let center_top = (bh - p.size.1) / 2.0;
            p.position = ((center_left + rand_x).round(), (center_top + rand_y).round());
            p.rotation = (rng.r#gen::<f64>() - 0.5) * 2.0 * params.max_rotation_deg;
            p.state = PieceState::Scattered;
            p.interactive = true;
        }
    }

    /// Put every piece back in its solved spot, inert.
    pub fn reset_home(&mut self) {
        self.drag = None;
        for p in &mut self.pieces {
            p.send_home();
            p.state = PieceState::Home;
            p.interactive = false;
        }
    }

    /// Freeze the board in place (time ran out). Pieces keep their positions.
    pub fn lock_all(&mut self) {
        if let Some(d) = self.drag.take() {
            if let Some(p) = self.pieces.get_mut(d.piece) {
                p.state = PieceState::Scattered;
            }
        }
        for p in &mut self.pieces {
            p.interactive = false;
        }
    }

    /// Start dragging `index` from `pointer`. Rejected while another drag is
    /// live or when the piece is not loose and interactive.
    pub fn begin_drag(&mut self, index: usize, pointer: (f64, f64)) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let Some(p) = self.pieces.get_mut(index) else {
            return false;
        };
        if !p.interactive || p.state != PieceState::Scattered {
            return false;
        }
        p.state = PieceState::Dragging;
        self.drag = Some(DragSession { piece: index, pointer_start: pointer, piece_start: p.position });
        self.raise(index);
        true
    }

    /// Track the pointer 1:1. Returns the dragged piece, if any.
    pub fn drag_to(&mut self, pointer: (f64, f64)) -> Option<usize> {
        let d = self.drag?;
        let p = self.pieces.get_mut(d.piece)?;
        p.position = (
            d.piece_start.0 + (pointer.0 - d.pointer_start.0),
            d.piece_start.1 + (pointer.1 - d.pointer_start.1),
        );
        Some(d.piece)
    }

    /// Release the dragged piece, snapping it home when close enough.
    pub fn end_drag(&mut self) -> Option<DropResult> {
        let d = self.drag.take()?;
        let threshold = self.snap_threshold;
        let p = self.pieces.get_mut(d.piece)?;
        let snapped = p.distance_from_home() <= threshold;
        if snapped {
            p.send_home();
            p.state = PieceState::Placed;
            p.interactive = false;
        } else {
            p.state = PieceState::Scattered;
        }
        Some(DropResult { index: d.piece, snapped })
    }

    fn raise(&mut self, index: usize) {
        if let Some(pos) = self.z_order.iter().position(|&i| i == index) {
            let top = self.z_order.remove(pos);
            self.z_order.push(top);
        }
    }
}
