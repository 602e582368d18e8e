//! One puzzle session: the loaded image, current slicing, board and clock.
//!
//! Every user action is a method here. Methods never touch the DOM; they
//! return outcomes the view turns into style updates and notifications.

use rand::Rng;

use crate::board::input::{PointerPhase, PointerSample};
use crate::board::{Board, ScatterParams};
use crate::config::PuzzleConfig;
use crate::error::PuzzleError;
use crate::slicer::{compute_layout, BoardRect, GridSize, ImageSize, SliceLayout};
use crate::timer::{challenge_duration_ms, format_time, GameClock, TickOutcome, TimerMode};

pub const TIME_UP_MESSAGE: &str = "Time's up! The puzzle was not completed.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GamePhase {
    /// No game running; pieces sit home (or wherever the last game left them).
    #[default]
    Idle,
    /// Pieces scattered and draggable.
    Playing,
    Won,
    TimedOut,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerOutcome {
    Ignored,
    Began(usize),
    Moved(usize),
    Dropped { index: usize, snapped: bool, completed: bool },
}

pub fn win_message(reading: Option<(TimerMode, f64)>) -> String {
    match reading {
        Some((TimerMode::CountUp, elapsed)) => {
            format!("Congratulations! You completed the puzzle in {}.", format_time(elapsed))
        }
        Some((TimerMode::Countdown, remaining)) => {
            format!("Congratulations! You completed the puzzle with {} left.", format_time(remaining))
        }
        _ => "Congratulations! You completed the puzzle.".to_string(),
    }
}

#[derive(Debug)]
pub struct Session {
    config: PuzzleConfig,
    image: Option<ImageSize>,
    grid: GridSize,
    layout: Option<SliceLayout>,
    board: Board,
    clock: GameClock,
    mode: TimerMode,
    phase: GamePhase,
    /// Completion message waiting for the win delay to elapse.
    pending_win: Option<String>,
    /// Clock reading frozen when the last piece landed.
    final_reading: Option<f64>,
}

impl Session {
    pub fn new(config: PuzzleConfig) -> Self {
        let grid = GridSize::new(config.default_grid, config.default_grid);
        let board = Board::empty(config.snap_threshold);
        Self {
            config,
            image: None,
            grid,
            layout: None,
            board,
            clock: GameClock::new(),
            mode: TimerMode::None,
            phase: GamePhase::Idle,
            pending_win: None,
            final_reading: None,
        }
    }

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn image(&self) -> Option<ImageSize> {
        self.image
    }

    pub fn layout(&self) -> Option<&SliceLayout> {
        self.layout.as_ref()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn challenge_duration_ms(&self) -> f64 {
        challenge_duration_ms(self.grid.piece_count())
    }

    fn stop_game(&mut self) {
        self.clock.cancel();
        self.pending_win = None;
        self.final_reading = None;
        self.phase = GamePhase::Idle;
    }

    /// Accept a decoded image and slice it for the current grid.
    pub fn load_image(&mut self, size: ImageSize, board: BoardRect) -> Result<&SliceLayout, PuzzleError> {
        if !(size.width > 0.0 && size.height > 0.0) {
            self.image_failed();
            return Err(PuzzleError::ImageDecode);
        }
        self.image = Some(size);
        self.reslice(board).ok_or(PuzzleError::ImageDecode)
    }

    /// Decode failed: forget the image and every piece.
    pub fn image_failed(&mut self) {
        self.stop_game();
        self.image = None;
        self.layout = None;
        self.board = Board::empty(self.config.snap_threshold);
    }

    /// Rebuild the piece set from the loaded image. `None` when no image is
    /// loaded yet.
    pub fn reslice(&mut self, board: BoardRect) -> Option<&SliceLayout> {
        let image = self.image?;
        self.stop_game();
        let board = board.or_fallback(self.config.fallback_board);
        let layout = compute_layout(image, self.grid, board);
        self.board = Board::from_layout(&layout, self.config.snap_threshold);
        self.layout = Some(layout);
        self.layout.as_ref()
    }

    /// Change the grid. Any running game ends; the pieces are rebuilt when an
    /// image is loaded.
    pub fn set_grid(&mut self, grid: GridSize, board: BoardRect) -> Option<&SliceLayout> {
        self.grid = GridSize::new(grid.columns, grid.rows);
        self.stop_game();
        self.reslice(board)
    }

    /// Begin a game. `mode` of `None` keeps the currently selected timer mode.
    /// Pieces become draggable once [`Session::scatter`] runs.
    pub fn start(&mut self, mode: Option<TimerMode>, now: f64) -> Result<(), PuzzleError> {
        if self.image.is_none() || self.board.is_empty() {
            return Err(PuzzleError::NotReady);
        }
        self.stop_game();
        if let Some(mode) = mode {
            self.mode = mode;
        }
        self.board.lock_all();
        let duration = self.challenge_duration_ms();
        self.clock.start(self.mode, now, duration);
        self.phase = GamePhase::Playing;
        Ok(())
    }

    /// Scatter the pieces of a running game. No-op outside of play.
    pub fn scatter<R: Rng + ?Sized>(&mut self, rng: &mut R, board: BoardRect) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        let params = ScatterParams {
            board: board.or_fallback(self.config.fallback_board),
            margin_factor: self.config.scatter_margin_factor,
            max_rotation_deg: self.config.max_rotation_deg,
        };
        self.board.scatter(rng, params);
        true
    }

    /// Stop the game, clear the timer mode and put every piece home.
    pub fn reset(&mut self) -> bool {
        if self.image.is_none() || self.board.is_empty() {
            return false;
        }
        self.stop_game();
        self.mode = TimerMode::None;
        self.board.reset_home();
        true
    }

    /// Route a normalized pointer sample. `target` is the piece under a
    /// pointer-down; other phases act on the live drag.
    pub fn pointer(&mut self, sample: PointerSample, target: Option<usize>, now: f64) -> PointerOutcome {
        match sample.phase {
            PointerPhase::Down => {
                let Some(index) = target else {
                    return PointerOutcome::Ignored;
                };
                if self.phase == GamePhase::Playing && self.board.begin_drag(index, (sample.x, sample.y)) {
                    PointerOutcome::Began(index)
                } else {
                    PointerOutcome::Ignored
                }
            }
            PointerPhase::Move => match self.board.drag_to((sample.x, sample.y)) {
                Some(index) => PointerOutcome::Moved(index),
                None => PointerOutcome::Ignored,
            },
            PointerPhase::Up | PointerPhase::Cancel => {
                let Some(drop) = self.board.end_drag() else {
                    return PointerOutcome::Ignored;
                };
                let completed = self.phase == GamePhase::Playing && self.board.all_placed();
                if completed {
                    self.complete(now);
                }
                PointerOutcome::Dropped { index: drop.index, snapped: drop.snapped, completed }
            }
        }
    }

    /// Freeze the clock at the moment the last piece lands.
    fn complete(&mut self, now: f64) {
        let reading = self.clock.cancel().map(|c| (c.mode(), c.reading_ms(now)));
        self.final_reading = reading.map(|(_, ms)| ms);
        self.pending_win = Some(win_message(reading));
    }

    /// Called after the win delay. Ends the game and yields the message, or
    /// `None` if the game was reset in between.
    pub fn finish_win(&mut self) -> Option<String> {
        let message = self.pending_win.take()?;
        self.clock.cancel();
        self.phase = GamePhase::Won;
        Some(message)
    }

    pub fn tick(&mut self, now: f64) -> TickOutcome {
        if self.phase != GamePhase::Playing {
            return TickOutcome::Idle;
        }
        let outcome = self.clock.tick(now);
        if outcome == TickOutcome::TimedOut {
            self.phase = GamePhase::TimedOut;
            self.board.lock_all();
        }
        outcome
    }

    /// Text for the timer element; `None` hides it.
    pub fn timer_label(&self, now: f64) -> Option<String> {
        match (self.mode, self.clock.active()) {
            (TimerMode::None, _) => None,
            (_, Some(clock)) => Some(format_time(clock.reading_ms(now))),
            (_, None) if self.final_reading.is_some() => self.final_reading.map(format_time),
            (TimerMode::Countdown, None) if self.phase == GamePhase::TimedOut => Some(format_time(0.0)),
            (TimerMode::Countdown, None) => {
                Some(format!("Ready: {}", format_time(self.challenge_duration_ms())))
            }
            (TimerMode::CountUp, None) => Some(format_time(0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn board_rect() -> BoardRect {
        BoardRect::new(640.0, 480.0)
    }

    fn loaded(columns: u32, rows: u32) -> Session {
        let mut s = Session::new(PuzzleConfig::default());
        s.set_grid(GridSize::new(columns, rows), board_rect());
        s.load_image(ImageSize { width: 800.0, height: 600.0 }, board_rect()).expect("valid image");
        s
    }

    fn down(x: f64, y: f64) -> PointerSample {
        PointerSample { x, y, phase: PointerPhase::Down }
    }

    fn solve_all(s: &mut Session, now: f64) -> Vec<PointerOutcome> {
        let mut outcomes = Vec::new();
        for i in 0..s.board().len() {
            let p = s.board().pieces()[i].clone();
            assert_eq!(s.pointer(down(0.0, 0.0), Some(i), now), PointerOutcome::Began(i));
            let to = (p.home.0 - p.position.0, p.home.1 - p.position.1);
            s.pointer(PointerSample { x: to.0, y: to.1, phase: PointerPhase::Move }, None, now);
            outcomes.push(s.pointer(PointerSample { x: to.0, y: to.1, phase: PointerPhase::Up }, None, now));
        }
        outcomes
    }

    #[test]
    fn start_without_image_is_not_ready() {
        let mut s = Session::new(PuzzleConfig::default());
        assert_eq!(s.start(Some(TimerMode::CountUp), 0.0), Err(PuzzleError::NotReady));
        assert_eq!(s.phase(), GamePhase::Idle);
        assert_eq!(s.mode(), TimerMode::None);
        assert!(!s.reset());
    }

    #[test]
    fn reslice_without_image_is_noop() {
        let mut s = Session::new(PuzzleConfig::default());
        assert!(s.reslice(board_rect()).is_none());
        assert!(s.set_grid(GridSize::new(4, 4), board_rect()).is_none());
        assert_eq!(s.grid(), GridSize::new(4, 4));
    }

    #[test]
    fn zero_sized_image_is_decode_failure() {
        let mut s = loaded(2, 2);
        let err = s.load_image(ImageSize { width: 0.0, height: 10.0 }, board_rect()).unwrap_err();
        assert_eq!(err, PuzzleError::ImageDecode);
        assert!(s.image().is_none());
        assert!(s.board().is_empty());
    }

    #[test]
    fn drag_refused_before_start() {
        let mut s = loaded(2, 2);
        assert_eq!(s.pointer(down(0.0, 0.0), Some(0), 0.0), PointerOutcome::Ignored);
    }

    #[test]
    fn restart_locks_pieces_until_scatter() {
        let mut s = loaded(2, 2);
        s.start(None, 0.0).unwrap();
        s.scatter(&mut StdRng::seed_from_u64(4), board_rect());
        s.start(None, 10.0).unwrap();
        assert!(s.board().pieces().iter().all(|p| !p.interactive));
        assert_eq!(s.pointer(down(0.0, 0.0), Some(0), 10.0), PointerOutcome::Ignored);
    }

    #[test]
    fn count_up_win_reports_elapsed() {
        let mut s = loaded(2, 2);
        s.start(Some(TimerMode::CountUp), 1_000.0).unwrap();
        assert!(s.scatter(&mut StdRng::seed_from_u64(1), board_rect()));
        let outcomes = solve_all(&mut s, 62_000.0);
        assert!(matches!(outcomes.last(), Some(PointerOutcome::Dropped { completed: true, .. })));
        assert!(!s.clock().is_running());
        assert_eq!(s.phase(), GamePhase::Playing);
        // The label shows the frozen reading, not the time the alert fires.
        assert_eq!(s.timer_label(62_400.0).as_deref(), Some("01:01"));
        assert_eq!(
            s.finish_win().as_deref(),
            Some("Congratulations! You completed the puzzle in 01:01.")
        );
        assert_eq!(s.phase(), GamePhase::Won);
        assert_eq!(s.timer_label(90_000.0).as_deref(), Some("01:01"));
        assert_eq!(s.finish_win(), None);
    }

    #[test]
    fn countdown_win_reports_remaining() {
        let mut s = loaded(2, 2);
        s.start(Some(TimerMode::Countdown), 0.0).unwrap();
        s.scatter(&mut StdRng::seed_from_u64(2), board_rect());
        solve_all(&mut s, 20_000.0);
        assert_eq!(
            s.finish_win().as_deref(),
            Some("Congratulations! You completed the puzzle with 00:40 left.")
        );
    }

    #[test]
    fn untimed_win_is_generic() {
        let mut s = loaded(2, 2);
        s.start(None, 0.0).unwrap();
        s.scatter(&mut StdRng::seed_from_u64(3), board_rect());
        solve_all(&mut s, 5.0);
        assert_eq!(s.finish_win().as_deref(), Some("Congratulations! You completed the puzzle."));
        assert_eq!(s.timer_label(5.0), None);
    }

    #[test]
    fn reset_during_win_delay_drops_message() {
        let mut s = loaded(2, 2);
        s.start(Some(TimerMode::CountUp), 0.0).unwrap();
        s.scatter(&mut StdRng::seed_from_u64(4), board_rect());
        solve_all(&mut s, 1.0);
        assert!(s.reset());
        assert_eq!(s.finish_win(), None);
        assert_eq!(s.mode(), TimerMode::None);
    }

    #[test]
    fn countdown_timeout_locks_board() {
        let mut s = loaded(2, 2);
        s.start(Some(TimerMode::Countdown), 0.0).unwrap();
        s.scatter(&mut StdRng::seed_from_u64(5), board_rect());
        assert_eq!(s.tick(30_000.0), TickOutcome::Display("00:30".into()));
        assert_eq!(s.tick(60_000.0), TickOutcome::TimedOut);
        assert_eq!(s.phase(), GamePhase::TimedOut);
        assert!(s.board().pieces().iter().all(|p| !p.interactive));
        assert_eq!(s.tick(60_250.0), TickOutcome::Idle);
        assert_eq!(s.pointer(down(0.0, 0.0), Some(0), 60_300.0), PointerOutcome::Ignored);
        assert_eq!(s.timer_label(60_300.0).as_deref(), Some("00:00"));
    }

    #[test]
    fn switching_mode_replaces_clock() {
        let mut s = loaded(3, 3);
        s.start(Some(TimerMode::Countdown), 0.0).unwrap();
        s.start(Some(TimerMode::CountUp), 1_000.0).unwrap();
        assert_eq!(s.mode(), TimerMode::CountUp);
        // Well past the countdown deadline, yet nothing times out.
        assert_eq!(s.tick(200_000.0), TickOutcome::Display("03:19".into()));
    }

    #[test]
    fn grid_change_cancels_and_updates_ready_label() {
        let mut s = loaded(3, 3);
        s.start(Some(TimerMode::Countdown), 0.0).unwrap();
        assert_eq!(s.timer_label(0.0).as_deref(), Some("01:00"));
        s.set_grid(GridSize::new(5, 5), board_rect());
        assert!(!s.clock().is_running());
        assert_eq!(s.phase(), GamePhase::Idle);
        assert_eq!(s.board().len(), 25);
        assert_eq!(s.timer_label(0.0).as_deref(), Some("Ready: 03:00"));
        s.set_grid(GridSize::new(10, 10), board_rect());
        assert_eq!(s.timer_label(0.0).as_deref(), Some("Ready: 15:00"));
    }

    #[test]
    fn scatter_outside_play_is_noop() {
        let mut s = loaded(2, 2);
        assert!(!s.scatter(&mut StdRng::seed_from_u64(9), board_rect()));
        assert!(s.board().pieces().iter().all(|p| p.position == p.home));
    }
}
