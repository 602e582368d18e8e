//! Tunables for slicing, scattering, snapping and timing, plus the DOM ids the
//! view binds to. Defaults mirror the stock page layout.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MIN_GRID: u32 = 2;
pub const MAX_GRID: u32 = 10;
pub const DEFAULT_GRID: u32 = 3;
pub const SNAP_THRESHOLD_PX: f64 = 30.0;
pub const FALLBACK_BOARD_WIDTH: f64 = 640.0;
pub const FALLBACK_BOARD_HEIGHT: f64 = 480.0;
pub const TICK_INTERVAL_MS: u32 = 250;

/// Element ids looked up when mounting.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DomIds {
    pub file_input: String,
    pub preview: String,
    pub start_button: String,
    pub start_challenge_button: String,
    pub start_normal_button: String,
    pub reset_button: String,
    pub columns_input: String,
    pub rows_input: String,
    /// Outer board; its rect bounds the scatter area.
    pub board: String,
    /// Inner wrapper holding piece canvases; resized to the draw size.
    pub wrapper: String,
    pub timer_display: String,
}

impl Default for DomIds {
    fn default() -> Self {
        Self {
            file_input: "puzzleImage".into(),
            preview: "preview".into(),
            start_button: "startGameButton".into(),
            start_challenge_button: "startChallengeButton".into(),
            start_normal_button: "startNormalButton".into(),
            reset_button: "resetGameButton".into(),
            columns_input: "columns".into(),
            rows_input: "rows".into(),
            board: "puzzleContainer".into(),
            wrapper: "puzzleWrapper".into(),
            timer_display: "timerDisplay".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PuzzleConfig {
    pub default_grid: u32,
    pub snap_threshold: f64,
    pub fallback_board: (f64, f64),
    /// Extra scatter spread as a fraction of the board's short side.
    pub scatter_margin_factor: f64,
    pub max_rotation_deg: f64,
    pub scatter_delay_ms: u32,
    pub win_delay_ms: u32,
    pub tick_interval_ms: u32,
    pub ids: DomIds,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            default_grid: DEFAULT_GRID,
            snap_threshold: SNAP_THRESHOLD_PX,
            fallback_board: (FALLBACK_BOARD_WIDTH, FALLBACK_BOARD_HEIGHT),
            scatter_margin_factor: 0.6,
            max_rotation_deg: 30.0,
            scatter_delay_ms: 200,
            win_delay_ms: 400,
            tick_interval_ms: TICK_INTERVAL_MS,
            ids: DomIds::default(),
        }
    }
}

impl PuzzleConfig {
    /// Parse a partial JSON config; missing fields keep their defaults.
    #[cfg(feature = "serde_json")]
    pub fn from_json(text: &str) -> Result<Self, crate::PuzzleError> {
        serde_json::from_str(text).map_err(|e| crate::PuzzleError::Config(e.to_string()))
    }
}
