//! Picture Puzzle core crate.
//!
//! Upload an image, slice it into a grid, scatter the pieces and drag them
//! back home. Game rules (`slicer`, `board`, `timer`, `session`) are plain
//! Rust and run on the host; `view` binds them to the page.

use wasm_bindgen::prelude::*;

pub mod board;
pub mod config;
pub mod error;
pub mod session;
pub mod slicer;
pub mod timer;
mod view;

pub use config::PuzzleConfig;
pub use error::PuzzleError;
pub use session::{GamePhase, PointerOutcome, Session};
pub use timer::{challenge_duration_ms, format_time, TimerMode};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

/// Bind the puzzle to the stock page ids.
#[wasm_bindgen]
pub fn start_puzzle_app() -> Result<(), JsValue> {
    view::mount(PuzzleConfig::default()).map_err(Into::into)
}

/// Bind with a JSON config; omitted fields keep their defaults.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_puzzle_app_with_config(json: &str) -> Result<(), JsValue> {
    let config = PuzzleConfig::from_json(json)?;
    view::mount(config).map_err(Into::into)
}

#[wasm_bindgen]
pub fn upload_image() -> bool {
    view::upload_image()
}

/// Slice an image given by URL instead of the file input.
#[wasm_bindgen]
pub fn load_image_url(url: &str) -> bool {
    view::load_image_url(url)
}

/// Start with the currently selected timer mode.
#[wasm_bindgen]
pub fn start_game() -> bool {
    view::start(None)
}

#[wasm_bindgen]
pub fn start_challenge() -> bool {
    view::start(Some(TimerMode::Countdown))
}

#[wasm_bindgen]
pub fn start_normal() -> bool {
    view::start(Some(TimerMode::CountUp))
}

#[wasm_bindgen]
pub fn reset_game() {
    view::reset()
}

fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
