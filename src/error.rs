use wasm_bindgen::JsValue;

/// Failures surfaced to the player. None of these leave the session in a
/// partially updated state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PuzzleError {
    #[error("Please select an image file.")]
    NoFileSelected,
    #[error("Error loading image to create pieces.")]
    ImageDecode,
    #[error("Please load an image and wait for it to be ready before starting.")]
    NotReady,
    #[error("missing or invalid element: {0}")]
    Dom(String),
    #[error("invalid config: {0}")]
    Config(String),
}

impl PuzzleError {
    /// Whether the error is meant for the player (alert) rather than the console.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::NoFileSelected | Self::ImageDecode | Self::NotReady)
    }
}

impl From<PuzzleError> for JsValue {
    fn from(err: PuzzleError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
