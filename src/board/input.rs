use web_sys::{MouseEvent, TouchEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Normalized pointer sample in client coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub phase: PointerPhase,
}

/// Raw pointer input before normalization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerInput {
    Mouse { phase: PointerPhase, button: i16, x: f64, y: f64 },
    Touch { phase: PointerPhase, x: f64, y: f64 },
}

const PRIMARY_BUTTON: i16 = 0;

impl PointerInput {
    /// Collapse mouse and touch into one sample. Mouse presses of anything but
    /// the primary button are dropped.
    pub fn sample(self) -> Option<PointerSample> {
        match self {
            PointerInput::Mouse { phase: PointerPhase::Down, button, .. } if button != PRIMARY_BUTTON => None,
            PointerInput::Mouse { phase, x, y, .. } | PointerInput::Touch { phase, x, y } => {
                Some(PointerSample { x, y, phase })
            }
        }
    }

    pub fn from_mouse(evt: &MouseEvent, phase: PointerPhase) -> Self {
        PointerInput::Mouse {
            phase,
            button: evt.button(),
            x: evt.client_x() as f64,
            y: evt.client_y() as f64,
        }
    }

    /// First active touch, or the first changed touch once contact has ended.
    pub fn from_touch(evt: &TouchEvent, phase: PointerPhase) -> Option<Self> {
        let touch = evt
            .touches()
            .get(0)
            .or_else(|| evt.changed_touches().get(0))?;
        Some(PointerInput::Touch {
            phase,
            x: touch.client_x() as f64,
            y: touch.client_y() as f64,
        })
    }
}
