//! Challenge countdown and normal elapsed-time clock.
//!
//! The clock only stores anchors (deadline or origin) and is advanced by the
//! caller with explicit timestamps, so the browser interval that drives it can
//! be swapped for plain numbers in tests.

/// Which clock, if any, accompanies a game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimerMode {
    #[default]
    None,
    /// Challenge: count down from a duration derived from the piece count.
    Countdown,
    /// Normal: count up from the start without limit.
    CountUp,
}

/// Countdown budget for a puzzle with `piece_count` pieces.
pub fn challenge_duration_ms(piece_count: usize) -> f64 {
    const MINUTE: f64 = 60_000.0;
    let minutes = match piece_count {
        0..=9 => 1.0,
        10..=25 => 3.0,
        26..=49 => 5.0,
        50..=81 => 10.0,
        _ => 15.0,
    };
    minutes * MINUTE
}

/// `MM:SS`, rounding partial seconds up. Non-positive input is `00:00`.
pub fn format_time(ms: f64) -> String {
    if ms.is_nan() || ms <= 0.0 {
        return "00:00".to_string();
    }
    let total = (ms / 1000.0).ceil() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActiveClock {
    Countdown { deadline_ms: f64 },
    CountUp { origin_ms: f64 },
}

impl ActiveClock {
    pub fn mode(&self) -> TimerMode {
        match self {
            ActiveClock::Countdown { .. } => TimerMode::Countdown,
            ActiveClock::CountUp { .. } => TimerMode::CountUp,
        }
    }

    /// Remaining (countdown) or elapsed (count-up) milliseconds at `now`.
    pub fn reading_ms(&self, now: f64) -> f64 {
        match *self {
            ActiveClock::Countdown { deadline_ms } => deadline_ms - now,
            ActiveClock::CountUp { origin_ms } => now - origin_ms,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// No clock running.
    Idle,
    Display(String),
    /// Countdown reached zero. Reported once; the clock is gone afterwards.
    TimedOut,
}

/// The single clock slot of a session.
#[derive(Debug, Default)]
pub struct GameClock {
    active: Option<ActiveClock>,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any running clock with a fresh one for `mode`. `TimerMode::None`
    /// only cancels.
    pub fn start(&mut self, mode: TimerMode, now: f64, countdown_ms: f64) {
        self.cancel();
        self.active = match mode {
            TimerMode::None => None,
            TimerMode::Countdown => Some(ActiveClock::Countdown { deadline_ms: now + countdown_ms }),
            TimerMode::CountUp => Some(ActiveClock::CountUp { origin_ms: now }),
        };
    }

    /// Stop the clock. Safe to call with nothing running; returns what was
    /// running.
    pub fn cancel(&mut self) -> Option<ActiveClock> {
        self.active.take()
    }

    pub fn active(&self) -> Option<ActiveClock> {
        self.active
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn tick(&mut self, now: f64) -> TickOutcome {
        match self.active {
            None => TickOutcome::Idle,
            Some(clock @ ActiveClock::Countdown { .. }) => {
                let remaining = clock.reading_ms(now);
                if remaining <= 0.0 {
                    self.active = None;
                    TickOutcome::TimedOut
                } else {
                    TickOutcome::Display(format_time(remaining))
                }
            }
            Some(clock @ ActiveClock::CountUp { .. }) => {
                TickOutcome::Display(format_time(clock.reading_ms(now)))
            }
        }
    }
}
