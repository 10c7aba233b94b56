//! Loading spinner state
//!
//! Counts outstanding network calls and keeps the refresh spinner visible for
//! a minimum dwell after the last one finishes, so quick calls do not flicker.
//! The spinner never owns a timer itself: state changes return a
//! [`TimerCommand`] for whoever runs the event loop.

use std::time::Duration;

use super::SPINNER_MIN_VISIBLE;

/// Visibility of the refresh spinner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinnerState {
    #[default]
    Hidden,
    Visible,
}

/// Instruction for the owner of the spinner-hide timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Cancel any pending hide timer and start a new one with this delay
    Arm(Duration),
    /// Cancel the pending hide timer
    Cancel,
}

#[derive(Debug, Clone)]
pub struct Spinner {
    outstanding: usize,
    state: SpinnerState,
    hide_armed: bool,
    min_visible: Duration,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new(SPINNER_MIN_VISIBLE)
    }
}

impl Spinner {
    pub fn new(min_visible: Duration) -> Self {
        Self {
            outstanding: 0,
            state: SpinnerState::Hidden,
            hide_armed: false,
            min_visible,
        }
    }

    pub fn state(&self) -> SpinnerState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == SpinnerState::Visible
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// A tracked call is starting
    pub fn acquire(&mut self) -> Option<TimerCommand> {
        self.outstanding += 1;
        self.state = SpinnerState::Visible;

        if self.hide_armed {
            self.hide_armed = false;
            Some(TimerCommand::Cancel)
        } else {
            None
        }
    }

    /// A tracked call has finished, successfully or not
    pub fn release(&mut self) -> Option<TimerCommand> {
        if self.outstanding == 0 {
            tracing::warn!("Spinner released without a matching acquire");
            return None;
        }

        self.outstanding -= 1;
        if self.outstanding == 0 && self.is_visible() {
            self.hide_armed = true;
            Some(TimerCommand::Arm(self.min_visible))
        } else {
            None
        }
    }

    /// The hide timer fired. Returns true if the spinner was hidden.
    pub fn hide_elapsed(&mut self) -> bool {
        if !self.hide_armed || self.outstanding > 0 {
            return false;
        }

        self.hide_armed = false;
        self.state = SpinnerState::Hidden;
        true
    }
}
