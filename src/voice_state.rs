//! Voice process state machine
//!
//! Advisory state for the UI: it never gates whether a voice value is
//! accepted. Driven entirely by the voice producer's events and ticks.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::lexicon::VoiceMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum VoiceState {
    Idle = 0,
    Listening = 1,
    Processing = 2,
    CommandDetected = 3,
    NumberDetected = 4,
}

impl From<u8> for VoiceState {
    fn from(v: u8) -> Self {
        match v {
            1 => VoiceState::Listening,
            2 => VoiceState::Processing,
            3 => VoiceState::CommandDetected,
            4 => VoiceState::NumberDetected,
            _ => VoiceState::Idle,
        }
    }
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Listening => write!(f, "Listening"),
            VoiceState::Processing => write!(f, "Processing"),
            VoiceState::CommandDetected => write!(f, "Command"),
            VoiceState::NumberDetected => write!(f, "Number"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VoiceStateMachine {
    state: VoiceState,
    state_timestamp: Instant,
    detection_window: Duration,
}

impl VoiceStateMachine {
    pub fn new(detection_window: Duration, now: Instant) -> Self {
        Self {
            state: VoiceState::Idle,
            state_timestamp: now,
            detection_window,
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn state_timestamp(&self) -> Instant {
        self.state_timestamp
    }

    /// Apply one recognition result
    pub fn evaluate(&mut self, result: &VoiceMatch, now: Instant) -> VoiceState {
        self.expire(now);

        match result {
            VoiceMatch::Command(_) => self.state = VoiceState::CommandDetected,
            VoiceMatch::Number(_) => self.state = VoiceState::NumberDetected,
            VoiceMatch::NoMatch => {}
        }

        self.state_timestamp = now;
        self.state
    }

    /// Timer tick: only the detection window applies. The timestamp is left
    /// alone, otherwise a steady tick would keep the state alive forever.
    pub fn tick(&mut self, now: Instant) -> VoiceState {
        self.expire(now);
        self.state
    }

    /// Recognizer started delivering audio
    pub fn listen(&mut self, now: Instant) -> VoiceState {
        self.expire(now);
        if self.state == VoiceState::Idle {
            self.state = VoiceState::Listening;
        }
        self.state_timestamp = now;
        self.state
    }

    /// A non-empty chunk is about to be matched
    pub fn processing(&mut self, now: Instant) -> VoiceState {
        self.expire(now);
        if matches!(self.state, VoiceState::Idle | VoiceState::Listening) {
            self.state = VoiceState::Processing;
        }
        self.state_timestamp = now;
        self.state
    }

    fn expire(&mut self, now: Instant) {
        if now.saturating_duration_since(self.state_timestamp) > self.detection_window {
            self.state = VoiceState::Idle;
        }
    }
}
