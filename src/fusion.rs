//! Input fusion - merges gesture and voice recognition into one player input per cycle
//!
//! Precedence inside a cycle:
//! 1. Lifecycle commands - the latest one is forwarded alone, digits are dropped
//! 2. Digits - a voice digit beats gesture digits from the same cycle,
//!    otherwise the latest gesture frame wins
//! 3. Targets (spoken 15 / 20) travel alongside the digit

use std::time::Instant;

use serde::Deserialize;
use tracing::debug;

use crate::arbiter::{is_target, is_valid_hand, is_valid_hand_total};
use crate::error::Rejection;
use crate::lexicon::{VoiceCommand, VoiceMatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Gesture,
    Voice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Command,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventValue {
    Command(VoiceCommand),
    Number(u8),
}

/// One recognition result, immutable once produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognitionEvent {
    pub source: Source,
    pub value: EventValue,
    pub confidence: f32,
    pub timestamp: Instant,
}

impl RecognitionEvent {
    pub fn kind(&self) -> EventKind {
        match self.value {
            EventValue::Command(_) => EventKind::Command,
            EventValue::Number(_) => EventKind::Number,
        }
    }

    /// Voice matches carry no classifier score; a keyword hit counts as certain
    pub fn from_voice(result: VoiceMatch, timestamp: Instant) -> Option<Self> {
        let value = match result {
            VoiceMatch::NoMatch => return None,
            VoiceMatch::Command(command) => EventValue::Command(command),
            VoiceMatch::Number(n) => EventValue::Number(n),
        };
        Some(Self {
            source: Source::Voice,
            value,
            confidence: 1.0,
            timestamp,
        })
    }
}

/// Per-frame output of the gesture classifier
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GestureFrame {
    pub left: Option<u8>,
    pub right: Option<u8>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl GestureFrame {
    /// Convert to an event. Frames with no visible hand yield `Ok(None)`.
    ///
    /// Confidence is checked first, so an unsure frame is never judged on its hands.
    pub fn into_event(
        self,
        min_confidence: f32,
        timestamp: Instant,
    ) -> Result<Option<RecognitionEvent>, Rejection> {
        if self.confidence < min_confidence {
            return Err(Rejection::LowConfidence(self.confidence));
        }
        let hands: Vec<u8> = [self.left, self.right].into_iter().flatten().collect();
        if hands.is_empty() {
            return Ok(None);
        }
        if let Some(bad) = hands.iter().copied().find(|d| !is_valid_hand(*d)) {
            return Err(Rejection::HandOutOfRange(bad));
        }
        Ok(Some(RecognitionEvent {
            source: Source::Gesture,
            value: EventValue::Number(hands.iter().sum()),
            confidence: self.confidence,
            timestamp,
        }))
    }
}

/// Digit chosen for the player in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDigit {
    pub value: u8,
    pub source: Source,
}

/// Canonical player input produced by one fusion cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    Command(VoiceCommand),
    Round {
        digit: Option<PlayerDigit>,
        target: Option<u8>,
    },
}

#[derive(Debug)]
pub struct FusionLayer {
    pending: Vec<RecognitionEvent>,
    min_confidence: f32,
}

impl FusionLayer {
    pub fn new(min_confidence: f32) -> Self {
        Self {
            pending: Vec::new(),
            min_confidence,
        }
    }

    /// Validate and queue an event for the current cycle
    pub fn submit(&mut self, event: RecognitionEvent) -> Result<(), Rejection> {
        if let EventValue::Number(n) = event.value {
            let valid = match event.source {
                Source::Gesture => is_valid_hand_total(n),
                Source::Voice => n == 0 || n == 5 || is_target(n),
            };
            if !valid {
                let rejection = match event.source {
                    Source::Gesture => Rejection::HandOutOfRange(n),
                    Source::Voice => Rejection::UnknownNumber(n),
                };
                debug!(source = ?event.source, value = n, "Dropping input: {}", rejection);
                return Err(rejection);
            }
        }
        self.pending.push(event);
        Ok(())
    }

    /// Gesture frames pass through the confidence gate before queueing
    pub fn submit_gesture(&mut self, frame: GestureFrame, at: Instant) -> Result<(), Rejection> {
        match frame.into_event(self.min_confidence, at) {
            Ok(Some(event)) => self.submit(event),
            Ok(None) => Ok(()),
            // Low-confidence frames are routine noise
            Err(rejection @ Rejection::LowConfidence(_)) => Err(rejection),
            Err(rejection) => {
                debug!(?frame, "Dropping gesture frame: {}", rejection);
                Err(rejection)
            }
        }
    }

    /// Drop everything queued this cycle
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Close the current cycle and emit at most one input
    pub fn resolve(&mut self) -> Option<PlayerInput> {
        if self.pending.is_empty() {
            return None;
        }
        let mut events = std::mem::take(&mut self.pending);
        events.sort_by_key(|e| e.timestamp);

        let command = events.iter().rev().find_map(|e| match e.value {
            EventValue::Command(c) => Some(c),
            EventValue::Number(_) => None,
        });
        if let Some(command) = command {
            return Some(PlayerInput::Command(command));
        }

        let latest_digit = |source: Source| {
            events.iter().rev().find_map(|e| match e.value {
                EventValue::Number(n) if e.source == source && !is_target(n) => Some(PlayerDigit {
                    value: n,
                    source,
                }),
                _ => None,
            })
        };
        let digit = latest_digit(Source::Voice).or_else(|| latest_digit(Source::Gesture));

        let target = events.iter().rev().find_map(|e| match e.value {
            EventValue::Number(n) if e.source == Source::Voice && is_target(n) => Some(n),
            _ => None,
        });

        if digit.is_none() && target.is_none() {
            return None;
        }
        Some(PlayerInput::Round { digit, target })
    }
}
