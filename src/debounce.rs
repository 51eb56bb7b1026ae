//! Temporal debouncer for streaming voice text
//!
//! Streaming recognizers re-emit overlapping partial text. Chunks accumulate
//! in a history buffer that is dropped once it goes stale, and cleared as soon
//! as it produces a match so one utterance fires at most once.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::lexicon::{Lexicon, VoiceMatch, normalize};

/// Accumulated normalized text and the time it was last cleared
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    accumulated: String,
    last_clear: Instant,
}

impl HistoryBuffer {
    pub fn new(now: Instant) -> Self {
        Self {
            accumulated: String::new(),
            last_clear: now,
        }
    }

    pub fn text(&self) -> &str {
        &self.accumulated
    }

    pub fn last_clear(&self) -> Instant {
        self.last_clear
    }

    fn clear(&mut self, now: Instant) {
        self.accumulated.clear();
        self.last_clear = now;
    }

    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.last_clear) > window
    }
}

pub struct Debouncer {
    lexicon: Lexicon,
    history: HistoryBuffer,
    clear_window: Duration,
}

impl Debouncer {
    pub fn new(lexicon: Lexicon, clear_window: Duration, now: Instant) -> Self {
        Self {
            lexicon,
            history: HistoryBuffer::new(now),
            clear_window,
        }
    }

    /// Feed one raw chunk, returns the match against the updated history
    pub fn push(&mut self, chunk: &str, now: Instant) -> VoiceMatch {
        let normalized = normalize(chunk);
        if normalized.is_empty() {
            return VoiceMatch::NoMatch;
        }

        if self.history.is_stale(now, self.clear_window) {
            debug!(stale = %self.history.accumulated, "Discarding stale voice history");
            self.history.clear(now);
        }

        self.history.accumulated.push_str(&normalized);
        let result = self.lexicon.lookup(&self.history.accumulated);

        if result.should_clear_history() {
            debug!(history = %self.history.accumulated, ?result, "Voice history matched");
            self.history.clear(now);
        }

        result
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }
}
