//! Shared runtime state - thread-safe flags read by the UI and written by producers
//!
//! Every field is an atomic, so producers on their own threads and the consumer
//! loop share one `Arc<RuntimeState>` without locks.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use crate::session::Phase;
use crate::voice_state::VoiceState;

pub struct RuntimeState {
    // ========================================================================
    // Voice producer
    // ========================================================================
    /// Current advisory voice state (stored as u8)
    voice_state: AtomicU8,
    /// Voice text is dropped before the debouncer while muted
    pub mic_muted: AtomicBool,

    // ========================================================================
    // Session
    // ========================================================================
    /// Current session phase (stored as u8)
    phase: AtomicU8,

    // ========================================================================
    // Counters
    // ========================================================================
    /// Gesture frames rejected at the fusion boundary
    pub rejected_frames: AtomicU64,
    /// Voice matches forwarded to fusion
    pub voice_matches: AtomicU64,

    // ========================================================================
    // Shutdown
    // ========================================================================
    /// Set once on exit; producers stop at their next poll
    shutdown: AtomicBool,
}

impl RuntimeState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            voice_state: AtomicU8::new(VoiceState::Idle as u8),
            mic_muted: AtomicBool::new(false),
            phase: AtomicU8::new(Phase::WaitingStart as u8),
            rejected_frames: AtomicU64::new(0),
            voice_matches: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        })
    }

    // ========================================================================
    // Voice helpers
    // ========================================================================

    pub fn voice_state(&self) -> VoiceState {
        VoiceState::from(self.voice_state.load(Ordering::SeqCst))
    }

    /// Publish a new voice state, returns true if it changed
    pub fn set_voice_state(&self, state: VoiceState) -> bool {
        self.voice_state.swap(state as u8, Ordering::SeqCst) != state as u8
    }

    pub fn is_muted(&self) -> bool {
        self.mic_muted.load(Ordering::SeqCst)
    }

    /// Toggle microphone mute state, returns new state
    pub fn toggle_mic_mute(&self) -> bool {
        !self.mic_muted.fetch_xor(true, Ordering::SeqCst)
    }

    // ========================================================================
    // Session helpers
    // ========================================================================

    pub fn phase(&self) -> Phase {
        Phase::from(self.phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    pub fn count_rejected_frame(&self) {
        self.rejected_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_voice_match(&self) {
        self.voice_matches.fetch_add(1, Ordering::Relaxed);
    }

    // ========================================================================
    // Shutdown helpers
    // ========================================================================

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeState")
            .field("voice_state", &self.voice_state())
            .field("mic_muted", &self.is_muted())
            .field("phase", &self.phase())
            .field(
                "rejected_frames",
                &self.rejected_frames.load(Ordering::Relaxed),
            )
            .field("voice_matches", &self.voice_matches.load(Ordering::Relaxed))
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

/// Type alias for shared state
pub type SharedState = Arc<RuntimeState>;
