use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{GameError, GameResult};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub machine: MachineConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            gesture: GestureConfig::default(),
            session: SessionConfig::default(),
            machine: MachineConfig::default(),
            vocabulary: VocabularyConfig::default(),
        }
    }
}

// ============================================================================
// Timing Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    /// Accumulated voice text older than this is discarded before the next chunk
    #[serde(default = "default_clear_window_ms")]
    pub clear_window_ms: u64,
    /// Voice state falls back to idle after this long without an evaluation
    #[serde(default = "default_detection_window_ms")]
    pub detection_window_ms: u64,
    /// Cadence of the fusion cycle that feeds the session controller
    #[serde(default = "default_fusion_tick_ms")]
    pub fusion_tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clear_window_ms: default_clear_window_ms(),
            detection_window_ms: default_detection_window_ms(),
            fusion_tick_ms: default_fusion_tick_ms(),
        }
    }
}

impl TimingConfig {
    pub fn clear_window(&self) -> Duration {
        Duration::from_millis(self.clear_window_ms)
    }

    pub fn detection_window(&self) -> Duration {
        Duration::from_millis(self.detection_window_ms)
    }

    pub fn fusion_tick(&self) -> Duration {
        Duration::from_millis(self.fusion_tick_ms.max(1))
    }
}

fn default_clear_window_ms() -> u64 {
    1500
}

fn default_detection_window_ms() -> u64 {
    1500
}

fn default_fusion_tick_ms() -> u64 {
    100
}

// ============================================================================
// Gesture Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct GestureConfig {
    /// Frames below this classifier confidence are never forwarded
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

fn default_min_confidence() -> f32 {
    0.8
}

// ============================================================================
// Session Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Decisive rounds needed to complete a session
    #[serde(default = "default_valid_rounds")]
    pub valid_rounds: u32,
    /// Countdown between starting a session and opening its first round
    #[serde(default = "default_prepare_ms")]
    pub prepare_ms: u64,
    /// Minimum time a round stays open before it can be arbitrated
    #[serde(default = "default_stillness_ms")]
    pub stillness_ms: u64,
    /// Missing player input is auto-filled after this long
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,
    /// How long a decisive result is shown before the next round opens
    #[serde(default = "default_resolve_pause_ms")]
    pub resolve_pause_ms: u64,
    /// Number of recent records carried in UI snapshots
    #[serde(default = "default_recent_records")]
    pub recent_records: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            valid_rounds: default_valid_rounds(),
            prepare_ms: default_prepare_ms(),
            stillness_ms: default_stillness_ms(),
            round_timeout_secs: default_round_timeout_secs(),
            resolve_pause_ms: default_resolve_pause_ms(),
            recent_records: default_recent_records(),
        }
    }
}

impl SessionConfig {
    pub fn prepare(&self) -> Duration {
        Duration::from_millis(self.prepare_ms)
    }

    pub fn stillness(&self) -> Duration {
        Duration::from_millis(self.stillness_ms)
    }

    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.round_timeout_secs)
    }

    pub fn resolve_pause(&self) -> Duration {
        Duration::from_millis(self.resolve_pause_ms)
    }
}

fn default_valid_rounds() -> u32 {
    5
}

fn default_prepare_ms() -> u64 {
    3000
}

fn default_stillness_ms() -> u64 {
    1000
}

fn default_round_timeout_secs() -> u64 {
    15
}

fn default_resolve_pause_ms() -> u64 {
    2000
}

fn default_recent_records() -> usize {
    3
}

// ============================================================================
// Machine Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct MachineConfig {
    /// Values each machine hand is drawn from (fist = 0, open palm = 5)
    #[serde(default = "default_hand_values")]
    pub hand_values: Vec<u8>,
    /// Hand totals used when a round times out without player gesture
    #[serde(default = "default_fallback_hands")]
    pub fallback_hands: Vec<u8>,
    /// Targets used when a round times out without a spoken target
    #[serde(default = "default_fallback_targets")]
    pub fallback_targets: Vec<u8>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            hand_values: default_hand_values(),
            fallback_hands: default_fallback_hands(),
            fallback_targets: default_fallback_targets(),
        }
    }
}

fn default_hand_values() -> Vec<u8> {
    vec![0, 5]
}

fn default_fallback_hands() -> Vec<u8> {
    vec![0, 5]
}

fn default_fallback_targets() -> Vec<u8> {
    vec![15, 20]
}

// ============================================================================
// Vocabulary Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VocabularyConfig {
    /// Extra command phrases, checked after the built-in ones
    #[serde(default)]
    pub commands: Vec<PhraseCommand>,
    /// Extra number phrases, checked after the built-in ones
    #[serde(default)]
    pub numbers: Vec<PhraseNumber>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PhraseCommand {
    pub phrase: String,
    /// One of "start", "end", "exit", "ready"
    pub command: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PhraseNumber {
    pub phrase: String,
    pub value: u8,
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> GameResult<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| match e {
            GameError::Config(msg) => GameError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(text: &str) -> GameResult<Self> {
        let config: Config = toml::from_str(text).map_err(|e| GameError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> GameResult<()> {
        if self.session.valid_rounds == 0 {
            return Err(GameError::Config("session.valid_rounds must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.gesture.min_confidence) {
            return Err(GameError::Config(
                "gesture.min_confidence must be within 0.0..=1.0".into(),
            ));
        }
        if self.machine.hand_values.is_empty()
            || self.machine.fallback_hands.is_empty()
            || self.machine.fallback_targets.is_empty()
        {
            return Err(GameError::Config("machine value sets must not be empty".into()));
        }
        if let Some(v) = self.machine.hand_values.iter().find(|v| **v > 5) {
            return Err(GameError::Config(format!(
                "machine.hand_values entry {} is outside 0..=5",
                v
            )));
        }
        if let Some(v) = self.machine.fallback_hands.iter().find(|v| **v > 10) {
            return Err(GameError::Config(format!(
                "machine.fallback_hands entry {} is outside 0..=10",
                v
            )));
        }
        if let Some(v) = self.machine.fallback_targets.iter().find(|v| **v != 15 && **v != 20) {
            return Err(GameError::Config(format!(
                "machine.fallback_targets entry {} is not 15 or 20",
                v
            )));
        }
        Ok(())
    }
}
