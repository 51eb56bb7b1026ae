//! Replay scripts - timestamped recognition events played back in real time
//!
//! ```toml
//! [[event]]
//! at_ms = 0
//! ui = "start"
//!
//! [[event]]
//! at_ms = 400
//! voice = "十五"
//!
//! [[event]]
//! at_ms = 600
//! gesture = { left = 5, right = 5, confidence = 0.93 }
//! ```

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{GameError, GameResult};
use crate::fusion::GestureFrame;
use crate::lexicon::VoiceCommand;
use crate::producer::{Inbound, VoiceChunk};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default, rename = "event")]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEvent {
    at_ms: u64,
    voice: Option<String>,
    gesture: Option<GestureFrame>,
    ui: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    /// Voice text, `|` separates streaming chunks
    Voice(Vec<String>),
    Gesture(GestureFrame),
    Ui(VoiceCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEvent {
    pub at: Duration,
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    pub events: Vec<ScriptEvent>,
}

impl Script {
    pub fn load(path: &Path) -> GameResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| GameError::Script(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> GameResult<Self> {
        let raw: RawScript =
            toml::from_str(content).map_err(|e| GameError::Script(e.to_string()))?;

        let mut events = raw
            .events
            .into_iter()
            .enumerate()
            .map(|(i, event)| convert(i, event))
            .collect::<GameResult<Vec<_>>>()?;

        // Stable, so same-time events keep file order
        events.sort_by_key(|e| e.at);
        Ok(Self { events })
    }

    pub fn duration(&self) -> Duration {
        self.events.last().map(|e| e.at).unwrap_or_default()
    }
}

fn convert(index: usize, event: RawEvent) -> GameResult<ScriptEvent> {
    let at = Duration::from_millis(event.at_ms);
    let action = match (event.voice, event.gesture, event.ui) {
        (Some(text), None, None) => {
            let chunks: Vec<String> = text
                .split('|')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
            if chunks.is_empty() {
                return Err(GameError::Script(format!("event {}: empty voice text", index)));
            }
            ScriptAction::Voice(chunks)
        }
        (None, Some(frame), None) => ScriptAction::Gesture(frame),
        (None, None, Some(ui)) => ScriptAction::Ui(
            ui.parse()
                .map_err(|e| GameError::Script(format!("event {}: {}", index, e)))?,
        ),
        _ => {
            return Err(GameError::Script(format!(
                "event {}: needs exactly one of voice, gesture, ui",
                index
            )));
        }
    };
    Ok(ScriptEvent { at, action })
}

/// Play the script against the producer channels, in real time
pub fn run_replay(
    script: Script,
    voice_tx: flume::Sender<VoiceChunk>,
    tx: flume::Sender<Inbound>,
    state: SharedState,
) -> GameResult<()> {
    info!(events = script.events.len(), "Replaying script");
    let start = Instant::now();

    for event in script.events {
        let due = start + event.at;
        while Instant::now() < due {
            if state.is_shutdown() {
                return Ok(());
            }
            let left = due.saturating_duration_since(Instant::now());
            std::thread::sleep(left.min(Duration::from_millis(50)));
        }

        let at = Instant::now();
        debug!(at_ms = event.at.as_millis() as u64, action = ?event.action, "Replay event");
        match event.action {
            ScriptAction::Voice(chunks) => {
                for text in chunks {
                    voice_tx.send(VoiceChunk { text, at })?;
                }
            }
            ScriptAction::Gesture(frame) => tx.send(Inbound::Gesture(frame, at))?,
            ScriptAction::Ui(command) => tx.send(Inbound::Ui(command))?,
        }
    }

    let _ = tx.send(Inbound::Closed("replay"));
    Ok(())
}
