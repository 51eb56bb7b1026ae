//! Producer loops - voice debouncing thread and the terminal line reader
//!
//! The voice producer owns the debouncer and the voice state machine, so both
//! have a single writer. It polls with a timeout to keep ticking the state
//! machine while no text arrives.

use std::io::BufRead;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::debounce::Debouncer;
use crate::error::{GameError, GameResult};
use crate::fusion::{GestureFrame, RecognitionEvent};
use crate::lexicon::{VoiceCommand, normalize};
use crate::state::SharedState;
use crate::voice_state::VoiceStateMachine;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Raw text chunk from the speech collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceChunk {
    pub text: String,
    pub at: Instant,
}

/// Everything the consumer loop receives
#[derive(Debug, Clone)]
pub enum Inbound {
    /// Debounced voice match
    Voice(RecognitionEvent),
    Gesture(GestureFrame, Instant),
    /// Keyboard slash command, unparsed
    Slash(String),
    /// Lifecycle command issued by a script
    Ui(VoiceCommand),
    /// Line that could not be parsed, shown to the player
    Invalid(String),
    /// Producer ran out of input
    Closed(&'static str),
}

/// Classified terminal line
#[derive(Debug, Clone, PartialEq)]
pub enum InputLine {
    Slash(String),
    Gesture(GestureFrame),
    Voice(Vec<String>),
    Empty,
}

/// Parse `g <left|-> <right|-> [confidence]`
pub fn parse_gesture(args: &str) -> GameResult<GestureFrame> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(GameError::Input(format!(
            "expected 'g <left|-> <right|-> [confidence]', got 'g {}'",
            args.trim()
        )));
    }

    let hand = |token: &str| -> GameResult<Option<u8>> {
        if token == "-" {
            return Ok(None);
        }
        token
            .parse::<u8>()
            .map(Some)
            .map_err(|_| GameError::Input(format!("bad hand value '{}'", token)))
    };

    let confidence = match parts.get(2) {
        Some(token) => token
            .parse::<f32>()
            .map_err(|_| GameError::Input(format!("bad confidence '{}'", token)))?,
        None => 1.0,
    };

    Ok(GestureFrame {
        left: hand(parts[0])?,
        right: hand(parts[1])?,
        confidence,
    })
}

pub fn classify_line(line: &str) -> GameResult<InputLine> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(InputLine::Empty);
    }
    if line.starts_with('/') {
        return Ok(InputLine::Slash(line.to_string()));
    }
    if let Some(args) = line.strip_prefix("g ") {
        return parse_gesture(args).map(InputLine::Gesture);
    }

    let chunks: Vec<String> = line
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();
    if chunks.is_empty() {
        return Ok(InputLine::Empty);
    }
    Ok(InputLine::Voice(chunks))
}

/// Voice producer: debounce chunks, drive the state machine, forward matches
pub fn run_voice_producer(
    rx: flume::Receiver<VoiceChunk>,
    tx: flume::Sender<Inbound>,
    mut debouncer: Debouncer,
    mut machine: VoiceStateMachine,
    state: SharedState,
) -> GameResult<()> {
    while !state.is_shutdown() {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(chunk) => handle_chunk(&chunk, &tx, &mut debouncer, &mut machine, &state)?,
            Err(flume::RecvTimeoutError::Timeout) => {
                state.set_voice_state(machine.tick(Instant::now()));
            }
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Drain remaining
    for chunk in rx.drain() {
        handle_chunk(&chunk, &tx, &mut debouncer, &mut machine, &state)?;
    }

    state.set_voice_state(machine.tick(Instant::now()));
    Ok(())
}

fn handle_chunk(
    chunk: &VoiceChunk,
    tx: &flume::Sender<Inbound>,
    debouncer: &mut Debouncer,
    machine: &mut VoiceStateMachine,
    state: &SharedState,
) -> GameResult<()> {
    if state.is_muted() {
        trace!(text = %chunk.text, "Mic muted, dropping chunk");
        return Ok(());
    }

    machine.listen(chunk.at);
    if !normalize(&chunk.text).is_empty() {
        machine.processing(chunk.at);
    }
    state.set_voice_state(machine.state());

    let result = debouncer.push(&chunk.text, chunk.at);
    state.set_voice_state(machine.evaluate(&result, chunk.at));

    if let Some(event) = RecognitionEvent::from_voice(result, chunk.at) {
        debug!(value = ?event.value, "Voice match");
        state.count_voice_match();
        tx.send(Inbound::Voice(event))?;
    }
    Ok(())
}

/// Read terminal lines until EOF or shutdown. Voice text goes to the voice
/// producer, everything else straight to the consumer.
pub fn run_line_reader<R: BufRead>(
    reader: R,
    voice_tx: flume::Sender<VoiceChunk>,
    tx: flume::Sender<Inbound>,
    state: SharedState,
) -> GameResult<()> {
    for line in reader.lines() {
        if state.is_shutdown() {
            break;
        }
        let line = line?;
        let at = Instant::now();

        match classify_line(&line) {
            Ok(InputLine::Empty) => {}
            Ok(InputLine::Slash(cmd)) => tx.send(Inbound::Slash(cmd))?,
            Ok(InputLine::Gesture(frame)) => tx.send(Inbound::Gesture(frame, at))?,
            Ok(InputLine::Voice(chunks)) => {
                for text in chunks {
                    voice_tx.send(VoiceChunk {
                        text,
                        at: Instant::now(),
                    })?;
                }
            }
            Err(e) => tx.send(Inbound::Invalid(e.to_string()))?,
        }
    }

    let _ = tx.send(Inbound::Closed("stdin"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::EventValue;
    use crate::lexicon::Lexicon;
    use crate::state::RuntimeState;
    use crate::voice_state::VoiceState;
    use std::io::Cursor;

    #[test]
    fn test_classify_lines() {
        assert_eq!(classify_line("   ").unwrap(), InputLine::Empty);
        assert_eq!(
            classify_line("/start").unwrap(),
            InputLine::Slash("/start".to_string())
        );
        assert_eq!(
            classify_line("开始|游戏").unwrap(),
            InputLine::Voice(vec!["开始".to_string(), "游戏".to_string()])
        );
        assert_eq!(
            classify_line("g 5 - 0.9").unwrap(),
            InputLine::Gesture(GestureFrame {
                left: Some(5),
                right: None,
                confidence: 0.9,
            })
        );
        // Words starting with g are still voice
        assert!(matches!(classify_line("go").unwrap(), InputLine::Voice(_)));
    }

    #[test]
    fn test_parse_gesture_errors() {
        assert!(parse_gesture("5").is_err());
        assert!(parse_gesture("5 x").is_err());
        assert!(parse_gesture("5 5 high").is_err());
        assert!(parse_gesture("5 5 0.9 extra").is_err());
        // Out-of-range hands parse; the fusion boundary rejects them
        assert_eq!(parse_gesture("10 0").unwrap().left, Some(10));
    }

    #[test]
    fn test_voice_producer_forwards_matches() {
        let state = RuntimeState::new();
        let (chunk_tx, chunk_rx) = flume::unbounded();
        let (tx, rx) = flume::unbounded();
        let t0 = Instant::now();

        let debouncer = Debouncer::new(Lexicon::builtin(), Duration::from_millis(1500), t0);
        let machine = VoiceStateMachine::new(Duration::from_millis(1500), t0);

        chunk_tx
            .send(VoiceChunk {
                text: "开始".to_string(),
                at: t0,
            })
            .unwrap();
        chunk_tx
            .send(VoiceChunk {
                text: "游戏".to_string(),
                at: t0 + Duration::from_millis(200),
            })
            .unwrap();
        drop(chunk_tx);

        run_voice_producer(chunk_rx, tx, debouncer, machine, state.clone()).unwrap();

        let events: Vec<Inbound> = rx.drain().collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Inbound::Voice(event) => {
                assert_eq!(event.value, EventValue::Command(VoiceCommand::StartGame))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(state.voice_matches.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[test]
    fn test_muted_voice_is_dropped() {
        let state = RuntimeState::new();
        state.toggle_mic_mute();
        let (chunk_tx, chunk_rx) = flume::unbounded();
        let (tx, rx) = flume::unbounded();
        let t0 = Instant::now();

        chunk_tx
            .send(VoiceChunk {
                text: "十五".to_string(),
                at: t0,
            })
            .unwrap();
        drop(chunk_tx);

        run_voice_producer(
            chunk_rx,
            tx,
            Debouncer::new(Lexicon::builtin(), Duration::from_millis(1500), t0),
            VoiceStateMachine::new(Duration::from_millis(1500), t0),
            state.clone(),
        )
        .unwrap();

        assert!(rx.drain().next().is_none());
        assert_eq!(state.voice_state(), VoiceState::Idle);
    }

    #[test]
    fn test_line_reader_routes_lines() {
        let state = RuntimeState::new();
        let (voice_tx, voice_rx) = flume::unbounded();
        let (tx, rx) = flume::unbounded();
        let input = Cursor::new("/start\ng 5 5\n十五|二十\ng nope\n");

        run_line_reader(input, voice_tx, tx, state).unwrap();

        let chunks: Vec<String> = voice_rx.drain().map(|c| c.text).collect();
        assert_eq!(chunks, vec!["十五", "二十"]);

        let inbound: Vec<Inbound> = rx.drain().collect();
        assert!(matches!(&inbound[0], Inbound::Slash(s) if s == "/start"));
        assert!(matches!(
            &inbound[1],
            Inbound::Gesture(GestureFrame { left: Some(5), right: Some(5), .. }, _)
        ));
        assert!(matches!(&inbound[2], Inbound::Invalid(msg) if msg.contains("nope")));
        assert!(matches!(inbound[3], Inbound::Closed("stdin")));
    }
}
