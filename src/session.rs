//! Game session controller - owns the session state machine and reacts to fused input
//!
//! Phases:
//! WaitingStart -> Preparing -> RoundInProgress -> RoundResolved -> (RoundInProgress | Complete)
//!
//! EndGame resets from any phase, ExitGame asks the runtime to terminate. Both
//! discard whatever round was in flight.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::arbiter::{Dealer, Outcome, RoundInput, RoundRecord, arbitrate};
use crate::config::SessionConfig;
use crate::error::GameResult;
use crate::fusion::PlayerInput;
use crate::lexicon::VoiceCommand;
use crate::stats::RoundStats;
use crate::voice_state::VoiceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum Phase {
    WaitingStart = 0,
    RoundInProgress = 1,
    RoundResolved = 2,
    Complete = 3,
    Preparing = 4,
}

impl From<u8> for Phase {
    fn from(v: u8) -> Self {
        match v {
            1 => Phase::RoundInProgress,
            2 => Phase::RoundResolved,
            3 => Phase::Complete,
            4 => Phase::Preparing,
            _ => Phase::WaitingStart,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::WaitingStart => write!(f, "Waiting"),
            Phase::RoundInProgress => write!(f, "Playing"),
            Phase::RoundResolved => write!(f, "Resolved"),
            Phase::Complete => write!(f, "Complete"),
            Phase::Preparing => write!(f, "Preparing"),
        }
    }
}

/// Session tallies. Ties are recorded but never counted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GameSession {
    pub valid_round_count: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub records: Vec<RoundRecord>,
}

impl GameSession {
    fn attempts(&self) -> u32 {
        self.records.len() as u32
    }

    fn apply(&mut self, record: RoundRecord) {
        match record.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Lose => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
        if record.counts_toward_session {
            self.valid_round_count += 1;
        }
        self.records.push(record);
    }
}

/// Player input collected for the round currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingRound {
    #[serde(skip)]
    pub started: Instant,
    pub hands: Option<u8>,
    pub target: Option<u8>,
    /// When the last missing piece arrived
    #[serde(skip)]
    pub completed_at: Option<Instant>,
}

impl PendingRound {
    fn open(now: Instant) -> Self {
        Self {
            started: now,
            hands: None,
            target: None,
            completed_at: None,
        }
    }

    fn update(&mut self, hands: Option<u8>, target: Option<u8>, now: Instant) {
        if hands.is_some() {
            self.hands = hands;
        }
        if target.is_some() {
            self.target = target;
        }
        if self.completed_at.is_none() && self.is_complete() {
            self.completed_at = Some(now);
        }
    }

    fn is_complete(&self) -> bool {
        self.hands.is_some() && self.target.is_some()
    }
}

/// Emitted by the controller for the UI and the runtime
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    RoundOpened { attempt: u32 },
    Arbitrated(RoundRecord),
    Complete(SessionReport),
    Reset,
    Exit,
}

/// End-of-session summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub generated_at: DateTime<Local>,
    pub valid_rounds: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub attempts: u32,
    pub average_reaction_ms: Option<u64>,
    pub records: Vec<RoundRecord>,
}

impl SessionReport {
    pub fn write_json(&self, path: &Path) -> GameResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Read-only view handed to the UI
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub valid_round_count: u32,
    pub quota: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub pending: Option<PendingRound>,
    pub latest: Option<RoundRecord>,
    pub recent: Vec<RoundRecord>,
    pub voice_state: VoiceState,
}

pub struct SessionController<D: Dealer> {
    phase: Phase,
    session: GameSession,
    pending: Option<PendingRound>,
    /// Start of the preparation countdown or the resolve pause
    paused_at: Option<Instant>,
    dealer: D,
    config: SessionConfig,
}

impl<D: Dealer> SessionController<D> {
    pub fn new(dealer: D, config: SessionConfig) -> Self {
        Self {
            phase: Phase::WaitingStart,
            session: GameSession::default(),
            pending: None,
            paused_at: None,
            dealer,
            config,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn pending(&self) -> Option<&PendingRound> {
        self.pending.as_ref()
    }

    /// React to one fused input
    #[instrument(skip(self, now), fields(phase = %self.phase))]
    pub fn handle(&mut self, input: PlayerInput, now: Instant) -> Vec<SessionEvent> {
        match input {
            PlayerInput::Command(command) => self.handle_command(command, now),
            PlayerInput::Round { digit, target } => {
                if self.phase != Phase::RoundInProgress {
                    debug!("Ignoring round input outside a round");
                    return Vec::new();
                }
                if let Some(pending) = self.pending.as_mut() {
                    pending.update(digit.map(|d| d.value), target, now);
                }
                self.try_arbitrate(now)
            }
        }
    }

    fn handle_command(&mut self, command: VoiceCommand, now: Instant) -> Vec<SessionEvent> {
        match command {
            VoiceCommand::ExitGame => {
                info!("Exit requested");
                self.pending = None;
                self.paused_at = None;
                vec![SessionEvent::Exit]
            }
            VoiceCommand::EndGame => {
                info!(
                    valid_rounds = self.session.valid_round_count,
                    "Session ended, back to waiting"
                );
                self.reset();
                vec![SessionEvent::Reset]
            }
            VoiceCommand::StartGame => match self.phase {
                Phase::WaitingStart | Phase::Complete => {
                    self.reset();
                    info!(quota = self.config.valid_rounds, "Session started");
                    let mut events = vec![SessionEvent::Started];
                    if self.config.prepare().is_zero() {
                        events.push(self.open_round(now));
                    } else {
                        self.phase = Phase::Preparing;
                        self.paused_at = Some(now);
                    }
                    events
                }
                _ => {
                    debug!("Session already running, ignoring start");
                    Vec::new()
                }
            },
            VoiceCommand::ReadyForRound => {
                if matches!(self.phase, Phase::Preparing | Phase::RoundResolved) {
                    vec![self.open_round(now)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Timer-driven progress: preparation, stillness, round timeout, resolve pause
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        match self.phase {
            Phase::RoundInProgress => self.try_arbitrate(now),
            Phase::Preparing => self.open_after(self.config.prepare(), now),
            Phase::RoundResolved => self.open_after(self.config.resolve_pause(), now),
            Phase::WaitingStart | Phase::Complete => Vec::new(),
        }
    }

    fn open_after(&mut self, pause: Duration, now: Instant) -> Vec<SessionEvent> {
        let paused = self
            .paused_at
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or_default();
        if paused >= pause {
            vec![self.open_round(now)]
        } else {
            Vec::new()
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::WaitingStart;
        self.session = GameSession::default();
        self.pending = None;
        self.paused_at = None;
    }

    fn open_round(&mut self, now: Instant) -> SessionEvent {
        self.phase = Phase::RoundInProgress;
        self.pending = Some(PendingRound::open(now));
        self.paused_at = None;
        SessionEvent::RoundOpened {
            attempt: self.session.attempts() + 1,
        }
    }

    fn try_arbitrate(&mut self, now: Instant) -> Vec<SessionEvent> {
        let Some(mut pending) = self.pending else {
            return Vec::new();
        };

        let open_for = now.saturating_duration_since(pending.started);
        if open_for < self.config.stillness() {
            return Vec::new();
        }

        let timed_out = open_for >= self.config.round_timeout();
        if !pending.is_complete() && !timed_out {
            return Vec::new();
        }

        let auto_filled = !pending.is_complete();
        let player_digit = match pending.hands {
            Some(hands) => hands,
            None => self.dealer.fallback_digit(),
        };
        let target = match pending.target {
            Some(target) => target,
            None => self.dealer.fallback_target(),
        };
        pending.hands = Some(player_digit);
        pending.target = Some(target);

        let reaction = if auto_filled {
            open_for
        } else {
            pending
                .completed_at
                .map(|at| at.saturating_duration_since(pending.started))
                .unwrap_or(open_for)
        };

        let input = RoundInput {
            player_digit,
            machine_digit: self.dealer.machine_digit(),
            target,
        };
        let record = arbitrate(self.session.attempts() + 1, input, reaction, auto_filled);
        info!(%record, "Round arbitrated");
        self.settle(record, now)
    }

    fn settle(&mut self, record: RoundRecord, now: Instant) -> Vec<SessionEvent> {
        let decisive = record.counts_toward_session;
        self.session.apply(record.clone());
        let mut events = vec![SessionEvent::Arbitrated(record)];

        if !decisive {
            // Tie: pair discarded, same round re-solicited
            events.push(self.open_round(now));
            return events;
        }

        if self.session.valid_round_count >= self.config.valid_rounds {
            self.phase = Phase::Complete;
            self.pending = None;
            let report = self.report();
            info!(
                wins = report.wins,
                losses = report.losses,
                ties = report.ties,
                "Session complete"
            );
            events.push(SessionEvent::Complete(report));
        } else {
            self.phase = Phase::RoundResolved;
            self.pending = None;
            self.paused_at = Some(now);
        }
        events
    }

    pub fn stats(&self) -> RoundStats {
        RoundStats::from_records(&self.session.records)
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            generated_at: Local::now(),
            valid_rounds: self.session.valid_round_count,
            wins: self.session.wins,
            losses: self.session.losses,
            ties: self.session.ties,
            attempts: self.session.attempts(),
            average_reaction_ms: self.stats().average_reaction_ms(),
            records: self.session.records.clone(),
        }
    }

    pub fn snapshot(&self, voice_state: VoiceState) -> SessionSnapshot {
        let records = &self.session.records;
        let keep = self.config.recent_records.min(records.len());
        SessionSnapshot {
            phase: self.phase,
            valid_round_count: self.session.valid_round_count,
            quota: self.config.valid_rounds,
            wins: self.session.wins,
            losses: self.session.losses,
            ties: self.session.ties,
            pending: self.pending,
            latest: records.last().cloned(),
            recent: records[records.len() - keep..].to_vec(),
            voice_state,
        }
    }

    /// Time left before the open round is auto-filled
    pub fn round_time_left(&self, now: Instant) -> Option<Duration> {
        if self.phase != Phase::RoundInProgress {
            return None;
        }
        self.pending.map(|p| {
            self.config
                .round_timeout()
                .saturating_sub(now.saturating_duration_since(p.started))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{PlayerDigit, Source};
    use std::collections::VecDeque;

    /// Dealer that plays back fixed machine digits
    struct Scripted {
        machine: VecDeque<u8>,
    }

    impl Scripted {
        fn new(machine: &[u8]) -> Self {
            Self {
                machine: machine.iter().copied().collect(),
            }
        }
    }

    impl Dealer for Scripted {
        fn machine_digit(&mut self) -> u8 {
            self.machine.pop_front().unwrap_or(5)
        }

        fn fallback_digit(&mut self) -> u8 {
            10
        }

        fn fallback_target(&mut self) -> u8 {
            15
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Controller that opens the first round as soon as the session starts
    fn controller(machine: &[u8]) -> SessionController<Scripted> {
        let config = SessionConfig {
            prepare_ms: 0,
            ..SessionConfig::default()
        };
        SessionController::new(Scripted::new(machine), config)
    }

    fn round(hands: u8, target: u8) -> PlayerInput {
        PlayerInput::Round {
            digit: Some(PlayerDigit {
                value: hands,
                source: Source::Gesture,
            }),
            target: Some(target),
        }
    }

    fn start(c: &mut SessionController<Scripted>, now: Instant) {
        let events = c.handle(PlayerInput::Command(VoiceCommand::StartGame), now);
        assert_eq!(
            events,
            vec![
                SessionEvent::Started,
                SessionEvent::RoundOpened { attempt: 1 }
            ]
        );
    }

    fn arbitrated(events: &[SessionEvent]) -> Option<&RoundRecord> {
        events.iter().find_map(|e| match e {
            SessionEvent::Arbitrated(r) => Some(r),
            _ => None,
        })
    }

    #[test]
    fn test_waiting_ignores_round_input() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        assert!(c.handle(round(10, 15), t0).is_empty());
        assert!(c.handle(PlayerInput::Command(VoiceCommand::ReadyForRound), t0).is_empty());
        assert_eq!(c.phase(), Phase::WaitingStart);
    }

    #[test]
    fn test_stillness_delays_arbitration() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        start(&mut c, t0);

        assert!(c.handle(round(10, 15), t0 + ms(300)).is_empty());
        assert!(c.tick(t0 + ms(999)).is_empty());

        let events = c.tick(t0 + ms(1000));
        let record = arbitrated(&events).unwrap();
        assert_eq!(record.outcome, Outcome::Win);
        assert_eq!(record.reaction, ms(300));
        assert!(!record.auto_filled);
        assert_eq!(c.phase(), Phase::RoundResolved);
        assert_eq!(c.session().valid_round_count, 1);
    }

    #[test]
    fn test_repeated_frames_keep_reaction_time() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        start(&mut c, t0);

        assert!(c.handle(round(10, 15), t0 + ms(300)).is_empty());
        let hands_only = PlayerInput::Round {
            digit: Some(PlayerDigit {
                value: 10,
                source: Source::Gesture,
            }),
            target: None,
        };
        for at in (400..1000).step_by(100) {
            assert!(c.handle(hands_only, t0 + ms(at)).is_empty());
        }

        let events = c.tick(t0 + ms(1000));
        let record = arbitrated(&events).unwrap();
        assert_eq!(record.reaction, ms(300));
        assert_eq!(c.stats().average_reaction_ms(), Some(300));
    }

    #[test]
    fn test_preparation_before_first_round() {
        let t0 = Instant::now();
        let mut c = SessionController::new(Scripted::new(&[5]), SessionConfig::default());

        assert_eq!(
            c.handle(PlayerInput::Command(VoiceCommand::StartGame), t0),
            vec![SessionEvent::Started]
        );
        assert_eq!(c.phase(), Phase::Preparing);
        assert!(c.pending().is_none());

        // Round input during the countdown is ignored
        assert!(c.handle(round(10, 15), t0 + ms(1500)).is_empty());
        assert!(
            c.handle(PlayerInput::Command(VoiceCommand::StartGame), t0 + ms(1600))
                .is_empty()
        );
        assert!(c.tick(t0 + ms(2999)).is_empty());
        assert_eq!(
            c.tick(t0 + ms(3000)),
            vec![SessionEvent::RoundOpened { attempt: 1 }]
        );
        assert_eq!(c.phase(), Phase::RoundInProgress);
        assert_eq!(c.pending().unwrap().hands, None);

        // Reaction counts from the round opening, not the session start
        c.handle(round(10, 15), t0 + ms(3200));
        let events = c.tick(t0 + ms(4000));
        assert_eq!(arbitrated(&events).unwrap().reaction, ms(200));
    }

    #[test]
    fn test_ready_skips_preparation() {
        let t0 = Instant::now();
        let mut c = SessionController::new(Scripted::new(&[5]), SessionConfig::default());
        c.handle(PlayerInput::Command(VoiceCommand::StartGame), t0);
        assert_eq!(
            c.handle(PlayerInput::Command(VoiceCommand::ReadyForRound), t0 + ms(100)),
            vec![SessionEvent::RoundOpened { attempt: 1 }]
        );
        assert_eq!(c.phase(), Phase::RoundInProgress);
    }

    #[test]
    fn test_end_during_preparation() {
        let t0 = Instant::now();
        let mut c = SessionController::new(Scripted::new(&[5]), SessionConfig::default());
        c.handle(PlayerInput::Command(VoiceCommand::StartGame), t0);
        c.handle(PlayerInput::Command(VoiceCommand::EndGame), t0 + ms(500));
        assert_eq!(c.phase(), Phase::WaitingStart);
        assert!(c.tick(t0 + ms(5000)).is_empty());
    }

    #[test]
    fn test_tie_recorded_not_counted() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        start(&mut c, t0);

        let events = c.handle(round(5, 15), t0 + ms(1200));
        let record = arbitrated(&events).unwrap();
        assert_eq!(record.total, 10);
        assert_eq!(record.outcome, Outcome::Tie);
        assert!(events.contains(&SessionEvent::RoundOpened { attempt: 2 }));

        assert_eq!(c.phase(), Phase::RoundInProgress);
        assert_eq!(c.session().valid_round_count, 0);
        assert_eq!(c.session().ties, 1);
        // Pair discarded
        let pending = c.pending().unwrap();
        assert_eq!(pending.hands, None);
        assert_eq!(pending.target, None);
    }

    #[test]
    fn test_wrong_call_loses() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        start(&mut c, t0);
        let events = c.handle(round(10, 20), t0 + ms(1500));
        assert_eq!(arbitrated(&events).unwrap().outcome, Outcome::Lose);
        assert_eq!(c.session().losses, 1);
        assert_eq!(c.session().valid_round_count, 1);
    }

    #[test]
    fn test_input_pieces_merge_across_cycles() {
        let t0 = Instant::now();
        let mut c = controller(&[10]);
        start(&mut c, t0);

        let hands_only = PlayerInput::Round {
            digit: Some(PlayerDigit {
                value: 10,
                source: Source::Gesture,
            }),
            target: None,
        };
        let target_only = PlayerInput::Round {
            digit: None,
            target: Some(20),
        };
        assert!(c.handle(hands_only, t0 + ms(1100)).is_empty());
        let events = c.handle(target_only, t0 + ms(1400));
        let record = arbitrated(&events).unwrap();
        assert_eq!(record.outcome, Outcome::Win);
        assert_eq!(record.reaction, ms(1400));
    }

    #[test]
    fn test_round_timeout_auto_fills() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        start(&mut c, t0);

        assert!(c.tick(t0 + ms(14_999)).is_empty());
        let events = c.tick(t0 + ms(15_000));
        let record = arbitrated(&events).unwrap();
        assert!(record.auto_filled);
        assert_eq!(record.player_digit, 10);
        assert_eq!(record.target, 15);
        assert_eq!(record.outcome, Outcome::Win);
        assert!(c.stats().reaction().is_none());
    }

    #[test]
    fn test_resolve_pause_and_ready_skip() {
        let t0 = Instant::now();
        let mut c = controller(&[5, 5]);
        start(&mut c, t0);
        c.handle(round(10, 15), t0 + ms(1000));
        assert_eq!(c.phase(), Phase::RoundResolved);

        // Input during the pause is ignored
        assert!(c.handle(round(10, 15), t0 + ms(1100)).is_empty());
        assert!(c.tick(t0 + ms(2999)).is_empty());
        assert_eq!(
            c.tick(t0 + ms(3000)),
            vec![SessionEvent::RoundOpened { attempt: 2 }]
        );

        c.handle(round(10, 15), t0 + ms(4000));
        assert_eq!(c.phase(), Phase::RoundResolved);
        assert_eq!(
            c.handle(PlayerInput::Command(VoiceCommand::ReadyForRound), t0 + ms(4100)),
            vec![SessionEvent::RoundOpened { attempt: 3 }]
        );
        assert_eq!(c.phase(), Phase::RoundInProgress);
    }

    #[test]
    fn test_complete_after_quota() {
        let t0 = Instant::now();
        let mut c = controller(&[5, 5, 5, 5, 5, 5]);
        start(&mut c, t0);

        let mut now = t0;
        let mut complete = None;
        for i in 0..5 {
            now += ms(1000);
            let events = c.handle(round(10, 15), now);
            assert!(arbitrated(&events).is_some(), "round {}", i);
            complete = events.into_iter().find_map(|e| match e {
                SessionEvent::Complete(report) => Some(report),
                _ => None,
            });
            if i < 4 {
                assert!(complete.is_none());
                c.handle(PlayerInput::Command(VoiceCommand::ReadyForRound), now);
            }
        }

        let report = complete.unwrap();
        assert_eq!(report.valid_rounds, 5);
        assert_eq!(report.wins, 5);
        assert_eq!(report.average_reaction_ms, Some(1000));
        assert_eq!(c.phase(), Phase::Complete);
        assert!(c.tick(now + ms(10_000)).is_empty());

        // Complete accepts a fresh start
        let events = c.handle(PlayerInput::Command(VoiceCommand::StartGame), now);
        assert!(events.contains(&SessionEvent::Started));
        assert_eq!(c.session().valid_round_count, 0);
    }

    #[test]
    fn test_end_mid_round_discards() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        start(&mut c, t0);
        c.handle(
            PlayerInput::Round {
                digit: None,
                target: Some(15),
            },
            t0 + ms(200),
        );

        assert_eq!(
            c.handle(PlayerInput::Command(VoiceCommand::EndGame), t0 + ms(300)),
            vec![SessionEvent::Reset]
        );
        assert_eq!(c.phase(), Phase::WaitingStart);
        assert!(c.pending().is_none());
        assert!(c.tick(t0 + ms(20_000)).is_empty());
    }

    #[test]
    fn test_exit_from_any_phase() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        assert_eq!(
            c.handle(PlayerInput::Command(VoiceCommand::ExitGame), t0),
            vec![SessionEvent::Exit]
        );

        start(&mut c, t0);
        assert_eq!(
            c.handle(PlayerInput::Command(VoiceCommand::ExitGame), t0),
            vec![SessionEvent::Exit]
        );
        assert!(c.pending().is_none());
    }

    #[test]
    fn test_start_ignored_mid_session() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        start(&mut c, t0);
        assert!(
            c.handle(PlayerInput::Command(VoiceCommand::StartGame), t0 + ms(10))
                .is_empty()
        );
    }

    #[test]
    fn test_report_written_as_json() {
        let t0 = Instant::now();
        let mut c = controller(&[5]);
        start(&mut c, t0);
        c.handle(round(10, 20), t0 + ms(1000));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        c.report().write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["losses"], 1);
        assert_eq!(value["records"][0]["outcome"], "Lose");
        assert_eq!(value["records"][0]["reaction"], 1000);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_snapshot_keeps_recent_records() {
        let t0 = Instant::now();
        let mut c = controller(&[0, 0, 0, 0, 5]);
        start(&mut c, t0);
        let mut now = t0;
        for _ in 0..4 {
            now += ms(1000);
            c.handle(round(5, 15), now);
        }
        let snapshot = c.snapshot(VoiceState::Listening);
        assert_eq!(snapshot.ties, 4);
        assert_eq!(snapshot.recent.len(), 3);
        assert_eq!(snapshot.recent[0].round_index, 2);
        assert_eq!(snapshot.latest.as_ref().unwrap().round_index, 4);
        assert_eq!(snapshot.voice_state, VoiceState::Listening);
        assert_eq!(snapshot.quota, 5);
    }
}
