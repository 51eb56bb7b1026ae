//! Terminal renderer - the UI collaborator
//!
//! `Ui` is a cheap cloneable handle; the `Renderer` owns stdout and draws
//! events as they arrive on the channel.

use std::io::Write;

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};

use crate::arbiter::{Outcome, RoundRecord};
use crate::session::{Phase, SessionEvent, SessionReport, SessionSnapshot};

#[derive(Clone, Debug)]
pub enum UiEvent {
    Session(SessionEvent),
    Status(String),
    Message(String),
    Warning(String),
}

#[derive(Clone)]
pub struct Ui {
    tx: flume::Sender<UiEvent>,
}

impl Ui {
    pub fn new() -> (Self, flume::Receiver<UiEvent>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }

    pub fn session(&self, event: SessionEvent) {
        let _ = self.tx.send(UiEvent::Session(event));
    }

    pub fn status(&self, snapshot: &SessionSnapshot, time_left_secs: Option<u64>) {
        let _ = self
            .tx
            .send(UiEvent::Status(status_line(snapshot, time_left_secs)));
    }

    pub fn message(&self, text: impl Into<String>) {
        let _ = self.tx.send(UiEvent::Message(text.into()));
    }

    pub fn warn(&self, text: impl Into<String>) {
        let _ = self.tx.send(UiEvent::Warning(text.into()));
    }
}

/// One-line summary of the session for the status bar
pub fn status_line(snapshot: &SessionSnapshot, time_left_secs: Option<u64>) -> String {
    let mut line = format!(
        "[{} {}/{} | W{} L{} T{} | voice: {}",
        snapshot.phase,
        snapshot.valid_round_count,
        snapshot.quota,
        snapshot.wins,
        snapshot.losses,
        snapshot.ties,
        snapshot.voice_state
    );
    if let Some(pending) = &snapshot.pending {
        let show = |v: Option<u8>| v.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
        line.push_str(&format!(
            " | hands {} call {}",
            show(pending.hands),
            show(pending.target)
        ));
    }
    if let Some(secs) = time_left_secs {
        line.push_str(&format!(" | {}s", secs));
    }
    line.push(']');
    line
}

fn outcome_color(outcome: Outcome) -> Color {
    match outcome {
        Outcome::Win => Color::Green,
        Outcome::Lose => Color::Red,
        Outcome::Tie => Color::Yellow,
    }
}

pub struct Renderer<W: Write> {
    out: W,
    last_status: String,
    quota: u32,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, quota: u32) -> Self {
        Self {
            out,
            last_status: String::new(),
            quota,
        }
    }

    pub fn handle(&mut self, event: UiEvent) -> std::io::Result<()> {
        match event {
            UiEvent::Session(event) => self.render_session(event)?,
            UiEvent::Status(status) => {
                if status == self.last_status {
                    return Ok(());
                }
                queue!(
                    self.out,
                    SetForegroundColor(Color::DarkGrey),
                    Print(&status),
                    ResetColor,
                    Print("\n")
                )?;
                self.last_status = status;
            }
            UiEvent::Message(text) => queue!(self.out, Print(text), Print("\n"))?,
            UiEvent::Warning(text) => queue!(
                self.out,
                SetForegroundColor(Color::Yellow),
                Print(text),
                ResetColor,
                Print("\n")
            )?,
        }
        self.out.flush()
    }

    fn render_session(&mut self, event: SessionEvent) -> std::io::Result<()> {
        match event {
            SessionEvent::Started => queue!(
                self.out,
                SetAttribute(Attribute::Bold),
                Print(format!(
                    "Game on! First {} decisive rounds. Get ready...\n",
                    self.quota
                )),
                SetAttribute(Attribute::Reset)
            ),
            SessionEvent::RoundOpened { attempt } => {
                queue!(
                    self.out,
                    Print(format!(
                        "Round {}: show your hands and call 十五 or 二十\n",
                        attempt
                    ))
                )
            }
            SessionEvent::Arbitrated(record) => self.render_record(&record),
            SessionEvent::Complete(report) => self.render_report(&report),
            SessionEvent::Reset => queue!(
                self.out,
                Print("Session ended. Say 开始游戏 or type /start to play again.\n")
            ),
            SessionEvent::Exit => queue!(self.out, Print("Bye!\n")),
        }
    }

    fn render_record(&mut self, record: &RoundRecord) -> std::io::Result<()> {
        let note = match record.outcome {
            Outcome::Win => "you win",
            Outcome::Lose => "machine wins",
            Outcome::Tie => "no winner, again",
        };
        queue!(
            self.out,
            SetForegroundColor(outcome_color(record.outcome)),
            Print(format!("{} -> {}\n", record, note)),
            ResetColor
        )
    }

    fn render_report(&mut self, report: &SessionReport) -> std::io::Result<()> {
        let reaction = report
            .average_reaction_ms
            .map(|ms| format!("{}ms", ms))
            .unwrap_or_else(|| "-".to_string());
        queue!(
            self.out,
            SetAttribute(Attribute::Bold),
            Print(format!(
                "Session complete: {} wins, {} losses, {} ties over {} attempts (avg reaction {})\n",
                report.wins, report.losses, report.ties, report.attempts, reaction
            )),
            SetAttribute(Attribute::Reset),
            Print("Type /start for another session or /exit to quit.\n")
        )
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Phase-specific hint shown after slash status
pub fn phase_hint(phase: Phase) -> &'static str {
    match phase {
        Phase::WaitingStart => "Say 开始游戏 or type /start",
        Phase::Preparing => "Get ready... say 十五二十 or type /ready to begin now",
        Phase::RoundInProgress => "Show your hands (g L R) and call 十五 or 二十",
        Phase::RoundResolved => "Say 十五二十 or type /ready for the next round",
        Phase::Complete => "Type /start for a new session",
    }
}
