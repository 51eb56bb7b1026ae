//! Fusion-cycle driver - routes producer input into fusion and the session
//! controller, and reports progress to the UI
//!
//! Producers feed `on_inbound` as events arrive; the runtime calls `on_cycle`
//! once per fusion tick to close the cycle and advance session timers.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::arbiter::Dealer;
use crate::commands::{CommandResult, process_slash_command};
use crate::config::Config;
use crate::error::Rejection;
use crate::fusion::{FusionLayer, PlayerInput};
use crate::lexicon::VoiceCommand;
use crate::producer::Inbound;
use crate::render::{Ui, phase_hint, status_line};
use crate::session::{SessionController, SessionEvent, SessionReport};
use crate::state::SharedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A producer ran out of input
    Closed(&'static str),
    Exit,
}

/// Grace period between a producer closing and the loop stopping
#[derive(Debug, Clone, Copy)]
pub struct Drain {
    grace: Duration,
    deadline: Option<Instant>,
}

impl Drain {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            deadline: None,
        }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Start the countdown. Later closes keep the first deadline.
    pub fn start(&mut self, now: Instant) {
        self.deadline.get_or_insert(now + self.grace);
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

pub struct Game<D: Dealer> {
    fusion: FusionLayer,
    controller: SessionController<D>,
    state: SharedState,
    ui: Ui,
    last_report: Option<SessionReport>,
}

impl<D: Dealer> Game<D> {
    pub fn new(config: &Config, dealer: D, state: SharedState, ui: Ui) -> Self {
        Self {
            fusion: FusionLayer::new(config.gesture.min_confidence),
            controller: SessionController::new(dealer, config.session.clone()),
            state,
            ui,
            last_report: None,
        }
    }

    pub fn controller(&self) -> &SessionController<D> {
        &self.controller
    }

    pub fn on_inbound(&mut self, inbound: Inbound, now: Instant) -> Flow {
        match inbound {
            Inbound::Voice(event) => {
                // Rejections are logged by the fusion layer
                let _ = self.fusion.submit(event);
            }
            Inbound::Gesture(frame, at) => match self.fusion.submit_gesture(frame, at) {
                Ok(()) | Err(Rejection::LowConfidence(_)) => {}
                Err(rejection) => {
                    self.state.count_rejected_frame();
                    self.ui.warn(format!("Gesture ignored: {}", rejection));
                }
            },
            Inbound::Slash(text) => match process_slash_command(&text, &self.state) {
                Some(CommandResult::Session(command)) => return self.command(command, now),
                Some(CommandResult::Handled(Some(message))) => self.ui.message(message),
                Some(CommandResult::ShowStats) => {
                    self.ui.message(self.controller.stats().summary().trim_end())
                }
                Some(CommandResult::ShowStatus) => self.show_status(now),
                Some(CommandResult::Handled(None)) | None => {}
            },
            Inbound::Ui(command) => return self.command(command, now),
            Inbound::Invalid(message) => self.ui.warn(message),
            Inbound::Closed(source) => {
                info!(source, "Input closed");
                return Flow::Closed(source);
            }
        }
        Flow::Continue
    }

    /// Close the fusion cycle and advance session timers
    pub fn on_cycle(&mut self, now: Instant) -> Flow {
        if let Some(input) = self.fusion.resolve() {
            debug!(?input, "Fused input");
            if self.dispatch(input, now) == Flow::Exit {
                return Flow::Exit;
            }
        }

        let events = self.controller.tick(now);
        let flow = self.emit(events);
        self.publish();
        flow
    }

    pub fn report(&self) -> SessionReport {
        self.last_report
            .clone()
            .unwrap_or_else(|| self.controller.report())
    }

    /// UI lifecycle commands skip the fusion cycle
    fn command(&mut self, command: VoiceCommand, now: Instant) -> Flow {
        self.fusion.clear();
        let flow = self.dispatch(PlayerInput::Command(command), now);
        self.publish();
        flow
    }

    fn dispatch(&mut self, input: PlayerInput, now: Instant) -> Flow {
        let events = self.controller.handle(input, now);
        self.emit(events)
    }

    fn emit(&mut self, events: Vec<SessionEvent>) -> Flow {
        let mut flow = Flow::Continue;
        for event in events {
            match &event {
                SessionEvent::Exit => flow = Flow::Exit,
                SessionEvent::Complete(report) => self.last_report = Some(report.clone()),
                _ => {}
            }
            self.ui.session(event);
        }
        self.state.set_phase(self.controller.phase());
        flow
    }

    fn publish(&self) {
        let snapshot = self.controller.snapshot(self.state.voice_state());
        self.ui.status(&snapshot, None);
    }

    fn show_status(&self, now: Instant) {
        let snapshot = self.controller.snapshot(self.state.voice_state());
        let left = self.controller.round_time_left(now).map(|d| d.as_secs());
        let mic = if self.state.is_muted() { "muted" } else { "on" };
        self.ui
            .message(format!("{} mic: {}", status_line(&snapshot, left), mic));
        self.ui.message(phase_hint(snapshot.phase));
    }
}
