//! Reaction-time and outcome statistics over round records

use std::time::Duration;

use serde::Serialize;

use crate::arbiter::{Outcome, RoundRecord};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RoundStats {
    pub attempts: usize,
    pub wins: usize,
    pub losses: usize,
    pub ties: usize,
    pub auto_filled: usize,
    /// Reaction samples only cover rounds the player completed in time
    #[serde(skip)]
    pub reactions: Vec<Duration>,
}

impl RoundStats {
    pub fn from_records(records: &[RoundRecord]) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.record(record);
        }
        stats
    }

    pub fn record(&mut self, record: &RoundRecord) {
        self.attempts += 1;
        match record.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Lose => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
        if record.auto_filled {
            self.auto_filled += 1;
        } else {
            self.reactions.push(record.reaction);
        }
    }

    /// (avg, min, max) over player-completed rounds
    pub fn reaction(&self) -> Option<(Duration, Duration, Duration)> {
        if self.reactions.is_empty() {
            return None;
        }
        let total: Duration = self.reactions.iter().sum();
        let avg = total / self.reactions.len() as u32;
        let min = self.reactions.iter().min().copied().unwrap_or_default();
        let max = self.reactions.iter().max().copied().unwrap_or_default();
        Some((avg, min, max))
    }

    pub fn average_reaction_ms(&self) -> Option<u64> {
        self.reaction().map(|(avg, _, _)| avg.as_millis() as u64)
    }

    /// Win rate over decisive rounds
    pub fn win_rate(&self) -> Option<f64> {
        let decisive = self.wins + self.losses;
        if decisive == 0 {
            return None;
        }
        Some(self.wins as f64 / decisive as f64)
    }

    pub fn summary(&self) -> String {
        if self.attempts == 0 {
            return "No rounds played yet.\n".to_string();
        }

        let mut out = format!(
            "Rounds (n={}): wins={} losses={} ties={} auto={}\n",
            self.attempts, self.wins, self.losses, self.ties, self.auto_filled
        );
        if let Some(rate) = self.win_rate() {
            out.push_str(&format!("Win rate: {:.0}%\n", rate * 100.0));
        }
        if let Some((avg, min, max)) = self.reaction() {
            out.push_str(&format!(
                "Reaction (n={}): avg={}ms min={}ms max={}ms\n",
                self.reactions.len(),
                avg.as_millis(),
                min.as_millis(),
                max.as_millis()
            ));
        }
        out
    }
}
