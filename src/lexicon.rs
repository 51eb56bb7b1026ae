//! Lexical normalizer - cleans transcribed text and maps it onto game keywords
//!
//! Keywords live in two ordered tables, commands before numbers. Matching is
//! substring containment against the accumulated history, first declared
//! pattern wins. Containment tolerates streaming recognizers that re-emit and
//! extend partial text ("十五" growing into "十五二十").

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

use crate::config::VocabularyConfig;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Numbers a voice match may carry
pub const VOICE_NUMBERS: [u8; 4] = [0, 5, 15, 20];

/// Lifecycle commands recognized from speech or issued by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoiceCommand {
    StartGame,
    EndGame,
    ExitGame,
    /// "十五二十" - the round call, skips the pause between rounds
    ReadyForRound,
}

impl fmt::Display for VoiceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceCommand::StartGame => write!(f, "start game"),
            VoiceCommand::EndGame => write!(f, "end game"),
            VoiceCommand::ExitGame => write!(f, "exit game"),
            VoiceCommand::ReadyForRound => write!(f, "ready"),
        }
    }
}

impl FromStr for VoiceCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" | "start_game" => Ok(VoiceCommand::StartGame),
            "end" | "end_game" => Ok(VoiceCommand::EndGame),
            "exit" | "exit_game" | "quit" => Ok(VoiceCommand::ExitGame),
            "ready" | "ready_for_round" => Ok(VoiceCommand::ReadyForRound),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// Result of matching accumulated voice text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceMatch {
    NoMatch,
    Command(VoiceCommand),
    Number(u8),
}

impl VoiceMatch {
    /// Any match consumes the utterance that produced it
    pub fn should_clear_history(&self) -> bool {
        !matches!(self, VoiceMatch::NoMatch)
    }

    pub fn is_match(&self) -> bool {
        self.should_clear_history()
    }
}

/// Normalize raw transcribed text for matching: NFKC fold, lowercase,
/// drop non-word characters, collapse whitespace
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();
    let stripped = NON_WORD.replace_all(&folded, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Ordered keyword tables
#[derive(Debug, Clone)]
pub struct Lexicon {
    commands: Vec<(String, VoiceCommand)>,
    numbers: Vec<(String, u8)>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Lexicon {
    pub fn builtin() -> Self {
        let commands = [
            ("开始游戏", VoiceCommand::StartGame),
            ("结束游戏", VoiceCommand::EndGame),
            ("退出游戏", VoiceCommand::ExitGame),
            ("十五二十", VoiceCommand::ReadyForRound),
        ];

        // Longer numerals come before the numerals they contain
        let numbers = [
            ("十五", 15),
            ("一五", 15),
            ("15", 15),
            ("二十", 20),
            ("20", 20),
            ("五", 5),
            ("5", 5),
            ("零", 0),
            ("〇", 0),
            ("0", 0),
        ];

        Self {
            commands: commands
                .iter()
                .map(|(p, c)| (normalize(p), *c))
                .collect(),
            numbers: numbers.iter().map(|(p, n)| (normalize(p), *n)).collect(),
        }
    }

    /// Built-in tables extended with configured phrases
    pub fn from_config(vocabulary: &VocabularyConfig) -> Self {
        let mut lexicon = Self::builtin();

        for entry in &vocabulary.commands {
            match entry.command.parse::<VoiceCommand>() {
                Ok(command) => lexicon.push_command(&entry.phrase, command),
                Err(e) => warn!(phrase = %entry.phrase, "Skipping vocabulary command: {}", e),
            }
        }

        for entry in &vocabulary.numbers {
            if VOICE_NUMBERS.contains(&entry.value) {
                lexicon.push_number(&entry.phrase, entry.value);
            } else {
                warn!(
                    phrase = %entry.phrase,
                    value = entry.value,
                    "Skipping vocabulary number outside {:?}",
                    VOICE_NUMBERS
                );
            }
        }

        lexicon
    }

    fn push_command(&mut self, phrase: &str, command: VoiceCommand) {
        let pattern = normalize(phrase);
        if !pattern.is_empty() {
            self.commands.push((pattern, command));
        }
    }

    fn push_number(&mut self, phrase: &str, value: u8) {
        let pattern = normalize(phrase);
        if !pattern.is_empty() {
            self.numbers.push((pattern, value));
        }
    }

    /// Match already-normalized accumulated text, commands first
    pub fn lookup(&self, accumulated: &str) -> VoiceMatch {
        if accumulated.is_empty() {
            return VoiceMatch::NoMatch;
        }

        if let Some((_, command)) = self
            .commands
            .iter()
            .find(|(pattern, _)| accumulated.contains(pattern.as_str()))
        {
            return VoiceMatch::Command(*command);
        }

        if let Some((_, value)) = self
            .numbers
            .iter()
            .find(|(pattern, _)| accumulated.contains(pattern.as_str()))
        {
            return VoiceMatch::Number(*value);
        }

        VoiceMatch::NoMatch
    }

    pub fn commands(&self) -> &[(String, VoiceCommand)] {
        &self.commands
    }

    pub fn numbers(&self) -> &[(String, u8)] {
        &self.numbers
    }
}
