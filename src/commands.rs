//! Keyboard slash commands - the UI side of the session lifecycle
//!
//! Lifecycle commands go to the session controller exactly like their spoken
//! counterparts. Everything else is handled against the shared runtime state.

use crate::lexicon::VoiceCommand;
use crate::state::SharedState;

/// Result of slash command processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Handled locally, optional message to show
    Handled(Option<String>),

    /// Forward to the session controller
    Session(VoiceCommand),

    /// Show round statistics (needs the controller)
    ShowStats,

    /// Show the session status line and what to do next
    ShowStatus,
}

/// Check if input is a slash command (keyboard input)
pub fn process_slash_command(input: &str, state: &SharedState) -> Option<CommandResult> {
    let cmd = input.trim().strip_prefix('/')?.to_lowercase();

    match cmd.as_str() {
        "start" => Some(CommandResult::Session(VoiceCommand::StartGame)),
        "end" => Some(CommandResult::Session(VoiceCommand::EndGame)),
        "exit" | "quit" => Some(CommandResult::Session(VoiceCommand::ExitGame)),
        "ready" | "next" => Some(CommandResult::Session(VoiceCommand::ReadyForRound)),
        "mute" | "mic" => {
            let muted = state.toggle_mic_mute();
            Some(CommandResult::Handled(Some(
                if muted { "Mic muted" } else { "Mic unmuted" }.to_string(),
            )))
        }
        "stats" => Some(CommandResult::ShowStats),
        "status" => Some(CommandResult::ShowStatus),
        "help" | "commands" => {
            let help = "\
Commands:
  /start - Start a new session
  /end - End the session, back to waiting
  /exit or /quit - Exit application
  /ready - Skip the pause between rounds
  /mute - Toggle voice input
  /stats - Show round statistics
  /status - Show current status
  /help - Show this help

Input lines:
  g <left|-> <right|-> [confidence] - Gesture frame, e.g. 'g 5 5 0.93'
  anything else - Voice text, '|' splits streaming chunks

Voice:
  开始游戏 / 结束游戏 / 退出游戏 - Start / end / exit
  十五二十 - Ready for the next round
  零 五 - Hand total, 十五 二十 - Call the total"
                .to_string();
            Some(CommandResult::Handled(Some(help)))
        }
        _ => Some(CommandResult::Handled(Some(format!(
            "Unknown command '/{}', try /help",
            cmd
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RuntimeState;

    #[test]
    fn test_lifecycle_commands() {
        let state = RuntimeState::new();
        assert_eq!(
            process_slash_command("/start", &state),
            Some(CommandResult::Session(VoiceCommand::StartGame))
        );
        assert_eq!(
            process_slash_command(" /END ", &state),
            Some(CommandResult::Session(VoiceCommand::EndGame))
        );
        assert_eq!(
            process_slash_command("/quit", &state),
            Some(CommandResult::Session(VoiceCommand::ExitGame))
        );
    }

    #[test]
    fn test_slash_commands() {
        let state = RuntimeState::new();

        let result = process_slash_command("/mute", &state);
        assert_eq!(
            result,
            Some(CommandResult::Handled(Some("Mic muted".to_string())))
        );
        assert!(state.is_muted());

        assert_eq!(
            process_slash_command("/status", &state),
            Some(CommandResult::ShowStatus)
        );

        assert_eq!(
            process_slash_command("/stats", &state),
            Some(CommandResult::ShowStats)
        );

        let result = process_slash_command("not a command", &state);
        assert!(result.is_none());
    }

    #[test]
    fn test_unknown_slash_command() {
        let state = RuntimeState::new();
        let result = process_slash_command("/dance", &state);
        assert!(matches!(result, Some(CommandResult::Handled(Some(msg))) if msg.contains("/dance")));
    }
}
