//! REPL input parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Print the session's emotional state.
    State,
    /// Run one recovery tick.
    Breathe,
    /// Print how many turns are in history.
    History,
    Help,
    Quit,
    Message(String),
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let Some(command) = trimmed.strip_prefix('/') else {
            return Self::Message(trimmed.to_string());
        };
        match command.to_lowercase().as_str() {
            "state" => Self::State,
            "breathe" => Self::Breathe,
            "history" => Self::History,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

pub const HELP: &str = "\
/state     show the current emotional state
/breathe   take a recovery breath
/history   show how many turns are remembered
/quit      leave";
