//! Chat command parsing

use crate::game::Team;

/// A recognized chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the prefix, or set it when an argument is given
    Prefix(Option<String>),
    Host,
    /// `None` when the team argument is missing or unknown
    Join(Option<Team>),
    /// Targets come from the message's mentions
    Block,
    Leave,
    Start,
    Cancel,
    Spymaster,
    Guess(String),
    EndTurn,
    Help,
}

impl Command {
    /// Parse `text` if it starts with `prefix`.
    ///
    /// The command name is case-insensitive; arguments are split on runs of
    /// whitespace. Unknown commands yield `None`.
    pub fn parse(text: &str, prefix: &str) -> Option<Command> {
        let rest = text.trim_start().strip_prefix(prefix)?;
        let mut args = rest.split_whitespace();
        let name = args.next()?.to_lowercase();
        let first = args.next();

        let command = match name.as_str() {
            "prefix" => Command::Prefix(first.map(str::to_string)),
            "host" => Command::Host,
            "join" => Command::Join(first.and_then(Team::parse)),
            "block" | "kick" => Command::Block,
            "leave" => Command::Leave,
            "start" => Command::Start,
            "cancel" => Command::Cancel,
            "spymaster" | "sm" => Command::Spymaster,
            "guess" | "g" => Command::Guess(first.unwrap_or_default().to_string()),
            "endturn" | "end" => Command::EndTurn,
            "help" | "h" => Command::Help,
            _ => return None,
        };
        Some(command)
    }
}

/// Reply to `help`.
pub fn help_text(prefix: &str) -> String {
    [
        ("host", "open a game in this channel"),
        ("join <blue|red>", "join or switch team"),
        ("leave", "leave your team"),
        ("spymaster (sm)", "become your team's spymaster"),
        ("block (kick) @name", "host only, bar members from this game"),
        ("start", "host only, deal the board"),
        ("cancel", "host only, end the game"),
        ("guess (g) <word>", "reveal a word"),
        ("endturn (end)", "pass the turn"),
        ("prefix [new]", "show or change the command prefix"),
    ]
    .iter()
    .map(|(usage, what)| format!("{}{} - {}", prefix, usage, what))
    .collect::<Vec<_>>()
    .join("\n")
}
