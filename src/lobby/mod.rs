//! Command dispatch and the per-channel session registry
//!
//! Handles:
//! - Parsing chat lines against the guild's prefix
//! - Creating, driving and retiring one game session per channel
//! - Host-only commands and command-message cleanup
//! - Ticking the clocks of started games

pub mod command;

pub use command::Command;

use crate::game::surface::{ChannelRenderer, WordSupply};
use crate::game::session::{GuessOutcome, StartOutcome};
use crate::game::GameSession;
use crate::hub::{ChannelOutlet, Hub, Incoming};
use crate::storage::{Storage, StorageError, DEFAULT_PREFIX};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct Lobby {
    guild: String,
    storage: Storage,
    supply: Box<dyn WordSupply>,
    sessions: HashMap<String, GameSession>,
}

impl Lobby {
    pub fn new(guild: impl Into<String>, storage: Storage, supply: Box<dyn WordSupply>) -> Self {
        Self {
            guild: guild.into(),
            storage,
            supply,
            sessions: HashMap::new(),
        }
    }

    /// The guild's prefix; falls back to the default if storage fails.
    pub fn prefix(&self) -> String {
        self.storage.guild_prefix(&self.guild).unwrap_or_else(|e| {
            warn!(error = %e, "could not read prefix");
            DEFAULT_PREFIX.to_string()
        })
    }

    /// Act on one chat line. Lines that are not commands are ignored.
    pub fn handle(&mut self, msg: &Incoming, now: Instant, hub: &mut Hub) {
        let prefix = self.prefix();
        let Some(cmd) = Command::parse(&msg.text, &prefix) else {
            return;
        };
        debug!(channel = %msg.channel, author = %msg.author.name, command = ?cmd, "command");

        let mut out = hub.outlet(&msg.channel);
        let author = &msg.author;

        match cmd {
            Command::Help => reply(&mut out, &command::help_text(&prefix)),
            Command::Prefix(None) => reply(&mut out, &format!("Current prefix: `{}`", prefix)),
            Command::Prefix(Some(new)) => match self.storage.set_guild_prefix(&self.guild, &new) {
                Ok(()) => {
                    info!(guild = %self.guild, prefix = %new, "prefix changed");
                    reply(&mut out, &format!("Prefix set to `{}`", new));
                }
                Err(StorageError::InvalidPrefix(_)) => {
                    reply(&mut out, "! A prefix cannot be blank or contain spaces.")
                }
                Err(e) => warn!(error = %e, "could not store prefix"),
            },
            Command::Host => {
                if self.sessions.contains_key(&msg.channel) {
                    out.delete(msg.handle);
                    return;
                }
                match GameSession::host(author.clone(), &mut out) {
                    Ok(session) => {
                        info!(channel = %msg.channel, host = %author.name, "session opened");
                        self.sessions.insert(msg.channel.clone(), session);
                    }
                    Err(e) => warn!(error = %e, "could not post game display"),
                }
            }
            Command::Join(team) => match self.sessions.get_mut(&msg.channel) {
                Some(session) => {
                    if let Some(team) = team {
                        session.add_player(author, team, &mut out);
                    }
                    out.delete(msg.handle);
                }
                None => reply(
                    &mut out,
                    &format!("! No game in this channel. Use `{}host` to open one.", prefix),
                ),
            },
            other => {
                let Some(session) = self.sessions.get_mut(&msg.channel) else {
                    return;
                };
                let is_host = session.is_host(author.id);
                let keep_command = other == Command::Cancel;
                let mut retire = false;

                match other {
                    Command::Block if is_host => session.block_players(&msg.mentions, &mut out),
                    Command::Leave => session.remove_player(author.id, &mut out),
                    Command::Start if is_host => {
                        match session.start(now, self.supply.as_mut(), &mut out) {
                            StartOutcome::Started => info!(
                                channel = %msg.channel,
                                host = %session.host_member().name,
                                "game started"
                            ),
                            StartOutcome::Unmet(unmet) => {
                                debug!(unmet = unmet.len(), "start refused")
                            }
                            StartOutcome::DeliveryFailed(e) => {
                                warn!(error = %e, "board delivery failed")
                            }
                            StartOutcome::WordsUnavailable(e) => {
                                warn!(error = %e, "no board drawn")
                            }
                            StartOutcome::AlreadyStarted => {}
                        }
                    }
                    Command::Cancel if is_host => {
                        session.cancel(&mut out);
                        retire = true;
                    }
                    Command::Spymaster => {
                        session.set_spymaster(author.id, &mut out);
                    }
                    Command::Guess(word) if session.is_started() => {
                        let outcome = session.guess(author.id, &word, &mut out);
                        if let GuessOutcome::Won { winner, .. } = outcome {
                            info!(channel = %msg.channel, winner = winner.label(), "game won");
                        }
                        retire = outcome.ended();
                    }
                    Command::EndTurn if session.is_started() => {
                        session.end_turn(author.id, &mut out);
                    }
                    _ => {}
                }

                if !keep_command {
                    out.delete(msg.handle);
                }
                if retire {
                    info!(channel = %msg.channel, winner = ?session.winner(), "session closed");
                    self.sessions.remove(&msg.channel);
                }
            }
        }
    }

    /// Fire every due turn clock.
    pub fn tick(&mut self, now: Instant, hub: &mut Hub) {
        for (channel, session) in self.sessions.iter_mut() {
            session.poll_clock(now, &mut hub.outlet(channel));
        }
    }

    /// How long the serve loop may sleep before a clock needs attention.
    pub fn until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.sessions.values().filter_map(|s| s.until_tick(now)).min()
    }
}

#[cfg(test)]
impl Lobby {
    pub fn guild(&self) -> &str {
        &self.guild
    }

    pub fn session(&self, channel: &str) -> Option<&GameSession> {
        self.sessions.get(channel)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

fn reply(out: &mut ChannelOutlet<'_>, text: &str) {
    if let Err(e) = out.send(text) {
        warn!(error = %e, "could not reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::clock::TICK;
    use crate::game::render::CANCELED_TEXT;
    use crate::game::testing::{init_logging, SequentialWords};
    use crate::game::session::Phase;
    use crate::game::{Color, Team};
    use crate::hub::fixtures::{addr, frames_for};
    use crate::hub::MAX_HISTORY;
    use crate::network::ServerFrame;

    struct Table {
        hub: Hub,
        lobby: Lobby,
        now: Instant,
    }

    const ANA: u16 = 1;
    const BEA: u16 = 2;
    const CY: u16 = 3;
    const DEE: u16 = 4;

    impl Table {
        fn new() -> Self {
            init_logging();
            let mut hub = Hub::new();
            for (n, name) in [(ANA, "ana"), (BEA, "bea"), (CY, "cy"), (DEE, "dee")] {
                hub.hello(addr(n), name, "general", true);
            }
            hub.drain_outbox();
            let storage = Storage::open_in_memory().unwrap();
            Self {
                hub,
                lobby: Lobby::new("den", storage, Box::new(SequentialWords)),
                now: Instant::now(),
            }
        }

        /// Say `text` as member `n`; returns the line's id.
        fn say(&mut self, n: u16, text: &str) -> u64 {
            let incoming = self.hub.say(addr(n), text).unwrap();
            self.lobby.handle(&incoming, self.now, &mut self.hub);
            incoming.handle.0
        }

        fn frames(&mut self) -> Vec<ServerFrame> {
            frames_for(&mut self.hub, addr(ANA))
        }

        fn session(&self) -> &GameSession {
            self.lobby.session("general").unwrap()
        }

        /// Two per team, ana and cy as spymasters.
        fn seat_everyone(&mut self) {
            self.say(ANA, "!host");
            self.say(ANA, "!join blue");
            self.say(BEA, "!join blue");
            self.say(CY, "!join red");
            self.say(DEE, "!join red");
            self.say(ANA, "!sm");
            self.say(CY, "!sm");
            self.hub.drain_outbox();
        }

        fn words_of(&self, color: Color) -> Vec<String> {
            self.session()
                .board()
                .unwrap()
                .words()
                .iter()
                .filter(|w| w.color == color)
                .map(|w| w.text.clone())
                .collect()
        }
    }

    fn posted(frames: &[ServerFrame]) -> Vec<String> {
        frames
            .iter()
            .filter_map(|f| match f {
                ServerFrame::Posted { line } if line.author.is_none() => Some(line.text.clone()),
                _ => None,
            })
            .collect()
    }

    fn deleted(frames: &[ServerFrame], id: u64) -> bool {
        frames.contains(&ServerFrame::Deleted { id })
    }

    #[test]
    fn test_host_opens_one_session_per_channel() {
        let mut t = Table::new();
        let first = t.say(ANA, "!host");
        let frames = t.frames();
        assert!(!deleted(&frames, first));
        assert_eq!(posted(&frames), vec!["Host: ana\n\nBlue Team:\n\nRed Team:"]);

        let second = t.say(BEA, "!host");
        let frames = t.frames();
        assert!(deleted(&frames, second));
        assert!(posted(&frames).is_empty());
        assert!(t.session().is_host(crate::game::MemberId(1)));
        assert_eq!(t.lobby.session_count(), 1);
    }

    #[test]
    fn test_sessions_are_per_channel() {
        let mut t = Table::new();
        t.hub.hello(addr(9), "eve", "random", true);
        t.say(ANA, "!host");
        t.say(9, "!host");
        assert_eq!(t.lobby.session_count(), 2);
        assert!(t.lobby.session("random").is_some());
    }

    #[test]
    fn test_join_without_session_hints() {
        let mut t = Table::new();
        let id = t.say(BEA, "!join blue");
        let frames = t.frames();
        assert!(!deleted(&frames, id));
        assert_eq!(
            posted(&frames),
            vec!["! No game in this channel. Use `!host` to open one."]
        );
    }

    #[test]
    fn test_join_adds_player_and_cleans_up() {
        let mut t = Table::new();
        t.say(ANA, "!host");
        let id = t.say(BEA, "!join Red");
        let frames = t.frames();
        assert!(deleted(&frames, id));
        assert_eq!(t.session().roster().team_of(crate::game::MemberId(2)), Some(Team::Red));

        t.say(CY, "!join purple");
        assert_eq!(t.session().roster().team_of(crate::game::MemberId(3)), None);
    }

    #[test]
    fn test_plain_chat_is_ignored() {
        let mut t = Table::new();
        let id = t.say(ANA, "host a game please");
        assert!(!deleted(&t.frames(), id));
        assert_eq!(t.lobby.session_count(), 0);
    }

    #[test]
    fn test_block_is_host_only() {
        let mut t = Table::new();
        t.say(ANA, "!host");
        t.say(BEA, "!join blue");
        t.say(CY, "!join blue");

        t.say(BEA, "!kick @cy");
        assert!(t.session().roster().contains(Team::Blue, crate::game::MemberId(3)));

        let id = t.say(ANA, "!block @cy @bea");
        assert!(deleted(&t.frames(), id));
        assert!(t.session().roster().members(Team::Blue).is_empty());

        t.say(CY, "!join red");
        assert_eq!(t.session().roster().team_of(crate::game::MemberId(3)), None);
    }

    #[test]
    fn test_start_is_host_only() {
        let mut t = Table::new();
        t.seat_everyone();
        let id = t.say(BEA, "!start");
        assert!(deleted(&t.frames(), id));
        assert_eq!(t.session().phase(), Phase::Lobby);
    }

    #[test]
    fn test_start_deals_and_messages_spymasters() {
        let mut t = Table::new();
        t.seat_everyone();
        let id = t.say(ANA, "!start");
        assert_eq!(t.session().phase(), Phase::Started);

        let to_ana = t.frames();
        assert!(deleted(&to_ana, id));
        assert!(to_ana
            .iter()
            .any(|f| matches!(f, ServerFrame::Direct { text } if text.starts_with("Words:"))));
        assert!(posted(&to_ana)
            .iter()
            .any(|p| p == "[B] Blue spymaster's turn\n[B] Time remaining: 02:00"));
    }

    #[test]
    fn test_start_reports_unmet_conditions() {
        let mut t = Table::new();
        t.say(ANA, "!host");
        t.say(ANA, "!join blue");
        t.hub.drain_outbox();
        t.say(ANA, "!start");
        let posts = posted(&t.frames());
        assert_eq!(posts.len(), 1);
        assert!(posts[0].starts_with("! Blue team does not have a spymaster"));
        assert_eq!(t.session().phase(), Phase::Lobby);
    }

    #[test]
    fn test_guess_and_end_turn_need_started_game() {
        let mut t = Table::new();
        t.seat_everyone();
        let id = t.say(BEA, "!guess w00");
        assert!(deleted(&t.frames(), id));
        let id = t.say(ANA, "!end");
        assert!(deleted(&t.frames(), id));
        assert_eq!(t.session().phase(), Phase::Lobby);
    }

    #[test]
    fn test_winning_guess_retires_session() {
        let mut t = Table::new();
        t.seat_everyone();
        t.say(ANA, "!start");
        let blue = t.words_of(Color::Blue);
        assert_eq!(blue.len(), 7);

        t.say(ANA, "!end");
        assert_eq!(t.session().turn(), Some(crate::game::Turn::BlueGuessing));
        for word in &blue[..6] {
            t.say(BEA, &format!("!g {}", word));
        }
        assert_eq!(t.session().remaining(Team::Blue), 1);
        t.hub.drain_outbox();

        t.say(BEA, &format!("!guess {}", blue[6].to_uppercase()));
        assert!(t.lobby.session("general").is_none());
        assert!(posted(&t.frames()).iter().any(|p| p == "Blue team won!"));
    }

    #[test]
    fn test_long_chatter_keeps_game_displays_live() {
        let mut t = Table::new();
        t.seat_everyone();
        t.say(ANA, "!start");
        let game = t.session().game_message();
        let turn = t.session().turn_message().unwrap();
        for i in 0..(MAX_HISTORY + 20) {
            t.say(BEA, &format!("chatter {}", i));
        }
        t.say(ANA, "!end");
        let blue = t.words_of(Color::Blue);
        t.hub.drain_outbox();

        t.say(BEA, &format!("!g {}", blue[0]));
        let revealed = format!("[B] {}", blue[0]);
        assert!(t.frames().iter().any(|f| matches!(
            f,
            ServerFrame::Edited { id, text } if *id == game.0 && text.contains(&revealed)
        )));

        t.lobby.tick(t.now + TICK, &mut t.hub);
        assert!(t.frames().iter().any(|f| matches!(
            f,
            ServerFrame::Edited { id, text } if *id == turn.0 && text.ends_with("01:59")
        )));
    }

    #[test]
    fn test_cancel_is_host_only_and_keeps_command() {
        let mut t = Table::new();
        t.seat_everyone();
        t.say(ANA, "!start");

        let id = t.say(BEA, "!cancel");
        assert!(!deleted(&t.frames(), id));
        assert!(t.lobby.session("general").is_some());

        let id = t.say(ANA, "!cancel");
        let frames = t.frames();
        assert!(!deleted(&frames, id));
        assert!(posted(&frames).iter().any(|p| p == CANCELED_TEXT));
        assert!(t.lobby.session("general").is_none());
        assert_eq!(t.lobby.until_next_tick(t.now), None);
    }

    #[test]
    fn test_tick_drives_started_clocks() {
        let mut t = Table::new();
        t.seat_everyone();
        t.say(ANA, "!start");
        assert_eq!(t.lobby.until_next_tick(t.now), Some(TICK));
        t.hub.drain_outbox();

        t.lobby.tick(t.now + TICK, &mut t.hub);
        assert_eq!(t.session().time_left(), 119);
        assert!(t.frames().iter().any(|f| matches!(
            f,
            ServerFrame::Edited { text, .. } if text.ends_with("Time remaining: 01:59")
        )));

        t.lobby.tick(t.now + TICK, &mut t.hub);
        assert_eq!(t.session().time_left(), 119);
    }

    #[test]
    fn test_prefix_change() {
        let mut t = Table::new();
        let id = t.say(ANA, "!prefix ?");
        let frames = t.frames();
        assert!(!deleted(&frames, id));
        assert_eq!(posted(&frames), vec!["Prefix set to `?`"]);
        assert_eq!(t.lobby.prefix(), "?");

        t.say(ANA, "!host");
        assert_eq!(t.lobby.session_count(), 0);
        t.say(ANA, "?HOST");
        assert_eq!(t.lobby.session_count(), 1);

        t.hub.drain_outbox();
        t.say(BEA, "?prefix");
        assert_eq!(posted(&t.frames()), vec!["Current prefix: `?`"]);
    }

    #[test]
    fn test_help_replies() {
        let mut t = Table::new();
        let id = t.say(DEE, "!h");
        let frames = t.frames();
        assert!(!deleted(&frames, id));
        assert_eq!(posted(&frames), vec![command::help_text("!")]);
    }

    #[test]
    fn test_leave_and_spymaster() {
        let mut t = Table::new();
        t.say(ANA, "!host");
        t.say(BEA, "!join blue");
        let id = t.say(BEA, "!spymaster");
        assert!(deleted(&t.frames(), id));
        assert_eq!(
            t.session().roster().spymaster_id(Team::Blue),
            Some(crate::game::MemberId(2))
        );

        t.say(BEA, "!leave");
        assert_eq!(t.session().roster().team_of(crate::game::MemberId(2)), None);
        assert_eq!(t.session().roster().spymaster_id(Team::Blue), None);
    }
}
