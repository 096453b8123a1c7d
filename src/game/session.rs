//! Game session: owns the board, rosters and turn state of one channel's game
//!
//! Every method is a discrete reaction to a player action or a clock tick.
//! State is updated first, then rendered through the [`Surface`].

use super::board::{Board, Reveal};
use super::clock::TurnClock;
use super::render;
use super::surface::{
    ChannelRenderer, DeliveryError, MessageHandle, RenderError, Surface, WordSupply,
    WordSupplyError,
};
use super::{Color, Member, MemberId, Roster, Team, Turn, TurnSequencer, TURN_DURATION};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Minimum team size to start, spymaster included.
pub const MIN_TEAM_SIZE: usize = 2;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Players are joining; no turns yet
    Lobby,
    /// Turns are running
    Started,
    /// A winner was declared or the game was canceled
    Ended,
}

/// A start precondition that does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmet {
    NoSpymaster(Team),
    NotEnoughPlayers(Team),
}

/// What a call to [`GameSession::start`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Both spymasters have the board and the clock is running
    Started,
    /// The session was not in the lobby
    AlreadyStarted,
    /// Preconditions failed; a diagnostic lists them
    Unmet(Vec<Unmet>),
    /// A spymaster could not be sent the board
    DeliveryFailed(DeliveryError),
    /// No board could be drawn
    WordsUnavailable(WordSupplyError),
}

/// What a call to [`GameSession::guess`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Wrong phase, unauthorized actor, or a word not on the board
    Ignored,
    /// A word was revealed and play continues
    Revealed(Reveal),
    /// The guess decided the game
    Won { winner: Team, reveal: Reveal },
}

impl GuessOutcome {
    /// Whether the session is over and should be discarded.
    pub fn ended(&self) -> bool {
        matches!(self, GuessOutcome::Won { .. })
    }
}

/// One channel's game.
pub struct GameSession {
    host: Member,
    roster: Roster,
    board: Option<Board>,
    blue_left: u32,
    red_left: u32,
    turns: TurnSequencer,
    time_left: u32,
    clock: TurnClock,
    phase: Phase,
    winner: Option<Team>,
    game_msg: MessageHandle,
    turn_msg: Option<MessageHandle>,
    last_diagnostic: Option<MessageHandle>,
    rng: StdRng,
}

impl GameSession {
    /// Open a session hosted by `host`, posting the game display.
    pub fn host<C: ChannelRenderer + ?Sized>(
        host: Member,
        channel: &mut C,
    ) -> Result<Self, RenderError> {
        Self::host_with_rng(host, StdRng::from_os_rng(), channel)
    }

    /// Like [`GameSession::host`] with a caller-provided RNG (for testing/seeding).
    pub fn host_with_rng<C: ChannelRenderer + ?Sized>(
        host: Member,
        rng: StdRng,
        channel: &mut C,
    ) -> Result<Self, RenderError> {
        let roster = Roster::new();
        let game_msg = channel.send(&render::game_text(&host, &roster, &[]))?;
        info!(host = %host.name, "game session hosted");

        Ok(Self {
            host,
            roster,
            board: None,
            blue_left: Team::Blue.quota(),
            red_left: Team::Red.quota(),
            turns: TurnSequencer::new(),
            time_left: TURN_DURATION,
            clock: TurnClock::new(),
            phase: Phase::Lobby,
            winner: None,
            game_msg,
            turn_msg: None,
            last_diagnostic: None,
            rng,
        })
    }

    // ---- roster actions ----

    /// Put `member` on `team`.
    pub fn add_player<C: ChannelRenderer + ?Sized>(&mut self, member: &Member, team: Team, out: &mut C) {
        self.roster.assign_team(member, team);
        debug!(member = %member.name, team = team.label(), "join");
        self.refresh_game(out);
    }

    /// Block members for the rest of the session and take them off their teams.
    pub fn block_players<C: ChannelRenderer + ?Sized>(&mut self, members: &[Member], out: &mut C) {
        self.roster.block_and_unassign(members);
        debug!(count = members.len(), "members blocked");
        self.refresh_game(out);
    }

    /// Take `member` off their team.
    pub fn remove_player<C: ChannelRenderer + ?Sized>(&mut self, member: MemberId, out: &mut C) {
        self.roster.unassign(member);
        self.refresh_game(out);
    }

    /// Claim the spymaster slot of the member's team if it is free.
    pub fn set_spymaster<C: ChannelRenderer + ?Sized>(&mut self, member: MemberId, out: &mut C) -> bool {
        let taken = self.roster.set_spymaster(member);
        self.refresh_game(out);
        taken
    }

    // ---- lifecycle ----

    /// Every start precondition that currently fails, in display order.
    pub fn unmet(&self) -> Vec<Unmet> {
        let mut unmet = Vec::new();
        for team in Team::ALL {
            if self.roster.spymaster_id(team).is_none() {
                unmet.push(Unmet::NoSpymaster(team));
            }
        }
        for team in Team::ALL {
            if self.roster.members(team).len() < MIN_TEAM_SIZE {
                unmet.push(Unmet::NotEnoughPlayers(team));
            }
        }
        unmet
    }

    /// Try to leave the lobby.
    ///
    /// Any earlier diagnostic is retracted first, so at most one is visible.
    /// Failures leave the session in the lobby and may be retried.
    pub fn start<S: Surface + ?Sized>(
        &mut self,
        now: Instant,
        supply: &mut dyn WordSupply,
        out: &mut S,
    ) -> StartOutcome {
        if self.phase != Phase::Lobby {
            return StartOutcome::AlreadyStarted;
        }
        self.retract_diagnostic(out);

        let unmet = self.unmet();
        if !unmet.is_empty() {
            self.post_diagnostic(out, &render::unmet_text(&unmet));
            return StartOutcome::Unmet(unmet);
        }

        // A board drawn by an earlier, failed attempt is kept
        let board = match self.board.take() {
            Some(board) => board,
            None => match Board::generate(Team::Blue, Team::Red, supply, &mut self.rng) {
                Ok(board) => {
                    self.blue_left = Team::Blue.quota();
                    self.red_left = Team::Red.quota();
                    board
                }
                Err(e) => {
                    warn!(error = %e, "could not draw a board");
                    self.post_diagnostic(out, render::WORDS_UNAVAILABLE_TEXT);
                    return StartOutcome::WordsUnavailable(e);
                }
            },
        };
        let solved = render::solved_text(board.words());
        self.board = Some(board);
        self.refresh_game(out);

        for team in Team::ALL {
            let Some(spymaster) = self.roster.spymaster(team).cloned() else {
                continue;
            };
            if let Err(e) = out.send_direct(&spymaster, &solved) {
                warn!(error = %e, "could not send board to spymaster");
                self.post_diagnostic(out, &render::delivery_failed_text(&e));
                return StartOutcome::DeliveryFailed(e);
            }
        }

        self.phase = Phase::Started;
        self.turns = TurnSequencer::new();
        self.time_left = TURN_DURATION;
        self.turn_msg = match out.send(&self.turn_display()) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "could not post turn display");
                None
            }
        };
        self.clock.start(now);
        info!(host = %self.host.name, "game started");
        StartOutcome::Started
    }

    /// Stop the game without a winner.
    pub fn cancel<C: ChannelRenderer + ?Sized>(&mut self, out: &mut C) {
        if self.phase == Phase::Ended {
            return;
        }
        self.finish(None, out);
    }

    // ---- turns ----

    /// Run the clock if a tick is due at `now`.
    pub fn poll_clock<C: ChannelRenderer + ?Sized>(&mut self, now: Instant, out: &mut C) {
        if self.clock.fire(now) {
            self.tick(out);
        }
    }

    /// One second of turn time.
    ///
    /// An expired turn is switched instead of counted down.
    pub fn tick<C: ChannelRenderer + ?Sized>(&mut self, out: &mut C) {
        if self.phase != Phase::Started {
            return;
        }
        if self.time_left == 0 {
            self.switch_turn(out);
            return;
        }
        self.time_left -= 1;
        self.refresh_turn(out);
    }

    /// End the current phase early.
    ///
    /// Allowed for the spymaster during their clue phase and for the
    /// guessing team's other members during their guessing phase.
    pub fn end_turn<C: ChannelRenderer + ?Sized>(&mut self, actor: MemberId, out: &mut C) -> bool {
        if self.phase != Phase::Started {
            return false;
        }
        let turn = self.turns.current();
        let team = turn.team();
        let allowed = if turn.is_guessing() {
            self.roster.contains(team, actor) && !self.roster.is_spymaster(actor)
        } else {
            self.roster.spymaster_id(team) == Some(actor)
        };
        if allowed {
            self.switch_turn(out);
        }
        allowed
    }

    fn switch_turn<C: ChannelRenderer + ?Sized>(&mut self, out: &mut C) {
        self.time_left = TURN_DURATION;
        let turn = self.turns.advance();
        debug!(turn = turn.label(), "turn switched");
        self.refresh_turn(out);
    }

    /// Guess a word.
    ///
    /// Invalid guesses are ignored without feedback. A first reveal of a
    /// team's word counts toward that team; the forbidden word hands the
    /// game to the team that is not guessing.
    pub fn guess<C: ChannelRenderer + ?Sized>(
        &mut self,
        actor: MemberId,
        text: &str,
        out: &mut C,
    ) -> GuessOutcome {
        if self.phase != Phase::Started {
            return GuessOutcome::Ignored;
        }
        let text = text.trim();
        let turn = self.turns.current();
        if text.is_empty() || !turn.is_guessing() {
            return GuessOutcome::Ignored;
        }
        if !self.may_guess(actor, turn) {
            return GuessOutcome::Ignored;
        }
        let Some(reveal) = self.board.as_mut().and_then(|b| b.reveal(text)) else {
            return GuessOutcome::Ignored;
        };

        let winner = match (reveal.color, reveal.color.team()) {
            (Color::Forbidden, _) => Some(turn.team().other()),
            (_, Some(team)) if reveal.first => {
                let left = self.remaining_mut(team);
                *left = left.saturating_sub(1);
                (*left == 0).then_some(team)
            }
            _ => None,
        };
        debug!(word = text, index = reveal.index, color = ?reveal.color, first = reveal.first, "word revealed");

        self.refresh_game(out);

        match winner {
            Some(winner) => {
                self.finish(Some(winner), out);
                GuessOutcome::Won { winner, reveal }
            }
            None => GuessOutcome::Revealed(reveal),
        }
    }

    fn may_guess(&self, actor: MemberId, turn: Turn) -> bool {
        self.roster.is_spymaster(actor)
            || (self.roster.contains(turn.team(), actor) && !self.roster.is_spymaster(actor))
    }

    fn finish<C: ChannelRenderer + ?Sized>(&mut self, winner: Option<Team>, out: &mut C) {
        self.clock.stop();
        self.phase = Phase::Ended;
        self.winner = winner;

        let text = match winner {
            Some(team) => render::winner_text(team),
            None => render::CANCELED_TEXT.to_string(),
        };
        if let Err(e) = out.send(&text) {
            warn!(error = %e, "could not announce game end");
        }
        info!(winner = ?winner.map(Team::label), "game ended");
    }

    // ---- rendering ----

    fn refresh_game<C: ChannelRenderer + ?Sized>(&self, out: &mut C) {
        let display = self.board.as_ref().map(Board::display).unwrap_or(&[]);
        let text = render::game_text(&self.host, &self.roster, display);
        if let Err(e) = out.edit(self.game_msg, &text) {
            warn!(error = %e, "could not update game display");
        }
    }

    fn refresh_turn<C: ChannelRenderer + ?Sized>(&self, out: &mut C) {
        let Some(handle) = self.turn_msg else {
            return;
        };
        if let Err(e) = out.edit(handle, &self.turn_display()) {
            warn!(error = %e, "could not update turn display");
        }
    }

    fn turn_display(&self) -> String {
        render::turn_text(self.turns.current(), self.time_left)
    }

    fn post_diagnostic<C: ChannelRenderer + ?Sized>(&mut self, out: &mut C, text: &str) {
        match out.send(text) {
            Ok(handle) => self.last_diagnostic = Some(handle),
            Err(e) => warn!(error = %e, "could not post diagnostic"),
        }
    }

    fn retract_diagnostic<C: ChannelRenderer + ?Sized>(&mut self, out: &mut C) {
        if let Some(handle) = self.last_diagnostic.take() {
            out.delete(handle);
        }
    }

    fn remaining_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Blue => &mut self.blue_left,
            Team::Red => &mut self.red_left,
        }
    }

    // ---- accessors ----

    pub fn host_member(&self) -> &Member {
        &self.host
    }

    pub fn is_host(&self, member: MemberId) -> bool {
        self.host.id == member
    }

    pub fn is_started(&self) -> bool {
        self.phase == Phase::Started
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    /// Time until the next clock tick, if the clock runs.
    pub fn until_tick(&self, now: Instant) -> Option<Duration> {
        self.clock.until_due(now)
    }
}

#[cfg(test)]
impl GameSession {
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Words `team` still has to find.
    pub fn remaining(&self, team: Team) -> u32 {
        match team {
            Team::Blue => self.blue_left,
            Team::Red => self.red_left,
        }
    }

    /// The active phase, once started.
    pub fn turn(&self) -> Option<Turn> {
        (self.phase == Phase::Started).then(|| self.turns.current())
    }

    /// Seconds left in the current phase.
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn clock_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn game_message(&self) -> MessageHandle {
        self.game_msg
    }

    pub fn turn_message(&self) -> Option<MessageHandle> {
        self.turn_msg
    }

    pub fn last_diagnostic(&self) -> Option<MessageHandle> {
        self.last_diagnostic
    }
}
