//! Team rosters and spymaster slots

use super::{Member, MemberId, Team};
use std::collections::HashSet;

/// Members of both teams plus their spymasters.
///
/// A member is on at most one team. A spymaster slot is empty or holds a
/// member of that same team.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    blue: Vec<Member>,
    red: Vec<Member>,
    blue_spymaster: Option<MemberId>,
    red_spymaster: Option<MemberId>,
    blocked: HashSet<MemberId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `member` on `team`. Ignored for blocked members.
    ///
    /// Any spymaster slot the member holds is cleared first, even when they
    /// are already on `team`.
    pub fn assign_team(&mut self, member: &Member, team: Team) {
        if self.is_blocked(member.id) {
            return;
        }
        self.clear_spymaster(member.id);

        if self.contains(team, member.id) {
            return;
        }
        self.team_mut(team.other()).retain(|m| m.id != member.id);
        self.team_mut(team).push(member.clone());
    }

    /// Remove `member` from both teams and any spymaster slot.
    pub fn unassign(&mut self, member: MemberId) {
        self.clear_spymaster(member);
        self.blue.retain(|m| m.id != member);
        self.red.retain(|m| m.id != member);
    }

    /// Block each member for the rest of the session and remove them.
    pub fn block_and_unassign(&mut self, members: &[Member]) {
        for member in members {
            self.blocked.insert(member.id);
            self.unassign(member.id);
        }
    }

    /// Make `member` their team's spymaster if the slot is free.
    ///
    /// Returns whether the member now holds the slot.
    pub fn set_spymaster(&mut self, member: MemberId) -> bool {
        let Some(team) = self.team_of(member) else {
            return false;
        };
        let slot = self.slot_mut(team);
        if slot.is_some() {
            return false;
        }
        *slot = Some(member);
        true
    }

    /// The team `member` is on, if any.
    pub fn team_of(&self, member: MemberId) -> Option<Team> {
        Team::ALL.into_iter().find(|t| self.contains(*t, member))
    }

    pub fn contains(&self, team: Team, member: MemberId) -> bool {
        self.members(team).iter().any(|m| m.id == member)
    }

    /// Members of `team` in join order, spymaster included.
    pub fn members(&self, team: Team) -> &[Member] {
        match team {
            Team::Blue => &self.blue,
            Team::Red => &self.red,
        }
    }

    pub fn spymaster_id(&self, team: Team) -> Option<MemberId> {
        match team {
            Team::Blue => self.blue_spymaster,
            Team::Red => self.red_spymaster,
        }
    }

    /// The spymaster of `team` with their display name.
    pub fn spymaster(&self, team: Team) -> Option<&Member> {
        let id = self.spymaster_id(team)?;
        self.members(team).iter().find(|m| m.id == id)
    }

    /// Whether `member` holds either spymaster slot.
    pub fn is_spymaster(&self, member: MemberId) -> bool {
        Team::ALL
            .into_iter()
            .any(|t| self.spymaster_id(t) == Some(member))
    }

    pub fn is_blocked(&self, member: MemberId) -> bool {
        self.blocked.contains(&member)
    }

    fn clear_spymaster(&mut self, member: MemberId) {
        for team in Team::ALL {
            let slot = self.slot_mut(team);
            if *slot == Some(member) {
                *slot = None;
            }
        }
    }

    fn team_mut(&mut self, team: Team) -> &mut Vec<Member> {
        match team {
            Team::Blue => &mut self.blue,
            Team::Red => &mut self.red,
        }
    }

    fn slot_mut(&mut self, team: Team) -> &mut Option<MemberId> {
        match team {
            Team::Blue => &mut self.blue_spymaster,
            Team::Red => &mut self.red_spymaster,
        }
    }
}
