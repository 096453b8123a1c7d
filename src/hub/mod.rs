//! The chat hub: members, channels, and the message log
//!
//! The hub owns no sockets. It turns client frames into channel state and
//! queues [`ServerFrame`]s for the serve loop to deliver, which keeps it
//! usable from tests without a network.

pub mod serve;

use crate::game::surface::{
    ChannelRenderer, DeliveryError, DirectNotifier, MessageHandle, RenderError,
};
use crate::game::Member;
use crate::network::{ChatLine, ServerFrame};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use tracing::{debug, info};

/// Lines kept per channel for late joiners. Member lines are dropped
/// before lines the game posted, whose handles stay live for edits.
pub const MAX_HISTORY: usize = 200;

/// A line typed by a member, ready for command dispatch.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub channel: String,
    pub author: Member,
    pub handle: MessageHandle,
    pub text: String,
    /// Channel members named with `@name`
    pub mentions: Vec<Member>,
}

#[derive(Debug, Clone)]
struct Connection {
    member: Member,
    channel: String,
    allow_direct: bool,
}

#[derive(Debug, Default)]
struct Channel {
    lines: BTreeMap<u64, ChatLine>,
}

#[derive(Debug, Default)]
pub struct Hub {
    next_member: u64,
    next_message: u64,
    connections: HashMap<SocketAddr, Connection>,
    channels: HashMap<String, Channel>,
    outbox: Vec<(SocketAddr, ServerFrame)>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the client at `addr`. A second hello on the same connection
    /// is ignored and the existing member returned.
    pub fn hello(&mut self, addr: SocketAddr, name: &str, channel: &str, allow_direct: bool) -> Member {
        if let Some(existing) = self.connections.get(&addr) {
            return existing.member.clone();
        }

        self.next_member += 1;
        let name = name.trim();
        let name = if name.is_empty() {
            format!("guest{}", self.next_member)
        } else {
            name.to_string()
        };
        let member = Member::new(self.next_member, self.unique_name(&name));
        let channel = channel.trim().to_lowercase();

        info!(member = %member.name, id = %member.id, %channel, "member joined");
        self.connections.insert(
            addr,
            Connection {
                member: member.clone(),
                channel: channel.clone(),
                allow_direct,
            },
        );

        let history = self
            .channels
            .entry(channel.clone())
            .or_default()
            .lines
            .values()
            .cloned()
            .collect();
        self.outbox.push((
            addr,
            ServerFrame::Welcome {
                member_id: member.id.0,
                channel: channel.clone(),
                history,
            },
        ));
        self.announce_members(&channel);
        member
    }

    /// Forget the client at `addr`.
    pub fn disconnect(&mut self, addr: SocketAddr) -> Option<Member> {
        let connection = self.connections.remove(&addr)?;
        info!(member = %connection.member.name, channel = %connection.channel, "member left");
        self.announce_members(&connection.channel);
        Some(connection.member)
    }

    /// Post a member's line to their channel and hand it back for dispatch.
    pub fn say(&mut self, addr: SocketAddr, text: &str) -> Option<Incoming> {
        let connection = self.connections.get(&addr)?.clone();
        let text = text.trim_end();
        if text.trim().is_empty() {
            return None;
        }
        let handle = self.post(&connection.channel, Some(&connection.member.name), text);
        Some(Incoming {
            mentions: self.resolve_mentions(&connection.channel, text),
            channel: connection.channel,
            author: connection.member,
            handle,
            text: text.to_string(),
        })
    }

    /// Queue a reply to a ping.
    pub fn pong(&mut self, addr: SocketAddr) {
        self.outbox.push((addr, ServerFrame::Pong));
    }

    /// Frames queued since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<(SocketAddr, ServerFrame)> {
        std::mem::take(&mut self.outbox)
    }

    /// A renderer bound to one channel.
    pub fn outlet<'a>(&'a mut self, channel: &'a str) -> ChannelOutlet<'a> {
        ChannelOutlet { hub: self, channel }
    }

    /// Members currently in `channel`, by id.
    pub fn members_of(&self, channel: &str) -> Vec<&Member> {
        let mut members: Vec<&Member> = self
            .connections
            .values()
            .filter(|c| c.channel == channel)
            .map(|c| &c.member)
            .collect();
        members.sort_by_key(|m| m.id);
        members
    }

    #[cfg(test)]
    pub fn member_count(&self) -> usize {
        self.connections.len()
    }

    /// `wanted`, or `wanted2`, `wanted3`, ... if someone already goes by it.
    fn unique_name(&self, wanted: &str) -> String {
        let taken = |name: &str| {
            self.connections
                .values()
                .any(|c| c.member.name.eq_ignore_ascii_case(name))
        };
        if !taken(wanted) {
            return wanted.to_string();
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{}{}", wanted, suffix);
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// `@name` tokens matched case-insensitively against the channel.
    fn resolve_mentions(&self, channel: &str, text: &str) -> Vec<Member> {
        let mut found: Vec<Member> = Vec::new();
        for token in text.split_whitespace() {
            let Some(name) = token.strip_prefix('@') else {
                continue;
            };
            let hit = self
                .members_of(channel)
                .into_iter()
                .find(|m| m.name.eq_ignore_ascii_case(name));
            if let Some(member) = hit {
                if !found.contains(member) {
                    found.push(member.clone());
                }
            }
        }
        found
    }

    fn post(&mut self, channel: &str, author: Option<&str>, text: &str) -> MessageHandle {
        self.next_message += 1;
        let line = ChatLine {
            id: self.next_message,
            author: author.map(str::to_string),
            text: text.to_string(),
        };

        let log = &mut self.channels.entry(channel.to_string()).or_default().lines;
        log.insert(line.id, line.clone());
        while log.len() > MAX_HISTORY {
            evict_oldest(log);
        }

        self.broadcast(channel, ServerFrame::Posted { line });
        MessageHandle(self.next_message)
    }

    fn edit(&mut self, channel: &str, handle: MessageHandle, text: &str) -> Result<(), RenderError> {
        let line = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| RenderError::ChannelGone(channel.to_string()))?
            .lines
            .get_mut(&handle.0)
            .ok_or(RenderError::UnknownMessage(handle))?;
        line.text = text.to_string();
        self.broadcast(
            channel,
            ServerFrame::Edited {
                id: handle.0,
                text: text.to_string(),
            },
        );
        Ok(())
    }

    fn delete(&mut self, channel: &str, handle: MessageHandle) {
        let removed = self
            .channels
            .get_mut(channel)
            .and_then(|c| c.lines.remove(&handle.0));
        if removed.is_some() {
            self.broadcast(channel, ServerFrame::Deleted { id: handle.0 });
        }
    }

    fn direct(&mut self, member: &Member, text: &str) -> Result<(), DeliveryError> {
        let (addr, connection) = self
            .connections
            .iter()
            .find(|(_, c)| c.member.id == member.id)
            .ok_or_else(|| DeliveryError::NotConnected(member.name.clone()))?;
        if !connection.allow_direct {
            return Err(DeliveryError::DirectMessagesDisabled(member.name.clone()));
        }
        let addr = *addr;
        debug!(member = %member.name, "direct message");
        self.outbox.push((
            addr,
            ServerFrame::Direct {
                text: text.to_string(),
            },
        ));
        Ok(())
    }

    fn broadcast(&mut self, channel: &str, frame: ServerFrame) {
        let listeners: Vec<SocketAddr> = self
            .connections
            .iter()
            .filter(|(_, c)| c.channel == channel)
            .map(|(addr, _)| *addr)
            .collect();
        for addr in listeners {
            self.outbox.push((addr, frame.clone()));
        }
    }

    fn announce_members(&mut self, channel: &str) {
        let names = self
            .members_of(channel)
            .into_iter()
            .map(|m| m.name.clone())
            .collect();
        self.broadcast(channel, ServerFrame::Members { names });
    }

    #[cfg(test)]
    fn member_at(&self, addr: SocketAddr) -> Option<crate::game::MemberId> {
        self.connections.get(&addr).map(|c| c.member.id)
    }
}

/// Drop the oldest member line, or the oldest line if only game lines remain.
fn evict_oldest(log: &mut BTreeMap<u64, ChatLine>) {
    let chatter = log
        .values()
        .find(|line| line.author.is_some())
        .map(|line| line.id);
    match chatter {
        Some(id) => {
            log.remove(&id);
        }
        None => {
            log.pop_first();
        }
    }
}

/// One channel of the hub seen through the game's collaborator traits.
pub struct ChannelOutlet<'a> {
    hub: &'a mut Hub,
    channel: &'a str,
}

impl ChannelRenderer for ChannelOutlet<'_> {
    fn send(&mut self, text: &str) -> Result<MessageHandle, RenderError> {
        Ok(self.hub.post(self.channel, None, text))
    }

    fn edit(&mut self, handle: MessageHandle, text: &str) -> Result<(), RenderError> {
        self.hub.edit(self.channel, handle, text)
    }

    fn delete(&mut self, handle: MessageHandle) {
        self.hub.delete(self.channel, handle);
    }
}

impl DirectNotifier for ChannelOutlet<'_> {
    fn send_direct(&mut self, member: &Member, text: &str) -> Result<(), DeliveryError> {
        self.hub.direct(member, text)
    }
}
