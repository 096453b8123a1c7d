//! Collaborator seams between a game session and the chat it runs in.
//!
//! The session never talks to sockets directly. Whatever hosts it (the hub,
//! or a recording fake in tests) implements these traits.

use super::Member;
use thiserror::Error;

/// Handle of a message previously posted to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageHandle(pub u64);

/// A channel message could not be posted or changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The channel has no listeners left.
    #[error("channel {0} is gone")]
    ChannelGone(String),
    /// The message was deleted or never existed.
    #[error("message {0:?} not found")]
    UnknownMessage(MessageHandle),
}

/// A direct notification was not delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The recipient does not accept direct messages.
    #[error("{0} does not accept direct messages")]
    DirectMessagesDisabled(String),
    /// The recipient is no longer connected.
    #[error("{0} is not connected")]
    NotConnected(String),
}

/// The word supply could not satisfy a draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordSupplyError {
    #[error("requested {requested} words but only {available} are available")]
    NotEnoughWords { requested: usize, available: usize },
}

/// Posts, edits and deletes messages in one channel.
pub trait ChannelRenderer {
    fn send(&mut self, text: &str) -> Result<MessageHandle, RenderError>;
    fn edit(&mut self, handle: MessageHandle, text: &str) -> Result<(), RenderError>;
    fn delete(&mut self, handle: MessageHandle);
}

/// Sends a private message to a single member.
pub trait DirectNotifier {
    fn send_direct(&mut self, member: &Member, text: &str) -> Result<(), DeliveryError>;
}

/// Source of distinct lowercase words for new boards.
pub trait WordSupply {
    /// Draw `n` pairwise-distinct words. Never returns fewer than `n`.
    fn draw(&mut self, n: usize) -> Result<Vec<String>, WordSupplyError>;
}

/// Everything a session needs to reach the outside world: the channel it
/// lives in plus direct messages to its members.
pub trait Surface: ChannelRenderer + DirectNotifier {}

impl<T: ChannelRenderer + DirectNotifier + ?Sized> Surface for T {}
