//! Recording fakes for session tests

use super::surface::{
    ChannelRenderer, DeliveryError, DirectNotifier, MessageHandle, RenderError, WordSupply,
    WordSupplyError,
};
use super::{Member, MemberId};
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashSet};
use tracing_subscriber::{fmt, EnvFilter};

static LOGGING: OnceCell<()> = OnceCell::new();

/// Idempotent test logging. Level from `TEST_LOG`, then `RUST_LOG`, else `warn`.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

/// A channel plus direct-message inbox that records everything.
#[derive(Debug, Default)]
pub struct FakeChat {
    next_id: u64,
    /// Live messages by handle
    pub messages: BTreeMap<u64, String>,
    /// Every text passed to `send`, in order
    pub sent: Vec<String>,
    /// Number of successful edits
    pub edits: usize,
    /// Handles passed to `delete`
    pub deleted: Vec<u64>,
    /// Delivered direct messages
    pub directs: Vec<(MemberId, String)>,
    /// Members whose direct messages bounce
    pub refuse_direct: HashSet<MemberId>,
    /// Members who have left the chat
    pub gone: HashSet<MemberId>,
}

impl FakeChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, handle: MessageHandle) -> Option<&str> {
        self.messages.get(&handle.0).map(String::as_str)
    }

    pub fn last_sent(&self) -> Option<&str> {
        self.sent.last().map(String::as_str)
    }

    pub fn directs_to(&self, member: MemberId) -> Vec<&str> {
        self.directs
            .iter()
            .filter(|(id, _)| *id == member)
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

impl ChannelRenderer for FakeChat {
    fn send(&mut self, text: &str) -> Result<MessageHandle, RenderError> {
        self.next_id += 1;
        self.messages.insert(self.next_id, text.to_string());
        self.sent.push(text.to_string());
        Ok(MessageHandle(self.next_id))
    }

    fn edit(&mut self, handle: MessageHandle, text: &str) -> Result<(), RenderError> {
        match self.messages.get_mut(&handle.0) {
            Some(existing) => {
                *existing = text.to_string();
                self.edits += 1;
                Ok(())
            }
            None => Err(RenderError::UnknownMessage(handle)),
        }
    }

    fn delete(&mut self, handle: MessageHandle) {
        self.messages.remove(&handle.0);
        self.deleted.push(handle.0);
    }
}

impl DirectNotifier for FakeChat {
    fn send_direct(&mut self, member: &Member, text: &str) -> Result<(), DeliveryError> {
        if self.gone.contains(&member.id) {
            return Err(DeliveryError::NotConnected(member.name.clone()));
        }
        if self.refuse_direct.contains(&member.id) {
            return Err(DeliveryError::DirectMessagesDisabled(member.name.clone()));
        }
        self.directs.push((member.id, text.to_string()));
        Ok(())
    }
}

/// Hands out `w00`, `w01`, ... in order.
pub struct SequentialWords;

impl WordSupply for SequentialWords {
    fn draw(&mut self, n: usize) -> Result<Vec<String>, WordSupplyError> {
        Ok((0..n).map(|i| format!("w{:02}", i)).collect())
    }
}

/// A supply that is always empty.
pub struct NoWords;

impl WordSupply for NoWords {
    fn draw(&mut self, n: usize) -> Result<Vec<String>, WordSupplyError> {
        Err(WordSupplyError::NotEnoughWords {
            requested: n,
            available: 0,
        })
    }
}
