//! Channel view state for the terminal client

use crate::network::{ChatLine, ServerFrame};
use std::collections::BTreeMap;

/// Longest accepted input line
pub const MAX_INPUT_LEN: usize = 200;

/// Lines kept in the local log; member lines go before game lines
const MAX_LOG: usize = 500;

/// Everything the channel screen shows
#[derive(Debug, Clone)]
pub struct ChatState {
    /// Our display name
    pub name: String,
    /// Channel we asked for; replaced by the hub's normalized name
    pub channel: String,
    /// Identity assigned by the hub once welcomed
    pub member_id: Option<u64>,
    /// Names currently in the channel
    pub members: Vec<String>,
    /// Text being typed
    pub input: String,
    log: BTreeMap<u64, ChatLine>,
    /// Latest private message, usually the spymaster board
    direct: Option<String>,
}

impl ChatState {
    pub fn new(name: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel: channel.into(),
            member_id: None,
            members: Vec::new(),
            input: String::new(),
            log: BTreeMap::new(),
            direct: None,
        }
    }

    /// Fold one frame from the hub into the view
    pub fn apply(&mut self, frame: ServerFrame) {
        match frame {
            ServerFrame::Welcome {
                member_id,
                channel,
                history,
            } => {
                self.member_id = Some(member_id);
                self.channel = channel;
                self.log = history.into_iter().map(|l| (l.id, l)).collect();
            }
            ServerFrame::Posted { line } => {
                self.log.insert(line.id, line);
                while self.log.len() > MAX_LOG {
                    self.evict_oldest();
                }
            }
            ServerFrame::Edited { id, text } => {
                if let Some(line) = self.log.get_mut(&id) {
                    line.text = text;
                }
            }
            ServerFrame::Deleted { id } => {
                self.log.remove(&id);
            }
            ServerFrame::Direct { text } => self.direct = Some(text),
            ServerFrame::Members { names } => self.members = names,
            ServerFrame::Pong => {}
        }
    }

    /// Drop the oldest member line, or the oldest line if only game lines remain
    fn evict_oldest(&mut self) {
        let chatter = self.log.values().find(|l| l.author.is_some()).map(|l| l.id);
        match chatter {
            Some(id) => {
                self.log.remove(&id);
            }
            None => {
                self.log.pop_first();
            }
        }
    }

    /// Log lines, oldest first
    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &ChatLine> {
        self.log.values()
    }

    #[cfg(test)]
    pub fn line_count(&self) -> usize {
        self.log.len()
    }

    pub fn direct(&self) -> Option<&str> {
        self.direct.as_deref()
    }

    pub fn is_welcomed(&self) -> bool {
        self.member_id.is_some()
    }

    pub fn on_char(&mut self, c: char) {
        if !c.is_control() && self.input.chars().count() < MAX_INPUT_LEN {
            self.input.push(c);
        }
    }

    pub fn on_backspace(&mut self) {
        self.input.pop();
    }

    /// Take the typed line for sending; blank lines stay unsent
    pub fn take_input(&mut self) -> Option<String> {
        let text = std::mem::take(&mut self.input);
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
