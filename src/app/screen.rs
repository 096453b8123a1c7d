//! Application screen state management
//!
//! Handles transitions between the client's screens:
//! - Hub browser (mDNS)
//! - Channel (connected to a hub)
//! - Connection errors

use crate::config::PlayConfig;
use crate::network::{Client, HubBrowser, HubInfo};
use std::io;
use std::net::SocketAddr;
use tracing::{debug, warn};

use super::state::ChatState;

/// Ticks between keepalive pings
const HEARTBEAT_TICKS: u32 = 15;

/// The current application screen
pub enum Screen {
    /// Browsing for hubs on the LAN
    Browser {
        browser: HubBrowser,
        hubs: Vec<HubInfo>,
        selected: usize,
    },
    /// Chatting in a channel
    Channel { client: Client, chat: ChatState },
    /// Connection error
    Error { message: String },
}

/// Main application coordinator
pub struct AppCoordinator {
    pub screen: Screen,
    pub should_quit: bool,
    config: PlayConfig,
    ticks: u32,
}

impl AppCoordinator {
    /// Connect straight away when an address was given, else browse
    pub fn new(config: PlayConfig) -> Self {
        let mut coordinator = Self {
            screen: Screen::Error {
                message: String::new(),
            },
            should_quit: false,
            config,
            ticks: 0,
        };
        coordinator.screen = match coordinator.config.connect.clone() {
            Some(addr) => coordinator.enter_channel(Client::connect(&addr, coordinator.config.name.clone())),
            None => browse_screen(),
        };
        coordinator
    }

    pub fn config(&self) -> &PlayConfig {
        &self.config
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Esc: leave the current screen
    pub fn back(&mut self) {
        match self.screen {
            Screen::Browser { .. } => self.quit(),
            Screen::Channel { .. } | Screen::Error { .. } => {
                if self.config.connect.is_some() {
                    self.quit();
                } else {
                    self.switch_to(browse_screen());
                }
            }
        }
    }

    pub fn browser_up(&mut self) {
        if let Screen::Browser { selected, .. } = &mut self.screen {
            *selected = selected.saturating_sub(1);
        }
    }

    pub fn browser_down(&mut self) {
        if let Screen::Browser { selected, hubs, .. } = &mut self.screen {
            if *selected < hubs.len().saturating_sub(1) {
                *selected += 1;
            }
        }
    }

    /// Join the highlighted hub
    pub fn browser_select(&mut self) {
        let hub = match &self.screen {
            Screen::Browser { hubs, selected, .. } => match hubs.get(*selected) {
                Some(hub) => hub.clone(),
                None => return,
            },
            _ => return,
        };
        let client = connect_hub(&hub, &self.config.name);
        let next = self.enter_channel(client);
        self.switch_to(next);
    }

    pub fn on_char(&mut self, c: char) {
        if let Screen::Channel { chat, .. } = &mut self.screen {
            chat.on_char(c);
        }
    }

    pub fn on_backspace(&mut self) {
        if let Screen::Channel { chat, .. } = &mut self.screen {
            chat.on_backspace();
        }
    }

    /// Enter: send the typed line
    pub fn on_submit(&mut self) {
        let Screen::Channel { client, chat } = &mut self.screen else {
            return;
        };
        let Some(text) = chat.take_input() else {
            return;
        };
        if let Err(e) = client.say(&text) {
            warn!(error = %e, "send failed");
            self.switch_to(Screen::Error {
                message: format!("Connection lost: {}", e),
            });
        }
    }

    /// Pull pending network updates into the screen (call regularly)
    pub fn poll(&mut self) {
        let lost = match &mut self.screen {
            Screen::Browser {
                browser,
                hubs,
                selected,
            } => {
                *hubs = browser.poll();
                *selected = (*selected).min(hubs.len().saturating_sub(1));
                false
            }
            Screen::Channel { client, chat } => {
                for frame in client.poll() {
                    chat.apply(frame);
                }
                !client.is_connected()
            }
            Screen::Error { .. } => false,
        };
        if lost {
            self.switch_to(Screen::Error {
                message: "Connection to the hub was lost".to_string(),
            });
        }
    }

    /// Once per second from the main loop
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % HEARTBEAT_TICKS != 0 {
            return;
        }
        if let Screen::Channel { client, .. } = &self.screen {
            if let Err(e) = client.ping() {
                debug!(error = %e, "heartbeat failed");
            }
        }
    }

    fn enter_channel(&self, client: io::Result<Client>) -> Screen {
        let hello = client.and_then(|mut client| {
            client.hello(&self.config.channel, self.config.allow_direct)?;
            Ok(client)
        });
        match hello {
            Ok(client) => {
                debug!(hub = %client.hub_addr(), name = client.name(), "connected");
                Screen::Channel {
                    client,
                    chat: ChatState::new(self.config.name.clone(), self.config.channel.clone()),
                }
            }
            Err(e) => Screen::Error {
                message: format!("Could not connect: {}", e),
            },
        }
    }

    fn switch_to(&mut self, next: Screen) {
        if let Screen::Browser { browser, .. } = std::mem::replace(&mut self.screen, next) {
            if let Err(e) = browser.stop() {
                debug!(error = %e, "browser shutdown");
            }
        }
    }
}

fn browse_screen() -> Screen {
    match HubBrowser::new() {
        Ok(browser) => Screen::Browser {
            browser,
            hubs: Vec::new(),
            selected: 0,
        },
        Err(e) => Screen::Error {
            message: e.to_string(),
        },
    }
}

/// Try a discovered hub's addresses in order
pub fn connect_hub(hub: &HubInfo, name: &str) -> io::Result<Client> {
    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "hub has no addresses");
    for ip in &hub.addresses {
        match Client::connect_addr(SocketAddr::new(*ip, hub.port), name.to_string()) {
            Ok(client) => return Ok(client),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{ClientFrame, Server, ServerEvent, ServerFrame, PROTOCOL_VERSION};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn config(connect: Option<String>) -> PlayConfig {
        PlayConfig {
            connect,
            name: "ana".to_string(),
            channel: "general".to_string(),
            allow_direct: false,
        }
    }

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_direct_connect_says_hello() {
        let mut server = Server::start_on_port(55450).unwrap();
        let addr = format!("127.0.0.1:{}", server.port());
        let coordinator = AppCoordinator::new(config(Some(addr)));
        assert!(matches!(coordinator.screen, Screen::Channel { .. }));

        thread::sleep(Duration::from_millis(200));
        let events = server.poll();
        assert!(events.iter().any(|e| matches!(
            e,
            ServerEvent::FrameReceived {
                frame: ClientFrame::Hello { name, allow_direct: false, .. },
                ..
            } if name == "ana"
        )));
    }

    #[test]
    fn test_submit_and_poll() {
        let mut server = Server::start_on_port(55455).unwrap();
        let mut coordinator =
            AppCoordinator::new(config(Some(format!("127.0.0.1:{}", server.port()))));
        thread::sleep(Duration::from_millis(200));
        let peer = server
            .poll()
            .iter()
            .find_map(|e| match e {
                ServerEvent::PeerConnected { addr } => Some(*addr),
                _ => None,
            })
            .unwrap();

        for c in "!host".chars() {
            coordinator.on_char(c);
        }
        coordinator.on_submit();
        server
            .send_to(peer, ServerFrame::Direct { text: "Words:".into() })
            .unwrap();
        thread::sleep(Duration::from_millis(200));

        assert!(server.poll().iter().any(|e| matches!(
            e,
            ServerEvent::FrameReceived { frame: ClientFrame::Say { text }, .. } if text == "!host"
        )));
        coordinator.poll();
        match &coordinator.screen {
            Screen::Channel { chat, .. } => {
                assert_eq!(chat.direct(), Some("Words:"));
                assert!(chat.input.is_empty());
            }
            _ => panic!("expected channel screen"),
        }
    }

    #[test]
    fn test_failed_connect_shows_error_and_esc_quits() {
        let addr = format!("127.0.0.1:{}", closed_port());
        let mut coordinator = AppCoordinator::new(config(Some(addr)));
        assert!(matches!(&coordinator.screen, Screen::Error { message } if message.starts_with("Could not connect")));

        coordinator.back();
        assert!(coordinator.should_quit);
    }

    #[test]
    fn test_lost_hub_becomes_error() {
        let mut server = Server::start_on_port(55460).unwrap();
        let mut coordinator =
            AppCoordinator::new(config(Some(format!("127.0.0.1:{}", server.port()))));
        thread::sleep(Duration::from_millis(200));
        assert_eq!(server.poll().len(), 2);
        drop(server);
        thread::sleep(Duration::from_millis(300));

        coordinator.poll();
        assert!(matches!(&coordinator.screen, Screen::Error { message } if message.contains("lost")));
    }

    #[test]
    fn test_connect_hub_without_addresses() {
        let hub = HubInfo {
            instance_id: "spyword-00000000".into(),
            guild: "den".into(),
            version: PROTOCOL_VERSION.into(),
            hostname: "x.local.".into(),
            addresses: vec![],
            port: closed_port(),
        };
        let err = connect_hub(&hub, "ana").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_connect_hub_tries_each_address() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let hub = HubInfo {
            instance_id: "spyword-00000001".into(),
            guild: "den".into(),
            version: PROTOCOL_VERSION.into(),
            hostname: "x.local.".into(),
            addresses: vec!["127.0.0.1".parse().unwrap()],
            port: listener.local_addr().unwrap().port(),
        };
        assert!(connect_hub(&hub, "ana").is_ok());
    }

    #[test]
    fn test_typing_outside_channel_is_ignored() {
        let addr = format!("127.0.0.1:{}", closed_port());
        let mut coordinator = AppCoordinator::new(config(Some(addr)));
        coordinator.on_char('x');
        coordinator.on_submit();
        coordinator.tick();
        assert!(matches!(coordinator.screen, Screen::Error { .. }));
    }
}
