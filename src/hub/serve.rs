//! The hub's event loop: sockets in, lobby in the middle, frames out

use super::Hub;
use crate::game::dictionary::Dictionary;
use crate::lobby::Lobby;
use crate::network::{new_instance_id, ClientFrame, DiscoveryError, Server, ServerEvent, ServiceDiscovery};
use crate::storage::{Storage, StorageError};
use std::io;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Longest sleep between polls.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("could not start server: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub port: u16,
    pub guild: String,
    pub mdns: bool,
}

/// Run a hub until the listener dies.
pub fn run(config: ServeConfig) -> Result<(), ServeError> {
    let storage = Storage::open()?;
    let mut server = Server::start_on_port(config.port)?;
    let mut hub = Hub::new();
    let mut lobby = Lobby::new(config.guild.clone(), storage, Box::new(Dictionary::new()));

    let mut discovery = if config.mdns {
        let mut discovery = ServiceDiscovery::new(new_instance_id())?;
        discovery.advertise(&config.guild, server.port())?;
        Some(discovery)
    } else {
        None
    };

    info!(
        port = server.port(),
        guild = %config.guild,
        words = crate::game::dictionary::word_count(),
        "hub listening"
    );

    while server.is_running() {
        step(&mut server, &mut hub, &mut lobby, Instant::now());

        let pause = lobby
            .until_next_tick(Instant::now())
            .map_or(POLL_INTERVAL, |due| due.min(POLL_INTERVAL));
        thread::sleep(pause);
    }

    if let Some(discovery) = discovery.as_mut() {
        if let Err(e) = discovery.stop_advertising() {
            warn!(error = %e, "could not withdraw advertisement");
        }
    }
    info!("hub stopped");
    Ok(())
}

/// One pass: drain socket events, fire clocks, flush frames.
pub fn step(server: &mut Server, hub: &mut Hub, lobby: &mut Lobby, now: Instant) {
    for event in server.poll() {
        dispatch(event, hub, lobby, now);
    }
    lobby.tick(now, hub);

    for (addr, frame) in hub.drain_outbox() {
        if let Err(e) = server.send_to(addr, frame) {
            debug!(%addr, error = %e, "dropping frame for departed peer");
        }
    }
}

/// Route one server event into the hub and lobby.
pub fn dispatch(event: ServerEvent, hub: &mut Hub, lobby: &mut Lobby, now: Instant) {
    match event {
        ServerEvent::PeerConnected { addr } => debug!(%addr, "peer connected"),
        ServerEvent::PeerDisconnected { addr } => {
            hub.disconnect(addr);
        }
        ServerEvent::FrameReceived { from, frame } => match frame {
            ClientFrame::Hello {
                name,
                channel,
                allow_direct,
            } => {
                hub.hello(from, &name, &channel, allow_direct);
            }
            ClientFrame::Say { text } => {
                if let Some(incoming) = hub.say(from, &text) {
                    lobby.handle(&incoming, now, hub);
                }
            }
            ClientFrame::Ping => hub.pong(from),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{init_logging, SequentialWords};
    use crate::hub::fixtures::{addr, frames_for};
    use crate::network::{Client, ServerFrame};

    fn lobby() -> Lobby {
        Lobby::new(
            "den",
            Storage::open_in_memory().unwrap(),
            Box::new(SequentialWords),
        )
    }

    fn hello(n: u16, name: &str) -> ServerEvent {
        ServerEvent::FrameReceived {
            from: addr(n),
            frame: ClientFrame::Hello {
                name: name.to_string(),
                channel: "general".to_string(),
                allow_direct: true,
            },
        }
    }

    fn say(n: u16, text: &str) -> ServerEvent {
        ServerEvent::FrameReceived {
            from: addr(n),
            frame: ClientFrame::Say {
                text: text.to_string(),
            },
        }
    }

    #[test]
    fn test_dispatch_routes_commands() {
        init_logging();
        let mut hub = Hub::new();
        let mut lobby = lobby();
        let now = Instant::now();

        dispatch(hello(1, "ana"), &mut hub, &mut lobby, now);
        dispatch(say(1, "!host"), &mut hub, &mut lobby, now);
        assert!(lobby.session("general").is_some());

        let frames = frames_for(&mut hub, addr(1));
        assert!(matches!(frames[0], ServerFrame::Welcome { .. }));
        assert!(frames.iter().any(|f| matches!(
            f,
            ServerFrame::Posted { line } if line.text.starts_with("Host: ana")
        )));
    }

    #[test]
    fn test_dispatch_ping_and_disconnect() {
        let mut hub = Hub::new();
        let mut lobby = lobby();
        let now = Instant::now();

        dispatch(hello(1, "ana"), &mut hub, &mut lobby, now);
        hub.drain_outbox();
        let ping = ServerEvent::FrameReceived {
            from: addr(1),
            frame: ClientFrame::Ping,
        };
        dispatch(ping, &mut hub, &mut lobby, now);
        assert_eq!(frames_for(&mut hub, addr(1)), vec![ServerFrame::Pong]);

        dispatch(
            ServerEvent::PeerDisconnected { addr: addr(1) },
            &mut hub,
            &mut lobby,
            now,
        );
        assert_eq!(hub.member_count(), 0);
    }

    #[test]
    fn test_say_before_hello_is_ignored() {
        let mut hub = Hub::new();
        let mut lobby = lobby();
        dispatch(say(1, "!host"), &mut hub, &mut lobby, Instant::now());
        assert_eq!(lobby.session_count(), 0);
        assert!(hub.drain_outbox().is_empty());
    }

    #[test]
    fn test_step_over_loopback() {
        init_logging();
        let mut server = Server::start_on_port(55440).unwrap();
        let mut hub = Hub::new();
        let mut lobby = lobby();

        let mut client = Client::connect(&format!("127.0.0.1:{}", server.port()), "ana".into()).unwrap();
        client.hello("general", true).unwrap();
        thread::sleep(Duration::from_millis(200));
        step(&mut server, &mut hub, &mut lobby, Instant::now());

        client.say("!host").unwrap();
        thread::sleep(Duration::from_millis(200));
        step(&mut server, &mut hub, &mut lobby, Instant::now());
        thread::sleep(Duration::from_millis(200));

        let frames = client.poll();
        assert!(matches!(frames.first(), Some(ServerFrame::Welcome { .. })));
        assert!(frames.iter().any(|f| matches!(
            f,
            ServerFrame::Posted { line } if line.author.is_none() && line.text.starts_with("Host: ana")
        )));
        assert!(lobby.session("general").is_some());
    }
}
