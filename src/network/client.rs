//! TCP client for joining a hub

use super::peer::Peer;
use super::protocol::{ClientFrame, ServerFrame};
use super::server::DEFAULT_PORT;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

/// A terminal client's connection to a hub
pub struct Client {
    peer: Peer<ServerFrame, ClientFrame>,
    name: String,
    said_hello: bool,
}

impl Client {
    /// Connect to a hub at the given address
    ///
    /// The address can be:
    /// - "IP:PORT" (e.g., "192.168.1.100:55333")
    /// - "IP" (uses default port 55333)
    /// - "hostname:PORT"
    /// - "hostname" (uses default port)
    pub fn connect(addr: &str, name: String) -> io::Result<Self> {
        Self::connect_addr(parse_address(addr)?, name)
    }

    /// Connect to a hub at the given socket address
    pub fn connect_addr(addr: SocketAddr, name: String) -> io::Result<Self> {
        Ok(Client {
            peer: Peer::connect(addr)?,
            name,
            said_hello: false,
        })
    }

    /// Introduce ourselves; only the first call is sent
    pub fn hello(&mut self, channel: &str, allow_direct: bool) -> io::Result<()> {
        if self.said_hello {
            return Ok(());
        }
        self.peer.send(ClientFrame::Hello {
            name: self.name.clone(),
            channel: channel.to_string(),
            allow_direct,
        })?;
        self.said_hello = true;
        Ok(())
    }

    /// Post a line to our channel
    pub fn say(&self, text: &str) -> io::Result<()> {
        self.peer.send(ClientFrame::Say {
            text: text.to_string(),
        })
    }

    pub fn ping(&self) -> io::Result<()> {
        self.peer.send(ClientFrame::Ping)
    }

    /// Poll for incoming frames from the hub
    pub fn poll(&mut self) -> Vec<ServerFrame> {
        self.peer.recv_all()
    }

    /// Check if still connected
    pub fn is_connected(&self) -> bool {
        self.peer.is_alive()
    }

    pub fn hub_addr(&self) -> SocketAddr {
        self.peer.addr
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Parse an address string into a SocketAddr
///
/// Handles formats:
/// - "192.168.1.100:55333" -> parse directly
/// - "192.168.1.100" -> add default port
/// - "hostname:55333" -> resolve and use port
/// - "hostname" -> resolve and use default port
pub fn parse_address(addr: &str) -> io::Result<SocketAddr> {
    let with_port = if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{}:{}", addr, DEFAULT_PORT)
    };
    with_port
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "could not resolve address"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::server::{Server, ServerEvent};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_parse_address_with_port() {
        let addr = parse_address("127.0.0.1:55333").unwrap();
        assert_eq!(addr.port(), 55333);
    }

    #[test]
    fn test_parse_address_without_port() {
        let addr = parse_address("127.0.0.1").unwrap();
        assert_eq!(addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_client_hello_reaches_server() {
        let mut server = Server::start_on_port(55420).unwrap();
        let addr = format!("127.0.0.1:{}", server.port());

        let mut client = Client::connect(&addr, "ana".to_string()).unwrap();
        client.hello("general", true).unwrap();
        client.hello("general", true).unwrap();

        thread::sleep(Duration::from_millis(200));
        let events = server.poll();

        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::PeerConnected { .. })));
        let hellos = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    ServerEvent::FrameReceived {
                        frame: ClientFrame::Hello { name, channel, allow_direct: true },
                        ..
                    } if name == "ana" && channel == "general"
                )
            })
            .count();
        assert_eq!(hellos, 1);
    }

    #[test]
    fn test_client_receives_frames() {
        let mut server = Server::start_on_port(55421).unwrap();
        let addr = format!("127.0.0.1:{}", server.port());

        let mut client = Client::connect(&addr, "ana".to_string()).unwrap();
        client.hello("general", true).unwrap();

        thread::sleep(Duration::from_millis(100));
        let peer_addr = server
            .poll()
            .iter()
            .find_map(|e| match e {
                ServerEvent::PeerConnected { addr } => Some(*addr),
                _ => None,
            })
            .unwrap();

        server
            .send_to(peer_addr, ServerFrame::Direct { text: "Words:".into() })
            .unwrap();

        thread::sleep(Duration::from_millis(100));
        let frames = client.poll();
        assert!(frames.contains(&ServerFrame::Direct { text: "Words:".into() }));
    }
}
