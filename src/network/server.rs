//! TCP server for hosting a hub

use super::peer::Peer;
use super::protocol::{ClientFrame, ServerFrame};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Default hub port
pub const DEFAULT_PORT: u16 = 55333;

/// Maximum port to try when auto-incrementing
const MAX_PORT: u16 = 55433;

type ClientPeer = Peer<ClientFrame, ServerFrame>;

/// Accepts client connections and multiplexes their frames
pub struct Server {
    /// Local address the server is bound to
    addr: SocketAddr,
    /// Channel to receive new peer connections
    new_peers_rx: Receiver<ClientPeer>,
    /// Connected peers
    peers: Vec<ClientPeer>,
    /// Running flag
    running: bool,
}

impl Server {
    /// Start a new server on the default port with auto-increment
    #[cfg(test)]
    pub fn start() -> io::Result<Self> {
        Self::start_on_port(DEFAULT_PORT)
    }

    /// Start a new server on a specific port with auto-increment fallback
    pub fn start_on_port(start_port: u16) -> io::Result<Self> {
        let mut port = start_port;
        let listener = loop {
            match TcpListener::bind(format!("0.0.0.0:{}", port)) {
                Ok(l) => break l,
                Err(e) if e.kind() == io::ErrorKind::AddrInUse && port < MAX_PORT => {
                    port += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let (new_peers_tx, new_peers_rx) = channel();

        thread::spawn(move || {
            accept_loop(listener, new_peers_tx);
        });

        Ok(Server {
            addr,
            new_peers_rx,
            peers: Vec::new(),
            running: true,
        })
    }

    /// Get the port the server is listening on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Poll for new connections and frames
    pub fn poll(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();

        loop {
            match self.new_peers_rx.try_recv() {
                Ok(peer) => {
                    events.push(ServerEvent::PeerConnected { addr: peer.addr });
                    self.peers.push(peer);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running = false;
                    break;
                }
            }
        }

        let mut disconnected = Vec::new();
        for (i, peer) in self.peers.iter_mut().enumerate() {
            for frame in peer.recv_all() {
                events.push(ServerEvent::FrameReceived {
                    from: peer.addr,
                    frame,
                });
            }
            if !peer.is_alive() {
                disconnected.push(i);
            }
        }

        // Reverse order keeps indices valid
        for i in disconnected.into_iter().rev() {
            let peer = self.peers.remove(i);
            events.push(ServerEvent::PeerDisconnected { addr: peer.addr });
        }

        events
    }

    /// Send a frame to a specific peer by address
    pub fn send_to(&self, addr: SocketAddr, frame: ServerFrame) -> io::Result<()> {
        match self.peers.iter().find(|p| p.addr == addr) {
            Some(peer) => peer.send(frame),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "peer not found")),
        }
    }

    /// Get the number of connected peers
    #[cfg(test)]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Check if the server is still running
    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Events from the server
#[derive(Debug, Clone)]
pub enum ServerEvent {
    PeerConnected { addr: SocketAddr },
    PeerDisconnected { addr: SocketAddr },
    FrameReceived { from: SocketAddr, frame: ClientFrame },
}

fn accept_loop(listener: TcpListener, tx: Sender<ClientPeer>) {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => match Peer::new(stream) {
                Ok(peer) => {
                    if tx.send(peer).is_err() {
                        break;
                    }
                }
                Err(e) => debug!(%addr, error = %e, "could not set up peer"),
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_starts_on_default_port() {
        let server = Server::start();
        assert!(server.is_ok());
        let server = server.unwrap();
        assert!(server.port() >= DEFAULT_PORT);
        assert!(server.port() <= MAX_PORT);
    }

    #[test]
    fn test_server_auto_increment_port() {
        let server1 = Server::start_on_port(55400).unwrap();
        let port1 = server1.port();

        let server2 = Server::start_on_port(port1).unwrap();
        let port2 = server2.port();

        assert_ne!(port1, port2);
        assert_eq!(port2, port1 + 1);
    }

    #[test]
    fn test_server_accepts_connection() {
        let mut server = Server::start_on_port(55410).unwrap();
        let addr = SocketAddr::from(([127, 0, 0, 1], server.port()));

        let _client: Peer<ServerFrame, ClientFrame> = Peer::connect(addr).unwrap();

        thread::sleep(Duration::from_millis(100));
        let events = server.poll();

        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::PeerConnected { .. })));
        assert_eq!(server.peer_count(), 1);
    }

    #[test]
    fn test_send_to_unknown_peer_fails() {
        let server = Server::start_on_port(55415).unwrap();
        let stranger = SocketAddr::from(([127, 0, 0, 1], 9));
        let err = server.send_to(stranger, ServerFrame::Pong).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
