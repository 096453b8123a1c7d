//! Peer connection handling

use super::protocol::{read_frame, write_frame};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// A connected peer that reads `In` frames and writes `Out` frames
pub struct Peer<In, Out> {
    /// Peer's address
    pub addr: SocketAddr,
    /// Channel to send frames to this peer
    tx: Sender<Out>,
    /// Channel to receive frames from this peer
    rx: Receiver<In>,
    /// Whether the connection is still alive
    alive: bool,
    /// Kept to unblock the reader thread on drop
    stream: TcpStream,
}

impl<In, Out> Peer<In, Out>
where
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + 'static,
{
    /// Create a new peer from a TCP stream
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let addr = stream.peer_addr()?;

        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(Duration::from_secs(5)))?;

        let (outgoing_tx, outgoing_rx) = channel::<Out>();
        let (incoming_tx, incoming_rx) = channel::<In>();

        let mut read_stream = stream.try_clone()?;
        let mut write_stream = stream.try_clone()?;

        // Writer thread
        thread::spawn(move || {
            while let Ok(frame) = outgoing_rx.recv() {
                if let Err(e) = write_frame(&mut write_stream, &frame) {
                    debug!(%addr, error = %e, "writer stopped");
                    break;
                }
            }
        });

        // Reader thread
        thread::spawn(move || loop {
            match read_frame::<In, _>(&mut read_stream) {
                Ok(frame) => {
                    if incoming_tx.send(frame).is_err() {
                        break;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!(%addr, error = %e, "dropping malformed frame");
                }
                Err(e) => {
                    debug!(%addr, error = %e, "reader stopped");
                    break;
                }
            }
        });

        Ok(Peer {
            addr,
            tx: outgoing_tx,
            rx: incoming_rx,
            alive: true,
            stream,
        })
    }

    /// Connect to a peer at the given address
    pub fn connect(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, Duration::from_secs(5))?;
        Self::new(stream)
    }

    /// Queue a frame for this peer
    pub fn send(&self, frame: Out) -> io::Result<()> {
        self.tx
            .send(frame)
            .map_err(|_| io::Error::new(ErrorKind::BrokenPipe, "peer disconnected"))
    }

    /// Try to receive a frame from this peer (non-blocking)
    pub fn try_recv(&mut self) -> Option<In> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.alive = false;
                None
            }
        }
    }

    /// Receive all pending frames from this peer
    pub fn recv_all(&mut self) -> Vec<In> {
        let mut frames = Vec::new();
        while let Some(frame) = self.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Check if the peer connection is still alive
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

impl<In, Out> Drop for Peer<In, Out> {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
