//! Networking: mDNS discovery of hubs and TCP connections
//!
//! This module provides:
//! - mDNS-SD advertisement and browsing of spyword hubs on the local network
//! - TCP server the hub accepts clients on (default port 55333 with auto-increment)
//! - TCP client for terminal players (or manual connect via --connect IP:PORT)
//! - Length-prefixed JSON frames between the two

pub mod client;
pub mod peer;
pub mod protocol;
pub mod server;

pub use client::Client;
pub use protocol::{ChatLine, ClientFrame, ServerFrame};
pub use server::{Server, ServerEvent};

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use rand::Rng;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::mpsc;
use std::thread;
use thiserror::Error;
use tracing::debug;

/// Service type hubs advertise under
pub const SERVICE_TYPE: &str = "_spyword._tcp.local.";

/// Current protocol version
pub const PROTOCOL_VERSION: &str = "1";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("mDNS {action} failed: {message}")]
    Daemon {
        action: &'static str,
        message: String,
    },
}

fn daemon_error(action: &'static str) -> impl FnOnce(mdns_sd::Error) -> DiscoveryError {
    move |e| DiscoveryError::Daemon {
        action,
        message: e.to_string(),
    }
}

/// A random instance name, unique enough for one LAN.
pub fn new_instance_id() -> String {
    format!("spyword-{:08x}", rand::rng().random::<u32>())
}

/// A hub seen on the network
#[derive(Debug, Clone)]
pub struct HubInfo {
    /// Unique identifier of the hub instance
    pub instance_id: String,
    /// Guild the hub serves
    pub guild: String,
    /// Protocol version it speaks
    pub version: String,
    pub hostname: String,
    /// Addresses, IPv4 first
    pub addresses: Vec<IpAddr>,
    pub port: u16,
}

/// Events from the service discovery system
#[derive(Debug)]
pub enum DiscoveryEvent {
    HubFound(HubInfo),
    /// Instance id of a hub that went away
    HubLost(String),
}

/// mDNS advertisement (hub side) and browsing (client side)
pub struct ServiceDiscovery {
    daemon: ServiceDaemon,
    instance_id: String,
    registered: bool,
}

impl ServiceDiscovery {
    pub fn new(instance_id: String) -> Result<Self, DiscoveryError> {
        let daemon = ServiceDaemon::new().map_err(daemon_error("daemon start"))?;

        Ok(Self {
            daemon,
            instance_id,
            registered: false,
        })
    }

    /// Advertise a hub for `guild` listening on `port`
    pub fn advertise(&mut self, guild: &str, port: u16) -> Result<(), DiscoveryError> {
        let properties = [
            ("version", PROTOCOL_VERSION),
            ("guild", guild),
            ("instance_id", self.instance_id.as_str()),
        ];

        let hostname = format!("{}.local.", self.instance_id);

        let service_info = ServiceInfo::new(
            SERVICE_TYPE,
            &self.instance_id,
            &hostname,
            (),
            port,
            &properties[..],
        )
        .map_err(daemon_error("service info"))?
        .enable_addr_auto();

        self.daemon
            .register(service_info)
            .map_err(daemon_error("register"))?;

        self.registered = true;
        Ok(())
    }

    pub fn stop_advertising(&mut self) -> Result<(), DiscoveryError> {
        if self.registered {
            self.registered = false;
            let fullname = format!("{}.{}", self.instance_id, SERVICE_TYPE);
            self.daemon
                .unregister(&fullname)
                .map_err(daemon_error("unregister"))?;
        }
        Ok(())
    }

    /// Start browsing for hubs
    ///
    /// Returns a receiver that emits DiscoveryEvents as hubs come and go
    pub fn browse(&self) -> Result<mpsc::Receiver<DiscoveryEvent>, DiscoveryError> {
        let receiver = self
            .daemon
            .browse(SERVICE_TYPE)
            .map_err(daemon_error("browse"))?;

        let (tx, rx) = mpsc::channel();
        let own_id = self.instance_id.clone();

        thread::spawn(move || {
            while let Ok(event) = receiver.recv() {
                match event {
                    ServiceEvent::ServiceResolved(info) => {
                        let properties = info.get_properties();

                        let instance_id = properties
                            .get_property_val_str("instance_id")
                            .unwrap_or_default()
                            .to_string();
                        if instance_id == own_id {
                            continue;
                        }

                        let guild = properties
                            .get_property_val_str("guild")
                            .unwrap_or_default()
                            .to_string();
                        let version = properties
                            .get_property_val_str("version")
                            .unwrap_or(PROTOCOL_VERSION)
                            .to_string();

                        // Link-local IPv6 needs a scope id IpAddr can't carry
                        let mut addresses: Vec<IpAddr> = info
                            .get_addresses()
                            .iter()
                            .map(|s| s.to_ip_addr())
                            .collect();
                        addresses.sort_by_key(|addr| match addr {
                            IpAddr::V4(_) => 0,
                            IpAddr::V6(_) => 1,
                        });

                        debug!(%instance_id, %guild, "hub resolved");
                        let hub = HubInfo {
                            instance_id,
                            guild,
                            version,
                            hostname: info.get_hostname().to_string(),
                            addresses,
                            port: info.get_port(),
                        };
                        let _ = tx.send(DiscoveryEvent::HubFound(hub));
                    }
                    ServiceEvent::ServiceRemoved(_, fullname) => {
                        if let Some(id) = fullname.strip_suffix(&format!(".{}", SERVICE_TYPE)) {
                            let _ = tx.send(DiscoveryEvent::HubLost(id.to_string()));
                        }
                    }
                    _ => {}
                }
            }
        });

        Ok(rx)
    }

    pub fn stop_browsing(&self) -> Result<(), DiscoveryError> {
        self.daemon
            .stop_browse(SERVICE_TYPE)
            .map_err(daemon_error("stop browse"))
    }

    pub fn shutdown(self) -> Result<(), DiscoveryError> {
        self.daemon.shutdown().map_err(daemon_error("shutdown"))?;
        Ok(())
    }
}

/// Known hubs by instance id
#[derive(Debug, Default)]
pub struct HubTracker {
    hubs: HashMap<String, HubInfo>,
}

impl HubTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a hub
    pub fn update(&mut self, hub: HubInfo) {
        self.hubs.insert(hub.instance_id.clone(), hub);
    }

    pub fn remove(&mut self, instance_id: &str) -> Option<HubInfo> {
        self.hubs.remove(instance_id)
    }

    /// Hubs sorted by guild then instance id, for a stable listing
    pub fn hubs(&self) -> Vec<HubInfo> {
        let mut hubs: Vec<HubInfo> = self.hubs.values().cloned().collect();
        hubs.sort_by(|a, b| {
            a.guild
                .cmp(&b.guild)
                .then_with(|| a.instance_id.cmp(&b.instance_id))
        });
        hubs
    }

    #[cfg(test)]
    pub fn get(&self, instance_id: &str) -> Option<&HubInfo> {
        self.hubs.get(instance_id)
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.hubs.len()
    }

    /// Fold one discovery event into the tracker
    pub fn apply(&mut self, event: DiscoveryEvent) {
        match event {
            DiscoveryEvent::HubFound(hub) => self.update(hub),
            DiscoveryEvent::HubLost(id) => {
                self.remove(&id);
            }
        }
    }
}

/// Client-side browser of hubs on the LAN
pub struct HubBrowser {
    discovery: ServiceDiscovery,
    discovery_rx: mpsc::Receiver<DiscoveryEvent>,
    hubs: HubTracker,
}

impl HubBrowser {
    pub fn new() -> Result<Self, DiscoveryError> {
        let discovery = ServiceDiscovery::new(new_instance_id())?;
        let discovery_rx = discovery.browse()?;

        Ok(Self {
            discovery,
            discovery_rx,
            hubs: HubTracker::new(),
        })
    }

    /// Drain discovery events and return the current hub list
    pub fn poll(&mut self) -> Vec<HubInfo> {
        while let Ok(event) = self.discovery_rx.try_recv() {
            self.hubs.apply(event);
        }
        self.hubs.hubs()
    }

    pub fn stop(self) -> Result<(), DiscoveryError> {
        self.discovery.stop_browsing()?;
        self.discovery.shutdown()
    }
}
