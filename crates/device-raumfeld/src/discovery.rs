/// SSDP discovery of Raumfeld renderers
///
/// Discovery runs in two phases. First, M-SEARCH rounds collect the unique
/// `Location` headers of every answering MediaRenderer. Then each location is
/// resolved into a [`RaumfeldDevice`] concurrently; a device that cannot be
/// resolved is skipped and never spoils the rest of the pass.

use crate::device::RaumfeldDevice;
use futures_util::future::join_all;
use raumfeld_core::{DeviceOptions, DiscoveryConfig, Result};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket as StdUdpSocket};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

const RECV_BUFFER_SIZE: usize = 4096;

/// Discover Raumfeld devices on the local network
///
/// # Arguments
/// * `timeout` - Receive inactivity that ends a search round
/// * `retries` - How many search rounds to run
///
/// # Returns
/// Zones sorted by friendly name, or every renderer found when no zone exists
pub async fn discover(timeout: Duration, retries: u32) -> Vec<RaumfeldDevice> {
    discover_with(&DiscoveryConfig::new(timeout, retries)).await
}

/// Discover Raumfeld devices with every knob of [`DiscoveryConfig`]
pub async fn discover_with(config: &DiscoveryConfig) -> Vec<RaumfeldDevice> {
    info!(
        "Starting Raumfeld discovery ({} round(s), {:?} timeout)",
        config.retries, config.timeout
    );

    let locations = search_locations(config).await;

    let mut devices = Vec::with_capacity(locations.len());
    for (location, result) in resolve_locations(locations.iter(), &config.device).await {
        match result {
            Ok(device) => devices.push(device),
            Err(e) => warn!("Skipping device at {}: {}", location, e),
        }
    }

    let devices = select_devices(devices);
    info!("Raumfeld discovery complete, found {} device(s)", devices.len());
    devices
}

/// Run the configured number of M-SEARCH rounds and collect unique locations
pub async fn search_locations(config: &DiscoveryConfig) -> LocationSet {
    let mut locations = LocationSet::new();
    let request = build_msearch(&config.search_addr, &config.search_target);

    for round in 1..=config.retries {
        debug!("SSDP search round {}/{}", round, config.retries);
        if let Err(e) = search_round(config, &request, &mut locations).await {
            warn!("SSDP search round {} failed: {}", round, e);
        }
    }

    debug!("Collected {} unique location(s)", locations.len());
    locations
}

/// One round: fresh socket, one request, receive until `timeout` passes without data
async fn search_round(config: &DiscoveryConfig, request: &str, locations: &mut LocationSet) -> io::Result<()> {
    let socket = create_search_socket(&config.search_addr, config.multicast_ttl)?;

    let bytes_sent = socket.send_to(request.as_bytes(), config.search_addr).await?;
    debug!("Sent M-SEARCH for {} ({} bytes to {})", config.search_target, bytes_sent, config.search_addr);

    let mut buf = [0u8; RECV_BUFFER_SIZE];
    loop {
        match tokio::time::timeout(config.timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, addr))) => {
                let response = String::from_utf8_lossy(&buf[..len]);
                debug!("Received SSDP response from {} ({} bytes)", addr, len);

                if let Some(location) = parse_location(&response) {
                    if locations.insert(location) {
                        info!("Found device location {} (from {})", location, addr);
                    }
                }
            }
            Ok(Err(e)) => return Err(e),
            // Inactivity: no more responses this round
            Err(_) => break,
        }
    }

    Ok(())
}

/// Create a UDP socket for sending M-SEARCH requests
fn create_search_socket(search_addr: &SocketAddr, ttl: u32) -> io::Result<UdpSocket> {
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(*search_addr),
        socket2::Type::DGRAM,
        Some(socket2::Protocol::UDP),
    )?;

    socket.set_reuse_address(true)?;

    let bind_addr: SocketAddr = if search_addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    socket.bind(&bind_addr.into())?;

    if search_addr.is_ipv4() {
        socket.set_multicast_ttl_v4(ttl)?;
    } else {
        socket.set_multicast_hops_v6(ttl)?;
    }
    socket.set_nonblocking(true)?;

    let socket: StdUdpSocket = socket.into();
    UdpSocket::from_std(socket)
}

/// M-SEARCH request for `search_target`
pub fn build_msearch(search_addr: &SocketAddr, search_target: &str) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         ST: {}\r\n\
         MX: 1\r\n\
         \r\n",
        search_addr, search_target
    )
}

/// Value of the `Location` header of an SSDP response
pub fn parse_location(response: &str) -> Option<&str> {
    response.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if !name.trim().eq_ignore_ascii_case("location") {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    })
}

/// Locations in order of first appearance, without duplicates
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocationSet {
    locations: Vec<String>,
}

impl LocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `location` unless already present; returns whether it was new
    pub fn insert(&mut self, location: &str) -> bool {
        if self.locations.iter().any(|l| l == location) {
            return false;
        }
        self.locations.push(location.to_string());
        true
    }

    /// Record the location advertised by an SSDP response, if any
    pub fn absorb_response(&mut self, response: &str) -> bool {
        parse_location(response).is_some_and(|location| self.insert(location))
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.locations
    }
}

/// Resolve every location into a device handle, concurrently, keeping input order
pub async fn resolve_locations<'a, I>(locations: I, options: &DeviceOptions) -> Vec<(String, Result<RaumfeldDevice>)>
where
    I: IntoIterator<Item = &'a str>,
{
    let pending = locations.into_iter().map(|location| async move {
        let result = RaumfeldDevice::connect_with(location, options).await;
        (location.to_string(), result)
    });

    join_all(pending).await
}

/// Sort by friendly name and keep only zones when any zone is present
pub fn select_devices(mut devices: Vec<RaumfeldDevice>) -> Vec<RaumfeldDevice> {
    // Stable sort: equal names keep discovery order
    devices.sort_by(|a, b| a.friendly_name().cmp(b.friendly_name()));

    if devices.iter().any(RaumfeldDevice::is_zone) {
        devices.retain(RaumfeldDevice::is_zone);
    } else if !devices.is_empty() {
        debug!("No zones found, returning all {} renderer(s)", devices.len());
    }

    devices
}
