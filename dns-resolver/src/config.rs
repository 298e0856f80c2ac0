use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

/// IANA root hints (a subset of the 13 root letters), used as the starting
/// frontier for every iterative resolution.
fn default_root_servers() -> Vec<SocketAddr> {
    [
        Ipv4Addr::new(198, 41, 0, 4),   // a.root-servers.net
        Ipv4Addr::new(199, 9, 14, 201), // b.root-servers.net
        Ipv4Addr::new(192, 33, 4, 12),  // c.root-servers.net
        Ipv4Addr::new(199, 7, 91, 13),  // d.root-servers.net
        Ipv4Addr::new(192, 203, 230, 10), // e.root-servers.net
        Ipv4Addr::new(192, 5, 5, 241),  // f.root-servers.net
    ]
    .into_iter()
    .map(|ip| SocketAddr::V4(SocketAddrV4::new(ip, 53)))
    .collect()
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_address")]
    pub address: SocketAddr,
    #[serde(default = "default_root_servers")]
    pub root_servers: Vec<SocketAddr>,
    #[serde(default = "Config::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "Config::default_max_rounds")]
    pub max_rounds: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: Self::default_address(),
            root_servers: default_root_servers(),
            timeout_ms: Self::default_timeout_ms(),
            max_rounds: Self::default_max_rounds(),
        }
    }
}

impl Config {
    pub fn default_address() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(0, 0, 0, 0), 0))
    }

    pub fn default_timeout_ms() -> u64 {
        2_000
    }

    pub fn default_max_rounds() -> u32 {
        15
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
