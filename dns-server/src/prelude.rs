use std::net::SocketAddr;

/// A UDP datagram as received, trimmed to its actual size.
pub struct Message {
    pub address: SocketAddr,
    pub payload: Vec<u8>,
}
