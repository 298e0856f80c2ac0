use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

#[derive(Debug)]
pub struct Sender {
    socket: Arc<UdpSocket>,
}

impl Sender {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }

    pub async fn send(&self, address: SocketAddr, payload: &[u8]) -> std::io::Result<()> {
        tracing::debug!("sending message to {address:?}");
        self.socket.send_to(payload, address).await?;
        Ok(())
    }
}
