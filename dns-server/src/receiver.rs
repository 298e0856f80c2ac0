use crate::prelude::Message;
use async_stream::stream;
use futures_core::stream::Stream;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Datagrams larger than a bare 512-byte response are possible once a
/// referral carries several NS/glue records, so the read buffer is sized
/// well above the historical minimum rather than the teacher's 512.
const MAX_DATAGRAM: usize = 4096;

#[derive(Debug)]
pub struct Receiver {
    socket: Arc<UdpSocket>,
}

impl Receiver {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }

    async fn receive(&self) -> std::io::Result<Message> {
        let mut buffer = [0u8; MAX_DATAGRAM];
        let (size, address) = self.socket.recv_from(&mut buffer).await?;
        Ok(Message { address, payload: buffer[..size].to_vec() })
    }

    pub fn into_stream(self) -> impl Stream<Item = Message> {
        stream! {
            while let Ok(message) = self.receive().await {
                tracing::debug!("received message from {:?}", message.address);
                yield message;
            }
        }
    }
}
