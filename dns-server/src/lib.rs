use futures::stream::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

pub mod prelude;
pub mod receiver;
pub mod sender;
pub mod tcp;

pub use tcp::TcpServer;

/// Decodes a raw query and encodes a raw response, shared by both the UDP
/// and TCP transports. Returning `None` tells the transport to drop the
/// query rather than reply (an undecodable or question-less message).
#[async_trait::async_trait]
pub trait Handler {
    async fn handle(&self, query: &[u8]) -> Option<Vec<u8>>;
}

#[async_trait::async_trait]
impl<H: Handler + Send + Sync> Handler for Arc<H> {
    async fn handle(&self, query: &[u8]) -> Option<Vec<u8>> {
        (**self).handle(query).await
    }
}

pub struct UdpServer<H> {
    address: SocketAddr,
    handler: H,
}

impl<H: Handler> UdpServer<H> {
    pub fn new(address: SocketAddr, handler: H) -> Self {
        Self { address, handler }
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let socket = UdpSocket::bind(self.address).await?;
        let socket = Arc::new(socket);

        let receiver = receiver::Receiver::new(socket.clone());
        let sender = sender::Sender::new(socket);

        let stream = receiver
            .into_stream()
            .map(|item| async move {
                let response = self.handler.handle(&item.payload).await;
                (item.address, response)
            })
            .buffer_unordered(64);

        tokio::pin!(stream);

        while let Some((address, response)) = stream.next().await {
            let Some(response) = response else { continue };
            if let Err(error) = sender.send(address, &response).await {
                tracing::error!("couldn't send message to {address:?}: {error:?}");
            }
        }

        Ok(())
    }
}
