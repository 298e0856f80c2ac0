use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::Handler;

/// TCP transport for responses too large for a bare UDP datagram (RFC 1035
/// §4.2.2), framed with a 2-byte big-endian length prefix.
///
/// The Go original this was ported from read the prefix and then issued a
/// single `Read` for the payload, silently returning a truncated message
/// whenever the kernel handed back the bytes in more than one chunk. Both
/// reads here loop until the requested number of bytes has actually
/// arrived, or the connection closes.
pub struct TcpServer<H> {
    address: SocketAddr,
    handler: Arc<H>,
}

impl<H: Handler + Send + Sync + 'static> TcpServer<H> {
    pub fn new(address: SocketAddr, handler: Arc<H>) -> Self {
        Self { address, handler }
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.address).await?;

        loop {
            let (stream, peer) = listener.accept().await?;
            let handler = self.handler.clone();
            tokio::spawn(async move {
                if let Err(error) = serve_connection(stream, &*handler).await {
                    tracing::debug!("tcp connection with {peer:?} ended: {error}");
                }
            });
        }
    }
}

async fn read_exact_loop<R: AsyncReadExt + Unpin>(stream: &mut R, buf: &mut [u8]) -> std::io::Result<()> {
    let mut read = 0;
    while read < buf.len() {
        let n = stream.read(&mut buf[read..]).await?;
        if n == 0 {
            return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed mid-message"));
        }
        read += n;
    }
    Ok(())
}

async fn serve_connection<H: Handler>(mut stream: TcpStream, handler: &H) -> std::io::Result<()> {
    loop {
        let mut len_prefix = [0u8; 2];
        if let Err(error) = read_exact_loop(&mut stream, &mut len_prefix).await {
            if error.kind() == std::io::ErrorKind::UnexpectedEof {
                return Ok(());
            }
            return Err(error);
        }
        let len = u16::from_be_bytes(len_prefix) as usize;

        let mut payload = vec![0u8; len];
        read_exact_loop(&mut stream, &mut payload).await?;

        match handler.handle(&payload).await {
            Some(response) => {
                let len = u16::try_from(response.len())
                    .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "response too large for tcp framing"))?;
                stream.write_all(&len.to_be_bytes()).await?;
                stream.write_all(&response).await?;
            }
            None => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait::async_trait]
    impl Handler for EchoHandler {
        async fn handle(&self, query: &[u8]) -> Option<Vec<u8>> {
            if query == b"drop" {
                None
            } else {
                Some(query.to_vec())
            }
        }
    }

    async fn spawn_server() -> SocketAddr {
        let server = TcpServer::new("127.0.0.1:0".parse().unwrap(), Arc::new(EchoHandler));
        let listener = TcpListener::bind(server.address).await.unwrap();
        let address = listener.local_addr().unwrap();
        let handler = server.handler;
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let handler = handler.clone();
                tokio::spawn(async move {
                    let _ = serve_connection(stream, &*handler).await;
                });
            }
        });
        address
    }

    async fn roundtrip(stream: &mut TcpStream, payload: &[u8]) -> Vec<u8> {
        let len = u16::try_from(payload.len()).unwrap();
        stream.write_all(&len.to_be_bytes()).await.unwrap();
        stream.write_all(payload).await.unwrap();

        let mut len_prefix = [0u8; 2];
        read_exact_loop(stream, &mut len_prefix).await.unwrap();
        let len = u16::from_be_bytes(len_prefix) as usize;
        let mut response = vec![0u8; len];
        read_exact_loop(stream, &mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn echoes_a_single_message() {
        let address = spawn_server().await;
        let mut stream = TcpStream::connect(address).await.unwrap();

        let response = roundtrip(&mut stream, b"hello").await;
        assert_eq!(response, b"hello");
    }

    #[tokio::test]
    async fn reuses_the_connection_for_multiple_messages() {
        let address = spawn_server().await;
        let mut stream = TcpStream::connect(address).await.unwrap();

        assert_eq!(roundtrip(&mut stream, b"one").await, b"one");
        assert_eq!(roundtrip(&mut stream, b"two").await, b"two");
    }

    #[tokio::test]
    async fn closes_connection_when_handler_drops_query() {
        let address = spawn_server().await;
        let mut stream = TcpStream::connect(address).await.unwrap();

        stream.write_all(&4u16.to_be_bytes()).await.unwrap();
        stream.write_all(b"drop").await.unwrap();

        let mut len_prefix = [0u8; 2];
        let result = read_exact_loop(&mut stream, &mut len_prefix).await;
        assert!(result.is_err(), "server should close the connection instead of replying");
    }

    #[tokio::test]
    async fn read_exact_loop_assembles_short_reads() {
        let (mut client, mut server) = tokio::io::duplex(4);

        let writer = tokio::spawn(async move {
            for chunk in [b"ab".as_slice(), b"cd".as_slice(), b"ef".as_slice()] {
                client.write_all(chunk).await.unwrap();
            }
        });

        let mut buf = [0u8; 6];
        read_exact_loop(&mut server, &mut buf).await.unwrap();
        assert_eq!(&buf, b"abcdef");
        writer.await.unwrap();
    }
}
