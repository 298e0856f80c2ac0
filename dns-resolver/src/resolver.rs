use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};

use dns_proto::{decode_header, decode_record, extract_referral, QueryType, Record, Reader};
use futures::future::{BoxFuture, FutureExt};
use tokio::net::UdpSocket;

use crate::config::Config;
use crate::error::ResolveError;

#[async_trait::async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, qname: &str, qtype: QueryType) -> Result<Vec<u8>, ResolveError>;
}

/// Walks the referral chain from the configured root hints down to an
/// authoritative answer, one UDP round-trip per hop, following glue
/// addresses where given and resolving glueless NS targets recursively.
///
/// Grounded on `RemoteLookupService`'s socket-dial shape (send, receive with
/// a deadline) generalized from a single fixed upstream into a walking
/// frontier, in the style of a recursive resolver's seen-set/depth
/// recursion. Dials a fresh socket per attempt rather than sharing one
/// across concurrent client requests, so one request's `recv_from` can
/// never be handed another request's (or a spoofed) datagram.
pub struct IterativeResolver {
    config: Config,
    next_id: AtomicU16,
}

impl IterativeResolver {
    pub async fn new(config: Config) -> std::io::Result<Self> {
        // Bind once up front purely to fail fast on an unusable config;
        // the socket itself is discarded, every query dials its own.
        UdpSocket::bind(config.address).await?;
        Ok(Self { config, next_id: AtomicU16::new(0) })
    }

    #[tracing::instrument(skip(self))]
    async fn query_one(&self, server: SocketAddr, qname: &str, qtype: QueryType) -> Result<Vec<u8>, ResolveError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let query = dns_proto::build_query(id, qname, qtype)
            .map_err(|_| ResolveError::Transport(std::io::Error::new(std::io::ErrorKind::InvalidInput, "name too long")))?;

        let socket = UdpSocket::bind(self.config.address).await?;
        socket.send_to(&query, server).await?;

        let response = tokio::time::timeout(self.config.timeout(), async {
            loop {
                let mut buf = vec![0u8; 4096];
                let (size, from) = socket.recv_from(&mut buf).await?;
                buf.truncate(size);

                if from != server {
                    tracing::debug!("dropping datagram from {from}, expected {server}");
                    continue;
                }
                if buf.get(0..2).map(|b| u16::from_be_bytes([b[0], b[1]])) != Some(id) {
                    tracing::debug!("dropping datagram with mismatched transaction id from {from}");
                    continue;
                }

                return Ok::<_, std::io::Error>(buf);
            }
        })
        .await
        .map_err(|_| ResolveError::Transport(std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out")))??;

        tracing::debug!("received {} bytes from {server}", response.len());
        Ok(response)
    }

    fn resolve_at<'a>(
        &'a self,
        qname: &'a str,
        qtype: QueryType,
        frontier: Vec<SocketAddr>,
        depth: u32,
    ) -> BoxFuture<'a, Result<Vec<u8>, ResolveError>> {
        async move {
            if depth >= self.config.max_rounds {
                return Err(ResolveError::DepthExceeded);
            }

            for server in &frontier {
                let response = match self.query_one(*server, qname, qtype).await {
                    Ok(response) => response,
                    Err(error) => {
                        tracing::debug!("{server} did not answer: {error}");
                        continue;
                    }
                };

                let header = match decode_header(&mut Reader::new(&response)) {
                    Ok(header) => header,
                    Err(_) => continue,
                };

                if header.answers > 0 {
                    return Ok(response);
                }

                let referral = match extract_referral(&response) {
                    Ok(referral) => referral,
                    Err(_) => continue,
                };
                if referral.nameservers.is_empty() && referral.glue.is_empty() {
                    // No further delegation possible; the response (e.g. an
                    // authoritative NXDOMAIN) is the final answer as-is.
                    return Ok(response);
                }
                if referral.nameservers.is_empty() {
                    continue;
                }

                let mut next_frontier = Vec::new();
                for ns in &referral.nameservers {
                    if let Some(addrs) = referral.glue.get(ns) {
                        next_frontier.extend(addrs.iter().map(|ip| SocketAddr::new(*ip, 53)));
                        continue;
                    }
                    if let Ok(ns_response) =
                        self.resolve_at(ns, QueryType::A, self.config.root_servers.clone(), depth + 1).await
                    {
                        if let Some(addr) = first_a_address(&ns_response) {
                            next_frontier.push(SocketAddr::new(addr.into(), 53));
                        }
                    }
                }

                if next_frontier.is_empty() {
                    continue;
                }
                return self.resolve_at(qname, qtype, next_frontier, depth + 1).await;
            }

            Err(ResolveError::NoAnswer)
        }
        .boxed()
    }
}

fn first_a_address(buf: &[u8]) -> Option<std::net::Ipv4Addr> {
    let mut reader = Reader::new(buf);
    let header = decode_header(&mut reader).ok()?;
    for _ in 0..header.questions {
        reader.read_name().ok()?;
        reader.step(4).ok()?;
    }
    for _ in 0..header.answers {
        if let Ok(Record::A { addr, .. }) = decode_record(buf, &mut reader) {
            return Some(addr);
        }
    }
    None
}

#[async_trait::async_trait]
impl Resolve for IterativeResolver {
    async fn resolve(&self, qname: &str, qtype: QueryType) -> Result<Vec<u8>, ResolveError> {
        self.resolve_at(qname, qtype, self.config.root_servers.clone(), 0).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    async fn spawn_fake_server<F>(respond: F) -> SocketAddr
    where
        F: Fn(u16) -> Vec<u8> + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];
            loop {
                let Ok((size, from)) = socket.recv_from(&mut buf).await else { return };
                let id = u16::from_be_bytes([buf[0], buf[1]]);
                let _ = size;
                let response = respond(id);
                let _ = socket.send_to(&response, from).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn returns_terminal_response_with_no_referral_as_is() {
        let server = spawn_fake_server(|id| {
            let mut writer = dns_proto::Writer::new();
            let header = dns_proto::Header {
                id,
                is_response: true,
                recursion_desired: true,
                recursion_available: true,
                truncated: false,
                authoritative: true,
                response_code: dns_proto::ResponseCode::NxDomain,
                questions: 1,
                answers: 0,
                authorities: 0,
                additional: 0,
            };
            header.write(&mut writer);
            dns_proto::Question { name: "nx.example".into(), query_type: QueryType::A, class: dns_proto::QueryClass::In }
                .write(&mut writer)
                .unwrap();
            writer.into_bytes()
        })
        .await;

        let config = Config {
            address: "127.0.0.1:0".parse().unwrap(),
            root_servers: vec![server],
            timeout_ms: 500,
            max_rounds: 15,
        };
        let resolver = IterativeResolver::new(config).await.unwrap();

        let response = resolver.resolve("nx.example", QueryType::A).await.unwrap();
        let header = decode_header(&mut Reader::new(&response)).unwrap();
        assert_eq!(header.response_code, dns_proto::ResponseCode::NxDomain);
        assert_eq!(header.answers, 0);
    }

    #[test]
    fn first_a_address_reads_answer() {
        let mut writer = dns_proto::Writer::new();
        let header = dns_proto::Header {
            id: 1,
            is_response: true,
            recursion_desired: false,
            recursion_available: false,
            truncated: false,
            authoritative: false,
            response_code: dns_proto::ResponseCode::NoError,
            questions: 1,
            answers: 1,
            authorities: 0,
            additional: 0,
        };
        header.write(&mut writer);
        dns_proto::Question { name: "a.iana-servers.net".into(), query_type: QueryType::A, class: dns_proto::QueryClass::In }
            .write(&mut writer)
            .unwrap();
        dns_proto::write_record(
            &mut writer,
            &Record::A {
                name: "a.iana-servers.net".into(),
                ttl: 3600,
                addr: std::net::Ipv4Addr::new(199, 43, 135, 53),
            },
        )
        .unwrap();

        let addr = first_a_address(&writer.into_bytes());
        assert_eq!(addr, Some(std::net::Ipv4Addr::new(199, 43, 135, 53)));
    }
}
