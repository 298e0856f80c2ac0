use clap::Args;
use dns_server::{TcpServer, UdpServer};
use std::sync::Arc;

pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod handler;

/// Starts the DNS server, the core of the machine
#[derive(Args, Debug)]
pub struct Command;

impl Command {
    pub async fn run(&self, config: crate::config::Config) {
        tracing::info!("preparing dns server");

        let cache_service = config.cache.build().await.expect("unable to build cache service");
        let resolver = dns_resolver::IterativeResolver::new(config.resolver)
            .await
            .expect("unable to bind resolver socket");

        let sweeper_permit = permit::Permit::new();
        cache_service.start_sweeper(sweeper_permit.new_sub());

        let handler = Arc::new(handler::DnsHandler::new(Arc::new(cache_service), Arc::new(resolver)));

        let address = config.dns.address();
        tracing::info!("listening on {address} (udp+tcp)");

        let udp_server = UdpServer::new(address, handler.clone());
        let tcp_server = TcpServer::new(address, handler);

        if let Err(error) = tokio::try_join!(udp_server.run(), tcp_server.run()) {
            tracing::error!("server stopped: {error}");
        }

        sweeper_permit.revoke();
    }
}
