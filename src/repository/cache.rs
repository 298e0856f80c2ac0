use moka::future::Cache;
use std::io::Result;
use std::ops::Add;
use std::time::{Duration, SystemTime};

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_size")]
    size: u64,
    #[serde(default = "Config::default_sweep_interval_secs")]
    sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self { size: Self::default_size(), sweep_interval_secs: Self::default_sweep_interval_secs() }
    }
}

impl Config {
    pub fn default_size() -> u64 {
        10_000
    }

    pub fn default_sweep_interval_secs() -> u64 {
        30
    }
}

impl Config {
    pub async fn build(self) -> Result<MemoryCacheService> {
        Ok(MemoryCacheService::new(self.size, Duration::from_secs(self.sweep_interval_secs)))
    }
}

/// Builds the normalized key a record set or raw response is stored under,
/// the case-folded name joined with its query type.
pub fn cache_key(qname: &str, qtype: dns_proto::QueryType) -> String {
    format!("{}:{}", qname.trim_end_matches('.').to_lowercase(), qtype)
}

#[async_trait::async_trait]
pub trait CacheService {
    async fn persist(&self, qname: &str, qtype: dns_proto::QueryType, response: Vec<u8>) -> Result<()>;
    async fn request(&self, qname: &str, qtype: dns_proto::QueryType) -> Result<Option<Vec<u8>>>;
}

pub struct MemoryCacheService {
    inner: Cache<String, (SystemTime, Vec<u8>)>,
    sweep_interval: Duration,
}

impl MemoryCacheService {
    #[inline]
    fn new(size: u64, sweep_interval: Duration) -> Self {
        Self { inner: Cache::new(size), sweep_interval }
    }

    /// Spawns a background task that periodically drops expired entries, so
    /// a cache that receives no reads for a stale key doesn't hold onto it
    /// forever. Cancelled by revoking `permit`.
    pub fn start_sweeper(&self, permit: permit::Permit) -> tokio::task::JoinHandle<()> {
        let cache = self.inner.clone();
        let interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if permit.is_revoked() {
                    tracing::debug!("cache sweeper shutting down");
                    return;
                }
                let now = SystemTime::now();
                let expired: Vec<String> = cache
                    .iter()
                    .filter(|(_, (until, _))| until.duration_since(now).is_err())
                    .map(|(key, _)| key.as_ref().clone())
                    .collect();
                for key in expired {
                    cache.invalidate(&key).await;
                }
            }
        })
    }
}

#[async_trait::async_trait]
impl CacheService for MemoryCacheService {
    #[tracing::instrument(skip(self, response))]
    async fn persist(&self, qname: &str, qtype: dns_proto::QueryType, response: Vec<u8>) -> Result<()> {
        if let Some(ttl) = dns_proto::extract_ttl(&response).ok().flatten() {
            tracing::debug!("persisting with a ttl of {ttl} seconds");
            let deadline = SystemTime::now().add(Duration::new(ttl as u64, 0));
            self.inner.insert(cache_key(qname, qtype), (deadline, response)).await;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn request(&self, qname: &str, qtype: dns_proto::QueryType) -> Result<Option<Vec<u8>>> {
        let key = cache_key(qname, qtype);
        if let Some((until, response)) = self.inner.get(&key) {
            let now = SystemTime::now();
            if until.duration_since(now).is_ok() {
                tracing::debug!("found in cache");
                Ok(Some(response))
            } else {
                tracing::debug!("found in cache but expired");
                self.inner.invalidate(&key).await;
                Ok(None)
            }
        } else {
            tracing::debug!("not found in cache");
            Ok(None)
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockCacheService {
    inner: std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl MockCacheService {
    pub fn with_response(self, qname: &str, qtype: dns_proto::QueryType, response: Vec<u8>) -> Self {
        self.inner.lock().unwrap().insert(cache_key(qname, qtype), response);
        self
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl CacheService for MockCacheService {
    async fn persist(&self, qname: &str, qtype: dns_proto::QueryType, response: Vec<u8>) -> Result<()> {
        self.inner.lock().unwrap().insert(cache_key(qname, qtype), response);
        Ok(())
    }

    async fn request(&self, qname: &str, qtype: dns_proto::QueryType) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.lock().unwrap().get(&cache_key(qname, qtype)).cloned())
    }
}
