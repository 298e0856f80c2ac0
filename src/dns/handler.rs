use super::error::HandleError;
use crate::repository::cache::{cache_key, CacheService};
use crate::repository::dedup::Deduper;
use dns_proto::QueryType;
use dns_resolver::Resolve;
use std::sync::Arc;

pub(crate) struct DnsHandler {
    cache: Arc<dyn CacheService + Send + Sync>,
    resolver: Arc<dyn Resolve + Send + Sync>,
    dedup: Deduper,
}

impl DnsHandler {
    pub fn new(cache: Arc<dyn CacheService + Send + Sync>, resolver: Arc<dyn Resolve + Send + Sync>) -> Self {
        Self { cache, resolver, dedup: Deduper::new() }
    }
}

fn patch_reply(response: &[u8], query: &[u8]) -> Result<Vec<u8>, HandleError> {
    Ok(dns_proto::patch_header(response, query)?)
}

impl DnsHandler {
    async fn try_handle(&self, query: &[u8]) -> Result<Vec<u8>, HandleError> {
        let mut reader = dns_proto::Reader::new(query);
        let header = dns_proto::decode_header(&mut reader)?;
        if header.questions == 0 {
            return Err(HandleError::NoQuestion);
        }
        let question = dns_proto::decode_question(&mut reader)?;

        if let Some(cached) = self
            .cache
            .request(&question.name, question.query_type)
            .await
            .map_err(HandleError::Cache)?
        {
            return patch_reply(&cached, query);
        }

        let key = cache_key(&question.name, question.query_type);
        let qname = question.name.clone();
        let qtype = question.query_type;
        let resolver = self.resolver.clone();

        let resolved = self.dedup.run(&key, move || async move { resolver.resolve(&qname, qtype).await }).await;

        let resp = match resolved {
            Some(Ok(resp)) => {
                if let Err(error) = self.cache.persist(&question.name, question.query_type, resp.clone()).await {
                    tracing::error!("couldn't persist in cache: {error:?}");
                }
                resp
            }
            Some(Err(error)) => return Err(HandleError::Resolve(error)),
            None => self
                .cache
                .request(&question.name, question.query_type)
                .await
                .map_err(HandleError::Cache)?
                .ok_or(HandleError::NoAnswer)?,
        };

        let reply = patch_reply(&resp, query)?;
        self.chase_cname(&question, &resp, &reply).await
    }

    /// CNAME chase: at most one additional resolve call, per the response
    /// that carried the alias. The chase target is looked up and stored in
    /// the cache under its own key, independent of the alias's own entry.
    async fn chase_cname(&self, question: &dns_proto::Question, resp: &[u8], reply: &[u8]) -> Result<Vec<u8>, HandleError> {
        if question.query_type == QueryType::Cname {
            return Ok(reply.to_vec());
        }
        let Some(target) = dns_proto::extract_cname(resp, &question.name)? else {
            return Ok(reply.to_vec());
        };

        if let Some(cached) = self.cache.request(&target, question.query_type).await.map_err(HandleError::Cache)? {
            return Ok(dns_proto::merge_responses(reply, &cached)?);
        }

        match self.resolver.resolve(&target, question.query_type).await {
            Ok(extra) => {
                if let Err(error) = self.cache.persist(&target, question.query_type, extra.clone()).await {
                    tracing::error!("couldn't persist cname chase target in cache: {error:?}");
                }
                Ok(dns_proto::merge_responses(reply, &extra)?)
            }
            Err(error) => {
                tracing::debug!("cname chase to {target} failed: {error}");
                Ok(reply.to_vec())
            }
        }
    }
}

#[async_trait::async_trait]
impl dns_server::Handler for DnsHandler {
    #[tracing::instrument(skip_all, fields(id = tracing::field::Empty))]
    async fn handle(&self, query: &[u8]) -> Option<Vec<u8>> {
        match self.try_handle(query).await {
            Ok(response) => {
                tracing::debug!("sending response");
                Some(response)
            }
            Err(HandleError::NoQuestion) => {
                tracing::debug!("no question in message, dropping");
                None
            }
            Err(error) => {
                tracing::warn!("unable to build response: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DnsHandler;
    use crate::repository::cache::{CacheService, MockCacheService};
    use dns_proto::{QueryType, Record};
    use dns_resolver::mock::MockResolver;
    use dns_server::Handler;
    use similar_asserts::assert_eq;
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    fn build_query(id: u16, name: &str, qtype: QueryType) -> Vec<u8> {
        dns_proto::build_query(id, name, qtype).unwrap()
    }

    fn response_with_a(id: u16, name: &str, ttl: u32, addr: Ipv4Addr) -> Vec<u8> {
        let mut writer = dns_proto::Writer::new();
        let header = dns_proto::Header {
            id,
            is_response: true,
            recursion_desired: true,
            recursion_available: true,
            truncated: false,
            authoritative: false,
            response_code: dns_proto::ResponseCode::NoError,
            questions: 1,
            answers: 1,
            authorities: 0,
            additional: 0,
        };
        header.write(&mut writer);
        dns_proto::Question { name: name.to_string(), query_type: QueryType::A, class: dns_proto::QueryClass::In }.write(&mut writer).unwrap();
        dns_proto::write_record(&mut writer, &Record::A { name: name.to_string(), ttl, addr }).unwrap();
        writer.into_bytes()
    }

    #[tokio::test]
    async fn should_resolve_query() {
        let query = build_query(1, "perdu.com", QueryType::A);

        let cache = Arc::new(MockCacheService::default());
        let resolver = Arc::new(
            MockResolver::default().with_response(
                "perdu.com",
                QueryType::A,
                response_with_a(10, "perdu.com", 100, Ipv4Addr::new(99, 99, 99, 99)),
            ),
        );

        let result = DnsHandler::new(cache, resolver).handle(&query).await;
        let result = result.expect("should have a message");

        let mut reader = dns_proto::Reader::new(&result);
        let header = dns_proto::decode_header(&mut reader).unwrap();
        assert_eq!(header.id, 1);
        assert_eq!(header.answers, 1);
    }

    #[tokio::test]
    async fn should_not_answer_if_not_question() {
        let mut writer = dns_proto::Writer::new();
        dns_proto::Header::query(1).write(&mut writer);
        let query = writer.into_bytes();

        let cache = Arc::new(MockCacheService::default());
        let resolver = Arc::new(MockResolver::default());
        let result = DnsHandler::new(cache, resolver).handle(&query).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_use_cache() {
        let query = build_query(1, "perdu.com", QueryType::A);

        let cache = Arc::new(MockCacheService::default().with_response(
            "perdu.com",
            QueryType::A,
            response_with_a(55, "perdu.com", 42, Ipv4Addr::new(10, 0, 0, 1)),
        ));
        let resolver = Arc::new(MockResolver::default());
        let result = DnsHandler::new(cache, resolver).handle(&query).await;
        let result = result.expect("should have a message");

        let mut reader = dns_proto::Reader::new(&result);
        let header = dns_proto::decode_header(&mut reader).unwrap();
        assert_eq!(header.id, 1);
        assert_eq!(header.answers, 1);
    }

    #[tokio::test]
    async fn should_chase_cname_once_and_cache_the_target_separately() {
        let query = build_query(1, "alias.test", QueryType::A);

        let mut alias_writer = dns_proto::Writer::new();
        let alias_header = dns_proto::Header {
            id: 10,
            is_response: true,
            recursion_desired: true,
            recursion_available: true,
            truncated: false,
            authoritative: false,
            response_code: dns_proto::ResponseCode::NoError,
            questions: 1,
            answers: 1,
            authorities: 0,
            additional: 0,
        };
        alias_header.write(&mut alias_writer);
        dns_proto::Question { name: "alias.test".into(), query_type: QueryType::A, class: dns_proto::QueryClass::In }.write(&mut alias_writer).unwrap();
        dns_proto::write_record(
            &mut alias_writer,
            &Record::Cname { name: "alias.test".into(), ttl: 60, target: "target.test".into() },
        )
        .unwrap();

        let resolver = Arc::new(
            MockResolver::default()
                .with_response("alias.test", QueryType::A, alias_writer.into_bytes())
                .with_response("target.test", QueryType::A, response_with_a(11, "target.test", 300, Ipv4Addr::new(93, 184, 216, 34))),
        );
        let cache = Arc::new(MockCacheService::default());

        let result = DnsHandler::new(cache.clone(), resolver).handle(&query).await;
        let result = result.expect("should have a message");

        let mut reader = dns_proto::Reader::new(&result);
        let header = dns_proto::decode_header(&mut reader).unwrap();
        assert_eq!(header.answers, 2, "reply should carry both the CNAME and the chased A record");

        let alias_entry = cache.request("alias.test", QueryType::A).await.unwrap();
        assert!(alias_entry.is_some(), "alias.test:A should be cached under its own key");

        let target_entry = cache.request("target.test", QueryType::A).await.unwrap();
        assert!(target_entry.is_some(), "target.test:A should be cached under its own key, independent of the alias");
    }
}
