use std::collections::HashMap;

use dns_proto::QueryType;

use crate::error::ResolveError;
use crate::resolver::Resolve;

#[derive(Debug, Default)]
pub struct MockResolver {
    inner: HashMap<(String, QueryType), Vec<u8>>,
}

impl MockResolver {
    pub fn with_response(mut self, qname: &str, qtype: QueryType, response: Vec<u8>) -> Self {
        self.inner.insert((qname.to_string(), qtype), response);
        self
    }
}

#[async_trait::async_trait]
impl Resolve for MockResolver {
    async fn resolve(&self, qname: &str, qtype: QueryType) -> Result<Vec<u8>, ResolveError> {
        self.inner.get(&(qname.to_string(), qtype)).cloned().ok_or(ResolveError::NoAnswer)
    }
}
