use std::fmt::Display;

#[derive(Debug)]
pub enum HandleError {
    Cache(std::io::Error),
    Resolve(dns_resolver::ResolveError),
    Decode(dns_proto::DecodeError),
    Encode(dns_proto::EncodeError),
    NoQuestion,
    /// A waiter woke up after a dedup'd lookup completed but found nothing
    /// in the cache, meaning the pioneer's lookup itself failed.
    NoAnswer,
}

impl Display for HandleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache(err) => write!(f, "cache error: {err}"),
            Self::Resolve(err) => write!(f, "resolve error: {err}"),
            Self::Decode(err) => write!(f, "decode error: {err}"),
            Self::Encode(err) => write!(f, "encode error: {err}"),
            Self::NoQuestion => write!(f, "message carried no question"),
            Self::NoAnswer => write!(f, "in-flight lookup produced no cached answer"),
        }
    }
}

impl std::error::Error for HandleError {}

impl From<dns_resolver::ResolveError> for HandleError {
    fn from(value: dns_resolver::ResolveError) -> Self {
        Self::Resolve(value)
    }
}

impl From<dns_proto::DecodeError> for HandleError {
    fn from(value: dns_proto::DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<dns_proto::EncodeError> for HandleError {
    fn from(value: dns_proto::EncodeError) -> Self {
        Self::Encode(value)
    }
}
