use std::fmt::Display;

#[derive(Debug)]
pub enum ResolveError {
    /// Sending a query or reading a response from an upstream server failed.
    Transport(std::io::Error),
    /// The referral chain exceeded the configured round cap without reaching
    /// an answer.
    DepthExceeded,
    /// Every frontier nameserver was tried and none produced an answer.
    NoAnswer,
    /// A response from an upstream server did not parse.
    Malformed(dns_proto::DecodeError),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::DepthExceeded => write!(f, "referral chain exceeded the round cap"),
            Self::NoAnswer => write!(f, "no upstream server produced an answer"),
            Self::Malformed(err) => write!(f, "malformed upstream response: {err}"),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<std::io::Error> for ResolveError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err)
    }
}

impl From<dns_proto::DecodeError> for ResolveError {
    fn from(err: dns_proto::DecodeError) -> Self {
        Self::Malformed(err)
    }
}
