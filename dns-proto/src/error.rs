use std::fmt::Display;

/// Raised by any offset-bounds-checked read over a message buffer.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before a fixed-size field or header could be read.
    Truncated,
    /// A name's compression pointers formed a loop or exceeded the jump cap.
    MalformedName,
    /// A resource record's fixed fields or RDLENGTH did not fit the buffer.
    MalformedRr,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated => write!(f, "buffer ended before a fixed field could be read"),
            Self::MalformedName => write!(f, "name compression pointers are malformed or cyclic"),
            Self::MalformedRr => write!(f, "resource record fields do not fit the buffer"),
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug)]
pub enum EncodeError {
    /// A single label exceeded the 63-byte limit imposed by RFC 1035.
    LabelTooLong,
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LabelTooLong => write!(f, "a single label exceeds 63 bytes"),
        }
    }
}

impl std::error::Error for EncodeError {}
