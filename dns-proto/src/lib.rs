pub mod buffer;
pub mod error;
pub mod header;
pub mod ops;
pub mod question;
pub mod record;

pub use buffer::{Reader, Writer};
pub use error::{DecodeError, EncodeError};
pub use header::{decode_header, Header, ResponseCode};
pub use ops::{build_query, extract_cname, extract_referral, extract_ttl, merge_responses, patch_header, Referral};
pub use question::{decode_question, Question, QueryClass, QueryType};
pub use record::{decode_record, read_rr_header, write_record, Record, RrHeader};
