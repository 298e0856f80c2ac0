//! Byte-level operations the resolver and cache drive directly, without ever
//! materializing a full message into a record graph. Each function walks a
//! message with a [`Reader`] and touches only the bytes it needs, preserving
//! everything else unmodified.

use std::collections::HashMap;
use std::net::IpAddr;

use crate::buffer::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::header::{decode_header, Header};
use crate::question::{Question, QueryClass, QueryType};
use crate::record::{decode_record, read_rr_header, write_record, Record};

/// Builds a fresh outgoing query message: header with `RD` set and a single
/// question, nothing else.
pub fn build_query(id: u16, name: &str, query_type: QueryType) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new();
    Header::query(id).write(&mut writer);
    Question { name: name.to_string(), query_type, class: QueryClass::In }.write(&mut writer)?;
    Ok(writer.into_bytes())
}

/// RFC 1035 §4.1.1 byte offsets within the 12-byte header.
const FLAGS_HI: usize = 2;
const FLAGS_LO: usize = 3;
const AA_BIT: u8 = 0x04;
const RD_BIT: u8 = 0x01;
const RA_BIT: u8 = 0x80;

/// Rewrites an upstream response into the sole reply a client ever sees:
/// the client's own transaction ID, AA cleared (this server never answers
/// authoritatively), RA set (it does recurse on the client's behalf), and
/// RD mirroring whatever the client asked for. Every other byte — answers,
/// authorities, additional, RCODE — is carried over untouched.
pub fn patch_header(upstream_response: &[u8], client_request: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if upstream_response.len() < Header::LEN || client_request.len() < Header::LEN {
        return Err(DecodeError::Truncated);
    }

    let client_rd = client_request[FLAGS_HI] & RD_BIT != 0;

    let mut out = upstream_response.to_vec();
    out[0] = client_request[0];
    out[1] = client_request[1];

    out[FLAGS_HI] &= !AA_BIT;
    out[FLAGS_HI] &= !RD_BIT;
    if client_rd {
        out[FLAGS_HI] |= RD_BIT;
    }
    out[FLAGS_LO] |= RA_BIT;

    Ok(out)
}

fn skip_questions(reader: &mut Reader<'_>, count: u16) -> Result<(), DecodeError> {
    for _ in 0..count {
        reader.read_name()?;
        reader.step(4)?; // qtype + qclass
    }
    Ok(())
}

/// Returns the minimum TTL across a response's answer records, or `None` if
/// it has no answers (a referral or an empty NXDOMAIN has nothing to cache).
pub fn extract_ttl(buf: &[u8]) -> Result<Option<u32>, DecodeError> {
    let mut reader = Reader::new(buf);
    let header = decode_header(&mut reader)?;
    skip_questions(&mut reader, header.questions)?;

    let mut min_ttl = None;
    for _ in 0..header.answers {
        let rr = read_rr_header(&mut reader)?;
        min_ttl = Some(min_ttl.map_or(rr.ttl, |current: u32| current.min(rr.ttl)));
    }
    Ok(min_ttl)
}

/// Returns the target of the CNAME record owned by `owner` in the answer
/// section, if any. Matching on the owner name (rather than returning the
/// first CNAME present) is what lets a caller walk a multi-hop alias chain
/// correctly instead of re-finding the same record at every hop.
pub fn extract_cname(buf: &[u8], owner: &str) -> Result<Option<String>, DecodeError> {
    let owner = owner.trim_end_matches('.').to_lowercase();
    let mut reader = Reader::new(buf);
    let header = decode_header(&mut reader)?;
    skip_questions(&mut reader, header.questions)?;

    for _ in 0..header.answers {
        if let Record::Cname { name, target, .. } = decode_record(buf, &mut reader)? {
            if name.trim_end_matches('.').to_lowercase() == owner {
                return Ok(Some(target));
            }
        }
    }
    Ok(None)
}

/// Nameservers and glue addresses carried in a referral response's authority
/// and additional sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Referral {
    pub nameservers: Vec<String>,
    pub glue: HashMap<String, Vec<IpAddr>>,
}

/// Extracts the NS/glue referral from a delegation response, skipping over
/// the answer section (normally empty for a pure referral) without decoding
/// it.
pub fn extract_referral(buf: &[u8]) -> Result<Referral, DecodeError> {
    let mut reader = Reader::new(buf);
    let header = decode_header(&mut reader)?;
    skip_questions(&mut reader, header.questions)?;

    for _ in 0..header.answers {
        read_rr_header(&mut reader)?;
    }

    let mut nameservers = Vec::new();
    for _ in 0..header.authorities {
        if let Record::Ns { target, .. } = decode_record(buf, &mut reader)? {
            nameservers.push(target);
        }
    }

    let mut glue: HashMap<String, Vec<IpAddr>> = HashMap::new();
    for _ in 0..header.additional {
        match decode_record(buf, &mut reader)? {
            Record::A { name, addr, .. } => glue.entry(name).or_default().push(IpAddr::V4(addr)),
            Record::Aaaa { name, addr, .. } => glue.entry(name).or_default().push(IpAddr::V6(addr)),
            _ => {}
        }
    }

    Ok(Referral { nameservers, glue })
}

/// Splices the answer records of `extra` (the CNAME target's response) onto
/// `base` (the response carrying the alias), bumping ANCOUNT and leaving
/// `base`'s header, question and authority/additional sections untouched.
/// `extra`'s records are re-encoded fresh since their compression pointers
/// are only valid relative to `extra`'s own buffer.
pub fn merge_responses(base: &[u8], extra: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut extra_reader = Reader::new(extra);
    let extra_header = decode_header(&mut extra_reader)?;
    skip_questions(&mut extra_reader, extra_header.questions)?;

    let mut extra_records = Vec::with_capacity(extra_header.answers as usize);
    for _ in 0..extra_header.answers {
        extra_records.push(decode_record(extra, &mut extra_reader)?);
    }

    let mut base_reader = Reader::new(base);
    let base_header = decode_header(&mut base_reader)?;
    skip_questions(&mut base_reader, base_header.questions)?;
    for _ in 0..base_header.answers {
        read_rr_header(&mut base_reader)?;
    }
    let answers_end = base_reader.pos();

    let mut merged = Vec::with_capacity(base.len() + extra.len());
    merged.extend_from_slice(&base[..answers_end]);

    let mut writer = Writer::new();
    for record in &extra_records {
        write_record(&mut writer, record).map_err(|_| DecodeError::MalformedRr)?;
    }
    merged.extend_from_slice(writer.bytes());
    merged.extend_from_slice(&base[answers_end..]);

    let new_answers = base_header.answers + extra_records.len() as u16;
    merged[6] = (new_answers >> 8) as u8;
    merged[7] = (new_answers & 0xFF) as u8;

    Ok(merged)
}
