use std::net::{Ipv4Addr, Ipv6Addr};

use crate::buffer::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::question::QueryType;

/// The fixed fields common to every resource record, with the cursor left
/// positioned at `rdata_start` having already stepped past RDATA. Used by
/// [`crate::ops`] to walk a record section without decoding every record's
/// payload, and by [`decode_record`] to then decode the ones it cares about.
#[derive(Debug, Clone)]
pub struct RrHeader {
    pub name: String,
    pub query_type: QueryType,
    pub ttl: u32,
    pub rdata_start: usize,
    pub rdata_len: usize,
}

pub fn read_rr_header(reader: &mut Reader<'_>) -> Result<RrHeader, DecodeError> {
    let name = reader.read_name()?;
    let query_type = QueryType::from_u16(reader.read_u16()?);
    let _class = reader.read_u16()?;
    let ttl = reader.read_u32()?;
    let rdlength = reader.read_u16()? as usize;
    let rdata_start = reader.pos();
    reader.step(rdlength).map_err(|_| DecodeError::MalformedRr)?;
    Ok(RrHeader { name, query_type, ttl, rdata_start, rdata_len: rdlength })
}

/// Record payloads this codec understands structurally. Used to build test
/// fixtures and for records the resolver inspects (A, NS, CNAME, AAAA);
/// `Unknown` carries the raw bytes for every other type so records can still
/// be re-emitted unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    A { name: String, ttl: u32, addr: Ipv4Addr },
    Ns { name: String, ttl: u32, target: String },
    Cname { name: String, ttl: u32, target: String },
    Mx { name: String, ttl: u32, priority: u16, exchange: String },
    Aaaa { name: String, ttl: u32, addr: Ipv6Addr },
    Unknown { name: String, ttl: u32, query_type: u16, data: Vec<u8> },
}

impl Record {
    pub fn name(&self) -> &str {
        match self {
            Self::A { name, .. }
            | Self::Ns { name, .. }
            | Self::Cname { name, .. }
            | Self::Mx { name, .. }
            | Self::Aaaa { name, .. }
            | Self::Unknown { name, .. } => name,
        }
    }

    pub fn ttl(&self) -> u32 {
        match self {
            Self::A { ttl, .. }
            | Self::Ns { ttl, .. }
            | Self::Cname { ttl, .. }
            | Self::Mx { ttl, .. }
            | Self::Aaaa { ttl, .. }
            | Self::Unknown { ttl, .. } => *ttl,
        }
    }
}

pub fn decode_record(buf: &[u8], reader: &mut Reader<'_>) -> Result<Record, DecodeError> {
    let header = read_rr_header(reader)?;
    let mut rdata = Reader::at(buf, header.rdata_start);

    let record = match header.query_type {
        QueryType::A => {
            if header.rdata_len != 4 {
                return Err(DecodeError::MalformedRr);
            }
            let raw = rdata.read_u32()?;
            Record::A { name: header.name, ttl: header.ttl, addr: Ipv4Addr::from(raw) }
        }
        QueryType::Aaaa => {
            if header.rdata_len != 16 {
                return Err(DecodeError::MalformedRr);
            }
            let mut octets = [0u8; 16];
            for octet in octets.iter_mut() {
                *octet = rdata.read_u8()?;
            }
            Record::Aaaa { name: header.name, ttl: header.ttl, addr: Ipv6Addr::from(octets) }
        }
        QueryType::Ns => {
            let target = rdata.read_name()?;
            Record::Ns { name: header.name, ttl: header.ttl, target }
        }
        QueryType::Cname => {
            let target = rdata.read_name()?;
            Record::Cname { name: header.name, ttl: header.ttl, target }
        }
        QueryType::Mx => {
            let priority = rdata.read_u16()?;
            let exchange = rdata.read_name()?;
            Record::Mx { name: header.name, ttl: header.ttl, priority, exchange }
        }
        QueryType::Unknown(num) => {
            let data = buf
                .get(header.rdata_start..header.rdata_start + header.rdata_len)
                .ok_or(DecodeError::Truncated)?
                .to_vec();
            Record::Unknown { name: header.name, ttl: header.ttl, query_type: num, data }
        }
    };

    Ok(record)
}

/// Re-encodes a decoded record fresh, without compression, used by
/// `ops::merge_responses` to splice records from one message into another
/// where the original compression pointers would no longer resolve.
pub fn write_record(writer: &mut Writer, record: &Record) -> Result<(), EncodeError> {
    let (name, ttl, query_type) = match record {
        Record::A { name, ttl, .. } => (name, *ttl, QueryType::A),
        Record::Ns { name, ttl, .. } => (name, *ttl, QueryType::Ns),
        Record::Cname { name, ttl, .. } => (name, *ttl, QueryType::Cname),
        Record::Mx { name, ttl, .. } => (name, *ttl, QueryType::Mx),
        Record::Aaaa { name, ttl, .. } => (name, *ttl, QueryType::Aaaa),
        Record::Unknown { name, ttl, query_type, .. } => (name, *ttl, QueryType::Unknown(*query_type)),
    };

    writer.write_name(name)?;
    writer.write_u16(query_type.as_u16());
    writer.write_u16(1);
    writer.write_u32(ttl);

    let rdlength_pos = writer.pos();
    writer.write_u16(0);
    let rdata_start = writer.pos();
    match record {
        Record::A { addr, .. } => writer.write_bytes(&addr.octets()),
        Record::Aaaa { addr, .. } => writer.write_bytes(&addr.octets()),
        Record::Ns { target, .. } => writer.write_name(target)?,
        Record::Cname { target, .. } => writer.write_name(target)?,
        Record::Mx { priority, exchange, .. } => {
            writer.write_u16(*priority);
            writer.write_name(exchange)?;
        }
        Record::Unknown { data, .. } => writer.write_bytes(data),
    }
    let rdlength = (writer.pos() - rdata_start) as u16;
    writer.set_u16(rdlength_pos, rdlength);
    Ok(())
}
