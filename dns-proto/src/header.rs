use crate::buffer::{Reader, Writer};
use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl ResponseCode {
    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => Self::NoError,
            1 => Self::FormErr,
            2 => Self::ServFail,
            3 => Self::NxDomain,
            4 => Self::NotImp,
            5 => Self::Refused,
            other => Self::Other(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::NoError => 0,
            Self::FormErr => 1,
            Self::ServFail => 2,
            Self::NxDomain => 3,
            Self::NotImp => 4,
            Self::Refused => 5,
            Self::Other(v) => v,
        }
    }
}

/// The fixed 12-byte DNS message header (RFC 1035 §4.1.1).
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub id: u16,
    pub is_response: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub truncated: bool,
    pub authoritative: bool,
    pub response_code: ResponseCode,
    pub questions: u16,
    pub answers: u16,
    pub authorities: u16,
    pub additional: u16,
}

impl Header {
    pub const LEN: usize = 12;

    pub fn query(id: u16) -> Self {
        Self {
            id,
            is_response: false,
            recursion_desired: true,
            recursion_available: false,
            truncated: false,
            authoritative: false,
            response_code: ResponseCode::NoError,
            questions: 1,
            answers: 0,
            authorities: 0,
            additional: 0,
        }
    }

    pub fn write(&self, writer: &mut Writer) {
        writer.write_u16(self.id);

        let mut flags_hi = 0u8;
        if self.is_response {
            flags_hi |= 0x80;
        }
        // opcode (bits 3-6) is always standard query (0) for traffic we emit
        if self.authoritative {
            flags_hi |= 0x04;
        }
        if self.truncated {
            flags_hi |= 0x02;
        }
        if self.recursion_desired {
            flags_hi |= 0x01;
        }
        writer.write_u8(flags_hi);

        let mut flags_lo = self.response_code.as_u8() & 0x0F;
        if self.recursion_available {
            flags_lo |= 0x80;
        }
        writer.write_u8(flags_lo);

        writer.write_u16(self.questions);
        writer.write_u16(self.answers);
        writer.write_u16(self.authorities);
        writer.write_u16(self.additional);
    }
}

pub fn decode_header(reader: &mut Reader<'_>) -> Result<Header, DecodeError> {
    let id = reader.read_u16()?;
    let flags_hi = reader.read_u8()?;
    let flags_lo = reader.read_u8()?;
    let questions = reader.read_u16()?;
    let answers = reader.read_u16()?;
    let authorities = reader.read_u16()?;
    let additional = reader.read_u16()?;

    Ok(Header {
        id,
        is_response: (flags_hi & 0x80) != 0,
        authoritative: (flags_hi & 0x04) != 0,
        truncated: (flags_hi & 0x02) != 0,
        recursion_desired: (flags_hi & 0x01) != 0,
        recursion_available: (flags_lo & 0x80) != 0,
        response_code: ResponseCode::from_u8(flags_lo & 0x0F),
        questions,
        answers,
        authorities,
        additional,
    })
}
