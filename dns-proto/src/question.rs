use crate::buffer::{Reader, Writer};
use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    A,
    Ns,
    Cname,
    Mx,
    Aaaa,
    Unknown(u16),
}

impl QueryType {
    pub fn from_u16(num: u16) -> Self {
        match num {
            1 => Self::A,
            2 => Self::Ns,
            5 => Self::Cname,
            15 => Self::Mx,
            28 => Self::Aaaa,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::A => 1,
            Self::Ns => 2,
            Self::Cname => 5,
            Self::Mx => 15,
            Self::Aaaa => 28,
            Self::Unknown(num) => num,
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::Ns => write!(f, "NS"),
            Self::Cname => write!(f, "CNAME"),
            Self::Mx => write!(f, "MX"),
            Self::Aaaa => write!(f, "AAAA"),
            Self::Unknown(num) => write!(f, "TYPE{num}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryClass {
    In,
    Unknown(u16),
}

impl QueryClass {
    pub fn from_u16(num: u16) -> Self {
        match num {
            1 => Self::In,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::In => 1,
            Self::Unknown(num) => num,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub query_type: QueryType,
    pub class: QueryClass,
}

impl Question {
    pub fn write(&self, writer: &mut Writer) -> Result<(), crate::error::EncodeError> {
        writer.write_name(&self.name)?;
        writer.write_u16(self.query_type.as_u16());
        writer.write_u16(self.class.as_u16());
        Ok(())
    }
}

pub fn decode_question(reader: &mut Reader<'_>) -> Result<Question, DecodeError> {
    let name = reader.read_name()?;
    let query_type = QueryType::from_u16(reader.read_u16()?);
    let class = QueryClass::from_u16(reader.read_u16()?);
    Ok(Question { name, query_type, class })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_roundtrips() {
        let question = Question { name: "example.com".into(), query_type: QueryType::Aaaa, class: QueryClass::In };
        let mut writer = Writer::new();
        question.write(&mut writer).unwrap();
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        let decoded = decode_question(&mut reader).unwrap();
        assert_eq!(decoded, question);
    }
}
