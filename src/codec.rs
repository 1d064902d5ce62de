//! Versioned binary encoding of [`Value`]s.
//!
//! Payload: version byte, then one tagged value. Integers and float bits are
//! big-endian at their own width. Strings, byte strings and names are a u32
//! big-endian length followed by the raw bytes. A record is its name, a u32
//! field count, then each field name followed by the field value.
//!
//! The same encoding is the canonical form of map keys, so equal keys always
//! produce equal bytes.

use crate::value::{Record, Value};

pub const VERSION: u8 = 1;

const MAX_DEPTH: usize = 64;

mod tag {
    pub const BOOL: u8 = 0x00;
    pub const I8: u8 = 0x01;
    pub const I16: u8 = 0x02;
    pub const I32: u8 = 0x03;
    pub const I64: u8 = 0x04;
    pub const U8: u8 = 0x05;
    pub const U16: u8 = 0x06;
    pub const U32: u8 = 0x07;
    pub const U64: u8 = 0x08;
    pub const F32: u8 = 0x09;
    pub const F64: u8 = 0x0a;
    pub const STRING: u8 = 0x0b;
    pub const BYTES: u8 = 0x0c;
    pub const FIXED_BYTES: u8 = 0x0d;
    pub const RECORD: u8 = 0x0e;
}

pub fn encode(value: &Value) -> anyhow::Result<Vec<u8>> {
    let mut buffer = vec![VERSION];
    encode_value(value, 0, &mut buffer)?;
    Ok(buffer)
}

fn encode_len(len: usize, buffer: &mut Vec<u8>) -> anyhow::Result<()> {
    let Ok(len) = u32::try_from(len) else {
        anyhow::bail!("length {len} does not fit the u32 prefix")
    };
    buffer.extend(len.to_be_bytes());
    Ok(())
}

fn encode_bytes(bytes: &[u8], buffer: &mut Vec<u8>) -> anyhow::Result<()> {
    encode_len(bytes.len(), buffer)?;
    buffer.extend_from_slice(bytes);
    Ok(())
}

fn encode_value(value: &Value, depth: usize, buffer: &mut Vec<u8>) -> anyhow::Result<()> {
    anyhow::ensure!(depth <= MAX_DEPTH, "record nesting deeper than {MAX_DEPTH}");
    match value {
        Value::Bool(b) => buffer.extend([tag::BOOL, *b as u8]),
        Value::I8(n) => {
            buffer.push(tag::I8);
            buffer.extend(n.to_be_bytes())
        }
        Value::I16(n) => {
            buffer.push(tag::I16);
            buffer.extend(n.to_be_bytes())
        }
        Value::I32(n) => {
            buffer.push(tag::I32);
            buffer.extend(n.to_be_bytes())
        }
        Value::I64(n) => {
            buffer.push(tag::I64);
            buffer.extend(n.to_be_bytes())
        }
        Value::U8(n) => buffer.extend([tag::U8, *n]),
        Value::U16(n) => {
            buffer.push(tag::U16);
            buffer.extend(n.to_be_bytes())
        }
        Value::U32(n) => {
            buffer.push(tag::U32);
            buffer.extend(n.to_be_bytes())
        }
        Value::U64(n) => {
            buffer.push(tag::U64);
            buffer.extend(n.to_be_bytes())
        }
        Value::F32(x) => {
            buffer.push(tag::F32);
            buffer.extend(x.to_bits().to_be_bytes())
        }
        Value::F64(x) => {
            buffer.push(tag::F64);
            buffer.extend(x.to_bits().to_be_bytes())
        }
        Value::String(string) => {
            buffer.push(tag::STRING);
            encode_bytes(string.as_bytes(), buffer)?
        }
        Value::Bytes(bytes) => {
            buffer.push(tag::BYTES);
            encode_bytes(bytes, buffer)?
        }
        Value::FixedBytes(bytes) => {
            buffer.push(tag::FIXED_BYTES);
            encode_bytes(bytes, buffer)?
        }
        Value::Record(record) => {
            buffer.push(tag::RECORD);
            encode_bytes(record.type_name().as_bytes(), buffer)?;
            encode_len(record.fields().len(), buffer)?;
            for (name, field) in record.fields() {
                encode_bytes(name.as_bytes(), buffer)?;
                encode_value(field, depth + 1, buffer)?
            }
        }
    }
    Ok(())
}

pub fn decode(bytes: &[u8]) -> anyhow::Result<Value> {
    let Some((&version, rest)) = bytes.split_first() else {
        anyhow::bail!("empty payload")
    };
    anyhow::ensure!(version == VERSION, "unsupported codec version {version}");
    let mut reader = Reader(rest);
    let value = reader.value(0)?;
    anyhow::ensure!(
        reader.0.is_empty(),
        "{} trailing bytes after value",
        reader.0.len()
    );
    Ok(value)
}

struct Reader<'a>(&'a [u8]);

impl<'a> Reader<'a> {
    fn take<const N: usize>(&mut self) -> anyhow::Result<[u8; N]> {
        Ok(self.slice(N)?.try_into()?)
    }

    fn slice(&mut self, len: usize) -> anyhow::Result<&'a [u8]> {
        anyhow::ensure!(
            self.0.len() >= len,
            "truncated payload: need {len} bytes, {} left",
            self.0.len()
        );
        let (head, rest) = self.0.split_at(len);
        self.0 = rest;
        Ok(head)
    }

    fn len(&mut self) -> anyhow::Result<usize> {
        Ok(u32::from_be_bytes(self.take()?) as usize)
    }

    fn bytes(&mut self) -> anyhow::Result<Vec<u8>> {
        let len = self.len()?;
        Ok(self.slice(len)?.to_vec())
    }

    fn string(&mut self) -> anyhow::Result<String> {
        Ok(String::from_utf8(self.bytes()?)?)
    }

    fn value(&mut self, depth: usize) -> anyhow::Result<Value> {
        anyhow::ensure!(depth <= MAX_DEPTH, "record nesting deeper than {MAX_DEPTH}");
        let [byte] = self.take::<1>()?;
        let value = match byte {
            tag::BOOL => match self.take::<1>()? {
                [0] => Value::Bool(false),
                [1] => Value::Bool(true),
                [b] => anyhow::bail!("invalid bool byte {b:#04x}"),
            },
            tag::I8 => Value::I8(i8::from_be_bytes(self.take()?)),
            tag::I16 => Value::I16(i16::from_be_bytes(self.take()?)),
            tag::I32 => Value::I32(i32::from_be_bytes(self.take()?)),
            tag::I64 => Value::I64(i64::from_be_bytes(self.take()?)),
            tag::U8 => Value::U8(u8::from_be_bytes(self.take()?)),
            tag::U16 => Value::U16(u16::from_be_bytes(self.take()?)),
            tag::U32 => Value::U32(u32::from_be_bytes(self.take()?)),
            tag::U64 => Value::U64(u64::from_be_bytes(self.take()?)),
            tag::F32 => Value::F32(f32::from_bits(u32::from_be_bytes(self.take()?))),
            tag::F64 => Value::F64(f64::from_bits(u64::from_be_bytes(self.take()?))),
            tag::STRING => Value::String(self.string()?),
            tag::BYTES => Value::Bytes(self.bytes()?),
            tag::FIXED_BYTES => Value::FixedBytes(self.bytes()?),
            tag::RECORD => {
                let mut record = Record::new(self.string()?);
                for _ in 0..self.len()? {
                    let name = self.string()?;
                    record = record.with(name, self.value(depth + 1)?)
                }
                Value::Record(record)
            }
            _ => anyhow::bail!("unknown value tag {byte:#04x}"),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{tests::bob, StateValue};

    #[test]
    fn layout_is_stable() {
        assert_eq!(encode(&Value::U64(3)).unwrap(), [1, 0x08, 0, 0, 0, 0, 0, 0, 0, 3]);
        assert_eq!(encode(&"hi".into()).unwrap(), [1, 0x0b, 0, 0, 0, 2, b'h', b'i']);
        assert_eq!(encode(&Value::Bool(true)).unwrap(), [1, 0x00, 1]);
        assert_eq!(
            encode(&Record::new("P").with("a", 1u8).into()).unwrap(),
            [1, 0x0e, 0, 0, 0, 1, b'P', 0, 0, 0, 1, 0, 0, 0, 1, b'a', 0x05, 1]
        );
    }

    #[test]
    fn records_survive_encoding() {
        let value = bob().into_value();
        assert_eq!(decode(&encode(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn floats_keep_their_bits() {
        let value = Value::F64(-0.);
        let Value::F64(decoded) = decode(&encode(&value).unwrap()).unwrap() else {
            panic!("wrong kind")
        };
        assert!(decoded.is_sign_negative());
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(decode(&[]).is_err());
        assert!(decode(&[2, 0x00, 1]).is_err());
        assert!(decode(&[1, 0x00, 2]).is_err());
        assert!(decode(&[1, 0x08, 0, 0]).is_err());
        assert!(decode(&[1, 0x05, 1, 0]).is_err());
        assert!(decode(&[1, 0x0b, 0, 0, 0, 1, 0xff]).is_err());
        assert!(decode(&[1, 0x7f]).is_err());
        // first byte `{` is not a known version
        assert!(decode(br#"{"Name":"Bob"}"#).is_err());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn lengths_past_u32_are_refused() {
        let mut buffer = Vec::new();
        encode_len(u32::MAX as usize, &mut buffer).unwrap();
        assert_eq!(buffer, [0xff; 4]);
        assert!(encode_len(u32::MAX as usize + 1, &mut buffer).is_err());
        assert_eq!(buffer.len(), 4);
    }

    fn nested(levels: usize) -> Value {
        let mut value = Value::Bool(true);
        for _ in 0..levels {
            value = Record::new("N").with("n", value).into();
        }
        value
    }

    #[test]
    fn nesting_is_bounded() {
        let deepest = nested(MAX_DEPTH);
        assert_eq!(decode(&encode(&deepest).unwrap()).unwrap(), deepest);
        assert!(encode(&nested(MAX_DEPTH + 1)).is_err());

        // hand-built payload one level past the bound
        let mut payload = vec![VERSION];
        for _ in 0..=MAX_DEPTH {
            payload.extend([tag::RECORD, 0, 0, 0, 1, b'N', 0, 0, 0, 1, 0, 0, 0, 1, b'n']);
        }
        payload.extend([tag::BOOL, 1]);
        assert!(decode(&payload).is_err());
    }
}
