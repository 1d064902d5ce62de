//! Type descriptors and runtime values.
//!
//! Every variable and container carries a [`TypeDescriptor`]; every write is
//! checked against it, by kind for scalars and by identity (the record name)
//! plus field layout for records.

use std::{fmt::Display, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Kind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Bytes,
    FixedBytes,
    Record,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Bytes,
    FixedBytes(usize),
    Record(Arc<RecordType>),
}

#[derive(Debug, PartialEq)]
pub struct RecordType {
    name: String,
    fields: Vec<(String, TypeDescriptor)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    FixedBytes(Vec<u8>),
    Record(Record),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: Vec<(String, Value)>,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display(fmt = "TypeMismatch: expected {expected}, found {found}")]
pub struct TypeMismatch {
    pub expected: String,
    pub found: String,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Default::default(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.fields.push((name.into(), ty.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[(String, TypeDescriptor)] {
        &self.fields
    }
}

impl From<RecordType> for TypeDescriptor {
    fn from(record: RecordType) -> Self {
        Self::Record(Arc::new(record))
    }
}

impl TypeDescriptor {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool => Kind::Bool,
            Self::I8 => Kind::I8,
            Self::I16 => Kind::I16,
            Self::I32 => Kind::I32,
            Self::I64 => Kind::I64,
            Self::U8 => Kind::U8,
            Self::U16 => Kind::U16,
            Self::U32 => Kind::U32,
            Self::U64 => Kind::U64,
            Self::F32 => Kind::F32,
            Self::F64 => Kind::F64,
            Self::String => Kind::String,
            Self::Bytes => Kind::Bytes,
            Self::FixedBytes(_) => Kind::FixedBytes,
            Self::Record(_) => Kind::Record,
        }
    }

    /// Same kind, same fixed width, and for records the same identity.
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::FixedBytes(n), Self::FixedBytes(m)) => n == m,
            (Self::Record(record), Self::Record(other)) => record.name == other.name,
            _ => self.kind() == other.kind(),
        }
    }

    pub fn ensure_same_type(&self, other: &Self) -> anyhow::Result<()> {
        if !self.same_type(other) {
            anyhow::bail!(TypeMismatch {
                expected: self.to_string(),
                found: other.to_string(),
            })
        }
        Ok(())
    }

    /// Fails with [`TypeMismatch`] unless `value` conforms to this descriptor.
    pub fn check(&self, value: &Value) -> anyhow::Result<()> {
        let mismatch = || TypeMismatch {
            expected: self.to_string(),
            found: value.type_name(),
        };
        match (self, value) {
            (Self::FixedBytes(width), Value::FixedBytes(bytes)) => {
                if bytes.len() != *width {
                    anyhow::bail!(mismatch())
                }
            }
            (Self::Record(record), Value::Record(value_record)) => {
                if record.name != value_record.type_name
                    || record.fields.len() != value_record.fields.len()
                {
                    anyhow::bail!(mismatch())
                }
                for ((name, ty), (value_name, field)) in
                    record.fields.iter().zip(&value_record.fields)
                {
                    if name != value_name {
                        anyhow::bail!(mismatch())
                    }
                    ty.check(field)?
                }
            }
            _ => {
                if self.kind() != value.kind() {
                    anyhow::bail!(mismatch())
                }
            }
        }
        Ok(())
    }

    pub fn zero_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::I8 => Value::I8(0),
            Self::I16 => Value::I16(0),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::U8 => Value::U8(0),
            Self::U16 => Value::U16(0),
            Self::U32 => Value::U32(0),
            Self::U64 => Value::U64(0),
            Self::F32 => Value::F32(0.),
            Self::F64 => Value::F64(0.),
            Self::String => Value::String(Default::default()),
            Self::Bytes => Value::Bytes(Default::default()),
            Self::FixedBytes(width) => Value::FixedBytes(vec![0; *width]),
            Self::Record(record) => Value::Record(Record {
                type_name: record.name.clone(),
                fields: record
                    .fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.zero_value()))
                    .collect(),
            }),
        }
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedBytes(width) => write!(f, "bytes<{width}>"),
            Self::Record(record) => {
                write!(f, "{} {{", record.name)?;
                let mut prefix = " ";
                for (name, ty) in &record.fields {
                    write!(f, "{prefix}{name}: {ty}")?;
                    prefix = ", "
                }
                if record.fields.is_empty() {
                    write!(f, "}}")
                } else {
                    write!(f, " }}")
                }
            }
            _ => write!(f, "{}", self.kind().to_string().to_lowercase()),
        }
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool(_) => Kind::Bool,
            Self::I8(_) => Kind::I8,
            Self::I16(_) => Kind::I16,
            Self::I32(_) => Kind::I32,
            Self::I64(_) => Kind::I64,
            Self::U8(_) => Kind::U8,
            Self::U16(_) => Kind::U16,
            Self::U32(_) => Kind::U32,
            Self::U64(_) => Kind::U64,
            Self::F32(_) => Kind::F32,
            Self::F64(_) => Kind::F64,
            Self::String(_) => Kind::String,
            Self::Bytes(_) => Kind::Bytes,
            Self::FixedBytes(_) => Kind::FixedBytes,
            Self::Record(_) => Kind::Record,
        }
    }

    /// The descriptor this value conforms to, records included.
    pub fn descriptor(&self) -> TypeDescriptor {
        match self {
            Self::Bool(_) => TypeDescriptor::Bool,
            Self::I8(_) => TypeDescriptor::I8,
            Self::I16(_) => TypeDescriptor::I16,
            Self::I32(_) => TypeDescriptor::I32,
            Self::I64(_) => TypeDescriptor::I64,
            Self::U8(_) => TypeDescriptor::U8,
            Self::U16(_) => TypeDescriptor::U16,
            Self::U32(_) => TypeDescriptor::U32,
            Self::U64(_) => TypeDescriptor::U64,
            Self::F32(_) => TypeDescriptor::F32,
            Self::F64(_) => TypeDescriptor::F64,
            Self::String(_) => TypeDescriptor::String,
            Self::Bytes(_) => TypeDescriptor::Bytes,
            Self::FixedBytes(bytes) => TypeDescriptor::FixedBytes(bytes.len()),
            Self::Record(record) => record
                .fields
                .iter()
                .fold(RecordType::new(&record.type_name), |ty, (name, value)| {
                    ty.field(name, value.descriptor())
                })
                .into(),
        }
    }

    fn type_name(&self) -> String {
        match self {
            Self::Record(record) => record.type_name.clone(),
            _ => self.descriptor().to_string(),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        let Self::U64(n) = self else { return None };
        Some(*n)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::I8(n) => write!(f, "{n}"),
            Self::I16(n) => write!(f, "{n}"),
            Self::I32(n) => write!(f, "{n}"),
            Self::I64(n) => write!(f, "{n}"),
            Self::U8(n) => write!(f, "{n}"),
            Self::U16(n) => write!(f, "{n}"),
            Self::U32(n) => write!(f, "{n}"),
            Self::U64(n) => write!(f, "{n}"),
            Self::F32(x) => write!(f, "{x}"),
            Self::F64(x) => write!(f, "{x}"),
            Self::String(string) => write!(f, "{string:?}"),
            Self::Bytes(bytes) | Self::FixedBytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Self::Record(record) => {
                write!(f, "{} {{", record.type_name)?;
                let mut prefix = " ";
                for (name, value) in &record.fields {
                    write!(f, "{prefix}{name}: {value}")?;
                    prefix = ", "
                }
                if record.fields.is_empty() {
                    write!(f, "}}")
                } else {
                    write!(f, " }}")
                }
            }
        }
    }
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Default::default(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(other_name, value)| (other_name == name).then_some(value))
    }

    pub fn take(&mut self, name: &str) -> Option<Value> {
        let position = self
            .fields
            .iter()
            .position(|(other_name, _)| other_name == name)?;
        Some(self.fields.remove(position).1)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl From<&str> for Value {
    fn from(string: &str) -> Self {
        Self::String(string.into())
    }
}

/// Rust types that map onto one [`TypeDescriptor`].
///
/// Implemented for the primitive kinds here; records implement it by hand,
/// building their value with [`Record::with`] and reading it back with
/// [`Record::take`].
pub trait StateValue: Sized {
    fn descriptor() -> TypeDescriptor;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! scalar_state_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl StateValue for $t {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::$variant
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$t> for Value {
                fn from(inner: $t) -> Self {
                    Value::$variant(inner)
                }
            }
        )*
    };
}

scalar_state_value! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
}

impl<const N: usize> StateValue for [u8; N] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::FixedBytes(N)
    }

    fn into_value(self) -> Value {
        Value::FixedBytes(self.to_vec())
    }

    fn from_value(value: Value) -> Option<Self> {
        let Value::FixedBytes(bytes) = value else {
            return None;
        };
        bytes.try_into().ok()
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(bytes: [u8; N]) -> Self {
        Self::FixedBytes(bytes.to_vec())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Location {
        pub x: i64,
        pub y: i64,
        pub z: i64,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Person {
        pub name: String,
        pub age: u8,
        pub location: Location,
    }

    impl StateValue for Location {
        fn descriptor() -> TypeDescriptor {
            RecordType::new("Location")
                .field("x", TypeDescriptor::I64)
                .field("y", TypeDescriptor::I64)
                .field("z", TypeDescriptor::I64)
                .into()
        }

        fn into_value(self) -> Value {
            Record::new("Location")
                .with("x", self.x)
                .with("y", self.y)
                .with("z", self.z)
                .into()
        }

        fn from_value(value: Value) -> Option<Self> {
            let Value::Record(mut record) = value else {
                return None;
            };
            Some(Self {
                x: i64::from_value(record.take("x")?)?,
                y: i64::from_value(record.take("y")?)?,
                z: i64::from_value(record.take("z")?)?,
            })
        }
    }

    impl StateValue for Person {
        fn descriptor() -> TypeDescriptor {
            RecordType::new("Person")
                .field("name", TypeDescriptor::String)
                .field("age", TypeDescriptor::U8)
                .field("location", Location::descriptor())
                .into()
        }

        fn into_value(self) -> Value {
            Record::new("Person")
                .with("name", self.name)
                .with("age", self.age)
                .with("location", self.location.into_value())
                .into()
        }

        fn from_value(value: Value) -> Option<Self> {
            let Value::Record(mut record) = value else {
                return None;
            };
            Some(Self {
                name: String::from_value(record.take("name")?)?,
                age: u8::from_value(record.take("age")?)?,
                location: Location::from_value(record.take("location")?)?,
            })
        }
    }

    pub fn bob() -> Person {
        Person {
            name: "Bob".into(),
            age: 12,
            location: Location { x: 1, y: 2, z: 3 },
        }
    }

    #[test]
    fn scalar_check_is_by_kind() {
        assert!(TypeDescriptor::I64.check(&Value::I64(-4)).is_ok());
        let err = TypeDescriptor::I64.check(&Value::I32(-4)).unwrap_err();
        let mismatch = err.downcast_ref::<TypeMismatch>().unwrap();
        assert_eq!(mismatch.expected, "i64");
        assert_eq!(mismatch.found, "i32");
    }

    #[test]
    fn record_check_is_by_identity() {
        let person = Person::descriptor();
        assert!(person.check(&bob().into_value()).is_ok());

        // same shape, different record
        let impostor = Record::new("Location")
            .with("x", 1i64)
            .with("y", 2i64)
            .with("z", 3i64);
        assert!(Location::descriptor().check(&impostor.clone().into()).is_ok());
        let renamed = Record::new("Point")
            .with("x", 1i64)
            .with("y", 2i64)
            .with("z", 3i64);
        assert!(Location::descriptor().check(&renamed.into()).is_err());
        assert!(person.check(&impostor.into()).is_err());
    }

    #[test]
    fn record_fields_are_checked() {
        let wrong_age = Record::new("Person")
            .with("name", "Bob")
            .with("age", 12i32)
            .with("location", Location::default().into_value());
        assert!(Person::descriptor().check(&wrong_age.into()).is_err());
        let missing = Record::new("Person").with("name", "Bob");
        assert!(Person::descriptor().check(&missing.into()).is_err());
    }

    #[test]
    fn fixed_bytes_width_is_part_of_the_type() {
        let ty = <[u8; 4]>::descriptor();
        assert!(ty.check(&[1u8, 2, 3, 4].into()).is_ok());
        assert!(ty.check(&[1u8, 2, 3].into()).is_err());
        assert!(!ty.same_type(&TypeDescriptor::FixedBytes(3)));
    }

    #[test]
    fn zero_values_follow_the_descriptor() {
        assert_eq!(
            Person::from_value(Person::descriptor().zero_value()),
            Some(Person::default())
        );
        assert_eq!(
            TypeDescriptor::FixedBytes(2).zero_value(),
            Value::FixedBytes(vec![0, 0])
        );
    }

    #[test]
    fn value_descriptor_reconstructs_records() {
        assert_eq!(bob().into_value().descriptor(), Person::descriptor());
    }

    #[test]
    fn display() {
        assert_eq!(
            Person::descriptor().to_string(),
            "Person { name: string, age: u8, location: Location { x: i64, y: i64, z: i64 } }"
        );
        assert_eq!(
            bob().into_value().to_string(),
            r#"Person { name: "Bob", age: 12, location: Location { x: 1, y: 2, z: 3 } }"#
        );
        assert_eq!(Value::Bytes(vec![0xca, 0xfe]).to_string(), "0xcafe");
        assert_eq!(
            TypeDescriptor::from(RecordType::new("Unit")).to_string(),
            "Unit {}"
        );
    }
}
