use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, char, multispace0},
    combinator::{all_consuming, map_opt, opt, recognize, verify},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    Finish, IResult, Parser,
};

use crate::value::{RecordType, TypeDescriptor};

impl FromStr for TypeDescriptor {
    type Err = nom::error::Error<String>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match all_consuming(delimited(token_break, descriptor, token_break))(s).finish() {
            Ok((_, descriptor)) => Ok(descriptor),
            Err(err) => Err(nom::error::Error {
                input: err.input.into(),
                code: err.code,
            }),
        }
    }
}

fn keyword(id: &str) -> Option<TypeDescriptor> {
    Some(match id {
        "bool" => TypeDescriptor::Bool,
        "i8" => TypeDescriptor::I8,
        "i16" => TypeDescriptor::I16,
        "i32" => TypeDescriptor::I32,
        "i64" => TypeDescriptor::I64,
        "u8" => TypeDescriptor::U8,
        "u16" => TypeDescriptor::U16,
        "u32" => TypeDescriptor::U32,
        "u64" => TypeDescriptor::U64,
        "f32" => TypeDescriptor::F32,
        "f64" => TypeDescriptor::F64,
        "string" => TypeDescriptor::String,
        "bytes" => TypeDescriptor::Bytes,
        _ => return None,
    })
}

fn descriptor(input: &str) -> IResult<&str, TypeDescriptor> {
    alt((fixed_bytes, record, map_opt(id, keyword)))(input)
}

fn id(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

fn fixed_bytes(input: &str) -> IResult<&str, TypeDescriptor> {
    preceded(
        tuple((tag("bytes"), token_break, char('<'), token_break)),
        terminated(nom::character::complete::u32, pair(token_break, char('>'))),
    )
    .map(|width| TypeDescriptor::FixedBytes(width as usize))
    .parse(input)
}

fn field(input: &str) -> IResult<&str, (&str, TypeDescriptor)> {
    separated_pair(id, tuple((token_break, char(':'), token_break)), descriptor)(input)
}

fn record(input: &str) -> IResult<&str, TypeDescriptor> {
    let name = verify(id, |name: &str| keyword(name).is_none());
    let fields = delimited(
        pair(char('{'), token_break),
        separated_list0(tuple((token_break, char(','), token_break)), field),
        tuple((opt(pair(token_break, char(','))), token_break, char('}'))),
    );
    let (remaining, (name, fields)) = separated_pair(name, token_break, fields)(input)?;
    let record = fields
        .into_iter()
        .fold(RecordType::new(name), |record, (name, ty)| {
            record.field(name, ty)
        });
    Ok((remaining, record.into()))
}

fn token_break(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}
