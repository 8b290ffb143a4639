//! Parser for the magic(5) rule language, one line at a time.

use nom::{
    bytes::complete::{escaped, is_not, take_till1},
    character::complete::{anychar, char},
    multi::many0_count,
    IResult,
};

use crate::error::ParseError;
use crate::magic::types::lookup;
use crate::magic::{ArithOp, MagicLine, MagicType, Template};

mod number;
mod offset;
mod value;

pub use self::number::parse_integer;
pub use self::offset::parse_offset;
pub use self::value::{parse_test, unescape};

const STRING_FAMILY: [&str; 4] = ["string", "pstring", "search", "regex"];

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn field(input: &str) -> IResult<&str, &str> {
    take_till1(is_blank)(input)
}

// A value runs to the first whitespace not escaped with a backslash
fn value_field(input: &str) -> IResult<&str, &str> {
    escaped(is_not("\\ \t"), '\\', anychar)(input)
}

fn indent(input: &str) -> IResult<&str, usize> {
    many0_count(char('>'))(input)
}

/// Split `belong&0xff00` into its keyword and pre-operator.
fn parse_type(field: &str) -> Result<(MagicType, &str, Option<(ArithOp, i64)>), ParseError> {
    let (name, op) = match field.find(|c: char| "&-+/%*".contains(c)) {
        None => (field, None),
        Some(i) if STRING_FAMILY.contains(&&field[..i]) => {
            if !field[i..].starts_with('/') {
                return Err(ParseError::OperatorNotSupported(field[..i].to_string()));
            }
            (field, None)
        }
        Some(i) => {
            let c = field[i..].chars().next().ok_or(ParseError::MissingType)?;
            let op = ArithOp::from_char(c).ok_or_else(|| ParseError::UnknownType(field.to_string()))?;
            let operand = &field[i + 1..];
            let operand = parse_integer(operand)
                .ok_or_else(|| ParseError::InvalidOperand(operand.to_string()))?;
            (&field[..i], Some((op, operand)))
        }
    };

    let kind = lookup(name)?;
    if op.is_some() && !kind.is_numeric() {
        return Err(ParseError::OperatorNotSupported(name.to_string()));
    }
    Ok((kind, name, op))
}

/// Parse one rule line.
///
/// Returns the rule and, separately, the error that made its result
/// template unusable; such a rule is kept without a description.
pub fn parse_rule(
    line: u32,
    text: &str,
    scratch: &mut Vec<u8>,
) -> Result<(MagicLine, Option<ParseError>), ParseError> {
    let (rest, depth) = indent(text).map_err(|_| ParseError::MissingOffset)?;

    let (rest, offset) = field(rest.trim_start_matches(is_blank)).map_err(|_| ParseError::MissingOffset)?;
    let offset = parse_offset(offset)?;

    let (rest, type_field) = field(rest.trim_start_matches(is_blank)).map_err(|_| ParseError::MissingType)?;
    let (kind, type_name, type_op) = parse_type(type_field)?;

    let rest = rest.trim_start_matches(is_blank);
    let (rest, token) = value_field(rest).map_err(|_| ParseError::TrailingBackslash)?;
    if token.is_empty() && kind != MagicType::Default {
        return Err(ParseError::MissingValue);
    }
    let test = parse_test(&kind, token, scratch)?;

    let mut warning = None;
    let result = match rest.trim() {
        "" => None,
        desc => match Template::new(desc, kind.class(), type_name) {
            Ok(template) => Some(template),
            Err(e) => {
                warning = Some(e);
                None
            }
        },
    };

    let rule = MagicLine {
        line,
        depth: depth as u32,
        offset,
        kind,
        type_name: type_name.to_string(),
        type_op,
        test,
        result,
        mime: None,
        strength: 0,
        strength_adjust: None,
        text: false,
        binary: false,
    };
    Ok((rule, warning))
}

/// Parse one rule line, silently dropping a result template that fails
/// validation.
pub fn parse_line(line: u32, text: &str, scratch: &mut Vec<u8>) -> Result<MagicLine, ParseError> {
    parse_rule(line, text, scratch).map(|(rule, _)| rule)
}
