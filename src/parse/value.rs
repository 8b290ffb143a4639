// Test value field

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{opt, value},
    IResult,
};

use super::number::{parse_float, parse_integer};
use crate::error::ParseError;
use crate::magic::{MagicType, Test, TestOp, TestValue};

fn numeric_op(input: &str) -> IResult<&str, TestOp> {
    alt((
        value(TestOp::LessEq, tag("<=")),
        value(TestOp::GreaterEq, tag(">=")),
        value(TestOp::Equal, char('=')),
        value(TestOp::Less, char('<')),
        value(TestOp::Greater, char('>')),
        value(TestOp::AllSet, char('&')),
        value(TestOp::AllClear, char('^')),
    ))(input)
}

fn string_op(input: &str) -> IResult<&str, TestOp> {
    alt((
        value(TestOp::Equal, char('=')),
        value(TestOp::Less, char('<')),
        value(TestOp::Greater, char('>')),
    ))(input)
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Decode C escapes in `token` into `scratch`.
///
/// Named control characters, `\xHH` (one or two digits) and `\OOO` (one to
/// three octal digits) are understood; any other escaped byte stands for
/// itself.
pub fn unescape(token: &str, scratch: &mut Vec<u8>) -> Result<(), ParseError> {
    scratch.clear();
    let bytes = token.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        if b != b'\\' {
            scratch.push(b);
            continue;
        }
        let c = *bytes.get(i).ok_or(ParseError::TrailingBackslash)?;
        i += 1;
        match c {
            b'a' => scratch.push(0x07),
            b'b' => scratch.push(0x08),
            b'f' => scratch.push(0x0c),
            b'n' => scratch.push(b'\n'),
            b'r' => scratch.push(b'\r'),
            b't' => scratch.push(b'\t'),
            b'v' => scratch.push(0x0b),
            b'x' => {
                let mut v: Option<u8> = None;
                for _ in 0..2 {
                    match bytes.get(i).and_then(|&h| hex_value(h)) {
                        Some(d) => {
                            v = Some(v.unwrap_or(0) * 16 + d);
                            i += 1;
                        }
                        None => break,
                    }
                }
                scratch.push(v.unwrap_or(b'x'));
            }
            b'0'..=b'7' => {
                let mut v = u32::from(c - b'0');
                for _ in 0..2 {
                    match bytes.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            v = v * 8 + u32::from(d - b'0');
                            i += 1;
                        }
                        _ => break,
                    }
                }
                scratch.push(v as u8);
            }
            _ => scratch.push(c),
        }
    }
    Ok(())
}

/// Regex patterns keep their escapes for the regex engine, except `\ `.
fn unescape_regex(token: &str, scratch: &mut Vec<u8>) {
    scratch.clear();
    scratch.extend_from_slice(token.replace("\\ ", " ").as_bytes());
}

/// Parse the value field of a rule of type `kind`.
pub fn parse_test(kind: &MagicType, token: &str, scratch: &mut Vec<u8>) -> Result<Test, ParseError> {
    if token == "x" || matches!(kind, MagicType::Default) {
        return Ok(Test {
            op: TestOp::Always,
            negate: false,
            value: TestValue::None,
        });
    }
    let invalid = || ParseError::InvalidValue(token.to_string());

    let (rest, negate) = match token.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (token, false),
    };

    match kind {
        MagicType::String { .. } | MagicType::PString | MagicType::Search { .. } => {
            let (literal, op) = opt(string_op)(rest).map_err(|_| invalid())?;
            if literal.is_empty() {
                return Err(invalid());
            }
            unescape(literal, scratch)?;
            Ok(Test {
                op: op.unwrap_or(TestOp::Equal),
                negate,
                value: TestValue::Bytes(scratch.clone()),
            })
        }
        MagicType::Regex { .. } | MagicType::String16 { .. } => {
            let pattern = rest.strip_prefix('=').unwrap_or(rest);
            if pattern.is_empty() {
                return Err(invalid());
            }
            match kind {
                MagicType::Regex { .. } => unescape_regex(pattern, scratch),
                _ => unescape(pattern, scratch)?,
            }
            Ok(Test {
                op: TestOp::Equal,
                negate,
                value: TestValue::Bytes(scratch.clone()),
            })
        }
        _ => {
            let (number, op) = opt(numeric_op)(rest).map_err(|_| invalid())?;
            let value = match kind {
                MagicType::Float { .. } | MagicType::Double { .. } => {
                    TestValue::Float(parse_float(number).ok_or_else(invalid)?)
                }
                _ => {
                    let n = parse_integer(number).ok_or_else(invalid)?;
                    if kind.is_signed() {
                        TestValue::Signed(n)
                    } else {
                        TestValue::Unsigned(n as u64)
                    }
                }
            };
            Ok(Test {
                op: op.unwrap_or(TestOp::Equal),
                negate,
                value,
            })
        }
    }
}
