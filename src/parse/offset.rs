// Offset field: N, &N, (B[.t][opN]), &(B...), (&B...)

use super::number::{integer, parse_integer};
use crate::error::ParseError;
use crate::magic::{ArithOp, Indirect, IndirectType, Offset, OffsetBase};

pub fn parse_offset(field: &str) -> Result<Offset, ParseError> {
    let invalid = || ParseError::InvalidOffset(field.to_string());

    let (relative, rest) = match field.strip_prefix('&') {
        Some(rest) => (true, rest),
        None => (false, field),
    };

    if !rest.starts_with('(') {
        let value = parse_integer(rest).ok_or_else(invalid)?;
        if value < 0 && !relative {
            return Err(ParseError::NegativeOffset(field.to_string()));
        }
        return Ok(Offset {
            relative,
            base: OffsetBase::Direct(value),
        });
    }

    let inner = rest[1..]
        .strip_suffix(')')
        .ok_or_else(|| ParseError::MissingBracket(field.to_string()))?;
    let (base_relative, inner) = match inner.strip_prefix('&') {
        Some(inner) => (true, inner),
        None => (false, inner),
    };

    let (mut inner, base) = integer(inner).map_err(|_| invalid())?;

    let mut kind = IndirectType::default();
    if let Some(after) = inner.strip_prefix('.') {
        let c = after.chars().next().ok_or_else(invalid)?;
        kind = IndirectType::from_char(c).ok_or(ParseError::UnknownIndirectType(c))?;
        inner = &after[c.len_utf8()..];
    }

    let mut op = None;
    if let Some(c) = inner.chars().next() {
        let arith = match ArithOp::from_char(c) {
            Some(a @ ArithOp::Add) | Some(a @ ArithOp::Sub) | Some(a @ ArithOp::Mul) => a,
            _ if c == ')' || c == '(' => return Err(ParseError::MissingBracket(field.to_string())),
            _ => return Err(ParseError::UnknownIndirectOperator(c)),
        };
        let operand = parse_integer(&inner[c.len_utf8()..]).ok_or_else(invalid)?;
        op = Some((arith, operand));
    }

    Ok(Offset {
        relative,
        base: OffsetBase::Indirect(Indirect {
            relative: base_relative,
            base,
            kind,
            op,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indirect(field: &str) -> Indirect {
        match parse_offset(field).unwrap().base {
            OffsetBase::Indirect(ind) => ind,
            other => panic!("not indirect: {:?}", other),
        }
    }

    #[test]
    fn direct_offsets() {
        let off = parse_offset("0x3c").unwrap();
        assert_eq!(off, Offset { relative: false, base: OffsetBase::Direct(0x3c) });
        let off = parse_offset("&-4").unwrap();
        assert_eq!(off, Offset { relative: true, base: OffsetBase::Direct(-4) });
        assert_eq!(parse_offset("-4"), Err(ParseError::NegativeOffset("-4".into())));
        assert!(matches!(parse_offset("12z"), Err(ParseError::InvalidOffset(_))));
    }

    #[test]
    fn indirect_offsets() {
        assert_eq!(
            indirect("(0x3c.l)"),
            Indirect { relative: false, base: 0x3c, kind: IndirectType::LeLong, op: None }
        );
        assert_eq!(
            indirect("(&4.S+2)"),
            Indirect {
                relative: true,
                base: 4,
                kind: IndirectType::BeShort,
                op: Some((ArithOp::Add, 2))
            }
        );
        assert_eq!(indirect("(8)").kind, IndirectType::LeLong);
        assert_eq!(indirect("(8.b*-2)").op, Some((ArithOp::Mul, -2)));
        assert!(parse_offset("&(4.B)").unwrap().relative);
    }

    #[test]
    fn malformed_indirect() {
        assert!(matches!(parse_offset("(4.l"), Err(ParseError::MissingBracket(_))));
        assert_eq!(parse_offset("(4.q)"), Err(ParseError::UnknownIndirectType('q')));
        assert_eq!(parse_offset("(4.l/2)"), Err(ParseError::UnknownIndirectOperator('/')));
        assert!(matches!(parse_offset("(4.l))"), Err(ParseError::MissingBracket(_))));
        assert!(matches!(parse_offset("(4.l+)"), Err(ParseError::InvalidOffset(_))));
        assert!(matches!(parse_offset("(x)"), Err(ParseError::InvalidOffset(_))));
    }
}
