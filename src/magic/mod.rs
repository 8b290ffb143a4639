// Rule node definitions shared by the parser, tree builder and evaluator

use std::fmt;

use mime::Mime;

pub mod builtin;
pub mod check;
pub mod decode;
pub mod format;
pub mod ruleset;
pub mod types;

pub use self::format::Template;
pub use self::types::{Endian, MagicType, StringFlags, TypeClass, Width};

/// Arithmetic applied to an indirect offset, a decoded value or a strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    And,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    pub fn from_char(c: char) -> Option<ArithOp> {
        match c {
            '&' => Some(ArithOp::And),
            '+' => Some(ArithOp::Add),
            '-' => Some(ArithOp::Sub),
            '*' => Some(ArithOp::Mul),
            '/' => Some(ArithOp::Div),
            '%' => Some(ArithOp::Rem),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            ArithOp::And => '&',
            ArithOp::Add => '+',
            ArithOp::Sub => '-',
            ArithOp::Mul => '*',
            ArithOp::Div => '/',
            ArithOp::Rem => '%',
        }
    }

    /// Wrapping 64-bit application; `None` on division by zero.
    pub fn apply(self, value: i64, operand: i64) -> Option<i64> {
        Some(match self {
            ArithOp::And => value & operand,
            ArithOp::Add => value.wrapping_add(operand),
            ArithOp::Sub => value.wrapping_sub(operand),
            ArithOp::Mul => value.wrapping_mul(operand),
            ArithOp::Div => {
                if operand == 0 {
                    return None;
                }
                value.wrapping_div(operand)
            }
            ArithOp::Rem => {
                if operand == 0 {
                    return None;
                }
                value.wrapping_rem(operand)
            }
        })
    }

    /// Unsigned counterpart of [`ArithOp::apply`].
    pub fn apply_unsigned(self, value: u64, operand: u64) -> Option<u64> {
        Some(match self {
            ArithOp::And => value & operand,
            ArithOp::Add => value.wrapping_add(operand),
            ArithOp::Sub => value.wrapping_sub(operand),
            ArithOp::Mul => value.wrapping_mul(operand),
            ArithOp::Div => value.checked_div(operand)?,
            ArithOp::Rem => value.checked_rem(operand)?,
        })
    }
}

/// How the value at an indirect offset is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndirectType {
    /// `b`
    Byte,
    /// `B`
    UByte,
    /// `s`
    LeShort,
    /// `S`
    BeShort,
    /// `l`
    LeLong,
    /// `L`
    BeLong,
}

impl IndirectType {
    pub fn from_char(c: char) -> Option<IndirectType> {
        match c {
            'b' => Some(IndirectType::Byte),
            'B' => Some(IndirectType::UByte),
            's' => Some(IndirectType::LeShort),
            'S' => Some(IndirectType::BeShort),
            'l' => Some(IndirectType::LeLong),
            'L' => Some(IndirectType::BeLong),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            IndirectType::Byte => 'b',
            IndirectType::UByte => 'B',
            IndirectType::LeShort => 's',
            IndirectType::BeShort => 'S',
            IndirectType::LeLong => 'l',
            IndirectType::BeLong => 'L',
        }
    }
}

impl Default for IndirectType {
    fn default() -> Self {
        IndirectType::LeLong
    }
}

/// `(base.t op operand)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indirect {
    /// Base is relative to the cursor (`(&N...)`)
    pub relative: bool,
    pub base: i64,
    pub kind: IndirectType,
    pub op: Option<(ArithOp, i64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetBase {
    Direct(i64),
    Indirect(Indirect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offset {
    /// Result is added to the cursor (`&...`)
    pub relative: bool,
    pub base: OffsetBase,
}

/// Comparison performed once the value is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOp {
    /// `x`
    Always,
    Equal,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    /// `&`: every bit of the operand set
    AllSet,
    /// `^`: every bit of the operand clear
    AllClear,
}

impl TestOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TestOp::Always => "x",
            TestOp::Equal => "=",
            TestOp::Less => "<",
            TestOp::Greater => ">",
            TestOp::LessEq => "<=",
            TestOp::GreaterEq => ">=",
            TestOp::AllSet => "&",
            TestOp::AllClear => "^",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestValue {
    None,
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl TestValue {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TestValue::Bytes(b) => b,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    pub op: TestOp,
    pub negate: bool,
    pub value: TestValue,
}

/// One parsed rule line.
#[derive(Debug, Clone, PartialEq)]
pub struct MagicLine {
    pub line: u32,
    pub depth: u32,
    pub offset: Offset,
    pub kind: MagicType,
    /// Type keyword as written, flags included
    pub type_name: String,
    pub type_op: Option<(ArithOp, i64)>,
    pub test: Test,
    pub result: Option<Template>,
    pub mime: Option<Mime>,
    pub strength: u32,
    pub strength_adjust: Option<(ArithOp, u32)>,
    /// Something in this subtree reads text
    pub text: bool,
    /// Something in this subtree reads binary data
    pub binary: bool,
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relative {
            f.write_str("&")?;
        }
        match &self.base {
            OffsetBase::Direct(n) => write!(f, "{}", n),
            OffsetBase::Indirect(ind) => {
                f.write_str("(")?;
                if ind.relative {
                    f.write_str("&")?;
                }
                write!(f, "{}.{}", ind.base, ind.kind.as_char())?;
                if let Some((op, operand)) = ind.op {
                    write!(f, "{}{}", op.as_char(), operand)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Escape bytes so that the parser reads them back unchanged.
fn write_escaped(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for (i, &b) in bytes.iter().enumerate() {
        let leading = i == 0 && b"<>=!&^x".contains(&b);
        match b {
            b'\\' => f.write_str("\\\\")?,
            b' ' => f.write_str("\\ ")?,
            0x21..=0x7e if !leading => write!(f, "{}", b as char)?,
            _ => write!(f, "\\{:03o}", b)?,
        }
    }
    Ok(())
}

impl fmt::Display for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op == TestOp::Always {
            return f.write_str("x");
        }
        if self.negate {
            f.write_str("!")?;
        }
        match &self.value {
            TestValue::None => Ok(()),
            TestValue::Signed(n) => write!(f, "{}{}", self.op.as_str(), n),
            TestValue::Unsigned(n) => write!(f, "{}0x{:x}", self.op.as_str(), n),
            TestValue::Float(v) => write!(f, "{}{:?}", self.op.as_str(), v),
            TestValue::Bytes(b) => {
                if self.op != TestOp::Equal {
                    f.write_str(self.op.as_str())?;
                }
                write_escaped(f, b)
            }
        }
    }
}

impl fmt::Display for MagicLine {
    /// Normalised rule text; parsing it gives back an equal rule.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            f.write_str(">")?;
        }
        write!(f, "{}\t{}", self.offset, self.type_name)?;
        if let Some((op, operand)) = self.type_op {
            write!(f, "{}{}", op.as_char(), operand)?;
        }
        f.write_str("\t")?;
        match (&self.kind, &self.test.value) {
            // regex patterns keep their escapes as written
            (MagicType::Regex { .. }, TestValue::Bytes(b)) if self.test.op != TestOp::Always => {
                if self.test.negate {
                    f.write_str("!")?;
                }
                f.write_str(&String::from_utf8_lossy(b).replace(' ', "\\ "))?;
            }
            _ => write!(f, "{}", self.test)?,
        }
        if let Some(result) = &self.result {
            write!(f, "\t{}", result.as_str())?;
        }
        Ok(())
    }
}
