//! The closed set of rule types and their keywords.

use bitflags::bitflags;
use fnv::FnvHashMap;

use crate::error::ParseError;

/// Width in bytes of a numeric read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte = 1,
    Short = 2,
    Long = 4,
    Quad = 8,
}

impl Width {
    pub fn bytes(self) -> usize {
        self as usize
    }

    /// Wider than an `int`, matters for printf promotion.
    pub fn is_wide(self) -> bool {
        self == Width::Quad
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Native,
    Big,
    Little,
    /// PDP-11 byte order; recognised but never decoded
    Middle,
}

bitflags! {
    /// Flags after the `/` of a string-family type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StringFlags: u8 {
        /// `B`/`W`: whitespace in the pattern matches one or more in the data
        const COMPACT_WHITESPACE = 1 << 0;
        /// `b`/`w`: whitespace in the pattern matches zero or more
        const OPTIONAL_WHITESPACE = 1 << 1;
        /// `c`: lower-case pattern letters match either case
        const IGNORE_LOWER = 1 << 2;
        /// `C`: upper-case pattern letters match either case
        const IGNORE_UPPER = 1 << 3;
        /// `t`: text test; accepted for compatibility
        const TEXT = 1 << 4;
        /// `s`: leave the cursor at the start of the match
        const MATCH_START = 1 << 5;
    }
}

impl StringFlags {
    const LETTERS: [(char, StringFlags); 8] = [
        ('B', StringFlags::COMPACT_WHITESPACE),
        ('W', StringFlags::COMPACT_WHITESPACE),
        ('b', StringFlags::OPTIONAL_WHITESPACE),
        ('w', StringFlags::OPTIONAL_WHITESPACE),
        ('c', StringFlags::IGNORE_LOWER),
        ('C', StringFlags::IGNORE_UPPER),
        ('t', StringFlags::TEXT),
        ('s', StringFlags::MATCH_START),
    ];

    /// Parse flag letters, accepting only those in `allowed`.
    fn parse(name: &str, letters: &str, allowed: &str) -> Result<StringFlags, ParseError> {
        let mut flags = StringFlags::empty();
        for c in letters.chars() {
            let flag = Self::LETTERS
                .iter()
                .find(|(l, _)| *l == c)
                .filter(|_| allowed.contains(c))
                .map(|(_, f)| *f)
                .ok_or_else(|| ParseError::UnknownTypeFlag {
                    name: name.to_string(),
                    flag: c,
                })?;
            flags |= flag;
        }
        Ok(flags)
    }
}

/// What a rule reads and how it compares.
#[derive(Debug, Clone, PartialEq)]
pub enum MagicType {
    Integer {
        width: Width,
        endian: Endian,
        signed: bool,
    },
    Float {
        endian: Endian,
    },
    Double {
        endian: Endian,
    },
    Date {
        width: Width,
        endian: Endian,
        signed: bool,
        local: bool,
    },
    String {
        flags: StringFlags,
    },
    PString,
    /// 16-bit wide strings; recognised but never decoded
    String16 {
        endian: Endian,
    },
    Search {
        range: Option<usize>,
        flags: StringFlags,
    },
    Regex {
        flags: StringFlags,
    },
    Default,
}

/// Broad grouping used for format validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Integer,
    Float,
    String,
    Date,
    None,
    Unsupported,
}

impl MagicType {
    pub fn class(&self) -> TypeClass {
        match self {
            MagicType::Integer {
                endian: Endian::Middle,
                ..
            }
            | MagicType::Date {
                endian: Endian::Middle,
                ..
            }
            | MagicType::String16 { .. } => TypeClass::Unsupported,
            MagicType::Integer { .. } => TypeClass::Integer,
            MagicType::Float { .. } | MagicType::Double { .. } => TypeClass::Float,
            MagicType::Date { .. } => TypeClass::Date,
            MagicType::String { .. }
            | MagicType::PString
            | MagicType::Search { .. }
            | MagicType::Regex { .. } => TypeClass::String,
            MagicType::Default => TypeClass::None,
        }
    }

    /// Whether the type reads text (`Some(true)`), binary (`Some(false)`) or
    /// nothing at all.
    pub fn is_text(&self) -> Option<bool> {
        match self {
            MagicType::String { .. } | MagicType::Search { .. } | MagicType::Regex { .. } => {
                Some(true)
            }
            MagicType::Default => None,
            _ => Some(false),
        }
    }

    /// Numeric types take a pre-operator and an integer test value.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            MagicType::Integer { .. }
                | MagicType::Float { .. }
                | MagicType::Double { .. }
                | MagicType::Date { .. }
        )
    }

    pub fn is_signed(&self) -> bool {
        match self {
            MagicType::Integer { signed, .. } | MagicType::Date { signed, .. } => *signed,
            _ => false,
        }
    }
}

lazy_static! {
    static ref KEYWORDS: FnvHashMap<String, MagicType> = {
        use self::Endian::*;
        use self::Width::*;

        let mut out = FnvHashMap::default();
        let int = |width, endian, signed| MagicType::Integer { width, endian, signed };
        let date = |width, endian, signed, local| MagicType::Date { width, endian, signed, local };

        for &(prefix, endian) in &[("", Native), ("be", Big), ("le", Little)] {
            let byte_orders: &[(&str, Width)] = if endian == Native {
                &[("byte", Byte), ("short", Short), ("long", Long), ("quad", Quad)]
            } else {
                &[("short", Short), ("long", Long), ("quad", Quad)]
            };
            for &(name, width) in byte_orders {
                out.insert(format!("{}{}", prefix, name), int(width, endian, true));
                out.insert(format!("u{}{}", prefix, name), int(width, endian, false));
            }
            out.insert(format!("{}float", prefix), MagicType::Float { endian });
            out.insert(format!("{}double", prefix), MagicType::Double { endian });
            for &(name, width, local) in &[
                ("date", Long, false),
                ("qdate", Quad, false),
                ("ldate", Long, true),
                ("qldate", Quad, true),
            ] {
                out.insert(format!("{}{}", prefix, name), date(width, endian, true, local));
                out.insert(format!("u{}{}", prefix, name), date(width, endian, false, local));
            }
        }
        out.insert("bestring16".to_string(), MagicType::String16 { endian: Big });
        out.insert("lestring16".to_string(), MagicType::String16 { endian: Little });
        out.insert("melong".to_string(), int(Long, Middle, true));
        out.insert("medate".to_string(), date(Long, Middle, true, false));
        out.insert("meldate".to_string(), date(Long, Middle, true, true));
        out.insert("default".to_string(), MagicType::Default);
        out
    };
}

/// Resolve a type keyword (without any pre-operator) to a [`MagicType`].
pub fn lookup(name: &str) -> Result<MagicType, ParseError> {
    let (base, suffix) = match name.find('/') {
        Some(i) => (&name[..i], Some(&name[i + 1..])),
        None => (name, None),
    };

    match base {
        "string" => Ok(MagicType::String {
            flags: StringFlags::parse(name, suffix.unwrap_or(""), "bBwWcCt")?,
        }),
        "regex" => Ok(MagicType::Regex {
            flags: StringFlags::parse(name, suffix.unwrap_or(""), "cs")?,
        }),
        "search" => {
            let suffix = suffix.unwrap_or("");
            let digits = suffix.len() - suffix.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            let range = if digits > 0 {
                let n = suffix[..digits]
                    .parse::<usize>()
                    .map_err(|_| ParseError::InvalidOperand(suffix.to_string()))?;
                Some(n)
            } else {
                None
            };
            let rest = &suffix[digits..];
            let letters = if digits > 0 {
                match rest.strip_prefix('/') {
                    Some(letters) => letters,
                    None if rest.is_empty() => "",
                    None => return Err(ParseError::InvalidOperand(suffix.to_string())),
                }
            } else {
                rest
            };
            Ok(MagicType::Search {
                range,
                flags: StringFlags::parse(name, letters, "bBwWcCts")?,
            })
        }
        "pstring" if suffix.is_none() => Ok(MagicType::PString),
        _ if suffix.is_some() => Err(ParseError::UnknownType(name.to_string())),
        _ => KEYWORDS
            .get(base)
            .cloned()
            .ok_or_else(|| ParseError::UnknownType(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_resolves() {
        // 4 widths x signedness + 3 x 2 x 2 ordered ints, 3 float, 3 double,
        // 3 x 8 dates, 2 string16, 3 middle, default
        assert_eq!(KEYWORDS.len(), 8 + 12 + 3 + 3 + 24 + 2 + 3 + 1);
    }

    #[test]
    fn byte_order_keywords() {
        assert_eq!(
            lookup("ubelong").unwrap(),
            MagicType::Integer { width: Width::Long, endian: Endian::Big, signed: false }
        );
        assert_eq!(
            lookup("leshort").unwrap(),
            MagicType::Integer { width: Width::Short, endian: Endian::Little, signed: true }
        );
        assert_eq!(
            lookup("beqldate").unwrap(),
            MagicType::Date { width: Width::Quad, endian: Endian::Big, signed: true, local: true }
        );
        assert!(lookup("bebyte").is_err());
    }

    #[test]
    fn string_flags() {
        assert_eq!(
            lookup("string/cW").unwrap(),
            MagicType::String {
                flags: StringFlags::IGNORE_LOWER | StringFlags::COMPACT_WHITESPACE
            }
        );
        assert!(matches!(
            lookup("string/s"),
            Err(ParseError::UnknownTypeFlag { flag: 's', .. })
        ));
        assert_eq!(
            lookup("regex/cs").unwrap(),
            MagicType::Regex { flags: StringFlags::IGNORE_LOWER | StringFlags::MATCH_START }
        );
    }

    #[test]
    fn search_range_and_flags() {
        assert_eq!(
            lookup("search/64/s").unwrap(),
            MagicType::Search { range: Some(64), flags: StringFlags::MATCH_START }
        );
        assert_eq!(
            lookup("search").unwrap(),
            MagicType::Search { range: None, flags: StringFlags::empty() }
        );
        assert_eq!(
            lookup("search/c").unwrap(),
            MagicType::Search { range: None, flags: StringFlags::IGNORE_LOWER }
        );
        assert!(lookup("search/12x").is_err());
    }

    #[test]
    fn unknown_keywords() {
        assert!(matches!(lookup("belongg"), Err(ParseError::UnknownType(_))));
        assert!(matches!(lookup("belong/x"), Err(ParseError::UnknownType(_))));
        assert!(matches!(lookup("pstring/B"), Err(ParseError::UnknownType(_))));
    }
}
