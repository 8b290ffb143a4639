//! Result templates: at most one printf conversion, checked against the
//! rule's type when the rule is loaded and rendered on every match.

use std::borrow::Cow;

use regex::Regex;

use super::decode::MAX_OUTPUT;
use super::types::TypeClass;
use crate::error::ParseError;

lazy_static! {
    static ref FORMAT_INTEGER: Regex =
        Regex::new(r"^%[-#0 +]*[0-9]*(\.[0-9]*)?(hh|h|ll|l|q|j|z|t)?[diouxXcs]").unwrap();
    static ref FORMAT_FLOAT: Regex =
        Regex::new(r"^%[-#0 +]*[0-9]*(\.[0-9]*)?l?[eEfFgGs]").unwrap();
    static ref FORMAT_STRING: Regex = Regex::new(r"^%[-0-9.]*s").unwrap();
    /// Splits an already validated specifier into its parts
    static ref FORMAT_PARTS: Regex = Regex::new(
        r"^%(?P<flags>[-#0 +]*)(?P<width>[0-9]*)(?:\.(?P<precision>[0-9]*))?(?:hh|h|ll|l|q|j|z|t)?(?P<conv>[a-zA-Z])"
    )
    .unwrap();
}

/// A parsed `%` conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    /// Byte range of the specifier in the template
    start: usize,
    end: usize,
    left: bool,
    zero: bool,
    alternate: bool,
    plus: bool,
    space: bool,
    width: usize,
    precision: Option<usize>,
    conv: char,
}

/// The description attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
    spec: Option<FormatSpec>,
}

/// A decoded value handed to [`Template::render`].
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<'a> {
    /// No value (the `default` type)
    None,
    /// Integer bits plus what C's default promotions would make of them
    Int { bits: u64, signed: bool, wide: bool },
    Float(f64),
    Str(Cow<'a, str>),
}

/// Position of the single conversion, if any; `%%` is skipped.
fn find_spec(text: &str) -> Result<Option<usize>, ParseError> {
    let bytes = text.as_bytes();
    let mut found = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if bytes.get(i + 1) == Some(&b'%') {
                i += 2;
                continue;
            }
            if found.is_some() {
                return Err(ParseError::MultipleFormats(text.to_string()));
            }
            found = Some(i);
        }
        i += 1;
    }
    Ok(found)
}

impl Template {
    /// Validate `text` for a rule of type class `class`.
    pub fn new(text: &str, class: TypeClass, type_name: &str) -> Result<Template, ParseError> {
        let start = match find_spec(text)? {
            None => {
                return Ok(Template {
                    text: text.to_string(),
                    spec: None,
                })
            }
            Some(start) => start,
        };

        let invalid = || ParseError::InvalidFormat {
            name: type_name.to_string(),
            format: text[start..].to_string(),
        };
        let pattern: &Regex = match class {
            TypeClass::Integer => &FORMAT_INTEGER,
            TypeClass::Float => &FORMAT_FLOAT,
            TypeClass::String | TypeClass::Date => &FORMAT_STRING,
            TypeClass::None | TypeClass::Unsupported => return Err(invalid()),
        };
        if !pattern.is_match(&text[start..]) {
            return Err(invalid());
        }
        let caps = FORMAT_PARTS.captures(&text[start..]).ok_or_else(invalid)?;

        let flags = caps.name("flags").map_or("", |m| m.as_str());
        // widths past the output limit would only be truncated away
        let number = |name: &str| -> Result<Option<usize>, ParseError> {
            match caps.name(name).map(|m| m.as_str()) {
                None => Ok(None),
                Some("") => Ok(Some(0)),
                Some(digits) => match digits.parse::<usize>() {
                    Ok(n) if n <= MAX_OUTPUT => Ok(Some(n)),
                    _ => Err(invalid()),
                },
            }
        };
        let width = number("width")?.unwrap_or(0);
        let precision = number("precision")?;
        let conv = caps
            .name("conv")
            .and_then(|m| m.as_str().chars().next())
            .ok_or_else(invalid)?;

        Ok(Template {
            text: text.to_string(),
            spec: Some(FormatSpec {
                start,
                end: start + caps.get(0).map_or(0, |m| m.end()),
                left: flags.contains('-'),
                zero: flags.contains('0'),
                alternate: flags.contains('#'),
                plus: flags.contains('+'),
                space: flags.contains(' '),
                width,
                precision,
                conv,
            }),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn has_format(&self) -> bool {
        self.spec.is_some()
    }

    /// Substitute `arg` into the template.
    pub fn render(&self, arg: &Arg<'_>) -> String {
        match &self.spec {
            None => self.text.replace("%%", "%"),
            Some(spec) => {
                let mut out = self.text[..spec.start].replace("%%", "%");
                out.push_str(&spec.convert(arg));
                out.push_str(&self.text[spec.end..].replace("%%", "%"));
                out
            }
        }
    }
}

impl FormatSpec {
    fn convert(&self, arg: &Arg<'_>) -> String {
        match (self.conv, arg) {
            ('s', Arg::Str(s)) => self.string(s),
            ('s', Arg::Int { bits, signed, wide }) => {
                let text = match (*signed, *wide) {
                    (true, true) => (*bits as i64).to_string(),
                    (true, false) => (*bits as u32 as i32).to_string(),
                    (false, true) => bits.to_string(),
                    (false, false) => (*bits as u32).to_string(),
                };
                self.string(&text)
            }
            ('s', Arg::Float(v)) => self.string(&general(*v, 6, false)),
            ('d', Arg::Int { bits, wide, .. }) | ('i', Arg::Int { bits, wide, .. }) => {
                let v = if *wide { *bits as i64 } else { *bits as u32 as i32 as i64 };
                let digits = self.int_digits(v.unsigned_abs().to_string(), v == 0);
                let sign = if v < 0 {
                    "-"
                } else if self.plus {
                    "+"
                } else if self.space {
                    " "
                } else {
                    ""
                };
                self.pad_number(sign, &digits)
            }
            ('u', Arg::Int { bits, wide, .. })
            | ('o', Arg::Int { bits, wide, .. })
            | ('x', Arg::Int { bits, wide, .. })
            | ('X', Arg::Int { bits, wide, .. }) => {
                let v = if *wide { *bits } else { *bits as u32 as u64 };
                let (digits, prefix) = match self.conv {
                    'o' => {
                        let d = format!("{:o}", v);
                        let prefix = if self.alternate && !d.starts_with('0') { "0" } else { "" };
                        (d, prefix)
                    }
                    'x' => (format!("{:x}", v), if self.alternate && v != 0 { "0x" } else { "" }),
                    'X' => (format!("{:X}", v), if self.alternate && v != 0 { "0X" } else { "" }),
                    _ => (v.to_string(), ""),
                };
                let digits = self.int_digits(digits, v == 0);
                self.pad_number(prefix, &digits)
            }
            ('c', Arg::Int { bits, .. }) => self.pad(String::from(*bits as u8 as char)),
            (conv, Arg::Float(v)) if "eEfFgG".contains(conv) => {
                let precision = self.precision.unwrap_or(6);
                let body = match conv.to_ascii_lowercase() {
                    'e' => exponent(*v, precision),
                    'f' => format!("{:.*}", precision, v),
                    _ => general(*v, precision, self.alternate),
                };
                let body = if conv.is_ascii_uppercase() { body.to_uppercase() } else { body };
                let (sign, body) = match body.strip_prefix('-') {
                    Some(rest) => ("-", rest.to_string()),
                    None if self.plus => ("+", body),
                    None if self.space => (" ", body),
                    None => ("", body),
                };
                self.pad_number(sign, &body)
            }
            (_, Arg::None) => String::new(),
            // validated at load time; anything else is a mismatch we print raw
            (_, Arg::Int { bits, .. }) => bits.to_string(),
            (_, Arg::Str(s)) => s.to_string(),
            (_, Arg::Float(v)) => v.to_string(),
        }
    }

    /// `%.Nd` pads with zeros; `%.0d` of zero prints nothing.
    fn int_digits(&self, digits: String, zero: bool) -> String {
        match self.precision {
            Some(0) if zero => String::new(),
            Some(p) if digits.len() < p => format!("{}{}", "0".repeat(p - digits.len()), digits),
            _ => digits,
        }
    }

    fn string(&self, s: &str) -> String {
        let s = match self.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.to_string(),
        };
        self.pad(s)
    }

    fn pad(&self, body: String) -> String {
        let len = body.chars().count();
        if len >= self.width {
            return body;
        }
        let fill = " ".repeat(self.width - len);
        if self.left {
            body + &fill
        } else {
            fill + &body
        }
    }

    fn pad_number(&self, prefix: &str, digits: &str) -> String {
        let len = prefix.len() + digits.len();
        let zero = self.zero && !self.left && (self.precision.is_none() || "eEfFgG".contains(self.conv));
        if zero && len < self.width {
            format!("{}{}{}", prefix, "0".repeat(self.width - len), digits)
        } else {
            self.pad(format!("{}{}", prefix, digits))
        }
    }
}

/// C `%e`: mantissa, `e`, sign and at least two exponent digits.
fn exponent(v: f64, precision: usize) -> String {
    if !v.is_finite() {
        return non_finite(v);
    }
    let s = format!("{:.*e}", precision, v);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => s,
    }
}

/// C `%g`.
fn general(v: f64, precision: usize, alternate: bool) -> String {
    if !v.is_finite() {
        return non_finite(v);
    }
    let p = if precision == 0 { 1 } else { precision };
    let x = if v == 0.0 {
        0
    } else {
        let s = format!("{:.*e}", p - 1, v);
        s.split_once('e').and_then(|(_, e)| e.parse::<i32>().ok()).unwrap_or(0)
    };

    let out = if x < -4 || x >= p as i32 {
        exponent(v, p - 1)
    } else {
        format!("{:.*}", (p as i32 - 1 - x).max(0) as usize, v)
    };
    if alternate {
        return out;
    }

    // drop trailing zeros from the fraction
    let (mantissa, exp) = match out.find('e') {
        Some(i) => (&out[..i], &out[i..]),
        None => (&out[..], ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{}{}", mantissa, exp)
}

fn non_finite(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v < 0.0 {
        "-inf".to_string()
    } else {
        "inf".to_string()
    }
}
