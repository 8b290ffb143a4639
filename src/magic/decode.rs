//! Decode-and-compare for every rule type.
//!
//! Each decoder reads at `State::offset`, which the evaluator has already set
//! to the rule's resolved offset. On a match the decoder renders the rule's
//! description into `State::out` and moves the cursor the way the type
//! requires; children then run from there.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{Local, TimeZone, Utc};
use regex::bytes::{Regex, RegexBuilder};

use super::format::Arg;
use super::types::{Endian, MagicType, StringFlags, Width};
use super::{ArithOp, MagicLine, TestOp, TestValue};
use crate::error::TestError;

/// Longest description an evaluation produces, in bytes.
pub const MAX_OUTPUT: usize = 4096;

/// Longest string preview rendered for string types.
const MAX_PREVIEW: usize = 31;

const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Per-evaluation scratch state.
#[derive(Debug)]
pub struct State<'a> {
    pub buf: &'a [u8],
    /// Cursor: where the current rule reads
    pub offset: usize,
    pub out: String,
    pub mime: Option<String>,
}

impl<'a> State<'a> {
    pub fn new(buf: &'a [u8]) -> State<'a> {
        State {
            buf,
            offset: 0,
            out: String::new(),
            mime: None,
        }
    }

    /// Append a rendered description, space separated unless it starts
    /// with `\b`.
    pub fn emit(&mut self, text: &str) {
        let (text, separate) = match text.strip_prefix("\\b") {
            Some(rest) => (rest, false),
            None => (text, true),
        };
        if separate && !self.out.is_empty() {
            self.out.push(' ');
        }
        self.out.push_str(text);
        if self.out.len() > MAX_OUTPUT {
            let mut end = MAX_OUTPUT;
            while !self.out.is_char_boundary(end) {
                end -= 1;
            }
            self.out.truncate(end);
        }
    }

    fn render(&mut self, rule: &MagicLine, arg: Arg<'_>) {
        if let Some(template) = &rule.result {
            let text = template.render(&arg);
            self.emit(&text);
        }
    }
}

/// Printable prefix of `bytes`: at most 31 bytes, stopping at the first NUL
/// or non-printable byte, with backslashes doubled.
pub fn preview(bytes: &[u8]) -> String {
    let mut out = String::new();
    for &b in bytes.iter().take(MAX_PREVIEW) {
        match b {
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(b as char),
            _ => break,
        }
    }
    out
}

/// Build the matcher for a regex rule: byte oriented and multi-line, case
/// insensitive with `/c`.
pub fn compile_regex(pattern: &[u8], flags: StringFlags) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&String::from_utf8_lossy(pattern))
        .unicode(false)
        .multi_line(true)
        .case_insensitive(flags.contains(StringFlags::IGNORE_LOWER))
        .build()
}

/// Read an unsigned integer of `width` at `at`.
pub fn read_uint(buf: &[u8], at: usize, width: Width, endian: Endian) -> Result<u64, TestError> {
    let end = at.checked_add(width.bytes()).ok_or(TestError::OutOfBounds)?;
    let bytes = buf.get(at..end).ok_or(TestError::OutOfBounds)?;
    let big = match endian {
        Endian::Big => true,
        Endian::Little => false,
        Endian::Native => cfg!(target_endian = "big"),
        Endian::Middle => return Err(TestError::NotImplemented),
    };
    let fold = |v: u64, &b: &u8| v << 8 | u64::from(b);
    Ok(if big {
        bytes.iter().fold(0, fold)
    } else {
        bytes.iter().rev().fold(0, fold)
    })
}

/// Truncate `v` to `width`, sign-extending when `signed`.
fn normalize(v: u64, width: Width, signed: bool) -> u64 {
    let bits = width.bytes() * 8;
    if bits == 64 {
        return v;
    }
    let masked = v & ((1u64 << bits) - 1);
    if signed {
        let shift = 64 - bits;
        (((masked << shift) as i64) >> shift) as u64
    } else {
        masked
    }
}

fn apply(op: ArithOp, v: u64, operand: i64, signed: bool) -> Result<u64, TestError> {
    let out = if signed {
        op.apply(v as i64, operand).map(|r| r as u64)
    } else {
        op.apply_unsigned(v, operand as u64)
    };
    out.ok_or(TestError::Malformed("division by zero"))
}

fn compare_int(op: TestOp, v: u64, t: u64, signed: bool) -> bool {
    let ord = if signed {
        (v as i64).cmp(&(t as i64))
    } else {
        v.cmp(&t)
    };
    match op {
        TestOp::Always => true,
        TestOp::Equal => v == t,
        TestOp::Less => ord == Ordering::Less,
        TestOp::Greater => ord == Ordering::Greater,
        TestOp::LessEq => ord != Ordering::Greater,
        TestOp::GreaterEq => ord != Ordering::Less,
        TestOp::AllSet => v & t == t,
        TestOp::AllClear => v & t == 0,
    }
}

fn int_operand(value: &TestValue) -> u64 {
    match *value {
        TestValue::Signed(n) => n as u64,
        TestValue::Unsigned(n) => n,
        _ => 0,
    }
}

/// Read, apply the pre-operator and compare; returns the raw verdict and
/// the value after the operator.
fn test_int(
    rule: &MagicLine,
    state: &State<'_>,
    width: Width,
    endian: Endian,
    signed: bool,
) -> Result<(bool, u64), TestError> {
    let raw = read_uint(state.buf, state.offset, width, endian)?;
    let mut v = normalize(raw, width, signed);
    if let Some((op, operand)) = rule.type_op {
        v = normalize(apply(op, v, operand, signed)?, width, signed);
    }
    let t = normalize(int_operand(&rule.test.value), width, signed);
    Ok((compare_int(rule.test.op, v, t, signed), v))
}

fn integer(rule: &MagicLine, state: &mut State<'_>, width: Width, endian: Endian, signed: bool) -> Result<bool, TestError> {
    let (raw, v) = test_int(rule, state, width, endian, signed)?;
    let matched = raw != rule.test.negate;
    if matched && rule.result.is_some() {
        state.render(
            rule,
            Arg::Int {
                bits: v,
                signed,
                wide: width.is_wide(),
            },
        );
        state.offset += width.bytes();
    }
    Ok(matched)
}

fn float(rule: &MagicLine, state: &mut State<'_>, double: bool, endian: Endian) -> Result<bool, TestError> {
    if rule.type_op.is_some() {
        return Err(TestError::Malformed("operator on floating type"));
    }
    let width = if double { Width::Quad } else { Width::Long };
    let bits = read_uint(state.buf, state.offset, width, endian)?;
    let v = if double {
        f64::from_bits(bits)
    } else {
        f64::from(f32::from_bits(bits as u32))
    };

    let raw = match (rule.test.op, &rule.test.value) {
        (TestOp::Always, _) => true,
        (TestOp::Equal, TestValue::Float(t)) if double => v == *t,
        (TestOp::Equal, TestValue::Float(t)) => v as f32 == *t as f32,
        _ => return Err(TestError::Malformed("unsupported float comparison")),
    };
    let matched = raw != rule.test.negate;
    if matched && rule.result.is_some() {
        state.render(rule, Arg::Float(v));
        state.offset += width.bytes();
    }
    Ok(matched)
}

fn render_date(secs: i64, local: bool) -> String {
    let formatted = if local {
        Local
            .timestamp_opt(secs, 0)
            .single()
            .map(|t| t.format(DATE_FORMAT).to_string())
    } else {
        Utc.timestamp_opt(secs, 0)
            .single()
            .map(|t| t.format(DATE_FORMAT).to_string())
    };
    formatted.unwrap_or_else(|| "*Invalid date*".to_string())
}

fn date(
    rule: &MagicLine,
    state: &mut State<'_>,
    width: Width,
    endian: Endian,
    signed: bool,
    local: bool,
) -> Result<bool, TestError> {
    let (raw, v) = test_int(rule, state, width, endian, signed)?;
    let matched = raw != rule.test.negate;
    if matched && rule.result.is_some() {
        let secs = if signed || width != Width::Quad {
            v as i64
        } else {
            i64::try_from(v).unwrap_or(i64::MAX)
        };
        let text = render_date(secs, local);
        state.render(rule, Arg::Str(Cow::Owned(text)));
        state.offset += width.bytes();
    }
    Ok(matched)
}

fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0b
}

/// Fewest buffer bytes `pattern` can match.
fn min_len(pattern: &[u8], flags: StringFlags) -> usize {
    if flags.contains(StringFlags::OPTIONAL_WHITESPACE) {
        pattern.iter().filter(|&&b| !is_space(b)).count()
    } else {
        pattern.len()
    }
}

/// Compare `pattern` against the start of `data` under `flags`.
///
/// Returns how the data orders against the pattern at the first difference
/// and the number of data bytes consumed.
fn compare(pattern: &[u8], data: &[u8], flags: StringFlags) -> Result<(Ordering, usize), TestError> {
    let whitespace = flags.intersects(StringFlags::COMPACT_WHITESPACE | StringFlags::OPTIONAL_WHITESPACE);
    let mut j = 0;
    for &p in pattern {
        if whitespace && is_space(p) {
            let start = j;
            while j < data.len() && is_space(data[j]) {
                j += 1;
            }
            if flags.contains(StringFlags::COMPACT_WHITESPACE) && j == start {
                let c = *data.get(j).ok_or(TestError::OutOfBounds)?;
                return Ok((c.cmp(&p), j));
            }
            continue;
        }

        let c = *data.get(j).ok_or(TestError::OutOfBounds)?;
        let c = if flags.contains(StringFlags::IGNORE_LOWER) && p.is_ascii_lowercase() {
            c.to_ascii_lowercase()
        } else if flags.contains(StringFlags::IGNORE_UPPER) && p.is_ascii_uppercase() {
            c.to_ascii_uppercase()
        } else {
            c
        };
        if c != p {
            return Ok((c.cmp(&p), j));
        }
        j += 1;
    }
    Ok((Ordering::Equal, j))
}

fn ordering_matches(op: TestOp, ord: Ordering) -> Result<bool, TestError> {
    match op {
        TestOp::Equal => Ok(ord == Ordering::Equal),
        TestOp::Less => Ok(ord == Ordering::Less),
        TestOp::Greater => Ok(ord == Ordering::Greater),
        _ => Err(TestError::Malformed("unsupported string comparison")),
    }
}

fn render_preview(rule: &MagicLine, state: &mut State<'_>, at: usize) {
    if rule.result.is_some() {
        let text = preview(state.buf.get(at..).unwrap_or(&[]));
        state.render(rule, Arg::Str(Cow::Owned(text)));
    }
}

fn string(rule: &MagicLine, state: &mut State<'_>, flags: StringFlags) -> Result<bool, TestError> {
    let at = state.offset;
    let data = state.buf.get(at..).ok_or(TestError::OutOfBounds)?;
    let (raw, consumed) = if rule.test.op == TestOp::Always {
        (true, 0)
    } else {
        let (ord, consumed) = compare(rule.test.value.as_bytes(), data, flags)?;
        (ordering_matches(rule.test.op, ord)?, consumed)
    };

    let matched = raw != rule.test.negate;
    if matched {
        render_preview(rule, state, at);
        if rule.test.op == TestOp::Equal && !rule.test.negate {
            state.offset = at + consumed;
        }
    }
    Ok(matched)
}

fn pstring(rule: &MagicLine, state: &mut State<'_>) -> Result<bool, TestError> {
    let at = state.offset;
    let len = usize::from(*state.buf.get(at).ok_or(TestError::OutOfBounds)?);
    let payload = state
        .buf
        .get(at + 1..at + 1 + len)
        .ok_or(TestError::OutOfBounds)?;

    let raw = if rule.test.op == TestOp::Always {
        true
    } else {
        let pattern = rule.test.value.as_bytes();
        let ord = len.cmp(&pattern.len()).then_with(|| payload.cmp(pattern));
        ordering_matches(rule.test.op, ord)?
    };

    let matched = raw != rule.test.negate;
    if matched {
        if rule.result.is_some() {
            let text = preview(payload);
            state.render(rule, Arg::Str(Cow::Owned(text)));
        }
        if rule.test.op == TestOp::Equal && !rule.test.negate {
            state.offset = at + 1 + len;
        }
    }
    Ok(matched)
}

fn search(rule: &MagicLine, state: &mut State<'_>, range: Option<usize>, flags: StringFlags) -> Result<bool, TestError> {
    let at = state.offset;
    let data = state.buf.get(at..).ok_or(TestError::OutOfBounds)?;
    if rule.test.op == TestOp::Always {
        let matched = !rule.test.negate;
        if matched {
            render_preview(rule, state, at);
        }
        return Ok(matched);
    }

    let pattern = rule.test.value.as_bytes();
    if data.len() < min_len(pattern, flags) {
        return Err(TestError::OutOfBounds);
    }

    let last = range.unwrap_or(data.len()).min(data.len());
    let mut found = None;
    for k in 0..=last {
        match compare(pattern, &data[k..], flags) {
            Ok((ord, consumed)) => {
                if ordering_matches(rule.test.op, ord)? {
                    found = Some((k, consumed));
                    break;
                }
            }
            // later starts are shorter still
            Err(TestError::OutOfBounds) => break,
            Err(e) => return Err(e),
        }
    }

    let matched = found.is_some() != rule.test.negate;
    if matched {
        match found {
            Some((k, consumed)) => {
                render_preview(rule, state, at + k);
                state.offset = if flags.contains(StringFlags::MATCH_START) {
                    at + k
                } else {
                    at + k + consumed
                };
            }
            None => render_preview(rule, state, at),
        }
    }
    Ok(matched)
}

fn regex(rule: &MagicLine, state: &mut State<'_>, compiled: Option<&Regex>, flags: StringFlags) -> Result<bool, TestError> {
    let at = state.offset;
    let data = state.buf.get(at..).ok_or(TestError::OutOfBounds)?;
    let found = match rule.test.op {
        TestOp::Always => None,
        TestOp::Equal => {
            let re = compiled.ok_or(TestError::Malformed("regex not compiled"))?;
            Some(re.find(data).map(|m| (m.start(), m.end())))
        }
        _ => return Err(TestError::Malformed("unsupported regex comparison")),
    };

    let raw = match found {
        None => true,
        Some(m) => m.is_some(),
    };
    let matched = raw != rule.test.negate;
    if matched {
        match found {
            Some(Some((start, end))) => {
                if rule.result.is_some() {
                    let text = preview(&data[start..end]);
                    state.render(rule, Arg::Str(Cow::Owned(text)));
                }
                state.offset = if flags.contains(StringFlags::MATCH_START) {
                    at + start
                } else {
                    at + end
                };
            }
            _ => render_preview(rule, state, at),
        }
    }
    Ok(matched)
}

/// Test `rule` at `state.offset`.
///
/// `compiled` is the rule's regex, when it is a regex rule.
pub fn test(rule: &MagicLine, compiled: Option<&Regex>, state: &mut State<'_>) -> Result<bool, TestError> {
    match rule.kind {
        MagicType::Integer { width, endian, signed } => integer(rule, state, width, endian, signed),
        MagicType::Float { endian } => float(rule, state, false, endian),
        MagicType::Double { endian } => float(rule, state, true, endian),
        MagicType::Date {
            width,
            endian,
            signed,
            local,
        } => date(rule, state, width, endian, signed, local),
        MagicType::String { flags } => string(rule, state, flags),
        MagicType::PString => pstring(rule, state),
        MagicType::Search { range, flags } => search(rule, state, range, flags),
        MagicType::Regex { flags } => regex(rule, state, compiled, flags),
        MagicType::Default => {
            state.render(rule, Arg::None);
            Ok(true)
        }
        MagicType::String16 { .. } => Err(TestError::NotImplemented),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_line;

    fn rule(text: &str) -> MagicLine {
        parse_line(1, text, &mut Vec::new()).unwrap()
    }

    /// Run `text` at `offset`, returning the verdict, output and cursor.
    fn run(text: &str, buf: &[u8], offset: usize) -> (Result<bool, TestError>, String, usize) {
        let rule = rule(text);
        let compiled = match rule.kind {
            MagicType::Regex { flags } => Some(compile_regex(rule.test.value.as_bytes(), flags).unwrap()),
            _ => None,
        };
        let mut state = State::new(buf);
        state.offset = offset;
        let verdict = test(&rule, compiled.as_ref(), &mut state);
        (verdict, state.out, state.offset)
    }

    #[test]
    fn emit_separators() {
        let mut state = State::new(b"");
        state.emit("ELF");
        state.emit("32-bit");
        state.emit("\\b, LSB");
        assert_eq!(state.out, "ELF 32-bit, LSB");

        state.emit(&"x".repeat(MAX_OUTPUT));
        assert_eq!(state.out.len(), MAX_OUTPUT);
    }

    #[test]
    fn previews() {
        assert_eq!(preview(b"hello\0world"), "hello");
        assert_eq!(preview(b"a\\b\x01c"), "a\\\\b");
        assert_eq!(preview(&[b'z'; 40]).len(), 31);
    }

    #[test]
    fn integer_widths_and_orders() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0];
        assert_eq!(read_uint(&buf, 0, Width::Short, Endian::Big), Ok(0x1234));
        assert_eq!(read_uint(&buf, 0, Width::Long, Endian::Little), Ok(0x7856_3412));
        assert_eq!(read_uint(&buf, 0, Width::Quad, Endian::Big), Ok(0x1234_5678_9abc_def0));
        assert_eq!(read_uint(&buf, 6, Width::Long, Endian::Big), Err(TestError::OutOfBounds));
        assert_eq!(read_uint(&buf, 0, Width::Long, Endian::Middle), Err(TestError::NotImplemented));
    }

    #[test]
    fn integer_tests() {
        let buf = [0xff, 0x00, 0x01, 0x02];
        assert_eq!(run("0 byte -1", &buf, 0).0, Ok(true));
        assert_eq!(run("0 ubyte 255", &buf, 0).0, Ok(true));
        assert_eq!(run("0 byte <0", &buf, 0).0, Ok(true));
        assert_eq!(run("0 ubyte <0x10", &buf, 0).0, Ok(false));
        assert_eq!(run("0 ubyte &0x81", &buf, 0).0, Ok(true));
        assert_eq!(run("0 ubyte ^0x81", &buf, 1).0, Ok(true));
        assert_eq!(run("0 ubyte !0", &buf, 0).0, Ok(true));
        assert_eq!(run("0 ubyte/0 x", &buf, 0).0, Err(TestError::Malformed("division by zero")));

        // pre-operator wraps within the width
        assert_eq!(run("0 ubyte+1 0", &buf, 0).0, Ok(true));
        assert_eq!(run("0 ubeshort%256 0x01", &buf, 1).0, Ok(true));
    }

    #[test]
    fn integer_cursor_moves_only_with_result() {
        let buf = [1, 2, 3, 4];
        let (verdict, out, cursor) = run("0 beshort 0x0102 version %d", &buf, 0);
        assert_eq!(verdict, Ok(true));
        assert_eq!(out, "version 258");
        assert_eq!(cursor, 2);

        let (_, out, cursor) = run("0 beshort 0x0102", &buf, 0);
        assert_eq!(out, "");
        assert_eq!(cursor, 0);
    }

    #[test]
    fn short_buffer_never_matches() {
        assert_eq!(run("0 belong !0", &[1, 2], 0).0, Err(TestError::OutOfBounds));
        assert_eq!(run("0 string !MZ", b"M", 0).0, Err(TestError::OutOfBounds));
        assert_eq!(run("0 pstring x", &[5, b'a'], 0).0, Err(TestError::OutOfBounds));
        assert_eq!(run("0 search/8 !PDF", b"PD", 0).0, Err(TestError::OutOfBounds));
    }

    #[test]
    fn floats() {
        let buf = 1.5f32.to_be_bytes();
        assert_eq!(run("0 befloat 1.5", &buf, 0).0, Ok(true));
        let (verdict, out, _) = run("0 befloat x %.1f", &buf, 0);
        assert_eq!(verdict, Ok(true));
        assert_eq!(out, "1.5");
        assert!(matches!(run("0 befloat >1.0", &buf, 0).0, Err(TestError::Malformed(_))));
        assert!(matches!(run("0 befloat+1 x", &buf, 0).0, Err(TestError::Malformed(_))));

        let buf = 2.25f64.to_le_bytes();
        assert_eq!(run("0 ledouble 2.25", &buf, 0).0, Ok(true));
    }

    #[test]
    fn dates() {
        let buf = 0u32.to_be_bytes();
        let (verdict, out, cursor) = run("0 bedate x created %s", &buf, 0);
        assert_eq!(verdict, Ok(true));
        assert_eq!(out, "created Thu Jan  1 00:00:00 1970");
        assert_eq!(cursor, 4);
        assert_eq!(run("0 medate x %s", &buf, 0).0, Err(TestError::NotImplemented));
    }

    #[test]
    fn string_compare_flags() {
        assert_eq!(run("0 string/c hello", b"HeLLo", 0).0, Ok(true));
        assert_eq!(run("0 string/C HELLO", b"hello", 0).0, Ok(true));
        assert_eq!(run("0 string/C hello", b"HELLO", 0).0, Ok(false));
        assert_eq!(run("0 string/b a\\ b", b"ab", 0).0, Ok(true));
        assert_eq!(run("0 string/W a\\ b", b"a   b", 0).0, Ok(true));
        assert_eq!(run("0 string/W a\\ b", b"abcd", 0).0, Ok(false));
        assert_eq!(run("0 string >\\0", b"x", 0).0, Ok(true));
        assert_eq!(run("0 string >\\0", b"\0", 0).0, Ok(false));
        assert_eq!(run("0 string <b", b"a", 0).0, Ok(true));
    }

    #[test]
    fn case_flags_order_folded_bytes() {
        assert_eq!(run("0 string/c <b", b"C", 0).0, Ok(false));
        assert_eq!(run("0 string/c <b", b"c", 0).0, Ok(false));
        assert_eq!(run("0 string/c <b", b"A", 0).0, Ok(true));
        assert_eq!(run("0 string/c >b", b"C", 0).0, Ok(true));
        assert_eq!(run("0 string/C >B", b"a", 0).0, Ok(false));
        assert_eq!(run("0 string/C <B", b"a", 0).0, Ok(true));
    }

    #[test]
    fn string_renders_preview_and_advances() {
        let (verdict, out, cursor) = run("0 string #! script %s", b"#!/bin/sh\nexit", 0);
        assert_eq!(verdict, Ok(true));
        assert_eq!(out, "script #!/bin/sh");
        assert_eq!(cursor, 2);

        let (_, _, cursor) = run("0 string !MZ", b"PK\x03\x04", 0);
        assert_eq!(cursor, 0);
    }

    #[test]
    fn pstring_lengths() {
        let buf = b"\x03abcdef";
        let (verdict, out, cursor) = run("0 pstring abc name %s", buf, 0);
        assert_eq!(verdict, Ok(true));
        assert_eq!(out, "name abc");
        assert_eq!(cursor, 4);
        assert_eq!(run("0 pstring >ab", buf, 0).0, Ok(true));
        assert_eq!(run("0 pstring <abcd", buf, 0).0, Ok(true));
        assert_eq!(run("0 pstring abd", buf, 0).0, Ok(false));
    }

    #[test]
    fn search_window() {
        let buf = b"....PDF....";
        let (verdict, _, cursor) = run("0 search/4 PDF", buf, 0);
        assert_eq!(verdict, Ok(true));
        assert_eq!(cursor, 7);

        let (_, _, cursor) = run("0 search/4/s PDF", buf, 0);
        assert_eq!(cursor, 4);

        assert_eq!(run("0 search/3 PDF", buf, 0).0, Ok(false));
        assert_eq!(run("0 search PDF", buf, 0).0, Ok(true));
        assert_eq!(run("0 search/2 PDF", buf, 2).0, Ok(true));
    }

    #[test]
    fn regex_match() {
        let (verdict, out, cursor) = run("0 regex/c ^<html html %s", b"  \n<HTML><body>", 0);
        assert_eq!(verdict, Ok(true));
        assert_eq!(out, "html <HTML");
        assert_eq!(cursor, 8);
        assert_eq!(run("0 regex ^<html", b"<body>", 0).0, Ok(false));
        assert_eq!(run("0 regex !^<html", b"<body>", 0).0, Ok(true));
    }

    #[test]
    fn default_and_unimplemented() {
        let (verdict, out, cursor) = run("0 default x fallback", b"", 0);
        assert_eq!(verdict, Ok(true));
        assert_eq!(out, "fallback");
        assert_eq!(cursor, 0);
        assert_eq!(run("0 bestring16 abc", b"\0a\0b\0c", 0).0, Err(TestError::NotImplemented));
    }
}
