//! Handles "base types": what a file is when no rule describes it.

/// Description and MIME type of each base type
const EMPTY: (&str, &str) = ("empty", "application/x-empty");
const DIRECTORY: (&str, &str) = ("directory", "inode/directory");
const ASCII: (&str, &str) = ("ASCII text", "text/plain");
const UTF8: (&str, &str) = ("UTF-8 Unicode text", "text/plain");
const DATA: (&str, &str) = ("data", "application/octet-stream");

fn pick(base: (&'static str, &'static str), mime: bool) -> &'static str {
    if mime {
        base.1
    } else {
        base.0
    }
}

fn is_text_byte(b: u8) -> bool {
    matches!(b, 0x20..=0x7e | b'\t' | b'\n' | b'\r' | 0x0c | 0x08 | 0x1b)
}

fn base_text(buf: &[u8]) -> Option<(&'static str, &'static str)> {
    if buf.is_empty() || buf.contains(&0) {
        return None;
    }
    if buf.iter().all(|&b| is_text_byte(b)) {
        return Some(ASCII);
    }

    // the read may have cut a character in half
    let valid = match std::str::from_utf8(buf) {
        Ok(s) => s,
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&buf[..e.valid_up_to()]).ok()?,
        Err(_) => return None,
    };
    let control = valid
        .chars()
        .any(|c| c.is_control() && !(c.is_ascii() && is_text_byte(c as u8)));
    if control {
        None
    } else {
        Some(UTF8)
    }
}

/// Name of the plain-text encoding of `buf`, if it is text at all.
///
/// Text buffers are tested against text rules only.
pub fn text_type(buf: &[u8]) -> Option<&'static str> {
    base_text(buf).map(|t| t.0)
}

/// What `buf` is when no rule matched: a description, or a MIME type with
/// `mime` set.
pub fn fallback(buf: &[u8], mime: bool) -> &'static str {
    if buf.is_empty() {
        return pick(EMPTY, mime);
    }
    pick(base_text(buf).unwrap_or(DATA), mime)
}

/// Base type of a directory.
pub fn directory(mime: bool) -> &'static str {
    pick(DIRECTORY, mime)
}
