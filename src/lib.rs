//! `magic_tree` compiles magic(5) rule files into a decision tree and
//! identifies byte buffers against it.
//!
//! # About
//! A rule file is read once into a `petgraph` tree: every top-level rule is
//! a root, and each continuation line (`>`, `>>`, ...) hangs off the rule
//! above it. Roots are ordered by strength, so the most specific rules are
//! tried first, and a buffer is described by the first root that matches
//! along with whatever its continuations add.
//!
//! # Features
//! - Numeric tests of every width and byte order, with pre-operators
//! - Indirect offsets (`(0x3c.l+4)`) and cursor-relative offsets (`&2`)
//! - `string`, `pstring`, `search` and `regex` tests with their flags
//! - Dates rendered in UTC or local time
//! - `!:mime` and `!:strength` directives
//! - A bundled rule set, available through [`from_u8`] and [`mime_from_u8`]
//!
//! # Feature flags
//! `cli`: Enable building of the `magicfile` binary
//!
//! # Example
//! ```rust
//! use magic_tree::{MagicSet, TestFlags};
//!
//! let rules = "0\tbelong\t0x7f454c46\tELF\n>4\tbyte\t1\t32-bit\n";
//! let set = MagicSet::from_reader(rules.as_bytes(), "elf").unwrap();
//!
//! let result = set.test(b"\x7fELF\x01", TestFlags::empty());
//! assert_eq!(result.as_deref(), Some("ELF 32-bit"));
//! ```

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

use std::fs::{self, File};
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use bitflags::bitflags;

pub mod basetype;
pub mod error;
pub mod magic;
pub mod parse;

pub use crate::error::{Error, ParseError, Result, TestError, Warning};
pub use crate::magic::builtin::BUILTIN;
pub use crate::magic::ruleset::MagicSet;
pub use crate::magic::MagicLine;

bitflags! {
    /// How [`MagicSet::test`] evaluates a buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TestFlags: u8 {
        /// Only try rules that read text
        const TEXT = 1 << 0;
        /// Return the MIME type of the match instead of its description
        const MIME = 1 << 1;
    }
}

/// Most bytes read from a file for identification.
pub const READ_LIMIT: u64 = 1 << 20;

/// Describes a byte stream with the bundled rules.
///
/// # Examples
/// ```rust
/// let result = magic_tree::from_u8(b"%PDF-1.7\n");
/// assert_eq!(result.as_deref(), Some("PDF document, version 1.7"));
/// ```
pub fn from_u8(bytes: &[u8]) -> Option<String> {
    BUILTIN.test(bytes, TestFlags::empty())
}

/// Gets the MIME type of a byte stream with the bundled rules.
///
/// # Examples
/// ```rust
/// let result = magic_tree::mime_from_u8(b"GIF89a\x01\x00\x01\x00");
/// assert_eq!(result.as_deref(), Some("image/gif"));
///
/// // no rule for this one
/// assert_eq!(magic_tree::mime_from_u8(b"\x00\x01\x02"), None);
/// ```
pub fn mime_from_u8(bytes: &[u8]) -> Option<String> {
    BUILTIN.test(bytes, TestFlags::MIME)
}

/// Identify `bytes` with `set`, never failing.
///
/// Text is tested against text rules only. When nothing matches, the base
/// type from [`basetype::fallback`] is returned.
pub fn identify(set: &MagicSet, bytes: &[u8], mime: bool) -> String {
    if bytes.is_empty() {
        return basetype::fallback(bytes, mime).to_string();
    }
    let mut flags = if mime { TestFlags::MIME } else { TestFlags::empty() };
    if basetype::text_type(bytes).is_some() {
        flags |= TestFlags::TEXT;
    }
    set.test(bytes, flags)
        .unwrap_or_else(|| basetype::fallback(bytes, mime).to_string())
}

/// Read at most `limit` bytes from the start of a file.
pub fn read_bytes(filepath: &Path, limit: u64) -> Result<Vec<u8>> {
    let f = File::open(filepath)?;
    let r = BufReader::new(f);
    let mut b = Vec::<u8>::new();
    r.take(limit).read_to_end(&mut b)?;
    Ok(b)
}

fn identify_filepath(filepath: &Path, mime: bool) -> Result<String> {
    if fs::metadata(filepath)?.is_dir() {
        return Ok(basetype::directory(mime).to_string());
    }
    let b = read_bytes(filepath, READ_LIMIT)?;
    Ok(identify(&BUILTIN, &b, mime))
}

/// Describes a file with the bundled rules.
///
/// Does not look at the file name, only at the first megabyte of content.
/// Directories and unrecognised files get their base type.
pub fn from_filepath(filepath: &Path) -> Result<String> {
    identify_filepath(filepath, false)
}

/// Gets the MIME type of a file with the bundled rules.
pub fn mime_from_filepath(filepath: &Path) -> Result<String> {
    identify_filepath(filepath, true)
}
