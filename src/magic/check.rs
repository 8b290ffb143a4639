use petgraph::prelude::*;

use super::decode::{self, read_uint, State};
use super::ruleset::MagicSet;
use super::{Endian, IndirectType, Offset, OffsetBase, Width};
use crate::error::TestError;
use crate::TestFlags;

/// Read the value an indirect offset points at.
fn read_indirect(buf: &[u8], at: usize, kind: IndirectType) -> Result<i64, TestError> {
    let (width, endian) = match kind {
        IndirectType::Byte | IndirectType::UByte => (Width::Byte, Endian::Little),
        IndirectType::LeShort => (Width::Short, Endian::Little),
        IndirectType::BeShort => (Width::Short, Endian::Big),
        IndirectType::LeLong => (Width::Long, Endian::Little),
        IndirectType::BeLong => (Width::Long, Endian::Big),
    };
    let v = read_uint(buf, at, width, endian)?;
    Ok(match kind {
        IndirectType::Byte => i64::from(v as u8 as i8),
        _ => v as i64,
    })
}

/// Work out where a rule reads, given the cursor left by its parent.
///
/// `None` if the offset falls outside the buffer; the buffer length itself
/// is allowed.
pub fn resolve_offset(offset: &Offset, buf: &[u8], cursor: usize) -> Option<usize> {
    let mut at = match &offset.base {
        OffsetBase::Direct(n) => *n,
        OffsetBase::Indirect(ind) => {
            let mut base = ind.base;
            if ind.relative {
                base = base.wrapping_add(cursor as i64);
            }
            let base = usize::try_from(base).ok()?;
            let value = read_indirect(buf, base, ind.kind).ok()?;
            match ind.op {
                Some((op, operand)) => op.apply(value, operand)?,
                None => value,
            }
        }
    };
    if offset.relative {
        at = at.wrapping_add(cursor as i64);
    }

    let at = usize::try_from(at).ok()?;
    if at > buf.len() {
        return None;
    }
    Some(at)
}

impl MagicSet {
    /// Test one rule and, if it matches, its continuations.
    fn test_line(&self, node: NodeIndex, state: &mut State<'_>, cursor: usize) -> bool {
        let rule = &self.graph[node];
        let at = match resolve_offset(&rule.offset, state.buf, cursor) {
            Some(at) => at,
            None => {
                trace!("{}, {}: offset out of range", self.name(), rule.line);
                return false;
            }
        };

        state.offset = at;
        match decode::test(rule, self.regexes.get(&node), state) {
            Ok(true) => {}
            Ok(false) | Err(TestError::OutOfBounds) => return false,
            Err(e) => {
                warn!("{}, {}: {} {}", self.name(), rule.line, rule.type_name, e);
                return false;
            }
        }
        trace!("{}, {}: matched at {}", self.name(), rule.line, at);

        if let Some(mime) = &rule.mime {
            state.mime = Some(mime.to_string());
        }
        let cursor = state.offset;
        for child in self.children(node) {
            self.test_line(child, state, cursor);
        }
        true
    }

    /// Identify `buf`.
    ///
    /// Returns the description, or with [`TestFlags::MIME`] the MIME type of
    /// the match. `None` when no rule produced a description.
    pub fn test(&self, buf: &[u8], flags: TestFlags) -> Option<String> {
        let mut state = State::new(buf);
        for &root in self.roots.values() {
            if flags.contains(TestFlags::TEXT) && !self.graph[root].text {
                continue;
            }
            // only the rule that ends the walk may supply the MIME type
            state.mime = None;
            state.out.clear();
            if self.test_line(root, &mut state, 0) && !state.out.is_empty() {
                debug!("{}: matched rule at line {}", self.name(), self.graph[root].line);
                break;
            }
        }

        let description = state.out.trim_end();
        if description.is_empty() {
            return None;
        }
        if flags.contains(TestFlags::MIME) {
            return state.mime;
        }
        Some(description.to_string())
    }
}
