//! Rules bundled with the crate.

use super::ruleset::MagicSet;

/// Compiled on first use.
lazy_static! {
    pub static ref BUILTIN: MagicSet = {
        MagicSet::from_reader(include_str!("magic").as_bytes(), "builtin")
            .unwrap_or_else(|_| MagicSet::empty("builtin"))
    };
}

/// The bundled rules in the `magic(5)` text format.
pub fn source() -> &'static str {
    include_str!("magic")
}
