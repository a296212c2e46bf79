//! Interactive selection capability.
//!
//! Every decision the tool cannot make on its own is delegated through this
//! trait: detection-method selection, signature disambiguation, manual
//! engine/version entry, database subset selection, and post-run removal
//! confirmation. The terminal implementation lives in the binary; tests
//! supply scripted fakes so the core runs without a terminal.

use crate::error::Result;

/// Capability for resolving ambiguity via an external party.
pub trait Chooser: Send + Sync {
    /// Present `options` and return exactly one of them.
    fn choose(&self, prompt: &str, options: &[String]) -> Result<String>;

    /// Present `options` and return a subset of them, possibly empty.
    fn multi_choose(&self, prompt: &str, options: &[String]) -> Result<Vec<String>>;

    /// Ask for free-form text, returning `default` on empty input.
    fn text_input(&self, prompt: &str, default: &str) -> Result<String>;
}
