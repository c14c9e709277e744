//! # Module identifiers.
//!
//! A [`ModuleId`] names one remote repository module to mirror. It is an
//! opaque string: the runtime never inspects its structure beyond using it
//! to derive remote URLs and local paths. Identifiers are immutable once
//! enqueued and uniqueness is not enforced — a module listed twice is
//! simply mirrored twice.

use std::fmt;
use std::sync::Arc;

/// Opaque name of one remote repository module.
///
/// Cheap to clone (`Arc`-backed), so it can travel through the queue,
/// the event bus, and notification payloads without copying the string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    /// Creates a module identifier from any string-like value.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
