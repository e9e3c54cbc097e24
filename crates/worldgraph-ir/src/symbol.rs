//! Interned-by-refcount symbol names.

use std::fmt;
use std::sync::Arc;

/// A free variable such as `x3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: impl AsRef<str>) -> Self {
        Symbol(Arc::from(name.as_ref()))
    }

    /// Conventional variable name `x<n>`.
    pub fn numbered(n: u64) -> Self {
        Symbol::new(format!("x{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Every maximal run of ASCII digits in the name, parsed as integers.
    pub fn digit_runs(&self) -> impl Iterator<Item = u64> + '_ {
        self.0
            .split(|c: char| !c.is_ascii_digit())
            .filter(|run| !run.is_empty())
            .filter_map(|run| run.parse().ok())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol::new(value)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
