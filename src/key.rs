//! Node identifiers for task graphs.
//!
//! Every node in a [`TaskGraph`](crate::TaskGraph) is addressed by a [`Key`]:
//! either a free-standing atom or a `(name, index)` pair naming one block of
//! a partitioned frame. Keys are hashable and carry a canonical total order
//! that the scheduler uses to break priority ties deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node in a task graph.
///
/// The derived `Ord` is the canonical comparator: atoms sort before block
/// keys, atoms compare lexicographically, and block keys compare by table
/// name and then position.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A free-standing task name.
    Atom(String),
    /// Block `index` of the logical table called `name`.
    Block(String, usize),
}

impl Key {
    /// Key of one block of a named table.
    #[must_use]
    pub fn block(name: impl Into<String>, index: usize) -> Self {
        Key::Block(name.into(), index)
    }

    /// A free-standing atom key.
    #[must_use]
    pub fn atom(name: impl Into<String>) -> Self {
        Key::Atom(name.into())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Atom(name) => write!(f, "{name}"),
            Key::Block(name, index) => write!(f, "({name}, {index})"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Atom(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Atom(name)
    }
}
