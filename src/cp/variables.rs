//! Reference-host variable types.

use std::fmt;

/// Handle to an integer variable stored in a [`DomainArena`](super::DomainArena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An integer variable with a domain [min, max].
#[derive(Debug, Clone)]
pub struct IntVar {
    /// Variable name, used in logs.
    pub name: String,
    /// Current minimum value.
    pub min: i64,
    /// Current maximum value.
    pub max: i64,
}

impl IntVar {
    /// Creates a new integer variable with the given bounds.
    pub fn new(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    /// Creates a fixed integer variable.
    pub fn fixed(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, value, value)
    }

    /// Whether this variable is fixed to a single value.
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Domain size (max - min + 1), zero when empty.
    pub fn domain_size(&self) -> i64 {
        (self.max - self.min + 1).max(0)
    }
}

/// A bound fact about a variable: `[var >= value]` or `[var <= value]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundLiteral {
    AtLeast { var: VarId, value: i64 },
    AtMost { var: VarId, value: i64 },
}

impl BoundLiteral {
    pub fn at_least(var: VarId, value: i64) -> Self {
        BoundLiteral::AtLeast { var, value }
    }

    pub fn at_most(var: VarId, value: i64) -> Self {
        BoundLiteral::AtMost { var, value }
    }

    pub fn var(&self) -> VarId {
        match *self {
            BoundLiteral::AtLeast { var, .. } | BoundLiteral::AtMost { var, .. } => var,
        }
    }

    /// Whether the fact holds for the bounds `[min, max]`.
    pub fn holds(&self, min: i64, max: i64) -> bool {
        match *self {
            BoundLiteral::AtLeast { value, .. } => min >= value,
            BoundLiteral::AtMost { value, .. } => max <= value,
        }
    }
}

impl fmt::Display for BoundLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundLiteral::AtLeast { var, value } => write!(f, "[{var} >= {value}]"),
            BoundLiteral::AtMost { var, value } => write!(f, "[{var} <= {value}]"),
        }
    }
}
