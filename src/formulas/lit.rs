/// Index of a Boolean variable.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Var(pub usize);

impl Var {
    /// Last possible representation of a variable.
    pub const MAX: Self = Self(usize::MAX);

    /// The positive literal on this variable.
    pub const fn pos_lit(self) -> Lit {
        Lit(self.0 << 1)
    }

    /// The negative literal on this variable.
    pub const fn neg_lit(self) -> Lit {
        Lit(self.0 << 1 | 1)
    }
}

/// A literal, encoded as `2 * var + sign` so that a literal and its negation
/// are adjacent and a variable's literals can index watcher lists directly.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Lit(pub usize);

impl Lit {
    /// Last possible representation of a literal.
    pub const MAX: Self = Self(usize::MAX);

    /// Constructs a literal on `var`, negated if `sign` is `true`.
    pub const fn new(var: Var, sign: bool) -> Self {
        Self(var.0 << 1 | sign as usize)
    }

    /// The variable this literal is on.
    pub const fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    /// Returns `true` for a negative literal.
    pub const fn sign(self) -> bool {
        self.0 & 1 == 1
    }

    /// The negation of this literal.
    #[must_use]
    pub const fn negate(self) -> Self {
        Self(self.0 ^ 1)
    }
}
