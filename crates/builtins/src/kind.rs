use std::fmt;

/// The packed tag identifying what a compiled node is.
///
/// The low five bits hold the category: variable (0), constant (1), functions
/// of arity 0–7 (8–15), or closures of arity 0–7 (16–23). Bit five marks the
/// node as pure, meaning it is safe to fold at compile time. The same encoding
/// is stored as a little-endian `u32` in the portable image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Kind(u32);

impl Kind {
  /// A scalar read through a host address
  pub const VARIABLE: Self = Self(0);
  /// An inline scalar value
  pub const CONSTANT: Self = Self(1);

  const FUNCTION_BASE: u32 = 8;
  const CLOSURE_BASE: u32 = 16;
  const CATEGORY_MASK: u32 = 0x1f;
  const ARITY_MASK: u32 = 0x07;
  const PURE_FLAG: u32 = 1 << 5;

  /// The tag for a host function of the given arity.
  ///
  /// # Panics
  /// If the arity is greater than 7.
  #[must_use]
  pub fn function(arity: usize) -> Self {
    assert!(arity <= 7, "functions have arity 0-7");
    Self(Self::FUNCTION_BASE + u32::try_from(arity).unwrap())
  }

  /// The tag for a host closure of the given arity.
  ///
  /// # Panics
  /// If the arity is greater than 7.
  #[must_use]
  pub fn closure(arity: usize) -> Self {
    assert!(arity <= 7, "closures have arity 0-7");
    Self(Self::CLOSURE_BASE + u32::try_from(arity).unwrap())
  }

  /// The same tag, flagged as safe to constant fold
  #[must_use]
  pub fn pure(self) -> Self {
    Self(self.0 | Self::PURE_FLAG)
  }

  /// The category bits, with the purity flag stripped
  #[must_use]
  pub fn category(self) -> u32 {
    self.0 & Self::CATEGORY_MASK
  }

  /// Is this node safe to evaluate at compile time?
  #[must_use]
  pub fn is_pure(self) -> bool {
    self.0 & Self::PURE_FLAG != 0
  }

  #[must_use]
  pub fn is_function(self) -> bool {
    matches!(self.category(), 8..=15)
  }

  #[must_use]
  pub fn is_closure(self) -> bool {
    matches!(self.category(), 16..=23)
  }

  /// How many operands the node consumes.
  ///
  /// Zero for variables and constants; the low three category bits otherwise.
  #[must_use]
  pub fn arity(self) -> usize {
    if self.0 & (Self::FUNCTION_BASE | Self::CLOSURE_BASE) == 0 {
      0
    } else {
      (self.0 & Self::ARITY_MASK) as usize
    }
  }

  /// The raw encoding, as stored in the portable image
  #[must_use]
  pub fn bits(self) -> u32 {
    self.0
  }

  /// Rebuild a tag from its raw encoding
  #[must_use]
  pub fn from_bits(bits: u32) -> Self {
    Self(bits)
  }
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.category() {
      0 => write!(f, "variable"),
      1 => write!(f, "constant"),
      8..=15 => write!(f, "function/{}", self.arity()),
      16..=23 => write!(f, "closure/{}", self.arity()),
      _ => write!(f, "unknown"),
    }
  }
}
