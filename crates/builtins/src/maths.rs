//! # Maths
//! Numeric definitions backing the builtin tables.
//!
//! Everything defers to the platform maths library through the methods on the
//! scalar type, except the combinatorics helpers which carry their own
//! integer edge handling. Runtime failures never raise: domain errors produce
//! NaN and overflow produces infinity, both of which propagate through IEEE
//! arithmetic.

use crate::{Scalar, NAN};

#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn pi() -> Scalar {
  std::f64::consts::PI as Scalar
}

#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn e() -> Scalar {
  std::f64::consts::E as Scalar
}

/// Factorial over `floor(a)`.
///
/// Values in `[0, 1)` collapse to `0! == 1`. Negative input is NaN; anything
/// past `u32::MAX`, or any overflow along the way, is infinity.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn fac(a: Scalar) -> Scalar {
  if a < 0.0 {
    return NAN;
  }
  if a > u32::MAX as Scalar {
    return Scalar::INFINITY;
  }

  let n = a as u64;
  let mut result: u64 = 1;
  for i in 1..=n {
    result = match result.checked_mul(i) {
      Some(next) => next,
      None => return Scalar::INFINITY,
    };
  }
  result as Scalar
}

/// Combinations of `n` items taken `r` at a time.
///
/// NaN when either input is negative or `n < r`; infinity on overflow.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn ncr(n: Scalar, r: Scalar) -> Scalar {
  if n < 0.0 || r < 0.0 || n < r {
    return NAN;
  }
  if n > u32::MAX as Scalar || r > u32::MAX as Scalar {
    return Scalar::INFINITY;
  }

  let n = n as u64;
  let mut r = r as u64;
  if r > n / 2 {
    r = n - r;
  }

  let mut result: u64 = 1;
  for i in 1..=r {
    result = match result.checked_mul(n - r + i) {
      Some(next) => next,
      None => return Scalar::INFINITY,
    };
    result /= i;
  }
  result as Scalar
}

/// Permutations of `n` items taken `r` at a time
#[must_use]
pub fn npr(n: Scalar, r: Scalar) -> Scalar {
  ncr(n, r) * fac(r)
}

#[must_use]
pub fn abs(a: Scalar) -> Scalar {
  a.abs()
}
#[must_use]
pub fn acos(a: Scalar) -> Scalar {
  a.acos()
}
#[must_use]
pub fn asin(a: Scalar) -> Scalar {
  a.asin()
}
#[must_use]
pub fn atan(a: Scalar) -> Scalar {
  a.atan()
}
#[must_use]
pub fn atan2(a: Scalar, b: Scalar) -> Scalar {
  a.atan2(b)
}
#[must_use]
pub fn ceil(a: Scalar) -> Scalar {
  a.ceil()
}
#[must_use]
pub fn cos(a: Scalar) -> Scalar {
  a.cos()
}
#[must_use]
pub fn cosh(a: Scalar) -> Scalar {
  a.cosh()
}
#[must_use]
pub fn exp(a: Scalar) -> Scalar {
  a.exp()
}
#[must_use]
pub fn floor(a: Scalar) -> Scalar {
  a.floor()
}
#[must_use]
pub fn ln(a: Scalar) -> Scalar {
  a.ln()
}
#[must_use]
pub fn log10(a: Scalar) -> Scalar {
  a.log10()
}
/// Base-10 by default; the `natural-log` feature switches this to [`ln`]
#[must_use]
pub fn log(a: Scalar) -> Scalar {
  #[cfg(not(feature = "natural-log"))]
  {
    a.log10()
  }
  #[cfg(feature = "natural-log")]
  {
    a.ln()
  }
}
#[must_use]
pub fn pow(a: Scalar, b: Scalar) -> Scalar {
  a.powf(b)
}
#[must_use]
pub fn sin(a: Scalar) -> Scalar {
  a.sin()
}
#[must_use]
pub fn sinh(a: Scalar) -> Scalar {
  a.sinh()
}
#[must_use]
pub fn sqrt(a: Scalar) -> Scalar {
  a.sqrt()
}
#[must_use]
pub fn tan(a: Scalar) -> Scalar {
  a.tan()
}
#[must_use]
pub fn tanh(a: Scalar) -> Scalar {
  a.tanh()
}

#[must_use]
pub fn add(a: Scalar, b: Scalar) -> Scalar {
  a + b
}
#[must_use]
pub fn sub(a: Scalar, b: Scalar) -> Scalar {
  a - b
}
#[must_use]
pub fn mul(a: Scalar, b: Scalar) -> Scalar {
  a * b
}
#[must_use]
pub fn divide(a: Scalar, b: Scalar) -> Scalar {
  a / b
}
#[must_use]
pub fn fmod(a: Scalar, b: Scalar) -> Scalar {
  a % b
}
#[must_use]
pub fn negate(a: Scalar) -> Scalar {
  -a
}

/// The comma operator: evaluate both sides, keep the right
#[must_use]
pub fn comma(_: Scalar, b: Scalar) -> Scalar {
  b
}

#[must_use]
pub fn greater(a: Scalar, b: Scalar) -> Scalar {
  Scalar::from(a > b)
}
#[must_use]
pub fn greater_eq(a: Scalar, b: Scalar) -> Scalar {
  Scalar::from(a >= b)
}
#[must_use]
pub fn lower(a: Scalar, b: Scalar) -> Scalar {
  Scalar::from(a < b)
}
#[must_use]
pub fn lower_eq(a: Scalar, b: Scalar) -> Scalar {
  Scalar::from(a <= b)
}
#[must_use]
pub fn equal(a: Scalar, b: Scalar) -> Scalar {
  Scalar::from(a == b)
}
#[must_use]
pub fn not_equal(a: Scalar, b: Scalar) -> Scalar {
  Scalar::from(a != b)
}

/// Both operands are evaluated; there is no short-circuiting
#[must_use]
pub fn logical_and(a: Scalar, b: Scalar) -> Scalar {
  Scalar::from(a != 0.0 && b != 0.0)
}
/// Both operands are evaluated; there is no short-circuiting
#[must_use]
pub fn logical_or(a: Scalar, b: Scalar) -> Scalar {
  Scalar::from(a != 0.0 || b != 0.0)
}
#[must_use]
pub fn logical_not(a: Scalar) -> Scalar {
  Scalar::from(a == 0.0)
}
#[must_use]
pub fn logical_notnot(a: Scalar) -> Scalar {
  Scalar::from(a != 0.0)
}
#[must_use]
pub fn negate_logical_not(a: Scalar) -> Scalar {
  -Scalar::from(a == 0.0)
}
#[must_use]
pub fn negate_logical_notnot(a: Scalar) -> Scalar {
  -Scalar::from(a != 0.0)
}
