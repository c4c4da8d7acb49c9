use crate::{maths, Callable, Kind, NativeFn};

/// An entry in the builtin registry.
///
/// Every builtin is pure: its result depends only on its arguments, so the
/// optimiser may evaluate it at compile time.
#[derive(Clone, Copy, Debug)]
pub struct Builtin {
  pub name: &'static str,
  pub function: NativeFn,
}
impl Builtin {
  /// The packed tag a call to this builtin produces
  #[must_use]
  pub fn kind(&self) -> Kind {
    Kind::function(self.function.arity()).pure()
  }

  #[must_use]
  pub fn callable(&self) -> Callable {
    Callable::Function(self.function)
  }
}

macro_rules! builtin {
  ($name:literal, $arity:ident, $function:path) => {
    Builtin {
      name: $name,
      function: NativeFn::$arity($function),
    }
  };
}

/// Builtin functions callable by name, in alphabetical order
pub static FUNCTIONS: [Builtin; 24] = [
  builtin!("abs", F1, maths::abs),
  builtin!("acos", F1, maths::acos),
  builtin!("asin", F1, maths::asin),
  builtin!("atan", F1, maths::atan),
  builtin!("atan2", F2, maths::atan2),
  builtin!("ceil", F1, maths::ceil),
  builtin!("cos", F1, maths::cos),
  builtin!("cosh", F1, maths::cosh),
  builtin!("e", F0, maths::e),
  builtin!("exp", F1, maths::exp),
  builtin!("fac", F1, maths::fac),
  builtin!("floor", F1, maths::floor),
  builtin!("ln", F1, maths::ln),
  builtin!("log", F1, maths::log),
  builtin!("log10", F1, maths::log10),
  builtin!("ncr", F2, maths::ncr),
  builtin!("npr", F2, maths::npr),
  builtin!("pi", F0, maths::pi),
  builtin!("pow", F2, maths::pow),
  builtin!("sin", F1, maths::sin),
  builtin!("sinh", F1, maths::sinh),
  builtin!("sqrt", F1, maths::sqrt),
  builtin!("tan", F1, maths::tan),
  builtin!("tanh", F1, maths::tanh),
];

/// Builtin operators backing the language's operator tokens, in alphabetical
/// order. They stay resolvable by name, so `pow(2, 10)` and `2 ^ 10` compile
/// to the same call.
pub static OPERATORS: [Builtin; 20] = [
  builtin!("add", F2, maths::add),
  builtin!("comma", F2, maths::comma),
  builtin!("divide", F2, maths::divide),
  builtin!("equal", F2, maths::equal),
  builtin!("fmod", F2, maths::fmod),
  builtin!("greater", F2, maths::greater),
  builtin!("greater_eq", F2, maths::greater_eq),
  builtin!("logical_and", F2, maths::logical_and),
  builtin!("logical_not", F1, maths::logical_not),
  builtin!("logical_notnot", F1, maths::logical_notnot),
  builtin!("logical_or", F2, maths::logical_or),
  builtin!("lower", F2, maths::lower),
  builtin!("lower_eq", F2, maths::lower_eq),
  builtin!("mul", F2, maths::mul),
  builtin!("negate", F1, maths::negate),
  builtin!("negate_logical_not", F1, maths::negate_logical_not),
  builtin!("negate_logical_notnot", F1, maths::negate_logical_notnot),
  builtin!("not_equal", F2, maths::not_equal),
  builtin!("pow", F2, maths::pow),
  builtin!("sub", F2, maths::sub),
];

fn search(table: &'static [Builtin], name: &str) -> Option<&'static Builtin> {
  table
    .binary_search_by(|builtin| builtin.name.cmp(&name))
    .ok()
    .map(|index| &table[index])
}

/// Look a builtin up by name, searching functions then operators
#[must_use]
pub fn find_builtin(name: &str) -> Option<&'static Builtin> {
  search(&FUNCTIONS, name).or_else(|| search(&OPERATORS, name))
}

/// Look a builtin up by the identity of its function pointer.
///
/// Returns the first entry whose address matches, functions before operators.
/// Entries sharing an implementation (`pow` appears in both tables) resolve
/// to the first occurrence.
#[must_use]
pub fn find_by_address(address: usize) -> Option<&'static Builtin> {
  FUNCTIONS
    .iter()
    .chain(OPERATORS.iter())
    .find(|builtin| builtin.function.address() == address)
}
