//! # AST
//! The transient expression tree produced by the parser.
//!
//! Nodes are allocated in a bump arena and borrow identifier names from the
//! source string. Leaves are already resolved: variables carry the host
//! address they read from, calls carry the host callable they dispatch to.
//! The tree exists only inside compilation; lowering turns it into the
//! position-independent image.

use crate::allocator::{Box, Vec};
use shade_builtins::{Callable, Kind, Scalar};

/// An expression node
#[derive(Debug)]
pub enum Expression<'source, 'ast> {
  Constant(Constant),
  Variable(Variable<'source>),
  Call(Box<'ast, Call<'source, 'ast>>),
}
impl Expression<'_, '_> {
  /// The packed tag this node lowers to
  #[must_use]
  pub fn kind(&self) -> Kind {
    match self {
      Self::Constant(_) => Kind::CONSTANT,
      Self::Variable(_) => Kind::VARIABLE,
      Self::Call(call) => call.kind,
    }
  }

  #[must_use]
  pub fn is_constant(&self) -> bool {
    matches!(self, Self::Constant(_))
  }
}

/// A scalar literal, or a folded subtree
#[derive(Clone, Copy, Debug)]
pub struct Constant {
  pub value: Scalar,
}

/// A scalar read through a host address at every evaluation
#[derive(Clone, Copy, Debug)]
pub struct Variable<'source> {
  pub name: &'source str,
  pub address: *mut Scalar,
}

/// A call to a host function or closure.
///
/// Operators desugar to calls as well: `a + b` is a call to the builtin
/// `add`. The name is kept for the compiled name table.
#[derive(Debug)]
pub struct Call<'source, 'ast> {
  pub name: &'source str,
  pub kind: Kind,
  pub callable: Callable,
  pub arguments: Vec<'ast, Expression<'source, 'ast>>,
}
