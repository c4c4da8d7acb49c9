//! # Syntax
//! Tokenise and parse expression source into an arena-allocated AST.
//!
//! The parser is a recursive descent over a fixed precedence ladder, with the
//! language's unusual prefix handling: runs of `+`/`-`/`!` collapse into a
//! single sign and logical state which wrap the parsed operand. Identifiers
//! resolve against the caller's binding table first and the builtin registry
//! second, so the AST carries resolved host addresses and callables rather
//! than names alone.
//!
//! The AST only lives as long as the arena it is allocated in; compilation
//! lowers it into a portable image and drops it before returning.

#![deny(unsafe_code)]

pub mod ast;
mod parser;
mod tokeniser;


use shade_builtins::Binding;

/// Parses an expression string into an AST.
///
/// The expression ends at the first `;` or the end of the input. Identifiers
/// are resolved against `bindings` (linear search) and then the builtin
/// registry (binary search).
///
/// # Examples
/// ```
/// use shade_syntax::{parse, Allocator};
/// let allocator = Allocator::new();
/// let ast = parse("1 + 2 * 3", &[], &allocator);
///
/// assert!(ast.is_ok());
/// ```
///
/// # Errors
/// If the syntax of the source is invalid, with the source position of the
/// first failure.
pub fn parse<'source, 'ast>(
  source: &'source str,
  bindings: &[Binding],
  allocator: &'ast Allocator,
) -> Result<ast::Expression<'source, 'ast>, ParseError> {
  parser::Parser::new(source, bindings, allocator).parse()
}

/// Get the tokens from an expression string
pub fn tokenise(source: &str) -> impl Iterator<Item = tokeniser::Token> + '_ {
  tokeniser::Tokeniser::from(source)
}

/// Bump allocator for the AST
pub mod allocator {
  /// Arena allocator
  pub type Allocator = bumpalo::Bump;
  /// `Box` in the bump allocator
  pub type Box<'allocator, T> = bumpalo::boxed::Box<'allocator, T>;
  /// `Vec` in the bump allocator
  pub type Vec<'allocator, T> = bumpalo::collections::Vec<'allocator, T>;
}
pub use allocator::Allocator;
pub use parser::ParseError;
pub use tokeniser::{Token, TokenKind};
