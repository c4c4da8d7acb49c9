//! # Interpreter
//! Compile expressions and programs into position-independent byte images,
//! and evaluate those images against live host bindings.
//!
//! Compilation parses the source into a transient arena AST, folds the pure
//! constant subtrees, then lowers the tree into a contiguous buffer where
//! every host pointer has been replaced by an index into a side table. The
//! resulting image can be copied, stored, and evaluated repeatedly; only the
//! address table knows where the host's variables and functions actually
//! live.
//!
//! ```
//! use shade_interpreter::{compile_expression, interpret, Binding, Scalar};
//!
//! assert_eq!(interpret("1 + 2 * 3"), 7.0);
//!
//! let mut x: Scalar = 2.0;
//! let bindings = [Binding::variable("x", &mut x)];
//! let expression = compile_expression("x ^ 3", &bindings).unwrap();
//! assert_eq!(expression.evaluate(), 8.0);
//! ```
//!
//! Programs layer `;`-separated statements over the same machinery:
//!
//! ```
//! use shade_interpreter::{compile_program, Binding, Scalar};
//!
//! let mut x: Scalar = 0.0;
//! let bindings = [Binding::variable("x", &mut x)];
//! let program = compile_program(
//!   "x: 0; label: loop; x: x + 1; jump: loop ? x < 10; return: x;",
//!   &bindings,
//! )
//! .unwrap();
//! assert_eq!(program.evaluate(), 10.0);
//! ```

#![allow(unsafe_code)]

mod compiler;
mod image;
mod optimiser;
mod program;
mod table;
mod vm;

#[cfg(test)]
mod test;

pub use compiler::{compile_expression, interpret, CompileError, CompiledExpression};
pub use image::Image;
pub use program::{compile_program, evaluate_program, CompiledProgram, Statement};
pub use table::{Address, AddressTable};
pub use vm::evaluate;

pub use shade_builtins::{
  find_builtin, find_by_address, maths, Binding, BindingTarget, Builtin, Callable, ClosureFn, Kind,
  NativeFn, Scalar, NAN,
};
pub use shade_syntax::ParseError;
