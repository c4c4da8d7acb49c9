use crate::compiler::{compile_to_image, display_node, CompileError};
use crate::image::{Image, Node};
use crate::table::{Address, AddressInterner, AddressTable};
use crate::vm::evaluate;
use rustc_hash::FxHashMap;
use shade_builtins::{Binding, BindingTarget, Scalar, NAN};
use std::fmt;

/// One step of a compiled program.
///
/// Expressions are identified by the byte offset where they start inside the
/// program's concatenated image; destinations are address table indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Statement {
  /// Continue at another statement
  Jump { target: usize },
  /// Continue at another statement when the condition is non-zero
  JumpIf { target: usize, expression: usize },
  /// Evaluate and return the result immediately
  Return { expression: usize },
  /// Evaluate and write the result through a host binding
  Assign {
    destination: usize,
    expression: usize,
  },
  /// Evaluate for its side effects, discarding the result
  Call { expression: usize },
}

/// A statement before labels and expressions have been resolved
enum PendingStatement<'source> {
  Jump { label: &'source str },
  JumpIf { label: &'source str, expression: usize },
  Return { expression: usize },
  Assign { name: &'source str, expression: usize },
  Call { expression: usize },
}

/// Compile a `;`-separated program against a table of host bindings.
///
/// Statements take the form `head : tail`: `label` defines a jump target,
/// `jump` transfers control (with an optional `? condition`), `return` ends
/// evaluation, any other head assigns to that variable, and a statement with
/// no `:` is evaluated for its side effects. Every embedded expression
/// compiles through the expression pipeline with one shared address table,
/// and their images concatenate into a single buffer.
///
/// # Examples
/// ```
/// use shade_interpreter::{compile_program, Binding, Scalar};
///
/// let mut x: Scalar = 0.0;
/// let bindings = [Binding::variable("x", &mut x)];
/// let program = compile_program("x: 6; return: x * 7;", &bindings).unwrap();
///
/// assert_eq!(program.evaluate(), 42.0);
/// ```
///
/// # Errors
/// A syntax error in an embedded expression, positioned relative to the whole
/// program source; or an unresolvable assignment destination, duplicate
/// label, or jump to a label which is never defined.
pub fn compile_program(
  source: &str,
  bindings: &[Binding],
) -> Result<CompiledProgram, CompileError> {
  let mut pending = Vec::new();
  let mut labels: FxHashMap<&str, usize> = FxHashMap::default();
  let mut expressions: Vec<&str> = Vec::new();

  for piece in source.split(';') {
    let statement = piece.trim();
    if statement.is_empty() {
      continue;
    }

    let Some((head, tail)) = statement.split_once(':') else {
      expressions.push(statement);
      pending.push(PendingStatement::Call {
        expression: expressions.len() - 1,
      });
      continue;
    };
    let (head, tail) = (head.trim(), tail.trim());

    match head {
      "label" => {
        if labels.insert(tail, pending.len()).is_some() {
          return Err(CompileError::DuplicateLabel { name: tail.into() });
        }
      }
      "jump" => {
        if let Some((label, condition)) = tail.split_once('?') {
          expressions.push(condition.trim());
          pending.push(PendingStatement::JumpIf {
            label: label.trim(),
            expression: expressions.len() - 1,
          });
        } else {
          pending.push(PendingStatement::Jump { label: tail });
        }
      }
      "return" => {
        expressions.push(tail);
        pending.push(PendingStatement::Return {
          expression: expressions.len() - 1,
        });
      }
      name => {
        expressions.push(tail);
        pending.push(PendingStatement::Assign {
          name,
          expression: expressions.len() - 1,
        });
      }
    }
  }

  let mut interner = AddressInterner::default();

  // assignment destinations intern first, so assigned variables take the
  // lowest table slots whether or not any expression reads them
  let mut destinations: FxHashMap<&str, u32> = FxHashMap::default();
  for statement in &pending {
    if let PendingStatement::Assign { name, .. } = statement {
      if destinations.contains_key(name) {
        continue;
      }

      let target = bindings
        .iter()
        .find(|binding| binding.name() == *name)
        .map(Binding::target);
      let Some(BindingTarget::Variable(address)) = target else {
        return Err(CompileError::UndefinedVariable {
          name: (*name).into(),
        });
      };
      destinations.insert(*name, interner.intern(Address::Variable(address), name));
    }
  }

  // compile every embedded expression into one concatenated image
  let mut image = Image::default();
  let mut offsets = Vec::with_capacity(expressions.len());
  for fragment in &expressions {
    let compiled =
      compile_to_image(fragment, bindings, &mut interner).map_err(|error| CompileError::Parse {
        error,
        offset: offset_of(source, fragment),
      })?;
    offsets.push(image.append(&compiled));
  }

  let mut statements = Vec::with_capacity(pending.len());
  for statement in pending {
    statements.push(match statement {
      PendingStatement::Jump { label } => Statement::Jump {
        target: resolve_label(&labels, label)?,
      },
      PendingStatement::JumpIf { label, expression } => Statement::JumpIf {
        target: resolve_label(&labels, label)?,
        expression: offsets[expression],
      },
      PendingStatement::Return { expression } => Statement::Return {
        expression: offsets[expression],
      },
      PendingStatement::Assign { name, expression } => Statement::Assign {
        destination: destinations[name] as usize,
        expression: offsets[expression],
      },
      PendingStatement::Call { expression } => Statement::Call {
        expression: offsets[expression],
      },
    });
  }

  Ok(CompiledProgram {
    statements,
    image,
    table: interner.finish(),
  })
}

fn resolve_label(labels: &FxHashMap<&str, usize>, label: &str) -> Result<usize, CompileError> {
  labels
    .get(label)
    .copied()
    .ok_or_else(|| CompileError::UndefinedLabel { name: label.into() })
}

/// Where a fragment sits inside the source it was split out of
fn offset_of(source: &str, fragment: &str) -> usize {
  fragment.as_ptr() as usize - source.as_ptr() as usize
}

/// Run a program: statements in order, jumps landing exactly on their target
/// statement index.
///
/// A `return` statement ends evaluation with its expression's value; falling
/// off the end of the program returns NaN.
#[must_use]
pub fn evaluate_program(statements: &[Statement], image: &[u8], table: &AddressTable) -> Scalar {
  let expression = |offset: usize| image.get(offset..).map_or(NAN, |bytes| evaluate(bytes, table));

  let mut index = 0;
  while let Some(statement) = statements.get(index) {
    match *statement {
      Statement::Jump { target } => {
        index = target;
        continue;
      }
      Statement::JumpIf { target, expression: condition } => {
        if expression(condition) != 0.0 {
          index = target;
          continue;
        }
      }
      Statement::Return { expression: result } => return expression(result),
      Statement::Assign { destination, expression: value } => {
        let value = expression(value);
        match table.address(destination) {
          // SAFETY: the host guarantees that binding targets outlive every
          // evaluation against this table
          Some(Address::Variable(pointer)) => unsafe { *pointer = value },
          _ => return NAN,
        }
      }
      Statement::Call { expression: effect } => {
        expression(effect);
      }
    }

    index += 1;
  }

  NAN
}

/// A compiled program: statements, the concatenated expression image, and
/// the address/name tables shared by every statement.
#[derive(Clone, Debug)]
pub struct CompiledProgram {
  statements: Vec<Statement>,
  image: Image,
  table: AddressTable,
}
impl CompiledProgram {
  /// Run the program against the current values of the host bindings
  #[must_use]
  pub fn evaluate(&self) -> Scalar {
    evaluate_program(&self.statements, self.image.as_bytes(), &self.table)
  }

  #[must_use]
  pub fn statements(&self) -> &[Statement] {
    &self.statements
  }

  /// The concatenated image holding every statement's expression
  #[must_use]
  pub fn image(&self) -> &[u8] {
    self.image.as_bytes()
  }

  /// The host addresses the image refers into, parallel with the names
  #[must_use]
  pub fn address_table(&self) -> &AddressTable {
    &self.table
  }
}
impl fmt::Display for CompiledProgram {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "      ╭─[Program: {} statements, {} bytes, {} bindings]",
      self.statements.len(),
      self.image.len(),
      self.table.len()
    )?;

    // parameter offsets are relative to each expression's own start
    let expression_root = |offset: usize| Node::root(&self.image.as_bytes()[offset..]);

    for (index, statement) in self.statements.iter().enumerate() {
      match *statement {
        Statement::Jump { target } => writeln!(f, " {index:0>4} │ jump to {target}")?,
        Statement::JumpIf { target, expression } => {
          writeln!(f, " {index:0>4} │ jump to {target} when")?;
          display_node(f, expression_root(expression), &self.table, 1)?;
        }
        Statement::Return { expression } => {
          writeln!(f, " {index:0>4} │ return")?;
          display_node(f, expression_root(expression), &self.table, 1)?;
        }
        Statement::Assign { destination, expression } => {
          let name = self.table.name(destination).unwrap_or("?");
          writeln!(f, " {index:0>4} │ assign {name} ({destination})")?;
          display_node(f, expression_root(expression), &self.table, 1)?;
        }
        Statement::Call { expression } => {
          writeln!(f, " {index:0>4} │ call")?;
          display_node(f, expression_root(expression), &self.table, 1)?;
        }
      }
    }

    writeln!(f, "──────╯")
  }
}
