use crate::image::{Image, Node, NODE_HEADER_SIZE, PARAMETER_SIZE};
use crate::optimiser::fold_constants;
use crate::table::{Address, AddressInterner, AddressTable};
use crate::vm::evaluate;
use shade_builtins::{Binding, Callable, Kind, Scalar, NAN};
use shade_syntax::ast::Expression;
use shade_syntax::{parse, Allocator, ParseError};
use std::{error, fmt};

/// Compile an expression against a table of host bindings.
///
/// The returned handle owns the image and its address/name tables; the host
/// storage the bindings point at stays borrowed and must outlive the handle.
///
/// # Examples
/// ```
/// use shade_interpreter::{compile_expression, Binding, Scalar};
///
/// let mut x: Scalar = 2.0;
/// let mut y: Scalar = 3.0;
/// let bindings = [Binding::variable("x", &mut x), Binding::variable("y", &mut y)];
///
/// let expression = compile_expression("x * y ^ 3", &bindings).unwrap();
/// assert_eq!(expression.evaluate(), 54.0);
/// ```
///
/// # Errors
/// If the source has a syntax error, with the 1-based position of the first
/// failure.
pub fn compile_expression(
  source: &str,
  bindings: &[Binding],
) -> Result<CompiledExpression, CompileError> {
  let mut interner = AddressInterner::default();
  let image = compile_to_image(source, bindings, &mut interner)?;

  Ok(CompiledExpression {
    image,
    table: interner.finish(),
  })
}

/// Compile an expression with no bindings, evaluate it once, and discard it.
///
/// Returns NaN if the expression does not compile.
///
/// # Examples
/// ```
/// assert_eq!(shade_interpreter::interpret("sqrt 100 + 7"), 17.0);
/// ```
#[must_use]
pub fn interpret(source: &str) -> Scalar {
  compile_expression(source, &[]).map_or(NAN, |expression| expression.evaluate())
}

/// Parse, fold, and lower one expression into an image.
///
/// The interner is the caller's so that a program can thread one address
/// table through all of its statements. The AST lives in an arena which is
/// dropped before this returns.
pub(crate) fn compile_to_image(
  source: &str,
  bindings: &[Binding],
  interner: &mut AddressInterner,
) -> Result<Image, ParseError> {
  let allocator = Allocator::new();
  let mut ast = parse(source, bindings, &allocator)?;
  fold_constants(&mut ast);

  let mut lowerer = Lowerer { interner };
  let size = lowerer.measure(&ast);
  let mut image = Image::with_capacity(size);
  lowerer.write(&ast, &mut image);
  debug_assert_eq!(image.len(), size, "measured size matches written size");

  Ok(image)
}

/// Lowers an optimised AST into an image.
///
/// Two passes: [`Lowerer::measure`] sizes the buffer and interns every host
/// address the tree references, then [`Lowerer::write`] lays nodes out in
/// pre-order. Writing cannot be done in one pass: a parent's parameter slots
/// must be reserved before the offsets of its children are known.
struct Lowerer<'interner> {
  interner: &'interner mut AddressInterner,
}
impl Lowerer<'_> {
  /// The size of a subtree in the image, interning its host addresses
  fn measure(&mut self, expression: &Expression) -> usize {
    match expression {
      Expression::Constant(_) => NODE_HEADER_SIZE,
      Expression::Variable(variable) => {
        self
          .interner
          .intern(Address::Variable(variable.address), variable.name);
        NODE_HEADER_SIZE
      }
      Expression::Call(call) => {
        match call.callable {
          Callable::Function(function) => {
            self.interner.intern(Address::Function(function), call.name);
          }
          Callable::Closure { function, context } => {
            self.interner.intern(Address::Closure(function), call.name);
            self.interner.intern_context(context, call.name);
          }
        }

        let slots = call.arguments.len() + usize::from(call.kind.is_closure());
        let mut size = NODE_HEADER_SIZE + slots * PARAMETER_SIZE;
        for argument in &call.arguments {
          size += self.measure(argument);
        }
        size
      }
    }
  }

  /// Write a subtree at the image's cursor, parameters rewritten to offsets
  fn write(&mut self, expression: &Expression, image: &mut Image) {
    match expression {
      Expression::Constant(constant) => {
        let node = image.push_node(Kind::CONSTANT, 0);
        image.set_scalar(node, constant.value);
      }
      Expression::Variable(variable) => {
        let node = image.push_node(Kind::VARIABLE, 0);
        let index = self
          .interner
          .intern(Address::Variable(variable.address), variable.name);
        image.set_index(node, index);
      }
      Expression::Call(call) => {
        let slots = call.arguments.len() + usize::from(call.kind.is_closure());
        let node = image.push_node(call.kind, slots);

        let index = match call.callable {
          Callable::Function(function) => {
            self.interner.intern(Address::Function(function), call.name)
          }
          Callable::Closure { function, context } => {
            let context_index = self.interner.intern_context(context, call.name);
            image.set_parameter(node, call.arguments.len(), context_index);
            self.interner.intern(Address::Closure(function), call.name)
          }
        };
        image.set_index(node, index);

        for (parameter, argument) in call.arguments.iter().enumerate() {
          let offset = u32::try_from(image.len()).expect("images stay within u32 offsets");
          image.set_parameter(node, parameter, offset);
          self.write(argument, image);
        }
      }
    }
  }
}

/// A compiled expression: the portable image plus its address/name tables.
///
/// Dropping the handle releases all of them. Displaying it renders the image
/// as an indented node tree with names resolved through the name table.
#[derive(Clone, Debug)]
pub struct CompiledExpression {
  image: Image,
  table: AddressTable,
}
impl CompiledExpression {
  /// Evaluate the image against the current values of the host bindings
  #[must_use]
  pub fn evaluate(&self) -> Scalar {
    evaluate(self.image.as_bytes(), &self.table)
  }

  /// The position-independent image bytes
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
impl fmt::Display for CompiledExpression {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "      ╭─[Image: {} bytes, {} bindings]",
      self.image.len(),
      self.table.len()
    )?;
    display_node(f, Node::root(self.image.as_bytes()), &self.table, 0)?;
    writeln!(f, "──────╯")
  }
}

/// Render one node and its children as indented tree lines
pub(crate) fn display_node(
  f: &mut fmt::Formatter<'_>,
  node: Node,
  table: &AddressTable,
  depth: usize,
) -> fmt::Result {
  write!(f, " {:0>4} │ ", node.offset())?;
  for _ in 0..depth {
    write!(f, "  ")?;
  }

  let kind = node.kind();
  let name = |index: usize| table.name(index).unwrap_or("?");

  if kind.category() == Kind::CONSTANT.category() {
    return writeln!(f, "constant {}", node.scalar());
  }
  if kind.category() == Kind::VARIABLE.category() {
    return writeln!(f, "variable {} ({})", name(node.index()), node.index());
  }

  if kind.is_function() || kind.is_closure() {
    write!(f, "{kind} {} ({})", name(node.index()), node.index())?;
    if kind.is_closure() {
      write!(f, " [context {}]", node.parameter(kind.arity()))?;
    }
    writeln!(f)?;

    for argument in 0..kind.arity() {
      display_node(f, node.child(argument), table, depth + 1)?;
    }
    return Ok(());
  }

  writeln!(f, "unknown")
}

/// An error which arose while compiling an expression or program
#[derive(Clone, Debug)]
pub enum CompileError {
  /// A syntax error in an expression
  Parse {
    error: ParseError,
    /// Where the expression started, for statements inside a program
    offset: usize,
  },
  /// A program assigned to a name which is not bound to a host scalar
  UndefinedVariable { name: String },
  /// A program defined the same label twice
  DuplicateLabel { name: String },
  /// A program jumped to a label which is never defined
  UndefinedLabel { name: String },
}
impl CompileError {
  /// The title of the error message
  #[must_use]
  pub fn title(&self) -> &'static str {
    match self {
      Self::Parse { error, .. } => error.title(),
      Self::UndefinedVariable { .. } => "Undefined Variable",
      Self::DuplicateLabel { .. } => "Duplicate Label",
      Self::UndefinedLabel { .. } => "Undefined Label",
    }
  }

  /// The body of the error message describing what has gone wrong
  #[must_use]
  pub fn message(&self) -> String {
    match self {
      Self::Parse { error, .. } => error.message(),
      Self::UndefinedVariable { name } => {
        format!("variable `{name}` is not bound to a host scalar")
      }
      Self::DuplicateLabel { name } => format!("label `{name}` is defined more than once"),
      Self::UndefinedLabel { name } => format!("label `{name}` is never defined"),
    }
  }

  /// The 1-based source position of a syntax error.
  ///
  /// `None` for the semantic errors, which have no single offset.
  #[must_use]
  pub fn position(&self) -> Option<usize> {
    match self {
      Self::Parse { error, offset } => Some(error.position() + offset),
      _ => None,
    }
  }
}
impl From<ParseError> for CompileError {
  fn from(error: ParseError) -> Self {
    Self::Parse { error, offset: 0 }
  }
}
impl fmt::Display for CompileError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message())
  }
}
impl error::Error for CompileError {}
