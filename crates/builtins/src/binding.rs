use crate::{Kind, Scalar};

/// A host function of fixed arity, callable from expressions.
///
/// The eight shapes stand in for the variadic dispatch of a C engine: the
/// evaluator matches on the variant instead of punning a function pointer.
#[derive(Clone, Copy, Debug)]
pub enum NativeFn {
  F0(fn() -> Scalar),
  F1(fn(Scalar) -> Scalar),
  F2(fn(Scalar, Scalar) -> Scalar),
  F3(fn(Scalar, Scalar, Scalar) -> Scalar),
  F4(fn(Scalar, Scalar, Scalar, Scalar) -> Scalar),
  F5(fn(Scalar, Scalar, Scalar, Scalar, Scalar) -> Scalar),
  F6(fn(Scalar, Scalar, Scalar, Scalar, Scalar, Scalar) -> Scalar),
  F7(fn(Scalar, Scalar, Scalar, Scalar, Scalar, Scalar, Scalar) -> Scalar),
}
impl NativeFn {
  #[must_use]
  pub fn arity(self) -> usize {
    match self {
      Self::F0(_) => 0,
      Self::F1(_) => 1,
      Self::F2(_) => 2,
      Self::F3(_) => 3,
      Self::F4(_) => 4,
      Self::F5(_) => 5,
      Self::F6(_) => 6,
      Self::F7(_) => 7,
    }
  }

  /// The identity of the underlying function pointer.
  ///
  /// Used to deduplicate address table entries; two bindings sharing a
  /// function share a table slot.
  #[must_use]
  pub fn address(self) -> usize {
    match self {
      Self::F0(f) => f as usize,
      Self::F1(f) => f as usize,
      Self::F2(f) => f as usize,
      Self::F3(f) => f as usize,
      Self::F4(f) => f as usize,
      Self::F5(f) => f as usize,
      Self::F6(f) => f as usize,
      Self::F7(f) => f as usize,
    }
  }

  /// Call the function with already-evaluated arguments.
  ///
  /// `arguments` must hold exactly [`NativeFn::arity`] values.
  #[must_use]
  pub fn invoke(self, arguments: &[Scalar]) -> Scalar {
    debug_assert_eq!(arguments.len(), self.arity());

    match self {
      Self::F0(f) => f(),
      Self::F1(f) => f(arguments[0]),
      Self::F2(f) => f(arguments[0], arguments[1]),
      Self::F3(f) => f(arguments[0], arguments[1], arguments[2]),
      Self::F4(f) => f(arguments[0], arguments[1], arguments[2], arguments[3]),
      Self::F5(f) => f(
        arguments[0],
        arguments[1],
        arguments[2],
        arguments[3],
        arguments[4],
      ),
      Self::F6(f) => f(
        arguments[0],
        arguments[1],
        arguments[2],
        arguments[3],
        arguments[4],
        arguments[5],
      ),
      Self::F7(f) => f(
        arguments[0],
        arguments[1],
        arguments[2],
        arguments[3],
        arguments[4],
        arguments[5],
        arguments[6],
      ),
    }
  }
}

/// A host callable which receives an opaque context pointer first.
///
/// The context travels alongside the function in the binding and the address
/// table; the engine never inspects what it points at.
#[derive(Clone, Copy, Debug)]
pub enum ClosureFn {
  F0(fn(*mut ()) -> Scalar),
  F1(fn(*mut (), Scalar) -> Scalar),
  F2(fn(*mut (), Scalar, Scalar) -> Scalar),
  F3(fn(*mut (), Scalar, Scalar, Scalar) -> Scalar),
  F4(fn(*mut (), Scalar, Scalar, Scalar, Scalar) -> Scalar),
  F5(fn(*mut (), Scalar, Scalar, Scalar, Scalar, Scalar) -> Scalar),
  F6(fn(*mut (), Scalar, Scalar, Scalar, Scalar, Scalar, Scalar) -> Scalar),
  F7(fn(*mut (), Scalar, Scalar, Scalar, Scalar, Scalar, Scalar, Scalar) -> Scalar),
}
impl ClosureFn {
  #[must_use]
  pub fn arity(self) -> usize {
    match self {
      Self::F0(_) => 0,
      Self::F1(_) => 1,
      Self::F2(_) => 2,
      Self::F3(_) => 3,
      Self::F4(_) => 4,
      Self::F5(_) => 5,
      Self::F6(_) => 6,
      Self::F7(_) => 7,
    }
  }

  /// The identity of the underlying function pointer
  #[must_use]
  pub fn address(self) -> usize {
    match self {
      Self::F0(f) => f as usize,
      Self::F1(f) => f as usize,
      Self::F2(f) => f as usize,
      Self::F3(f) => f as usize,
      Self::F4(f) => f as usize,
      Self::F5(f) => f as usize,
      Self::F6(f) => f as usize,
      Self::F7(f) => f as usize,
    }
  }

  /// Call the closure with its context and already-evaluated arguments.
  ///
  /// `arguments` must hold exactly [`ClosureFn::arity`] values.
  #[must_use]
  pub fn invoke(self, context: *mut (), arguments: &[Scalar]) -> Scalar {
    debug_assert_eq!(arguments.len(), self.arity());

    match self {
      Self::F0(f) => f(context),
      Self::F1(f) => f(context, arguments[0]),
      Self::F2(f) => f(context, arguments[0], arguments[1]),
      Self::F3(f) => f(context, arguments[0], arguments[1], arguments[2]),
      Self::F4(f) => f(
        context,
        arguments[0],
        arguments[1],
        arguments[2],
        arguments[3],
      ),
      Self::F5(f) => f(
        context,
        arguments[0],
        arguments[1],
        arguments[2],
        arguments[3],
        arguments[4],
      ),
      Self::F6(f) => f(
        context,
        arguments[0],
        arguments[1],
        arguments[2],
        arguments[3],
        arguments[4],
        arguments[5],
      ),
      Self::F7(f) => f(
        context,
        arguments[0],
        arguments[1],
        arguments[2],
        arguments[3],
        arguments[4],
        arguments[5],
        arguments[6],
      ),
    }
  }
}

/// Either shape of host callable, with a closure's context attached
#[derive(Clone, Copy, Debug)]
pub enum Callable {
  Function(NativeFn),
  Closure { function: ClosureFn, context: *mut () },
}
impl Callable {
  #[must_use]
  pub fn arity(self) -> usize {
    match self {
      Self::Function(function) => function.arity(),
      Self::Closure { function, .. } => function.arity(),
    }
  }

  /// Call the callable with already-evaluated arguments
  #[must_use]
  pub fn invoke(self, arguments: &[Scalar]) -> Scalar {
    match self {
      Self::Function(function) => function.invoke(arguments),
      Self::Closure { function, context } => function.invoke(context, arguments),
    }
  }
}

/// What a host name resolves to
#[derive(Clone, Copy, Debug)]
pub enum BindingTarget {
  /// A scalar owned by the host, read at every evaluation
  Variable(*mut Scalar),
  /// A host function
  Function { function: NativeFn, pure: bool },
  /// A host closure and the context passed as its first argument
  Closure {
    function: ClosureFn,
    context: *mut (),
    pure: bool,
  },
}

/// A caller-supplied host binding: a name and the target it resolves to.
///
/// The storage behind variable addresses and closure contexts stays owned by
/// the host and must outlive every handle compiled against it. Binding tables
/// are searched linearly by exact name.
#[derive(Clone, Copy, Debug)]
pub struct Binding<'n> {
  name: &'n str,
  target: BindingTarget,
}
impl<'n> Binding<'n> {
  /// Bind a name to a scalar owned by the host
  #[must_use]
  pub fn variable(name: &'n str, address: *mut Scalar) -> Self {
    Self {
      name,
      target: BindingTarget::Variable(address),
    }
  }

  /// Bind a name to a host function
  #[must_use]
  pub fn function(name: &'n str, function: NativeFn) -> Self {
    Self {
      name,
      target: BindingTarget::Function {
        function,
        pure: false,
      },
    }
  }

  /// Bind a name to a host function which is safe to constant fold
  #[must_use]
  pub fn pure_function(name: &'n str, function: NativeFn) -> Self {
    Self {
      name,
      target: BindingTarget::Function {
        function,
        pure: true,
      },
    }
  }

  /// Bind a name to a host closure and its context
  #[must_use]
  pub fn closure(name: &'n str, function: ClosureFn, context: *mut ()) -> Self {
    Self {
      name,
      target: BindingTarget::Closure {
        function,
        context,
        pure: false,
      },
    }
  }

  /// Bind a name to a host closure which is safe to constant fold
  #[must_use]
  pub fn pure_closure(name: &'n str, function: ClosureFn, context: *mut ()) -> Self {
    Self {
      name,
      target: BindingTarget::Closure {
        function,
        context,
        pure: true,
      },
    }
  }

  #[must_use]
  pub fn name(&self) -> &'n str {
    self.name
  }

  #[must_use]
  pub fn target(&self) -> BindingTarget {
    self.target
  }

  /// The packed tag this binding produces in a compiled image
  #[must_use]
  pub fn kind(&self) -> Kind {
    match self.target {
      BindingTarget::Variable(_) => Kind::VARIABLE,
      BindingTarget::Function { function, pure } => {
        let kind = Kind::function(function.arity());
        if pure {
          kind.pure()
        } else {
          kind
        }
      }
      BindingTarget::Closure { function, pure, .. } => {
        let kind = Kind::closure(function.arity());
        if pure {
          kind.pure()
        } else {
          kind
        }
      }
    }
  }
}
