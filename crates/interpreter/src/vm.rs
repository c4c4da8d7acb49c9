use crate::image::Node;
use crate::table::{Address, AddressTable};
use shade_builtins::{Kind, Scalar, NAN};

/// Evaluate a compiled image against an address table.
///
/// This is stateless: the bytes may come straight from a
/// [`CompiledExpression`](crate::CompiledExpression), or from any copy of
/// them, as long as the address table matches the one the image was compiled
/// with. Arguments evaluate eagerly, left to right; `&&` and `||` do not
/// short-circuit.
///
/// Runtime failure does not exist: an unknown tag, an index outside the
/// table, or a table entry of the wrong class all evaluate to NaN, and
/// domain errors flow through IEEE arithmetic as NaN or infinity.
#[must_use]
pub fn evaluate(image: &[u8], table: &AddressTable) -> Scalar {
  evaluate_node(Node::root(image), table)
}

fn evaluate_node(node: Node, table: &AddressTable) -> Scalar {
  let kind = node.kind();

  if kind.category() == Kind::CONSTANT.category() {
    return node.scalar();
  }

  if kind.category() == Kind::VARIABLE.category() {
    return match table.address(node.index()) {
      // SAFETY: the host guarantees that binding targets outlive every
      // evaluation against this table
      Some(Address::Variable(pointer)) => unsafe { *pointer },
      _ => NAN,
    };
  }

  if kind.is_function() || kind.is_closure() {
    let arity = kind.arity();
    let mut arguments = [0.0; 7];
    for (index, argument) in arguments.iter_mut().enumerate().take(arity) {
      *argument = evaluate_node(node.child(index), table);
    }
    let arguments = &arguments[..arity];

    if kind.is_function() {
      return match table.address(node.index()) {
        Some(Address::Function(function)) if function.arity() == arity => {
          function.invoke(arguments)
        }
        _ => NAN,
      };
    }

    // the trailing parameter slot of a closure indexes its context
    let context = match table.address(node.parameter(arity)) {
      Some(Address::Context(context)) => context,
      _ => return NAN,
    };
    return match table.address(node.index()) {
      Some(Address::Closure(function)) if function.arity() == arity => {
        function.invoke(context, arguments)
      }
      _ => NAN,
    };
  }

  NAN
}
