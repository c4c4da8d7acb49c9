use shade_syntax::ast::{Constant, Expression};

/// Fold every pure subtree whose leaves are constants into one constant.
///
/// A post-order walk: arguments fold first, then a pure call whose arguments
/// are all constants is evaluated on the spot and replaced. Impure calls act
/// as barriers, so host functions which were not flagged pure always run at
/// evaluation time. Running the fold again on an already folded tree changes
/// nothing.
pub(crate) fn fold_constants(expression: &mut Expression) {
  let Expression::Call(call) = expression else {
    return;
  };

  for argument in call.arguments.iter_mut() {
    fold_constants(argument);
  }

  if !call.kind.is_pure() || !call.arguments.iter().all(Expression::is_constant) {
    return;
  }

  let mut arguments = [0.0; 7];
  for (slot, argument) in arguments.iter_mut().zip(call.arguments.iter()) {
    if let Expression::Constant(constant) = argument {
      *slot = constant.value;
    }
  }

  let value = call.callable.invoke(&arguments[..call.arguments.len()]);
  *expression = Expression::Constant(Constant { value });
}
