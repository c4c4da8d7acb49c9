use crate::compiler::compile_expression;
use crate::image::Node;
use crate::optimiser::fold_constants;
use crate::program::compile_program;
use crate::table::AddressTable;
use crate::vm::evaluate;
use crate::{CompileError, Statement};
use shade_builtins::{Binding, ClosureFn, Kind, NativeFn, Scalar};
use shade_syntax::ast::Expression;
use shade_syntax::{parse, Allocator};

fn answer() -> Scalar {
  42.0
}
fn double(a: Scalar) -> Scalar {
  a * 2.0
}
fn first_of(context: *mut (), _: Scalar) -> Scalar {
  // SAFETY: tests pass a pointer to a live Scalar as the context
  unsafe { *context.cast::<Scalar>() }
}

#[test]
fn image_layout() {
  let mut x: Scalar = 2.0;
  let mut y: Scalar = 3.0;
  let bindings = [Binding::variable("x", &mut x), Binding::variable("y", &mut y)];
  let expression = compile_expression("x * y", &bindings).unwrap();

  // a binary node with two leaves: 20 + 12 + 12 bytes
  assert_eq!(expression.image().len(), 44);

  let root = Node::root(expression.image());
  assert_eq!(root.kind(), Kind::function(2).pure());
  assert_eq!(root.parameter(0), 20);
  assert_eq!(root.parameter(1), 32);

  // children sit strictly after their parent
  assert!(root.parameter(0) > root.offset());
  assert!(root.parameter(1) > root.parameter(0));

  assert_eq!(root.child(0).kind(), Kind::VARIABLE);
  assert_eq!(root.child(1).kind(), Kind::VARIABLE);

  // interned in pre-order: the operator first, then the leaves
  let table = expression.address_table();
  assert_eq!(table.names().collect::<Vec<_>>(), vec!["mul", "x", "y"]);
  assert_eq!(root.child(0).index(), 1);
  assert_eq!(root.child(1).index(), 2);
}

#[test]
fn closure_layout() {
  let mut cell: Scalar = 5.0;
  let bindings = [Binding::closure(
    "first",
    ClosureFn::F1(first_of),
    (&mut cell as *mut Scalar).cast(),
  )];
  let expression = compile_expression("first 1", &bindings).unwrap();

  let root = Node::root(expression.image());
  assert_eq!(root.kind(), Kind::closure(1));

  // one argument slot, plus the trailing slot indexing the context
  assert_eq!(root.parameter(0), 12 + 8);
  assert_eq!(root.parameter(1), 1);

  let table = expression.address_table();
  assert_eq!(table.names().collect::<Vec<_>>(), vec!["first", "first_closure"]);

  assert_eq!(expression.evaluate(), 5.0);
}

#[test]
fn shared_addresses_intern_once() {
  let mut x: Scalar = 1.0;
  let mut y: Scalar = 2.0;
  let bindings = [Binding::variable("x", &mut x), Binding::variable("y", &mut y)];
  let expression = compile_expression("x + x + x - y", &bindings).unwrap();

  let names: Vec<_> = expression.address_table().names().collect();
  assert_eq!(names, vec!["sub", "add", "x", "y"]);
}

#[test]
fn context_names_stay_unique() {
  // a variable can occupy the name a context would synthesise
  let mut decoy: Scalar = 0.0;
  let mut cell: Scalar = 7.0;
  let bindings = [
    Binding::variable("first_closure", &mut decoy),
    Binding::closure("first", ClosureFn::F1(first_of), (&mut cell as *mut Scalar).cast()),
  ];
  let expression = compile_expression("first_closure + first 1", &bindings).unwrap();

  let names: Vec<_> = expression.address_table().names().collect();
  assert_eq!(names, vec!["add", "first_closure", "first", "first_closure2"]);
}

#[test]
fn pure_expressions_fold_to_one_constant() {
  for (source, value) in [("5+5", 10.0), ("pow(2,2)", 4.0), ("sqrt 100", 10.0), ("1+2*3", 7.0)] {
    let expression = compile_expression(source, &[]).unwrap();

    assert_eq!(expression.image().len(), 12, "{source}");
    assert_eq!(Node::root(expression.image()).kind(), Kind::CONSTANT);
    assert!(expression.address_table().is_empty(), "{source}");
    assert_eq!(expression.evaluate(), value, "{source}");
  }
}

#[test]
fn impure_calls_are_not_folded() {
  let bindings = [Binding::function("answer", NativeFn::F0(answer))];
  let expression = compile_expression("answer + 1", &bindings).unwrap();

  let root = Node::root(expression.image());
  assert_eq!(root.kind(), Kind::function(2).pure());
  assert_eq!(root.child(0).kind(), Kind::function(0));
  assert_eq!(expression.evaluate(), 43.0);
}

#[test]
fn pure_bound_functions_do_fold() {
  let bindings = [Binding::pure_function("double", NativeFn::F1(double))];
  let expression = compile_expression("double 21", &bindings).unwrap();

  assert_eq!(expression.image().len(), 12);
  assert_eq!(expression.evaluate(), 42.0);
}

#[test]
fn folding_is_idempotent() {
  let mut x: Scalar = 1.0;
  let bindings = [Binding::variable("x", &mut x)];

  let allocator = Allocator::new();
  let mut ast = parse("x + 2 * 3", &bindings, &allocator).unwrap();
  fold_constants(&mut ast);
  fold_constants(&mut ast);

  let Expression::Call(call) = &ast else {
    panic!("expected the impure root to survive");
  };
  assert_eq!(call.name, "add");
  assert!(matches!(&call.arguments[0], Expression::Variable(_)));
  match &call.arguments[1] {
    Expression::Constant(constant) => assert_eq!(constant.value, 6.0),
    other => panic!("expected a folded constant, got {other:?}"),
  }
}

#[test]
fn images_are_position_independent() {
  let mut x: Scalar = 9.0;
  let bindings = [Binding::variable("x", &mut x)];
  let expression = compile_expression("sqrt x + 1", &bindings).unwrap();

  let copied = expression.image().to_vec();
  assert_eq!(
    evaluate(&copied, expression.address_table()),
    expression.evaluate(),
  );
  assert_eq!(evaluate(&copied, expression.address_table()), 4.0);
}

#[test]
fn mismatched_tables_evaluate_to_nan() {
  let mut x: Scalar = 1.0;
  let variable = compile_expression("x", &[Binding::variable("x", &mut x)]).unwrap();
  let function =
    compile_expression("answer", &[Binding::function("answer", NativeFn::F0(answer))]).unwrap();

  // an empty table, or a table whose entry has the wrong class
  assert!(evaluate(variable.image(), &AddressTable::default()).is_nan());
  assert!(evaluate(variable.image(), function.address_table()).is_nan());
  assert!(evaluate(function.image(), variable.address_table()).is_nan());

  // garbage bytes are a NaN, not a crash
  assert!(evaluate(&[1, 2, 3], variable.address_table()).is_nan());
  assert!(evaluate(&[], variable.address_table()).is_nan());
}

#[test]
fn display_names_the_nodes() {
  let mut x: Scalar = 2.0;
  let bindings = [Binding::variable("x", &mut x)];
  let text = compile_expression("1 + 2 * x", &bindings)
    .unwrap()
    .to_string();

  assert!(text.contains("function/2 add (0)"), "{text}");
  assert!(text.contains("constant 1"), "{text}");
  assert!(text.contains("function/2 mul (1)"), "{text}");
  assert!(text.contains("variable x (2)"), "{text}");
}

#[test]
fn program_statements_take_shape() {
  let mut x: Scalar = 0.0;
  let bindings = [Binding::variable("x", &mut x)];
  let program = compile_program(
    "x: 0; label: loop; x: x + 1; jump: loop ? x < 10; return: x;",
    &bindings,
  )
  .unwrap();

  let statements = program.statements();
  assert_eq!(statements.len(), 4);
  assert!(matches!(statements[0], Statement::Assign { destination: 0, expression: 0 }));
  assert!(matches!(statements[1], Statement::Assign { destination: 0, .. }));
  assert!(matches!(statements[2], Statement::JumpIf { target: 1, .. }));
  assert!(matches!(statements[3], Statement::Return { .. }));

  // expressions concatenate in compile order
  let offsets: Vec<_> = statements
    .iter()
    .map(|statement| match *statement {
      Statement::Assign { expression, .. }
      | Statement::JumpIf { expression, .. }
      | Statement::Return { expression }
      | Statement::Call { expression }
      | Statement::Jump { target: expression } => expression,
    })
    .collect();
  assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
  assert_eq!(program.image().len(), offsets.last().unwrap() + 12);
}

#[test]
fn program_errors() {
  let mut x: Scalar = 0.0;
  let bindings = [Binding::variable("x", &mut x)];

  let error = compile_program("label: a; label: a; return: 1;", &bindings).unwrap_err();
  assert!(matches!(error, CompileError::DuplicateLabel { .. }));

  let error = compile_program("jump: nowhere; return: 1;", &bindings).unwrap_err();
  assert!(matches!(error, CompileError::UndefinedLabel { .. }));

  let error = compile_program("y: 1;", &bindings).unwrap_err();
  assert!(matches!(error, CompileError::UndefinedVariable { .. }));
  assert_eq!(error.position(), None);

  // assigning to a callable is not assignment to a host scalar
  let bindings = [Binding::function("f", NativeFn::F0(answer))];
  let error = compile_program("f: 1;", &bindings).unwrap_err();
  assert!(matches!(error, CompileError::UndefinedVariable { .. }));
}

#[test]
fn program_errors_report_positions_in_the_whole_source() {
  let mut x: Scalar = 0.0;
  let bindings = [Binding::variable("x", &mut x)];

  //             0123456789012
  let source = "x: 0; x: 1+;";
  let error = compile_program(source, &bindings).unwrap_err();
  assert!(matches!(error, CompileError::Parse { .. }));

  // "1+" starts at offset 9 and fails at its position 2
  assert_eq!(error.position(), Some(11));
}
