use indoc::indoc;
use shade_interpreter::{
  compile_program, evaluate_program, Binding, ClosureFn, CompileError, Scalar, Statement,
};

fn tick(context: *mut ()) -> Scalar {
  unsafe { *context.cast::<Scalar>() += 1.0 };
  0.0
}

#[test]
fn counting_loop_runs_exactly_ten_times() {
  let mut x: Scalar = -1.0;
  let mut ticks: Scalar = 0.0;
  let bindings = [
    Binding::variable("x", &mut x),
    Binding::closure("tick", ClosureFn::F0(tick), (&mut ticks as *mut Scalar).cast()),
  ];

  let program = compile_program(
    indoc! {"
      x: 0;
      label: loop;
      x: x + 1 + tick;
      jump: loop ? x < 10;
      return: x;
    "},
    &bindings,
  )
  .unwrap();

  assert_eq!(program.evaluate(), 10.0);
  assert_eq!(x, 10.0);
  assert_eq!(ticks, 10.0);
}

#[test]
fn return_ends_evaluation() {
  let program = compile_program("return: 2 + 3; return: 100;", &[]).unwrap();
  assert_eq!(program.evaluate(), 5.0);
}

#[test]
fn falling_off_the_end_is_nan() {
  let mut x: Scalar = 0.0;
  let bindings = [Binding::variable("x", &mut x)];

  let program = compile_program("x: 1;", &bindings).unwrap();
  assert!(program.evaluate().is_nan());
  assert_eq!(x, 1.0);
}

#[test]
fn bare_statements_run_for_their_side_effects() {
  let mut ticks: Scalar = 0.0;
  let bindings = [Binding::closure(
    "tick",
    ClosureFn::F0(tick),
    (&mut ticks as *mut Scalar).cast(),
  )];

  let program = compile_program("tick; tick; return: 0;", &bindings).unwrap();
  assert_eq!(program.evaluate(), 0.0);
  assert_eq!(ticks, 2.0);
}

#[test]
fn conditional_jumps_fall_through_on_zero() {
  let mut x: Scalar = 0.0;
  let bindings = [Binding::variable("x", &mut x)];

  let taken = compile_program("jump: skip ? 1; x: 42; label: skip; return: x;", &bindings);
  assert_eq!(taken.unwrap().evaluate(), 0.0);

  let fallen = compile_program("jump: skip ? 0; x: 42; label: skip; return: x;", &bindings);
  assert_eq!(fallen.unwrap().evaluate(), 42.0);
}

#[test]
fn nan_conditions_jump() {
  // a NaN condition is not equal to zero, so the jump is taken
  let program = compile_program("jump: end ? 0/0; return: 1; label: end; return: 2;", &[]).unwrap();
  assert_eq!(program.evaluate(), 2.0);
}

#[test]
fn unconditional_jumps_skip_forward() {
  let mut x: Scalar = 7.0;
  let bindings = [Binding::variable("x", &mut x)];

  let program = compile_program("jump: end; x: 1; label: end; return: x;", &bindings).unwrap();
  assert_eq!(program.evaluate(), 7.0);
  assert_eq!(x, 7.0);
}

#[test]
fn statements_share_one_address_table() {
  let mut x: Scalar = 0.0;
  let bindings = [Binding::variable("x", &mut x)];

  let program = compile_program("x: x + 1; x: x + 1; return: x;", &bindings).unwrap();
  assert_eq!(program.evaluate(), 2.0);

  // one slot for `x`, one for `add`, shared by every statement
  assert_eq!(program.address_table().len(), 2);
  let names: Vec<_> = program.address_table().names().collect();
  assert_eq!(names, vec!["x", "add"]);
}

#[test]
fn blank_statements_are_skipped() {
  let mut x: Scalar = 0.0;
  let bindings = [Binding::variable("x", &mut x)];

  let program = compile_program("x: 1;;  ; return: x;;", &bindings).unwrap();
  assert_eq!(program.statements().len(), 2);
  assert_eq!(program.evaluate(), 1.0);
}

#[test]
fn whitespace_is_trimmed_around_heads_and_tails() {
  let mut x: Scalar = 0.0;
  let bindings = [Binding::variable("x", &mut x)];

  let program = compile_program("  x  :  3  ;  return :  x  ;", &bindings).unwrap();
  assert_eq!(program.evaluate(), 3.0);
}

#[test]
fn labels_resolve_in_two_passes() {
  // forward reference: the jump compiles before its label is defined
  let program = compile_program(
    "jump: done ? 1; return: 1; label: done; return: 2;",
    &[],
  )
  .unwrap();
  assert_eq!(program.evaluate(), 2.0);

  assert!(matches!(
    program.statements()[0],
    Statement::JumpIf { target: 2, .. }
  ));
}

#[test]
fn duplicate_labels_are_an_error() {
  let error = compile_program("label: a; return: 1; label: a;", &[]).unwrap_err();
  assert!(matches!(error, CompileError::DuplicateLabel { .. }));
}

#[test]
fn undefined_labels_are_an_error() {
  let error = compile_program("jump: nowhere; return: 1;", &[]).unwrap_err();
  assert!(matches!(error, CompileError::UndefinedLabel { .. }));
}

#[test]
fn undefined_assignment_destinations_are_an_error() {
  let error = compile_program("y: 1;", &[]).unwrap_err();
  assert!(matches!(error, CompileError::UndefinedVariable { .. }));
}

#[test]
fn relocated_program_images_evaluate_identically() {
  let mut x: Scalar = 0.0;
  let bindings = [Binding::variable("x", &mut x)];

  let program = compile_program(
    indoc! {"
      x: 0;
      label: l;
      x: x + 2;
      jump: l ? x < 8;
      return: x;
    "},
    &bindings,
  )
  .unwrap();
  assert_eq!(program.evaluate(), 8.0);

  let copied = program.image().to_vec();
  assert_eq!(
    evaluate_program(program.statements(), &copied, program.address_table()),
    8.0
  );
}
