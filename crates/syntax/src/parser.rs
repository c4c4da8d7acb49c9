use crate::allocator::{Allocator, Box, Vec};
use crate::ast::{Call, Constant, Expression, Variable};
use crate::tokeniser::{Token, TokenKind, Tokeniser};
use shade_builtins::{find_builtin, Binding, BindingTarget, Builtin, Callable, Kind};
use std::{error, fmt};

/// Parse an expression string into an AST.
///
/// A recursive descent over the precedence ladder, lowest binding first:
/// comma lists, logical, comparison, sum, term, power chains, unary prefixes,
/// then the leaves.
pub struct Parser<'source, 'bindings, 'ast> {
  /// The bump allocator to store the AST in
  allocator: &'ast Allocator,

  /// The source code string to parse
  source: &'source str,
  /// The tokeniser for the source string
  tokeniser: Tokeniser<'source>,
  /// The token currently being considered
  current: Token,

  /// The caller's host bindings, searched before the builtin registry
  bindings: &'bindings [Binding<'bindings>],
}
impl<'s, 'b, 'ast> Parser<'s, 'b, 'ast> {
  /// Creates a new parser
  ///
  /// For a given source string, host binding table, and allocator to place
  /// the AST in
  pub fn new(source: &'s str, bindings: &'b [Binding<'b>], allocator: &'ast Allocator) -> Self {
    let mut parser = Self {
      allocator,
      source,
      tokeniser: Tokeniser::from(source),
      current: Token::default(),
      bindings,
    };
    parser.advance();
    parser
  }

  /// Parse the source into an expression tree.
  ///
  /// The whole input must be consumed, up to the end of the source or a `;`.
  pub fn parse(mut self) -> ParseResult<Expression<'s, 'ast>> {
    let expression = self.list()?;

    match self.current.kind {
      TokenKind::EndOfFile | TokenKind::Semicolon => Ok(expression),
      TokenKind::Unknown => Err(ParseError::UnknownCharacter(self.current)),
      _ => Err(ParseError::TrailingInput(self.current)),
    }
  }

  /// Move to the next token from the tokeniser
  fn advance(&mut self) {
    self.current = self.tokeniser.next().unwrap_or(Token {
      kind: TokenKind::EndOfFile,
      start: u32::try_from(self.source.len()).unwrap(),
      length: 0,
    });
  }

  /// Consume a token of the specified kind, or fail
  fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
    if self.current.kind == kind {
      let token = self.current;
      self.advance();
      Ok(token)
    } else {
      Err(ParseError::Expected {
        expected: kind,
        received: self.current,
      })
    }
  }

  /// The registry entry backing an operator token
  fn operator_builtin(kind: TokenKind) -> &'static Builtin {
    let name = match kind {
      TokenKind::Plus => "add",
      TokenKind::Minus => "sub",
      TokenKind::Star => "mul",
      TokenKind::Slash => "divide",
      TokenKind::Caret => "pow",
      TokenKind::Percent => "fmod",
      TokenKind::BangEqual => "not_equal",
      TokenKind::EqualEqual => "equal",
      TokenKind::Less => "lower",
      TokenKind::LessEqual => "lower_eq",
      TokenKind::Greater => "greater",
      TokenKind::GreaterEqual => "greater_eq",
      TokenKind::And => "logical_and",
      TokenKind::Or => "logical_or",
      _ => unreachable!("only operator tokens are passed"),
    };

    find_builtin(name).expect("operators are registered")
  }

  /// Build a call to a binary operator
  fn binary(
    &mut self,
    operator: &'static Builtin,
    left: Expression<'s, 'ast>,
    right: Expression<'s, 'ast>,
  ) -> Expression<'s, 'ast> {
    let mut arguments = Vec::with_capacity_in(2, self.allocator);
    arguments.push(left);
    arguments.push(right);

    Expression::Call(Box::new_in(
      Call {
        name: operator.name,
        kind: operator.kind(),
        callable: operator.callable(),
        arguments,
      },
      self.allocator,
    ))
  }

  /// Build a call to a unary operator
  fn unary(&mut self, name: &'static str, operand: Expression<'s, 'ast>) -> Expression<'s, 'ast> {
    let builtin = find_builtin(name).expect("unary operators are registered");
    let mut arguments = Vec::with_capacity_in(1, self.allocator);
    arguments.push(operand);

    Expression::Call(Box::new_in(
      Call {
        name: builtin.name,
        kind: builtin.kind(),
        callable: builtin.callable(),
        arguments,
      },
      self.allocator,
    ))
  }

  /// `<list> = <expression> { "," <expression> }`
  fn list(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let mut expression = self.expression()?;

    while self.current.kind == TokenKind::Comma {
      let operator = find_builtin("comma").expect("comma is registered");
      self.advance();
      let right = self.expression()?;
      expression = self.binary(operator, expression, right);
    }

    Ok(expression)
  }

  /// `<expression> = <comparison> { ("&&" | "||") <comparison> }`
  fn expression(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let mut expression = self.comparison()?;

    while matches!(self.current.kind, TokenKind::And | TokenKind::Or) {
      let operator = Self::operator_builtin(self.current.kind);
      self.advance();
      let right = self.comparison()?;
      expression = self.binary(operator, expression, right);
    }

    Ok(expression)
  }

  /// `<comparison> = <sum> { (">" | ">=" | "<" | "<=" | "==" | "!=") <sum> }`
  fn comparison(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let mut expression = self.sum()?;

    while matches!(
      self.current.kind,
      TokenKind::Greater
        | TokenKind::GreaterEqual
        | TokenKind::Less
        | TokenKind::LessEqual
        | TokenKind::EqualEqual
        | TokenKind::BangEqual
    ) {
      let operator = Self::operator_builtin(self.current.kind);
      self.advance();
      let right = self.sum()?;
      expression = self.binary(operator, expression, right);
    }

    Ok(expression)
  }

  /// `<sum> = <term> { ("+" | "-") <term> }`
  fn sum(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let mut expression = self.term()?;

    while matches!(self.current.kind, TokenKind::Plus | TokenKind::Minus) {
      let operator = Self::operator_builtin(self.current.kind);
      self.advance();
      let right = self.term()?;
      expression = self.binary(operator, expression, right);
    }

    Ok(expression)
  }

  /// `<term> = <factor> { ("*" | "/" | "%") <factor> }`
  fn term(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let mut expression = self.factor()?;

    while matches!(
      self.current.kind,
      TokenKind::Star | TokenKind::Slash | TokenKind::Percent
    ) {
      let operator = Self::operator_builtin(self.current.kind);
      self.advance();
      let right = self.factor()?;
      expression = self.binary(operator, expression, right);
    }

    Ok(expression)
  }

  /// `<factor> = <power> { "^" <power> }`, left associative
  #[cfg(not(feature = "pow-from-right"))]
  fn factor(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let mut expression = self.power()?;

    while self.current.kind == TokenKind::Caret {
      let operator = Self::operator_builtin(TokenKind::Caret);
      self.advance();
      let right = self.power()?;
      expression = self.binary(operator, expression, right);
    }

    Ok(expression)
  }

  /// `<factor> = <power> { "^" <power> }`, right associative.
  ///
  /// The unary wrapper on the first operand is peeled off and reapplied
  /// around the whole chain, so `-2^2` parses as `-(2^2)`.
  #[cfg(feature = "pow-from-right")]
  fn factor(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let expression = self.power()?;

    if self.current.kind != TokenKind::Caret {
      return Ok(expression);
    }

    let (wrapper, expression) = Self::split_unary_wrapper(expression);

    let mut operands = vec![expression];
    while self.current.kind == TokenKind::Caret {
      self.advance();
      operands.push(self.power()?);
    }

    let operator = Self::operator_builtin(TokenKind::Caret);
    let mut expression = operands.pop().expect("the chain has operands");
    while let Some(left) = operands.pop() {
      expression = self.binary(operator, left, expression);
    }

    if let Some(name) = wrapper {
      expression = self.unary(name, expression);
    }
    Ok(expression)
  }

  /// Take the unary operator off the top of an expression, if there is one
  #[cfg(feature = "pow-from-right")]
  fn split_unary_wrapper(
    expression: Expression<'s, 'ast>,
  ) -> (Option<&'static str>, Expression<'s, 'ast>) {
    const UNARY_WRAPPERS: [&str; 5] = [
      "negate",
      "logical_not",
      "logical_notnot",
      "negate_logical_not",
      "negate_logical_notnot",
    ];

    let is_wrapper = matches!(&expression, Expression::Call(call)
      if call.arguments.len() == 1 && UNARY_WRAPPERS.contains(&call.name));
    if !is_wrapper {
      return (None, expression);
    }

    let Expression::Call(call) = expression else {
      unreachable!("checked to be a call above")
    };
    let mut call = Box::into_inner(call);
    let name = UNARY_WRAPPERS
      .into_iter()
      .find(|name| *name == call.name)
      .expect("checked to be a wrapper above");
    let operand = call.arguments.pop().expect("unary wrapper has an argument");

    (Some(name), operand)
  }

  /// `<power> = { "+" | "-" | "!" } <base>`
  ///
  /// A run of signs collapses into one; once a `!` is seen the run tracks
  /// the not/not-not state instead and later signs are swallowed. The
  /// combined prefix wraps the operand in the matching builtin.
  fn power(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let mut sign = 1;
    while matches!(self.current.kind, TokenKind::Plus | TokenKind::Minus) {
      if self.current.kind == TokenKind::Minus {
        sign = -sign;
      }
      self.advance();
    }

    let mut logical = 0;
    while matches!(
      self.current.kind,
      TokenKind::Plus | TokenKind::Minus | TokenKind::Bang
    ) {
      if self.current.kind == TokenKind::Bang {
        logical = if logical == 0 { -1 } else { -logical };
      }
      self.advance();
    }

    let base = self.base()?;

    let wrapper = match (sign, logical) {
      (1, 0) => return Ok(base),
      (1, -1) => "logical_not",
      (1, _) => "logical_notnot",
      (_, 0) => "negate",
      (_, -1) => "negate_logical_not",
      _ => "negate_logical_notnot",
    };
    Ok(self.unary(wrapper, base))
  }

  /// `<base> = NUMBER | IDENTIFIER … | "(" <list> ")"`
  fn base(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    match self.current.kind {
      TokenKind::Number => self.number(),
      TokenKind::Identifier => self.identifier(),
      TokenKind::LeftParen => self.group(),
      TokenKind::Unknown => Err(ParseError::UnknownCharacter(self.current)),
      _ => Err(ParseError::ExpectedExpression(self.current)),
    }
  }

  /// Parses a number literal
  fn number(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let raw = self.current.text(self.source);
    let value = raw
      .parse()
      .expect("string to be a valid number representation");
    self.advance();

    Ok(Expression::Constant(Constant { value }))
  }

  /// Parses a parenthesised list
  fn group(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    self.advance();
    let expression = self.list()?;
    self.expect(TokenKind::RightParen)?;

    Ok(expression)
  }

  /// Resolve an identifier and parse whatever call shape it requires.
  ///
  /// The caller's bindings shadow the builtin registry.
  fn identifier(&mut self) -> ParseResult<Expression<'s, 'ast>> {
    let token = self.current;
    let name = token.text(self.source);

    if let Some(binding) = self.bindings.iter().find(|binding| binding.name() == name) {
      return match binding.target() {
        BindingTarget::Variable(address) => {
          self.advance();
          Ok(Expression::Variable(Variable { name, address }))
        }
        BindingTarget::Function { function, .. } => {
          self.call(name, binding.kind(), Callable::Function(function))
        }
        BindingTarget::Closure {
          function, context, ..
        } => self.call(name, binding.kind(), Callable::Closure { function, context }),
      };
    }

    if let Some(builtin) = find_builtin(name) {
      return self.call(builtin.name, builtin.kind(), builtin.callable());
    }

    Err(ParseError::UnknownIdentifier(token))
  }

  /// Parses the arguments of a call.
  ///
  /// Nullary callables take an optional empty `()`; unary callables apply
  /// directly to a `<power>` with no parentheses needed; anything else takes
  /// a parenthesised list with exactly the right number of arguments.
  fn call(
    &mut self,
    name: &'s str,
    kind: Kind,
    callable: Callable,
  ) -> ParseResult<Expression<'s, 'ast>> {
    self.advance();

    let arity = kind.arity();
    let mut arguments = Vec::with_capacity_in(arity, self.allocator);

    if arity == 0 {
      if self.current.kind == TokenKind::LeftParen {
        self.advance();
        self.expect(TokenKind::RightParen)?;
      }
    } else if arity == 1 {
      arguments.push(self.power()?);
    } else {
      if self.current.kind != TokenKind::LeftParen {
        return Err(ParseError::Expected {
          expected: TokenKind::LeftParen,
          received: self.current,
        });
      }

      for index in 0..arity {
        self.advance();
        arguments.push(self.expression()?);

        if self.current.kind != TokenKind::Comma {
          if index + 1 != arity {
            return Err(ParseError::WrongArity {
              expected: arity,
              received: index + 1,
              token: self.current,
            });
          }
          break;
        }
      }
      self.expect(TokenKind::RightParen)?;
    }

    Ok(Expression::Call(Box::new_in(
      Call {
        name,
        kind,
        callable,
        arguments,
      },
      self.allocator,
    )))
  }
}

/// An error which arose during parsing
#[derive(Clone, Copy, Debug)]
pub enum ParseError {
  /// A character the language does not use
  UnknownCharacter(Token),
  /// An identifier which is neither a host binding nor a builtin
  UnknownIdentifier(Token),
  /// Expected the start of an expression
  ExpectedExpression(Token),
  /// Expected a token of a certain kind
  Expected {
    /// Expected Token Kind to be
    expected: TokenKind,
    /// Received this Token instead
    received: Token,
  },
  /// A call supplied with the wrong number of arguments
  WrongArity {
    expected: usize,
    received: usize,
    token: Token,
  },
  /// A complete expression followed by something other than the end
  TrailingInput(Token),
}
impl ParseError {
  /// The title of the error message
  #[must_use]
  pub fn title(&self) -> &'static str {
    match self {
      Self::UnknownCharacter(_) => "Unknown Character",
      Self::UnknownIdentifier(_) => "Unknown Identifier",
      Self::ExpectedExpression(_) => "Expected Expression",
      Self::Expected { .. } => "Expected Token",
      Self::WrongArity { .. } => "Wrong Number of Arguments",
      Self::TrailingInput(_) => "Trailing Input",
    }
  }

  /// The body of the error message describing what has gone wrong
  #[must_use]
  pub fn message(&self) -> String {
    match self {
      Self::UnknownCharacter(_) => "got unknown character".into(),
      Self::UnknownIdentifier(_) => "identifier is not a host binding or a builtin".into(),
      Self::ExpectedExpression(token) => {
        format!("expected expression but got {}", token.kind)
      }
      Self::Expected { expected, received } => {
        format!("expected {expected} but got {}", received.kind)
      }
      Self::WrongArity { expected, received, .. } => {
        format!("expected {expected} arguments but got {received}")
      }
      Self::TrailingInput(token) => {
        format!("expected the end of the expression but got {}", token.kind)
      }
    }
  }

  /// The 1-based byte offset of the error in the source: just past the
  /// offending token
  #[must_use]
  pub fn position(&self) -> usize {
    let token = match self {
      Self::UnknownCharacter(token)
      | Self::UnknownIdentifier(token)
      | Self::ExpectedExpression(token)
      | Self::TrailingInput(token)
      | Self::WrongArity { token, .. } => token,
      Self::Expected { received, .. } => received,
    };

    token.end().max(1)
  }
}
impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message())
  }
}
impl error::Error for ParseError {}

type ParseResult<T> = Result<T, ParseError>;
