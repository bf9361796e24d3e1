//! Formula parser
//!
//! A recursive descent parser over the token sequence produced by the lexer.
//!
//! Precedence (lowest to highest):
//! 1. Equality: `=`, `!=`
//! 2. Comparison: `<`, `>`, `<=`, `>=`
//! 3. Additive: `+`, `-`
//! 4. Multiplicative: `*`, `/`
//! 5. Unary: `!`
//! 6. Primary: literals, cell and range references, calls, parentheses
//!
//! Every binary level is right associative: after one operator the level
//! recurses into itself for the right operand, so `1-2-3` is `1-(2-3)`.
//! Existing sheets depend on this grouping.
//!
//! Every descent through a right operand, `!`, a group or a call argument
//! counts one level; past [`MAX_PARSE_DEPTH`] parsing fails with
//! [`ParseError::TooDeep`].

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaResult, ParseError, ParseResult};
use crate::evaluator::FormulaValue;
use crate::lexer::{tokenize, Literal, Token, TokenKind};
use subsheet_core::FORMULA_SIGIL;

/// Deepest expression nesting the parser accepts
pub const MAX_PARSE_DEPTH: usize = 256;

/// Tokenize and parse formula text.
///
/// A leading `=` sigil is optional.
///
/// # Example
/// ```rust
/// use subsheet_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("sum(A1..A3)").unwrap();
/// let ast = parse_formula("=if(A1>0, \"yes\", \"no\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let source = formula.strip_prefix(FORMULA_SIGIL).unwrap_or(formula);
    let tokens = tokenize(source)?;
    Ok(parse(&tokens)?)
}

/// Parse a token sequence into an AST.
///
/// The first error aborts parsing; nothing of the partial tree survives.
pub fn parse(tokens: &[Token]) -> ParseResult<FormulaExpr> {
    let mut parser = FormulaParser::new(tokens);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current_kind() != TokenKind::Eof {
        return Err(ParseError::UnexpectedToken);
    }

    Ok(expr)
}

/// Formula parser
struct FormulaParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    // === Token access ===

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> TokenKind {
        self.current().map_or(TokenKind::Eof, |t| t.kind)
    }

    fn consume(&mut self) -> Option<&'a Token> {
        let token = self.current();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.current_kind() == kind {
            self.consume();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, error: ParseError) -> ParseResult<&'a Token> {
        if self.current_kind() == kind {
            self.consume().ok_or(error)
        } else {
            Err(error)
        }
    }

    /// Run a nested rule one level deeper
    fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(ParseError::TooDeep);
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    // === Expression parsing with precedence ===

    fn parse_expression(&mut self) -> ParseResult<FormulaExpr> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> ParseResult<FormulaExpr> {
        let left = self.parse_comparison()?;

        let op = match self.current_kind() {
            TokenKind::Equal => BinaryOperator::Equal,
            TokenKind::NotEqual => BinaryOperator::NotEqual,
            _ => return Ok(left),
        };

        self.consume();
        let right = self.nested(Self::parse_equality)?; // Right associative
        Ok(binary(op, left, right))
    }

    fn parse_comparison(&mut self) -> ParseResult<FormulaExpr> {
        let left = self.parse_additive()?;

        let op = match self.current_kind() {
            TokenKind::Less => BinaryOperator::LessThan,
            TokenKind::Greater => BinaryOperator::GreaterThan,
            TokenKind::LessEqual => BinaryOperator::LessEqual,
            TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
            _ => return Ok(left),
        };

        self.consume();
        let right = self.nested(Self::parse_comparison)?; // Right associative
        Ok(binary(op, left, right))
    }

    fn parse_additive(&mut self) -> ParseResult<FormulaExpr> {
        let left = self.parse_multiplicative()?;

        let op = match self.current_kind() {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Subtract,
            _ => return Ok(left),
        };

        self.consume();
        let right = self.nested(Self::parse_additive)?; // Right associative
        Ok(binary(op, left, right))
    }

    fn parse_multiplicative(&mut self) -> ParseResult<FormulaExpr> {
        let left = self.parse_unary()?;

        let op = match self.current_kind() {
            TokenKind::Asterisk => BinaryOperator::Multiply,
            TokenKind::Slash => BinaryOperator::Divide,
            _ => return Ok(left),
        };

        self.consume();
        let right = self.nested(Self::parse_multiplicative)?; // Right associative
        Ok(binary(op, left, right))
    }

    fn parse_unary(&mut self) -> ParseResult<FormulaExpr> {
        if self.match_kind(TokenKind::Exclamation) {
            let operand = self.nested(Self::parse_unary)?;
            return Ok(FormulaExpr::Unary {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<FormulaExpr> {
        let token = self.current().ok_or(ParseError::UnexpectedToken)?;

        match token.kind {
            TokenKind::Number | TokenKind::String => {
                self.consume();
                let value = match &token.literal {
                    Some(Literal::Number(n)) => FormulaValue::Number(*n),
                    Some(Literal::Text(s)) => FormulaValue::Text(s.clone()),
                    None => return Err(ParseError::UnexpectedToken),
                };
                Ok(FormulaExpr::Literal(value))
            }

            TokenKind::True | TokenKind::False => {
                self.consume();
                Ok(FormulaExpr::Literal(FormulaValue::Boolean(
                    token.kind == TokenKind::True,
                )))
            }

            TokenKind::Cell => {
                self.consume();
                if self.match_kind(TokenKind::DotDot) {
                    return self.parse_range(token);
                }
                Ok(FormulaExpr::CellRef(token.lexeme.clone()))
            }

            TokenKind::ParenLeft => {
                self.consume();
                let expr = self.nested(Self::parse_expression)?;
                self.expect(TokenKind::ParenRight, ParseError::NoParen)?;
                Ok(FormulaExpr::Grouping(Box::new(expr)))
            }

            TokenKind::Identifier => {
                self.consume();
                self.parse_call(token)
            }

            _ => Err(ParseError::UnexpectedToken),
        }
    }

    fn parse_range(&mut self, start: &Token) -> ParseResult<FormulaExpr> {
        let end = self.expect(TokenKind::Cell, ParseError::UnexpectedToken)?;
        Ok(FormulaExpr::RangeRef {
            start: start.lexeme.clone(),
            end: end.lexeme.clone(),
        })
    }

    fn parse_call(&mut self, name: &Token) -> ParseResult<FormulaExpr> {
        self.expect(TokenKind::ParenLeft, ParseError::UnexpectedToken)?;

        let mut args = Vec::new();

        if !self.match_kind(TokenKind::ParenRight) {
            args.push(self.nested(Self::parse_expression)?);

            while self.match_kind(TokenKind::Comma) {
                args.push(self.nested(Self::parse_expression)?);
            }

            self.expect(TokenKind::ParenRight, ParseError::NoParen)?;
        }

        Ok(FormulaExpr::Call {
            name: name.lexeme.clone(),
            args,
        })
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FormulaError, LexError};
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> FormulaExpr {
        FormulaExpr::Literal(FormulaValue::Number(n))
    }

    fn parse_err(formula: &str) -> FormulaError {
        parse_formula(formula).unwrap_err()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("=42").unwrap(), num(42.0));
        assert_eq!(parse_formula("=3.14").unwrap(), num(3.14));
    }

    #[test]
    fn test_parse_string() {
        let ast = parse_formula("=\"Hello\"").unwrap();
        assert_eq!(ast, FormulaExpr::Literal(FormulaValue::Text("Hello".into())));
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(
            parse_formula("=True").unwrap(),
            FormulaExpr::Literal(FormulaValue::Boolean(true))
        );
        assert_eq!(
            parse_formula("=False").unwrap(),
            FormulaExpr::Literal(FormulaValue::Boolean(false))
        );
    }

    #[test]
    fn test_same_level_is_right_associative() {
        let ast = parse_formula("=1-2-3").unwrap();
        assert_eq!(
            ast,
            binary(
                BinaryOperator::Subtract,
                num(1.0),
                binary(BinaryOperator::Subtract, num(2.0), num(3.0))
            )
        );

        assert_eq!(parse_formula("=8/4/2").unwrap().to_string(), "(/ 8 (/ 4 2))");
        assert_eq!(parse_formula("=1-2+3").unwrap().to_string(), "(- 1 (+ 2 3))");
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse_formula("=1+2*3").unwrap().to_string(), "(+ 1 (* 2 3))");
        assert_eq!(
            parse_formula("=1+2>3=True").unwrap().to_string(),
            "(= (> (+ 1 2) 3) True)"
        );
        assert_eq!(
            parse_formula("=(1+2)*3").unwrap().to_string(),
            "(* (group (+ 1 2)) 3)"
        );
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(parse_formula("=!!True").unwrap().to_string(), "(! (! True))");
        assert_eq!(
            parse_formula("=!A1=B1").unwrap().to_string(),
            "(= (! A1) B1)"
        );
    }

    #[test]
    fn test_parse_cell_and_range() {
        assert_eq!(
            parse_formula("=B3").unwrap(),
            FormulaExpr::CellRef("B3".into())
        );
        assert_eq!(
            parse_formula("=A1..C2").unwrap(),
            FormulaExpr::RangeRef {
                start: "A1".into(),
                end: "C2".into()
            }
        );
    }

    #[test]
    fn test_range_requires_end_cell() {
        assert_eq!(
            parse_err("=A1..5"),
            FormulaError::Parse(ParseError::UnexpectedToken)
        );
        assert_eq!(
            parse_err("=A1.."),
            FormulaError::Parse(ParseError::UnexpectedToken)
        );
    }

    #[test]
    fn test_parse_call() {
        let ast = parse_formula("=if(A1>0, \"yes\", sum(B1..B3))").unwrap();
        if let FormulaExpr::Call { name, args } = ast {
            assert_eq!(name, "if");
            assert_eq!(args.len(), 3);
            assert!(matches!(&args[2], FormulaExpr::Call { name, .. } if name == "sum"));
        } else {
            panic!("Expected Call");
        }

        assert_eq!(
            parse_formula("=now()").unwrap(),
            FormulaExpr::Call {
                name: "now".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn test_missing_paren() {
        assert_eq!(parse_err("=(1+2"), FormulaError::Parse(ParseError::NoParen));
        assert_eq!(parse_err("=sum(A1..A2"), FormulaError::Parse(ParseError::NoParen));
    }

    #[test]
    fn test_nesting_ceiling() {
        let deep = format!("={}1{}", "(".repeat(3000), ")".repeat(3000));
        assert_eq!(parse_err(&deep), FormulaError::Parse(ParseError::TooDeep));

        let nots = format!("={}True", "!".repeat(MAX_PARSE_DEPTH + 1));
        assert_eq!(parse_err(&nots), FormulaError::Parse(ParseError::TooDeep));

        let shallow = format!("={}1{}", "(".repeat(200), ")".repeat(200));
        assert!(parse_formula(&shallow).is_ok());
    }

    #[test]
    fn test_long_chain_within_ceiling() {
        let terms = vec!["1"; 200].join("+");
        assert!(parse_formula(&format!("={terms}")).is_ok());

        // Siblings do not accumulate depth
        let args = vec!["(((1)))"; 100].join(",");
        assert!(parse_formula(&format!("=sum({args})")).is_ok());
    }

    #[test]
    fn test_unexpected_tokens() {
        assert_eq!(parse_err("="), FormulaError::Parse(ParseError::UnexpectedToken));
        assert_eq!(parse_err("=1+"), FormulaError::Parse(ParseError::UnexpectedToken));
        assert_eq!(parse_err("=foo"), FormulaError::Parse(ParseError::UnexpectedToken));
        assert_eq!(parse_err("=1 2"), FormulaError::Parse(ParseError::UnexpectedToken));
        assert_eq!(parse_err("=)"), FormulaError::Parse(ParseError::UnexpectedToken));
    }

    #[test]
    fn test_lexer_errors_surface_first() {
        assert_eq!(parse_err("=1 + #"), FormulaError::Lex(LexError::InvalidChar));
        assert_eq!(parse_err("=A1B"), FormulaError::Lex(LexError::InvalidCell));
    }

    #[test]
    fn test_parse_without_sigil() {
        assert_eq!(parse_formula("1").unwrap(), num(1.0));
    }
}
