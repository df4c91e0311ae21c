//! Recursive-descent parser for filter expressions.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or         := and (("||" | "or") and)*
//! and        := equality (("&&" | "and") equality)*
//! equality   := comparison (("==" | "!=") comparison)*
//! comparison := additive (("<" | "<=" | ">" | ">=" | "in" | "not" "in"
//!                          | "contains" | "startsWith" | "endsWith") additive)*
//! additive   := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := unary (("*" | "/" | "%") unary)*
//! unary      := ("!" | "not" | "-") unary | primary
//! primary    := literal | identifier | "(" or ")" | "[" (or ("," or)* ","?)? "]"
//! ```
//!
//! `||` and `&&` chains become one n-ary node each, so a long flat chain
//! stays shallow. Every other node counts toward [`MAX_HEIGHT`].

use super::ast::{BinaryOp, Expr, LogicalOp, Operand, UnaryOp};
use super::lexer::{Lexer, Token};
use super::CompileError;

/// Maximum nesting of parentheses, arrays and unary operators.
const MAX_DEPTH: usize = 64;

/// Maximum height of the compiled tree.
const MAX_HEIGHT: usize = 256;

/// Parses filter source into an expression tree.
pub(crate) fn parse(source: &str) -> Result<Expr, CompileError> {
    if source.trim().is_empty() {
        return Err(CompileError::Empty);
    }

    let mut parser = Parser::new(source)?;
    let expr = parser.parse_or()?;
    if parser.current != Token::Eof {
        return Err(parser.unexpected("an operator or end of input"));
    }
    Ok(expr)
}

struct Parser {
    lexer: Lexer,
    current: Token,
    offset: usize,
    depth: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, CompileError> {
        let mut lexer = Lexer::new(input);
        let (current, offset) = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            offset,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<(), CompileError> {
        let (token, offset) = self.lexer.next_token()?;
        self.current = token;
        self.offset = offset;
        Ok(())
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), CompileError> {
        if &self.current == token {
            self.advance()
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &'static str) -> CompileError {
        CompileError::UnexpectedToken {
            found: self.current.describe(),
            expected,
            offset: self.offset,
        }
    }

    fn enter(&mut self) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CompileError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let first = self.parse_and()?;
        self.parse_chain(LogicalOp::Or, &Token::Or, first, Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let first = self.parse_equality()?;
        self.parse_chain(LogicalOp::And, &Token::And, first, Self::parse_equality)
    }

    fn parse_chain(
        &mut self,
        op: LogicalOp,
        separator: &Token,
        first: Expr,
        mut operand: impl FnMut(&mut Self) -> Result<Expr, CompileError>,
    ) -> Result<Expr, CompileError> {
        if &self.current != separator {
            return Ok(first);
        }
        let mut terms = vec![first];
        while &self.current == separator {
            self.advance()?;
            terms.push(operand(self)?);
        }
        bounded(Expr::logical(op, terms))
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.current {
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_comparison()?;
            left = bounded(Expr::binary(op, left, right))?;
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                Token::In => BinaryOp::In,
                Token::Contains => BinaryOp::Contains,
                Token::StartsWith => BinaryOp::StartsWith,
                Token::EndsWith => BinaryOp::EndsWith,
                Token::Not if self.lexer.peek_token()? == Token::In => {
                    self.advance()?;
                    BinaryOp::NotIn
                }
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = bounded(Expr::binary(op, left, right))?;
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = bounded(Expr::binary(op, left, right))?;
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = bounded(Expr::binary(op, left, right))?;
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let op = match self.current {
            Token::Not => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        self.advance()?;

        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();

        match (op, operand) {
            (UnaryOp::Neg, Expr::Literal(Operand::Int(n))) => Ok(Expr::Literal(Operand::Int(-n))),
            (UnaryOp::Neg, Expr::Literal(Operand::Float(f))) => {
                Ok(Expr::Literal(Operand::Float(-f)))
            }
            (op, operand) => bounded(Expr::unary(op, operand)),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let expr = match &self.current {
            Token::Int(n) => Expr::Literal(Operand::Int(*n)),
            Token::Float(f) => Expr::Literal(Operand::Float(*f)),
            Token::Str(s) => Expr::Literal(Operand::Str(s.clone())),
            Token::True => Expr::Literal(Operand::Bool(true)),
            Token::False => Expr::Literal(Operand::Bool(false)),
            Token::Nil => Expr::Literal(Operand::Nil),
            Token::Ident(name) => Expr::Variable(name.clone()),
            Token::LeftParen => {
                self.advance()?;
                self.enter()?;
                let inner = self.parse_or()?;
                self.leave();
                self.expect(&Token::RightParen, "`)`")?;
                return self.reject_postfix(inner);
            }
            Token::LeftBracket => {
                self.advance()?;
                self.enter()?;
                let array = self.parse_array_items()?;
                self.leave();
                return self.reject_postfix(array);
            }
            _ => return Err(self.unexpected("a value, identifier or `(`")),
        };
        self.advance()?;
        self.reject_postfix(expr)
    }

    /// Parses array elements up to and including the closing bracket.
    fn parse_array_items(&mut self) -> Result<Expr, CompileError> {
        let mut items = Vec::new();
        while self.current != Token::RightBracket {
            items.push(self.parse_or()?);
            match self.current {
                Token::Comma => self.advance()?,
                Token::RightBracket => {}
                _ => return Err(self.unexpected("`,` or `]`")),
            }
        }
        self.advance()?;

        if items.iter().all(|item| matches!(item, Expr::Literal(_))) {
            let constants = items
                .into_iter()
                .filter_map(|item| match item {
                    Expr::Literal(operand) => Some(operand),
                    _ => None,
                })
                .collect();
            Ok(Expr::Literal(Operand::Array(constants)))
        } else {
            bounded(Expr::array(items))
        }
    }

    fn reject_postfix(&self, expr: Expr) -> Result<Expr, CompileError> {
        let construct = match self.current {
            Token::LeftParen => "function call",
            Token::Dot => "member access",
            Token::LeftBracket => "indexing",
            _ => return Ok(expr),
        };
        Err(CompileError::Unsupported {
            construct,
            offset: self.offset,
        })
    }
}

fn bounded(expr: Expr) -> Result<Expr, CompileError> {
    if expr.height() > MAX_HEIGHT {
        return Err(CompileError::TooDeep { limit: MAX_HEIGHT });
    }
    Ok(expr)
}
