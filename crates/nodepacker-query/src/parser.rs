use crate::ast::{Comparison, Expression, Leaf, NameOp, NumericField, NumericOp, Term};
use crate::lexer::{tokenize, Field, Operator, Spanned, Token};
use crate::{FilterError, Result};
use regex::Regex;
use tracing::warn;

/// Parse a complete filter expression.
///
/// ```text
/// Expression := Term ('|' Term)*
/// Term       := Leaf ('&' Leaf)*
/// Leaf       := Comparison | '(' Expression ')'
/// Comparison := ('mem' | 'cpu') NumericOp Natural
///             | 'name' ('=' | '!=' | '~=') Quoted
/// ```
pub fn parse(source: &str) -> Result<Expression> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };

    let expression = parser.expression()?;

    if let Some(extra) = parser.peek() {
        let message = match extra.token {
            Token::RParen => "unmatched ')'".to_string(),
            ref token => format!("unexpected '{}' after complete expression", token),
        };
        return Err(parser.error_at(message, extra));
    }

    Ok(expression)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek().map(|s| &s.token) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error_at(&self, message: impl Into<String>, at: &Spanned) -> FilterError {
        FilterError::syntax_error(message, self.source, at.offset, at.len)
    }

    fn error_at_end(&self, message: impl Into<String>) -> FilterError {
        FilterError::syntax_error(message, self.source, self.source.len(), 0)
    }

    fn expression(&mut self) -> Result<Expression> {
        let mut terms = vec![self.term()?];
        while self.eat(&Token::Or) {
            terms.push(self.term()?);
        }
        Ok(Expression { terms })
    }

    fn term(&mut self) -> Result<Term> {
        let mut leaves = vec![self.leaf()?];
        while self.eat(&Token::And) {
            leaves.push(self.leaf()?);
        }
        Ok(Term { leaves })
    }

    fn leaf(&mut self) -> Result<Leaf> {
        let Some(next) = self.advance() else {
            return Err(self.error_at_end("expected a comparison or '('"));
        };

        match next.token {
            Token::LParen => {
                let inner = self.expression()?;
                if self.eat(&Token::RParen) {
                    Ok(Leaf::Group(Box::new(inner)))
                } else {
                    Err(self.error_at("unclosed '('", &next))
                }
            }
            Token::Field(field) => self.comparison(field, &next).map(Leaf::Comparison),
            ref token => Err(self.error_at(
                format!("expected a comparison or '(', found '{}'", token),
                &next,
            )),
        }
    }

    fn comparison(&mut self, field: Field, field_token: &Spanned) -> Result<Comparison> {
        let op_token = match self.advance() {
            Some(s) => s,
            None => {
                return Err(self.error_at_end(format!("expected an operator after '{}'", field)))
            }
        };
        let Token::Op(op) = op_token.token else {
            return Err(self.error_at(
                format!("expected an operator after '{}'", field),
                &op_token,
            ));
        };

        match field {
            Field::Mem | Field::Cpu => self.numeric(field, op, &op_token),
            Field::Name => self.name(op, &op_token, field_token),
        }
    }

    fn numeric(&mut self, field: Field, op: Operator, op_token: &Spanned) -> Result<Comparison> {
        let Some(op) = NumericOp::from_operator(op) else {
            return Err(self.error_at(
                format!("'{}' is only valid for name", op),
                op_token,
            ));
        };

        let literal = match self.advance() {
            Some(s) => s,
            None => {
                return Err(self.error_at_end(format!("expected an integer after '{}'", op_token.token)))
            }
        };
        let Token::Natural(units) = literal.token else {
            return Err(self.error_at(
                format!("{} requires an integer literal", field),
                &literal,
            ));
        };

        let threshold = i64::try_from(units)
            .ok()
            .and_then(|v| v.checked_mul(1000))
            .ok_or_else(|| self.error_at("integer literal is out of range", &literal))?;

        let field = match field {
            Field::Mem => NumericField::Mem,
            _ => NumericField::Cpu,
        };

        Ok(Comparison::Numeric {
            field,
            op,
            units,
            threshold,
        })
    }

    fn name(&mut self, op: Operator, op_token: &Spanned, field_token: &Spanned) -> Result<Comparison> {
        if !matches!(op, Operator::Eq | Operator::Ne | Operator::Match) {
            return Err(self.error_at(
                format!("'{}' is not valid for name, use =, != or ~=", op),
                op_token,
            ));
        }

        let literal = match self.advance() {
            Some(s) => s,
            None => {
                return Err(self.error_at_end("expected a quoted string after name operator"))
            }
        };
        let Token::Quoted(text) = literal.token else {
            return Err(self.error_at(
                "name requires a single-quoted string literal",
                &literal,
            ));
        };

        let op = match op {
            Operator::Eq => NameOp::Eq,
            Operator::Ne => NameOp::Ne,
            _ => match Regex::new(&text) {
                Ok(re) => NameOp::Match(Some(re)),
                Err(e) => {
                    warn!(
                        "Invalid pattern '{}' at offset {} never matches: {}",
                        text, field_token.offset, e
                    );
                    NameOp::Match(None)
                }
            },
        };

        Ok(Comparison::Name { op, literal: text })
    }
}
