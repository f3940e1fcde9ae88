use crate::{FilterError, Result};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Record field a comparison reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Mem,
    Cpu,
    Name,
}

impl Field {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "mem" => Some(Field::Mem),
            "cpu" => Some(Field::Cpu),
            "name" => Some(Field::Name),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::Mem => "mem",
            Field::Cpu => "cpu",
            Field::Name => "name",
        };
        f.write_str(s)
    }
}

/// Comparison operator as written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `~=`, regular expression search
    Match,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Match => "~=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Field(Field),
    Op(Operator),
    Natural(u64),
    Quoted(String),
    LParen,
    RParen,
    And,
    Or,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Field(field) => write!(f, "{}", field),
            Token::Op(op) => write!(f, "{}", op),
            Token::Natural(n) => write!(f, "{}", n),
            Token::Quoted(s) => write!(f, "'{}'", s),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::And => f.write_str("&"),
            Token::Or => f.write_str("|"),
        }
    }
}

/// A token with its byte range in the source expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
    pub len: usize,
}

impl Spanned {
    fn new(token: Token, start: usize, end: usize) -> Self {
        Self {
            token,
            offset: start,
            len: end - start,
        }
    }
}

/// Split a filter expression into tokens. Whitespace is skipped.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>> {
    Lexer::new(source).collect()
}

struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn error(&self, message: impl Into<String>, offset: usize, len: usize) -> FilterError {
        FilterError::syntax_error(message, self.source, offset, len)
    }

    /// Consume `expected` if it is next, returning the end offset
    fn follow(&mut self, expected: char) -> Option<usize> {
        match self.chars.peek() {
            Some(&(i, c)) if c == expected => {
                self.chars.next();
                Some(i + c.len_utf8())
            }
            _ => None,
        }
    }

    /// Consume characters matching `pred`, extending the token ending at `end`
    fn take_while(&mut self, mut end: usize, pred: impl Fn(char) -> bool) -> usize {
        while let Some(&(i, c)) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        end
    }

    fn operator(&mut self, start: usize, c: char) -> Result<Spanned> {
        let single = start + c.len_utf8();
        let (op, end) = match c {
            '=' => (Operator::Eq, single),
            '<' => match self.follow('=') {
                Some(end) => (Operator::Le, end),
                None => (Operator::Lt, single),
            },
            '>' => match self.follow('=') {
                Some(end) => (Operator::Ge, end),
                None => (Operator::Gt, single),
            },
            '!' => match self.follow('=') {
                Some(end) => (Operator::Ne, end),
                None => return Err(self.error("expected '=' after '!'", start, 1)),
            },
            '~' => match self.follow('=') {
                Some(end) => (Operator::Match, end),
                None => return Err(self.error("expected '=' after '~'", start, 1)),
            },
            _ => unreachable!("operator called with non-operator character"),
        };
        Ok(Spanned::new(Token::Op(op), start, end))
    }

    fn natural(&mut self, start: usize) -> Result<Spanned> {
        let end = self.take_while(start + 1, |c| c.is_ascii_digit());
        let text = &self.source[start..end];
        let value = text.parse::<u64>().map_err(|_| {
            self.error(
                format!("integer literal '{}' is out of range", text),
                start,
                end - start,
            )
        })?;

        if let Some(&(i, c)) = self.chars.peek() {
            if c.is_alphabetic() || c == '_' {
                return Err(self.error(
                    "malformed integer literal",
                    start,
                    i + c.len_utf8() - start,
                ));
            }
        }

        Ok(Spanned::new(Token::Natural(value), start, end))
    }

    fn quoted(&mut self, start: usize) -> Result<Spanned> {
        for (i, c) in self.chars.by_ref() {
            if c == '\'' {
                let literal = self.source[start + 1..i].to_string();
                return Ok(Spanned {
                    token: Token::Quoted(literal),
                    offset: start,
                    len: i + 1 - start,
                });
            }
        }
        Err(self.error(
            "unterminated string literal",
            start,
            self.source.len() - start,
        ))
    }

    fn keyword(&mut self, start: usize, first: char) -> Result<Spanned> {
        let end = self.take_while(start + first.len_utf8(), |c| {
            c.is_alphanumeric() || c == '_'
        });
        let word = &self.source[start..end];
        match Field::from_keyword(word) {
            Some(field) => Ok(Spanned::new(Token::Field(field), start, end)),
            None => Err(self.error(
                format!("unknown field '{}', expected mem, cpu or name", word),
                start,
                end - start,
            )),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Spanned>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, c) = loop {
            let (i, c) = self.chars.next()?;
            if !c.is_whitespace() {
                break (i, c);
            }
        };

        let punct = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '&' => Some(Token::And),
            '|' => Some(Token::Or),
            _ => None,
        };
        if let Some(token) = punct {
            return Some(Ok(Spanned::new(token, start, start + 1)));
        }

        match c {
            '=' | '<' | '>' | '!' | '~' => Some(self.operator(start, c)),
            '\'' => Some(self.quoted(start)),
            c if c.is_ascii_digit() => Some(self.natural(start)),
            c if c.is_alphabetic() => Some(self.keyword(start, c)),
            other => Some(Err(self.error(
                format!("unexpected character '{}'", other),
                start,
                other.len_utf8(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_tokenize_comparison() {
        assert_eq!(
            tokens("cpu <= 10"),
            vec![
                Token::Field(Field::Cpu),
                Token::Op(Operator::Le),
                Token::Natural(10)
            ]
        );
    }

    #[test]
    fn test_tokenize_ignores_whitespace() {
        assert_eq!(tokens("mem>=4&cpu!=2"), tokens("  mem >= 4 \t& cpu != 2\n"));
    }

    #[test]
    fn test_tokenize_all_operators() {
        assert_eq!(
            tokens("= != < <= > >= ~="),
            vec![
                Token::Op(Operator::Eq),
                Token::Op(Operator::Ne),
                Token::Op(Operator::Lt),
                Token::Op(Operator::Le),
                Token::Op(Operator::Gt),
                Token::Op(Operator::Ge),
                Token::Op(Operator::Match),
            ]
        );
    }

    #[test]
    fn test_tokenize_quoted_keeps_content() {
        assert_eq!(
            tokens("name ~= 'n1-(standard|highmem) x'"),
            vec![
                Token::Field(Field::Name),
                Token::Op(Operator::Match),
                Token::Quoted("n1-(standard|highmem) x".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_spans() {
        let spanned = tokenize("( name = 'ab' )").unwrap();
        assert_eq!(spanned[0].offset, 0);
        assert_eq!(spanned[1].offset, 2);
        assert_eq!(spanned[1].len, 4);
        assert_eq!(spanned[3].offset, 9);
        assert_eq!(spanned[3].len, 4);
        assert_eq!(spanned[4].offset, 14);
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(tokenize("disk > 1").is_err());
        assert!(tokenize("name = 'open").is_err());
        assert!(tokenize("cpu ! 1").is_err());
        assert!(tokenize("cpu > 12ab").is_err());
        assert!(tokenize("cpu > 99999999999999999999999").is_err());
        assert!(tokenize("cpu > -1").is_err());
        assert!(tokenize("cpu $ 1").is_err());
    }

    #[test]
    fn test_unknown_field_points_at_word() {
        let err = tokenize("cpu > 1 & memory < 2").unwrap_err();
        assert_eq!(err.offset(), 10);
    }
}
