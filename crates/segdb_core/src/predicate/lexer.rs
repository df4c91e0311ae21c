//! Lexer for filter expressions.

use super::CompileError;

/// Token types for filter expressions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal (quotes and escapes removed).
    Str(String),
    /// Variable name.
    Ident(String),

    True,
    False,
    Nil,

    /// `&&` or `and`
    And,
    /// `||` or `or`
    Or,
    /// `!` or `not`
    Not,
    In,
    Contains,
    StartsWith,
    EndsWith,

    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,

    /// End of input
    Eof,
}

impl Token {
    /// Human-readable token name for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Int(n) => format!("number {n}"),
            Token::Float(f) => format!("number {f}"),
            Token::Str(s) => format!("string {s:?}"),
            Token::Ident(name) => format!("identifier `{name}`"),
            Token::Eof => "end of input".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::True => "true",
            Token::False => "false",
            Token::Nil => "nil",
            Token::And => "&&",
            Token::Or => "||",
            Token::Not => "!",
            Token::In => "in",
            Token::Contains => "contains",
            Token::StartsWith => "startsWith",
            Token::EndsWith => "endsWith",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Int(_)
            | Token::Float(_)
            | Token::Str(_)
            | Token::Ident(_)
            | Token::Eof => "",
        }
    }
}

/// Lexer for tokenizing filter expressions.
pub(crate) struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given source.
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token and the character offset it starts at.
    pub(crate) fn next_token(&mut self) -> Result<(Token, usize), CompileError> {
        self.skip_whitespace();
        let start = self.position;

        let Some(ch) = self.current_char() else {
            return Ok((Token::Eof, start));
        };

        let token = match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            '.' => self.single(Token::Dot),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '%' => self.single(Token::Percent),
            '=' => self.pair('=', Token::EqEq, None, start)?,
            '!' => self.pair('=', Token::NotEq, Some(Token::Not), start)?,
            '<' => self.pair('=', Token::Le, Some(Token::Lt), start)?,
            '>' => self.pair('=', Token::Ge, Some(Token::Gt), start)?,
            '&' => self.pair('&', Token::And, None, start)?,
            '|' => self.pair('|', Token::Or, None, start)?,
            '"' | '\'' => self.read_string(ch, start)?,
            _ if ch.is_ascii_digit() => self.read_number()?,
            _ if ch.is_ascii_alphabetic() || ch == '_' => self.read_word(),
            _ => {
                return Err(CompileError::UnexpectedChar {
                    found: ch,
                    offset: start,
                })
            }
        };

        Ok((token, start))
    }

    /// Peek at the next token without consuming it.
    pub(crate) fn peek_token(&mut self) -> Result<Token, CompileError> {
        let saved_position = self.position;
        let token = self.next_token();
        self.position = saved_position;
        token.map(|(token, _)| token)
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Two-character operator, optionally falling back to a one-character one.
    fn pair(
        &mut self,
        second: char,
        double: Token,
        single: Option<Token>,
        start: usize,
    ) -> Result<Token, CompileError> {
        let first = self.current_char().unwrap_or_default();
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            return Ok(double);
        }
        single.ok_or(CompileError::UnexpectedChar {
            found: first,
            offset: start,
        })
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match word.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "nil" => Token::Nil,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "in" => Token::In,
            "contains" => Token::Contains,
            "startsWith" => Token::StartsWith,
            "endsWith" => Token::EndsWith,
            _ => Token::Ident(word),
        }
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<Token, CompileError> {
        self.advance();
        let mut s = String::new();

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == quote {
                return Ok(Token::Str(s));
            }
            if ch == '\\' {
                let Some(escaped) = self.current_char() else {
                    break;
                };
                self.advance();
                match escaped {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    '"' | '\'' | '\\' => s.push(escaped),
                    _ => {
                        s.push('\\');
                        s.push(escaped);
                    }
                }
            } else {
                s.push(ch);
            }
        }

        Err(CompileError::UnterminatedString { offset: start })
    }

    fn read_number(&mut self) -> Result<Token, CompileError> {
        let mut literal = String::new();
        let mut is_float = false;

        self.take_digits(&mut literal);

        // "1." followed by a non-digit is left for the parser to reject
        if self.current_char() == Some('.') && self.peek_char().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            literal.push('.');
            self.advance();
            self.take_digits(&mut literal);
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let sign = self.peek_char();
            let digit_at = if matches!(sign, Some('+' | '-')) { 2 } else { 1 };
            if self.char_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    literal.push(self.current_char().unwrap_or_default());
                    self.advance();
                }
                self.take_digits(&mut literal);
            }
        }

        if self.current_char().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(CompileError::InvalidNumber { literal });
        }

        if is_float {
            literal
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| CompileError::InvalidNumber { literal })
        } else {
            literal
                .parse::<i64>()
                .map(Token::Int)
                .map_err(|_| CompileError::InvalidNumber { literal })
        }
    }

    fn take_digits(&mut self, out: &mut String) {
        while let Some(ch) = self.current_char() {
            let separator = ch == '_' && self.peek_char().is_some_and(|c| c.is_ascii_digit());
            if ch.is_ascii_digit() || separator {
                if ch != '_' {
                    out.push(ch);
                }
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.char_at(1)
    }

    fn char_at(&self, ahead: usize) -> Option<char> {
        self.input.get(self.position + ahead).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let (token, _) = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn lex_comparison_chain() {
        assert_eq!(
            tokens("level >= 1 && uvs in [1,2,3]"),
            vec![
                Token::Ident("level".into()),
                Token::Ge,
                Token::Int(1),
                Token::And,
                Token::Ident("uvs".into()),
                Token::In,
                Token::LeftBracket,
                Token::Int(1),
                Token::Comma,
                Token::Int(2),
                Token::Comma,
                Token::Int(3),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn lex_keywords_and_symbols() {
        assert_eq!(
            tokens("not a or b and !c != d"),
            vec![
                Token::Not,
                Token::Ident("a".into()),
                Token::Or,
                Token::Ident("b".into()),
                Token::And,
                Token::Not,
                Token::Ident("c".into()),
                Token::NotEq,
                Token::Ident("d".into()),
            ]
        );
    }

    #[test]
    fn lex_numbers() {
        assert_eq!(tokens("42"), vec![Token::Int(42)]);
        assert_eq!(tokens("1.5"), vec![Token::Float(1.5)]);
        assert_eq!(tokens("2e3"), vec![Token::Float(2000.0)]);
        assert_eq!(tokens("1_000"), vec![Token::Int(1000)]);
        assert_eq!(tokens("1.x"), vec![Token::Int(1), Token::Dot, Token::Ident("x".into())]);
    }

    #[test]
    fn lex_strings_with_escapes() {
        assert_eq!(tokens(r#""a\"b""#), vec![Token::Str("a\"b".into())]);
        assert_eq!(tokens(r"'it\'s'"), vec![Token::Str("it's".into())]);
        assert_eq!(tokens(r#""tab\there""#), vec![Token::Str("tab\there".into())]);
    }

    #[test]
    fn lex_errors() {
        assert!(matches!(
            Lexer::new("= 1").next_token(),
            Err(CompileError::UnexpectedChar { found: '=', .. })
        ));
        assert!(matches!(
            Lexer::new("\"open").next_token(),
            Err(CompileError::UnterminatedString { offset: 0 })
        ));
        assert!(matches!(
            Lexer::new("12abc").next_token(),
            Err(CompileError::InvalidNumber { .. })
        ));
        assert!(matches!(
            Lexer::new("99999999999999999999").next_token(),
            Err(CompileError::InvalidNumber { .. })
        ));
        assert!(matches!(
            Lexer::new("& b").next_token(),
            Err(CompileError::UnexpectedChar { found: '&', .. })
        ));
        assert!(matches!(
            Lexer::new("#").next_token(),
            Err(CompileError::UnexpectedChar { found: '#', offset: 0 })
        ));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new("not in");
        assert_eq!(lexer.next_token().unwrap().0, Token::Not);
        assert_eq!(lexer.peek_token().unwrap(), Token::In);
        assert_eq!(lexer.next_token().unwrap().0, Token::In);
    }
}
