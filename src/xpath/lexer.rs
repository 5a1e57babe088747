//! XPath Lexer
//!
//! Tokenizes path expressions. `*` and the names `and`, `or`, `mod` and
//! `div` are operators only when they follow something that ends an
//! operand; elsewhere they are name tests (`//div`, `/*`).

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Plus,        // +
    Minus,       // -
    Star,        // * as a name test
    Multiply,    // * as an operator
    Eq,          // =
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    And,         // and
    Or,          // or
    Mod,         // mod
    Div,         // div

    // Brackets
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Literals
    Number(f64),
    String(String),

    // Names
    Name(String),     // NCName
    NameTest(String), // prefix:* or prefix:local
    NodeType(String), // node(), text(), comment(), processing-instruction()

    // Axis
    Axis(String), // child::, descendant::, etc.

    // Special
    DoubleColon, // ::
    Comma,       // ,

    /// Input that cannot start any token
    Error(String),

    // End of input
    Eof,
}

impl Token {
    /// Whether an operator may follow this token
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Name(_)
                | Token::NameTest(_)
                | Token::Star
                | Token::Number(_)
                | Token::String(_)
                | Token::RightParen
                | Token::RightBracket
                | Token::Dot
                | Token::DoubleDot
        )
    }
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    operator_allowed: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            operator_allowed: false,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if is_xpath_whitespace(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        let token = self.scan_token();
        self.operator_allowed = token.ends_operand();
        token
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance(1);
        token
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek() {
            Some(c) => c,
            None => return Token::Eof,
        };

        match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                if self.peek_at(1) == Some('.') {
                    self.advance(2);
                    Token::DoubleDot
                } else if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.read_number()
                } else {
                    self.single(Token::Dot)
                }
            }
            '@' => self.single(Token::At),
            '|' => self.single(Token::Pipe),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' if self.operator_allowed => self.single(Token::Multiply),
            '*' => self.single(Token::Star),
            '=' => self.single(Token::Eq),
            '!' => {
                if self.peek_at(1) == Some('=') {
                    self.advance(2);
                    Token::NotEq
                } else {
                    self.advance(1);
                    Token::Error("expected `!=`".to_string())
                }
            }
            '<' => {
                self.advance(1);
                if self.peek() == Some('=') {
                    self.advance(1);
                    Token::LtEq
                } else {
                    Token::Lt
                }
            }
            '>' => {
                self.advance(1);
                if self.peek() == Some('=') {
                    self.advance(1);
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            '$' => {
                self.advance(1);
                Token::Error("variable references are not supported".to_string())
            }
            ':' => {
                if self.peek_at(1) == Some(':') {
                    self.advance(2);
                    Token::DoubleColon
                } else {
                    self.advance(1);
                    Token::Error("unexpected `:`".to_string())
                }
            }
            '"' | '\'' => self.read_string(c),
            '0'..='9' => self.read_number(),
            _ if is_name_start_char(c) => self.read_name_or_keyword(),
            _ => {
                self.advance(c.len_utf8());
                Token::Error(format!("unexpected character `{c}`"))
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }

        if self.peek() == Some('.') {
            self.advance(1);
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse() {
            Ok(value) => Token::Number(value),
            Err(_) => Token::Error(format!("invalid number `{num_str}`")),
        }
    }

    fn read_string(&mut self, quote: char) -> Token {
        self.advance(1);
        let start = self.pos;

        match self.remaining().find(quote) {
            Some(len) => {
                let value = self.input[start..start + len].to_string();
                self.advance(len + 1);
                Token::String(value)
            }
            None => {
                self.pos = self.input.len();
                Token::Error("unterminated string literal".to_string())
            }
        }
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn read_name_or_keyword(&mut self) -> Token {
        let name = self.read_ncname();

        if self.operator_allowed {
            match name {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        // prefix:local and prefix:* bind tighter than anything else
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            self.advance(1);
            if self.peek() == Some('*') {
                self.advance(1);
                return Token::NameTest(format!("{name}:*"));
            }
            if !self.peek().is_some_and(is_name_start_char) {
                return Token::Error(format!("missing local name after `{name}:`"));
            }
            let local = self.read_ncname();
            return self.function_or_name(format!("{name}:{local}"), true);
        }

        self.function_or_name(name.to_string(), false)
    }

    fn function_or_name(&mut self, name: String, prefixed: bool) -> Token {
        let save = self.pos;
        self.skip_whitespace();

        if !prefixed && self.remaining().starts_with("::") {
            return Token::Axis(name);
        }
        if self.peek() == Some('(') {
            if let "node" | "text" | "comment" | "processing-instruction" = name.as_str() {
                return Token::NodeType(name);
            }
        }

        self.pos = save;
        if prefixed {
            Token::NameTest(name)
        } else {
            Token::Name(name)
        }
    }

    /// Tokenize entire input
    #[cfg(test)]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        tokens
    }
}

fn is_xpath_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c == '\u{B7}'
}
