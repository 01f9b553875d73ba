//! Tokenizer for brace-delimited (C-family) source text.
//!
//! Comments are dropped, but a documentation comment (`///` or `/** */`)
//! marks the next token with `doc = true` so the parser can tell whether a
//! declaration is documented. String literal tokens carry their unescaped
//! content.

use super::error::ParseError;

/// Token classes the structural parser cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Punct,
}

/// A lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    /// Preceded by a documentation comment.
    pub doc: bool,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }
}

const TWO_CHAR_PUNCT: [&str; 18] = [
    "&&", "||", "?.", "??", "=>", "==", "!=", "<=", ">=", "::", "->", "++", "--", "+=", "-=",
    "*=", "/=", "|=",
];

/// Split `src` into tokens.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    Lexer {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        pending_doc: false,
        tokens: Vec::new(),
    }
    .run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    pending_doc: bool,
    tokens: Vec<Token>,
}

impl Lexer {
    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        while let Some(c) = self.peek(0) {
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek(1) == Some('/') => self.line_comment(),
                '/' if self.peek(1) == Some('*') => self.block_comment()?,
                '"' if self.peek(1) == Some('"') && self.peek(2) == Some('"') => {
                    self.raw_string()?
                }
                '"' => self.quoted('"', false)?,
                '\'' => self.quoted('\'', false)?,
                '`' => self.template()?,
                '@' | '$' if self.string_prefix_len().is_some() => self.prefixed_string()?,
                c if c.is_alphabetic() || c == '_' => self.ident(),
                c if c.is_ascii_digit() => self.number(),
                _ => self.punct(),
            }
        }
        Ok(self.tokens)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, text: String, line: u32) {
        self.tokens.push(Token {
            kind,
            text,
            line,
            doc: self.pending_doc,
        });
        self.pending_doc = false;
    }

    fn line_comment(&mut self) {
        let is_doc = self.peek(2) == Some('/') && self.peek(3) != Some('/');
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        if is_doc {
            self.pending_doc = true;
        }
    }

    fn block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.line;
        let is_doc = self.peek(2) == Some('*') && self.peek(3) != Some('/');
        self.pos += 2;
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some('*'), Some('/')) => {
                    self.pos += 2;
                    break;
                }
                (Some(_), _) => {
                    self.bump();
                }
                (None, _) => return Err(ParseError::UnterminatedComment { line: start }),
            }
        }
        if is_doc {
            self.pending_doc = true;
        }
        Ok(())
    }

    /// Length of a `@"`, `$"`, `$@"` or `@$"` prefix at the cursor.
    fn string_prefix_len(&self) -> Option<usize> {
        match (self.peek(0), self.peek(1), self.peek(2)) {
            (Some('@'), Some('"'), _) | (Some('$'), Some('"'), _) => Some(1),
            (Some('$'), Some('@'), Some('"')) | (Some('@'), Some('$'), Some('"')) => Some(2),
            _ => None,
        }
    }

    fn prefixed_string(&mut self) -> Result<(), ParseError> {
        let Some(prefix_len) = self.string_prefix_len() else {
            return Ok(());
        };
        let mut verbatim = false;
        let mut interpolated = false;
        for _ in 0..prefix_len {
            match self.bump() {
                Some('@') => verbatim = true,
                Some('$') => interpolated = true,
                _ => {}
            }
        }
        if verbatim {
            self.verbatim(interpolated)
        } else {
            self.quoted('"', interpolated)
        }
    }

    fn quoted(&mut self, quote: char, interpolated: bool) -> Result<(), ParseError> {
        let start = self.line;
        self.bump();
        let mut text = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(ParseError::UnterminatedString { line: start });
            };
            match c {
                '\n' => return Err(ParseError::UnterminatedString { line: start }),
                '\\' => match self.bump() {
                    Some('\n') | None => {
                        return Err(ParseError::UnterminatedString { line: start })
                    }
                    Some(escaped) => text.push(escaped),
                },
                '{' if interpolated => {
                    if self.peek(0) == Some('{') {
                        self.bump();
                        text.push('{');
                    } else {
                        self.skip_hole(start)?;
                        text.push_str("{}");
                    }
                }
                c if c == quote => break,
                c => text.push(c),
            }
        }
        self.push(TokenKind::Str, text, start);
        Ok(())
    }

    fn verbatim(&mut self, interpolated: bool) -> Result<(), ParseError> {
        let start = self.line;
        self.bump();
        let mut text = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(ParseError::UnterminatedString { line: start });
            };
            match c {
                '"' if self.peek(0) == Some('"') => {
                    self.bump();
                    text.push('"');
                }
                '"' => break,
                '{' if interpolated && self.peek(0) != Some('{') => {
                    self.skip_hole(start)?;
                    text.push_str("{}");
                }
                c => text.push(c),
            }
        }
        self.push(TokenKind::Str, text, start);
        Ok(())
    }

    fn raw_string(&mut self) -> Result<(), ParseError> {
        let start = self.line;
        self.pos += 3;
        let mut text = String::new();
        loop {
            match (self.peek(0), self.peek(1), self.peek(2)) {
                (Some('"'), Some('"'), Some('"')) => {
                    self.pos += 3;
                    break;
                }
                (Some(_), _, _) => {
                    if let Some(c) = self.bump() {
                        text.push(c);
                    }
                }
                (None, _, _) => return Err(ParseError::UnterminatedString { line: start }),
            }
        }
        self.push(TokenKind::Str, text.trim().to_string(), start);
        Ok(())
    }

    fn template(&mut self) -> Result<(), ParseError> {
        let start = self.line;
        self.bump();
        let mut text = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(ParseError::UnterminatedString { line: start });
            };
            match c {
                '\\' => {
                    if let Some(escaped) = self.bump() {
                        text.push(escaped);
                    }
                }
                '$' if self.peek(0) == Some('{') => {
                    self.bump();
                    self.skip_hole(start)?;
                    text.push_str("{}");
                }
                '`' => break,
                c => text.push(c),
            }
        }
        self.push(TokenKind::Str, text, start);
        Ok(())
    }

    /// Skip an interpolation hole whose opening `{` was already consumed.
    fn skip_hole(&mut self, start: u32) -> Result<(), ParseError> {
        let mut depth = 1usize;
        while depth > 0 {
            let Some(c) = self.bump() else {
                return Err(ParseError::UnterminatedString { line: start });
            };
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                '"' | '\'' => {
                    // Nested literal inside the hole; consume it without emitting.
                    loop {
                        match self.bump() {
                            None => return Err(ParseError::UnterminatedString { line: start }),
                            Some('\\') => {
                                self.bump();
                            }
                            Some(q) if q == c => break,
                            Some(_) => {}
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn ident(&mut self) {
        let line = self.line;
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        self.push(TokenKind::Ident, text, line);
    }

    fn number(&mut self) {
        let line = self.line;
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            let continues_fraction =
                c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit());
            if c.is_ascii_alphanumeric() || c == '_' || continues_fraction {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, text, line);
    }

    fn punct(&mut self) {
        let line = self.line;
        if self.peek(0) == Some('?') && self.peek(1) == Some('?') && self.peek(2) == Some('=') {
            self.pos += 3;
            self.push(TokenKind::Punct, "??=".to_string(), line);
            return;
        }
        if let (Some(a), Some(b)) = (self.peek(0), self.peek(1)) {
            let pair: String = [a, b].iter().collect();
            if TWO_CHAR_PUNCT.contains(&pair.as_str()) {
                self.pos += 2;
                self.push(TokenKind::Punct, pair, line);
                return;
            }
        }
        if let Some(c) = self.bump() {
            self.push(TokenKind::Punct, c.to_string(), line);
        }
    }
}
