//! Tokenizer for the subset of Go that goop reads.
//!
//! The lexer keeps comments and newlines as tokens: newlines separate
//! struct fields and top-level declarations, and comments directly above a
//! declaration become its documentation. String, raw string and rune
//! literals are single tokens, so braces inside them never disturb the
//! brace matching used to skip function bodies.

use crate::core::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    /// Interpreted string literal, quotes included.
    String,
    /// Raw string literal, backticks included.
    RawString,
    Rune,
    /// Operator or delimiter. `...` is one token, everything else is a single char.
    Punct,
    /// Line or block comment, delimiters included.
    Comment,
    Newline,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub line: usize,
    pub column: usize,
}

impl<'src> Token<'src> {
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }
}

pub fn tokenize<'src>(file: &str, text: &'src str) -> Result<Vec<Token<'src>>, ParseError> {
    Lexer::new(file, text).run()
}

struct Lexer<'f, 'src> {
    file: &'f str,
    text: &'src str,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token<'src>>,
}

impl<'f, 'src> Lexer<'f, 'src> {
    fn new(file: &'f str, text: &'src str) -> Self {
        Self {
            file,
            text,
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token<'src>>, ParseError> {
        // Skip a UTF-8 byte order mark.
        if self.text.starts_with('\u{feff}') {
            self.pos = '\u{feff}'.len_utf8();
        }

        while let Some(ch) = self.current_char() {
            let (start, line, column) = (self.pos, self.line, self.column);

            let kind = match ch {
                '\n' => {
                    self.advance();
                    TokenKind::Newline
                }
                c if c.is_whitespace() => {
                    self.advance();
                    continue;
                }
                '/' if self.peek_char(1) == Some('/') => {
                    while let Some(c) = self.current_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    TokenKind::Comment
                }
                '/' if self.peek_char(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.current_char() {
                            Some('*') if self.peek_char(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => self.advance(),
                            None => return Err(self.error(line, column, "unterminated block comment")),
                        }
                    }
                    TokenKind::Comment
                }
                c if c.is_alphabetic() || c == '_' => {
                    while let Some(c) = self.current_char() {
                        if c.is_alphanumeric() || c == '_' {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    TokenKind::Ident
                }
                c if c.is_ascii_digit() => {
                    self.read_number();
                    TokenKind::Number
                }
                '.' if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.read_number();
                    TokenKind::Number
                }
                '"' => {
                    self.read_quoted('"', line, column, "unterminated string literal")?;
                    TokenKind::String
                }
                '\'' => {
                    self.read_quoted('\'', line, column, "unterminated rune literal")?;
                    TokenKind::Rune
                }
                '`' => {
                    self.advance();
                    loop {
                        match self.current_char() {
                            Some('`') => {
                                self.advance();
                                break;
                            }
                            Some(_) => self.advance(),
                            None => return Err(self.error(line, column, "unterminated raw string literal")),
                        }
                    }
                    TokenKind::RawString
                }
                '.' if self.text[self.pos..].starts_with("...") => {
                    self.advance();
                    self.advance();
                    self.advance();
                    TokenKind::Punct
                }
                _ => {
                    self.advance();
                    TokenKind::Punct
                }
            };

            self.tokens.push(Token {
                kind,
                text: &self.text[start..self.pos],
                line,
                column,
            });
        }

        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: "",
            line: self.line,
            column: self.column,
        });
        Ok(self.tokens)
    }

    fn current_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.pos += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn read_number(&mut self) {
        while let Some(c) = self.current_char() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_quoted(
        &mut self,
        quote: char,
        line: usize,
        column: usize,
        message: &str,
    ) -> Result<(), ParseError> {
        self.advance();
        loop {
            match self.current_char() {
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(());
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('\n') | None => return Err(self.error(line, column, message)),
                Some(_) => self.advance(),
            }
        }
    }

    fn error(&self, line: usize, column: usize, message: &str) -> ParseError {
        ParseError {
            file: self.file.to_string(),
            line,
            column,
            message: message.to_string(),
        }
    }
}
