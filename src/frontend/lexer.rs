//! Tokenizer for C declarations.
//!
//! Comments and preprocessor directives are dropped here, so the parser
//! only ever sees identifiers, literals and punctuation.

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Char,
    Ellipsis,
    Punct(char),
}

/// A token with its position in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the first character
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
}

impl Token<'_> {
    /// Check for a specific punctuation character.
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    /// Check for a specific identifier or keyword.
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == name
    }
}

/// A lexical error with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub offset: usize,
    pub len: usize,
}

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            at_line_start: true,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, LexError> {
        let mut tokens = Vec::new();

        while let Some(b) = self.peek(0) {
            match b {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                    self.at_line_start = true;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line(),
                b'#' if self.at_line_start => self.skip_directive()?,
                b'\\' if self.peek(1) == Some(b'\n') => {
                    self.pos += 2;
                    self.line += 1;
                }
                _ => {
                    let token = self.next_token()?;
                    tokens.push(token);
                    self.at_line_start = false;
                }
            }
        }

        Ok(tokens)
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 2;

        loop {
            match self.peek(0) {
                None => {
                    return Err(LexError {
                        message: "unterminated comment".to_string(),
                        offset: start,
                        len: 2,
                    })
                }
                Some(b'*') if self.peek(1) == Some(b'/') => {
                    self.pos += 2;
                    return Ok(());
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Skip to (not past) the end of the line.
    fn skip_line(&mut self) {
        while let Some(b) = self.peek(0) {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    /// Skip a preprocessor directive, honoring line continuations and
    /// comments that span lines.
    fn skip_directive(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek(0) {
                None | Some(b'\n') => return Ok(()),
                Some(b'\\') if self.peek(1) == Some(b'\n') => {
                    self.pos += 2;
                    self.line += 1;
                }
                Some(b'\\') if self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') => {
                    self.pos += 3;
                    self.line += 1;
                }
                Some(b'/') if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                Some(b'/') if self.peek(1) == Some(b'/') => {
                    self.skip_line();
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.pos;
        let line = self.line;
        let b = self.bytes[start];

        let kind = if b == b'_' || b.is_ascii_alphabetic() {
            // String and char literal prefixes (L"", u8"", U'')
            let ident_end = self.scan_while(start, |c| c == b'_' || c.is_ascii_alphanumeric());
            let prefix = &self.src[start..ident_end];
            let next = self.bytes.get(ident_end).copied();
            match next {
                Some(q @ (b'"' | b'\'')) if matches!(prefix, "L" | "u" | "U" | "u8") => {
                    self.pos = ident_end;
                    self.scan_quoted(q, start)?
                }
                _ => {
                    self.pos = ident_end;
                    TokenKind::Ident
                }
            }
        } else if b.is_ascii_digit() || (b == b'.' && self.peek(1).is_some_and(|c| c.is_ascii_digit())) {
            self.pos = self.scan_number(start);
            TokenKind::Number
        } else if b == b'"' || b == b'\'' {
            self.scan_quoted(b, start)?
        } else if self.src[start..].starts_with("...") {
            self.pos += 3;
            TokenKind::Ellipsis
        } else {
            let c = self.src[start..].chars().next().unwrap_or('\0');
            self.pos += c.len_utf8().max(1);
            TokenKind::Punct(c)
        };

        Ok(Token {
            kind,
            text: &self.src[start..self.pos],
            offset: start,
            line,
        })
    }

    fn scan_while(&self, from: usize, pred: impl Fn(u8) -> bool) -> usize {
        let mut end = from;
        while end < self.bytes.len() && pred(self.bytes[end]) {
            end += 1;
        }
        end
    }

    fn scan_number(&self, from: usize) -> usize {
        let mut end = from;
        while end < self.bytes.len() {
            let c = self.bytes[end];
            let exponent_sign = (c == b'+' || c == b'-')
                && end > from
                && matches!(self.bytes[end - 1], b'e' | b'E' | b'p' | b'P');
            if c.is_ascii_alphanumeric() || c == b'.' || c == b'_' || c == b'\'' || exponent_sign {
                end += 1;
            } else {
                break;
            }
        }
        end
    }

    /// Scan a string or character literal starting at the quote at `self.pos`.
    fn scan_quoted(&mut self, quote: u8, start: usize) -> Result<TokenKind, LexError> {
        self.pos += 1;

        loop {
            match self.peek(0) {
                None | Some(b'\n') => {
                    let what = if quote == b'"' { "string" } else { "character" };
                    return Err(LexError {
                        message: format!("unterminated {} literal", what),
                        offset: start,
                        len: self.pos - start,
                    });
                }
                Some(b'\\') => {
                    if self.peek(1) == Some(b'\n') {
                        self.line += 1;
                    }
                    self.pos += 2;
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }

        Ok(if quote == b'"' {
            TokenKind::Str
        } else {
            TokenKind::Char
        })
    }
}
