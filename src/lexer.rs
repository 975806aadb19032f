use std::fmt;

use crate::token::{Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Unterminated single-, double- or backtick-quoted string.
    UnterminatedString,
    /// Unterminated `/* ... */` or `/** ... */` comment.
    UnterminatedComment,
    /// Heredoc or nowdoc whose closing label never appears.
    UnterminatedHeredoc { label: String },
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => {
                write!(f, "unterminated string literal")
            }
            Self::UnterminatedComment => {
                write!(f, "unterminated comment")
            }
            Self::UnterminatedHeredoc { label } => {
                write!(
                    f,
                    "unterminated heredoc, \
                     expected closing label: {label}"
                )
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize a PHP source unit into a lossless sequence of tokens.
///
/// Concatenating the text of the returned tokens reproduces `input`
/// byte for byte.
///
/// # Errors
///
/// Returns `LexError` on unterminated strings, comments or heredocs.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}

struct Lexer<'a> {
    src: &'a str,
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    in_php: bool,
    // Set after `::` and `->`, where keywords are plain member names.
    after_member_access: bool,
}

impl<'a> Lexer<'a> {
    const fn new(input: &'a str) -> Self {
        Self {
            src: input,
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            in_php: false,
            after_member_access: false,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while self.pos < self.input.len() {
            let token = if self.in_php {
                self.read_php_token()?
            } else {
                self.read_inline()
            };

            match token.kind {
                TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment => {}
                TokenKind::DoubleColon | TokenKind::Arrow => self.after_member_access = true,
                _ => self.after_member_access = false,
            }
            tokens.push(token);
        }

        Ok(tokens)
    }

    const fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.col,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix.as_bytes())
    }

    fn starts_with_ignore_case(&self, prefix: &str) -> bool {
        self.input
            .get(self.pos..self.pos + prefix.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(prefix.as_bytes()))
    }

    /// Consume input up to byte offset `end` and turn it into a token
    /// that starts at the current line.
    fn take_until(&mut self, kind: TokenKind, end: usize) -> Token {
        let start = self.pos;
        let line = self.line;
        for &b in &self.input[start..end] {
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.pos = end;
        Token::new(kind, &self.src[start..end], line)
    }

    fn take(&mut self, kind: TokenKind, len: usize) -> Token {
        self.take_until(kind, self.pos + len)
    }

    fn read_inline(&mut self) -> Token {
        let rest = &self.input[self.pos..];
        match find_bytes(rest, b"<?") {
            Some(0) => self.read_open_tag(),
            Some(offset) => self.take(TokenKind::InlineHtml, offset),
            None => self.take_until(TokenKind::InlineHtml, self.input.len()),
        }
    }

    fn read_open_tag(&mut self) -> Token {
        self.in_php = true;
        if self.starts_with_ignore_case("<?php") {
            // The long tag swallows exactly one following whitespace
            // character, a CRLF pair counting as one.
            let mut len = 5;
            match self.peek_at(5) {
                Some(b'\r') if self.peek_at(6) == Some(b'\n') => len += 2,
                Some(b' ' | b'\t' | b'\n' | b'\r') => len += 1,
                _ => {}
            }
            return self.take(TokenKind::OpenTag, len);
        }
        if self.starts_with("<?=") {
            return self.take(TokenKind::OpenTag, 3);
        }
        self.take(TokenKind::OpenTag, 2)
    }

    fn read_php_token(&mut self) -> Result<Token, LexError> {
        let ch = self.input[self.pos];

        let token = match ch {
            b' ' | b'\t' | b'\n' | b'\r' => {
                let len = self.input[self.pos..]
                    .iter()
                    .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
                    .count();
                self.take(TokenKind::Whitespace, len)
            }
            b'?' if self.peek_at(1) == Some(b'>') => {
                self.in_php = false;
                // A single newline directly after `?>` belongs to the tag.
                let len = match self.peek_at(2) {
                    Some(b'\n') => 3,
                    Some(b'\r') if self.peek_at(3) == Some(b'\n') => 4,
                    _ => 2,
                };
                self.take(TokenKind::CloseTag, len)
            }
            b'?' if self.starts_with("?->") => self.take(TokenKind::Arrow, 3),
            b'#' if self.peek_at(1) == Some(b'[') => self.take(TokenKind::Other, 2),
            b'#' => self.read_line_comment(),
            b'/' if self.peek_at(1) == Some(b'/') => self.read_line_comment(),
            b'/' if self.peek_at(1) == Some(b'*') => self.read_block_comment()?,
            b'\'' => self.read_quoted(b'\'')?,
            b'"' => self.read_quoted(b'"')?,
            b'`' => self.read_quoted(b'`')?,
            b'<' if self.starts_with("<<<") => self.read_heredoc()?,
            b'$' if self.peek_at(1).is_some_and(is_ident_start) => {
                let len = 1 + self.ident_len(self.pos + 1);
                self.take(TokenKind::Variable, len)
            }
            b'{' => self.take(TokenKind::OpenBrace, 1),
            b'}' => self.take(TokenKind::CloseBrace, 1),
            b'(' => self.take(TokenKind::OpenParen, 1),
            b')' => self.take(TokenKind::CloseParen, 1),
            b';' => self.take(TokenKind::Semicolon, 1),
            b':' if self.peek_at(1) == Some(b':') => self.take(TokenKind::DoubleColon, 2),
            b'-' if self.peek_at(1) == Some(b'>') => self.take(TokenKind::Arrow, 2),
            b'0'..=b'9' => self.read_number(),
            c if is_ident_start(c) => {
                let len = self.ident_len(self.pos);
                let word = &self.src[self.pos..self.pos + len];
                let kind = if self.after_member_access {
                    TokenKind::Identifier
                } else {
                    TokenKind::from_word(word)
                };
                self.take(kind, len)
            }
            _ => {
                let len = self.src[self.pos..].chars().next().map_or(1, char::len_utf8);
                self.take(TokenKind::Other, len)
            }
        };

        Ok(token)
    }

    fn ident_len(&self, from: usize) -> usize {
        self.input[from..]
            .iter()
            .take_while(|&&b| is_ident_continue(b))
            .count()
    }

    fn read_number(&mut self) -> Token {
        let mut end = self.pos;
        while end < self.input.len() {
            let b = self.input[end];
            let fraction = b == b'.'
                && self
                    .input
                    .get(end + 1)
                    .is_some_and(u8::is_ascii_digit);
            if b.is_ascii_alphanumeric() || b == b'_' || fraction {
                end += 1;
            } else {
                break;
            }
        }
        self.take_until(TokenKind::Number, end)
    }

    fn read_line_comment(&mut self) -> Token {
        let mut end = self.pos;
        while end < self.input.len() {
            match self.input[end] {
                b'\n' | b'\r' => break,
                b'?' if self.input.get(end + 1) == Some(&b'>') => break,
                _ => end += 1,
            }
        }
        self.take_until(TokenKind::Comment, end)
    }

    fn read_block_comment(&mut self) -> Result<Token, LexError> {
        let span = self.span();
        let is_doc = self.starts_with("/**")
            && self
                .peek_at(3)
                .is_some_and(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));

        let body = &self.input[self.pos + 2..];
        let Some(close) = find_bytes(body, b"*/") else {
            return Err(LexError {
                kind: LexErrorKind::UnterminatedComment,
                span,
            });
        };

        let kind = if is_doc {
            TokenKind::DocComment
        } else {
            TokenKind::Comment
        };
        Ok(self.take(kind, 2 + close + 2))
    }

    fn read_quoted(&mut self, quote: u8) -> Result<Token, LexError> {
        let span = self.span();
        let mut end = self.pos + 1;
        // Depth of `{$ ... }` interpolation inside double-quoted strings.
        let mut interpolation = 0usize;

        while end < self.input.len() {
            let b = self.input[end];
            match b {
                b'\\' => end += 2,
                b'{' if quote != b'\'' && self.input.get(end + 1) == Some(&b'$') => {
                    interpolation += 1;
                    end += 2;
                }
                b'{' if interpolation > 0 => {
                    interpolation += 1;
                    end += 1;
                }
                b'}' if interpolation > 0 => {
                    interpolation -= 1;
                    end += 1;
                }
                b'\'' | b'"' if interpolation > 0 => {
                    end = skip_simple_string(self.input, end);
                }
                _ if b == quote => {
                    return Ok(self.take_until(TokenKind::StringLiteral, end + 1));
                }
                _ => end += 1,
            }
        }

        Err(LexError {
            kind: LexErrorKind::UnterminatedString,
            span,
        })
    }

    fn read_heredoc(&mut self) -> Result<Token, LexError> {
        let span = self.span();
        let mut cursor = self.pos + 3;
        while matches!(self.input.get(cursor), Some(b' ' | b'\t')) {
            cursor += 1;
        }

        let quote = match self.input.get(cursor) {
            Some(&q @ (b'\'' | b'"')) => {
                cursor += 1;
                Some(q)
            }
            _ => None,
        };

        let label_start = cursor;
        let label_len = if self.input.get(cursor).copied().is_some_and(is_ident_start) {
            self.ident_len(cursor)
        } else {
            0
        };
        if label_len == 0 {
            // `<<<` without a label is just a run of operators.
            return Ok(self.take(TokenKind::Other, 3));
        }
        let label = self.src[label_start..label_start + label_len].to_string();
        cursor += label_len;

        if let Some(q) = quote {
            if self.input.get(cursor) != Some(&q) {
                return Ok(self.take(TokenKind::Other, 3));
            }
            cursor += 1;
        }

        // The opening line must end right after the label.
        match self.input.get(cursor) {
            Some(b'\n') => cursor += 1,
            Some(b'\r') if self.input.get(cursor + 1) == Some(&b'\n') => cursor += 2,
            _ => return Ok(self.take(TokenKind::Other, 3)),
        }

        // Scan line by line for the closing label, which may be indented
        // and must not be followed by another identifier character.
        while cursor <= self.input.len() {
            let line_end = self.input[cursor..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(self.input.len(), |p| cursor + p);

            let mut start = cursor;
            while matches!(self.input.get(start), Some(b' ' | b'\t')) {
                start += 1;
            }
            let candidate_end = start + label.len();
            if self.input.get(start..candidate_end) == Some(label.as_bytes())
                && !self
                    .input
                    .get(candidate_end)
                    .copied()
                    .is_some_and(is_ident_continue)
            {
                return Ok(self.take_until(TokenKind::StringLiteral, candidate_end));
            }

            if line_end >= self.input.len() {
                break;
            }
            cursor = line_end + 1;
        }

        Err(LexError {
            kind: LexErrorKind::UnterminatedHeredoc { label },
            span,
        })
    }
}

const fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

const fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Skip a quoted string nested inside an interpolation and return the
/// offset just past its closing quote (or the end of input).
fn skip_simple_string(input: &[u8], start: usize) -> usize {
    let quote = input[start];
    let mut end = start + 1;
    while end < input.len() {
        match input[end] {
            b'\\' => end += 2,
            b if b == quote => return end + 1,
            _ => end += 1,
        }
    }
    input.len()
}
