//! Immutable, indexable view over a lexed source unit.
//!
//! Positions handed out by the sequence stay valid for its whole
//! lifetime: there is no way to mutate a token after construction, so
//! edits are planned against positions and applied by
//! [`TokenEditor`](crate::editor::TokenEditor).

use std::fmt;
use std::ops::Index;
use std::slice;

use crate::lexer::{LexError, tokenize};
use crate::token::Token;

/// Error raised by token access and search operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// Position outside `[0, len)`.
    #[error("token position {index} is out of range (sequence has {len} tokens)")]
    OutOfRange { index: usize, len: usize },
    /// Malformed search range or bracket query.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A bracket has no structural counterpart.
    #[error("no matching bracket for '{text}' at line {line}")]
    MalformedInput {
        position: usize,
        line: usize,
        text: String,
    },
}

/// An ordered, read-only list of tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenSequence {
    tokens: Vec<Token>,
}

impl TokenSequence {
    #[must_use]
    pub const fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Tokenize `source` and wrap the result.
    pub fn parse(source: &str) -> Result<Self, LexError> {
        Ok(Self::new(tokenize(source)?))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Checked access to the token at `index`.
    pub fn at(&self, index: usize) -> Result<&Token, SequenceError> {
        self.tokens.get(index).ok_or(SequenceError::OutOfRange {
            index,
            len: self.tokens.len(),
        })
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    /// Concatenated text of the tokens in `start..=end`.
    pub fn text_between(&self, start: usize, end: usize) -> Result<String, SequenceError> {
        self.at(start)?;
        self.at(end)?;
        if start > end {
            return Err(SequenceError::InvalidArgument(format!(
                "text range start {start} is after end {end}"
            )));
        }
        Ok(self.tokens[start..=end]
            .iter()
            .map(|t| t.text.as_str())
            .collect())
    }
}

impl From<Vec<Token>> for TokenSequence {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

impl Index<usize> for TokenSequence {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenSequence {
    type Item = &'a Token;
    type IntoIter = slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl fmt::Display for TokenSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            f.write_str(&token.text)?;
        }
        Ok(())
    }
}
