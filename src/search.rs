//! Directional, bounded search over a [`TokenSequence`].
//!
//! Searches report a miss as `Ok(None)` and reserve `Err` for invalid
//! queries, so a caller can tell "not found" from "asked wrongly".

use crate::sequence::{SequenceError, TokenSequence};
use crate::token::TokenKind;

/// Something a token kind can be matched against: a single kind or a
/// set of kinds.
pub trait Target {
    fn matches(&self, kind: TokenKind) -> bool;
}

impl Target for TokenKind {
    fn matches(&self, kind: TokenKind) -> bool {
        *self == kind
    }
}

impl Target for [TokenKind] {
    fn matches(&self, kind: TokenKind) -> bool {
        self.contains(&kind)
    }
}

impl<const N: usize> Target for [TokenKind; N] {
    fn matches(&self, kind: TokenKind) -> bool {
        self.contains(&kind)
    }
}

impl<T: Target + ?Sized> Target for &T {
    fn matches(&self, kind: TokenKind) -> bool {
        (**self).matches(kind)
    }
}

/// Positions from `start` to `end` inclusive, descending when
/// `start > end`.
#[derive(Debug, Clone)]
struct Scan {
    next: Option<usize>,
    end: usize,
}

impl Scan {
    const fn new(start: usize, end: usize) -> Self {
        Self {
            next: Some(start),
            end,
        }
    }
}

impl Iterator for Scan {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = match current.cmp(&self.end) {
            std::cmp::Ordering::Less => Some(current + 1),
            std::cmp::Ordering::Greater => Some(current - 1),
            std::cmp::Ordering::Equal => None,
        };
        Some(current)
    }
}

impl TokenSequence {
    fn check_position(&self, position: usize, what: &str) -> Result<(), SequenceError> {
        if position < self.len() {
            Ok(())
        } else {
            Err(SequenceError::InvalidArgument(format!(
                "{what} position {position} is outside of [0, {})",
                self.len()
            )))
        }
    }

    /// Returns the first position between `start` and `end` (both
    /// inclusive, scanned downwards if `start > end`) whose token
    /// matches `target`.
    ///
    /// A token matching `stop` aborts the search with `None`. The
    /// target is checked first, so a position matching both counts as
    /// a hit.
    pub fn find_between(
        &self,
        target: impl Target,
        start: usize,
        end: usize,
        stop: &[TokenKind],
    ) -> Result<Option<usize>, SequenceError> {
        self.check_position(start, "start")?;
        self.check_position(end, "end")?;

        for position in Scan::new(start, end) {
            let kind = self[position].kind;
            if target.matches(kind) {
                return Ok(Some(position));
            }
            if stop.contains(&kind) {
                return Ok(None);
            }
        }
        Ok(None)
    }

    /// Every matching position between `start` and `end` in scan order,
    /// up to the first stop token.
    pub fn find_all_between(
        &self,
        target: impl Target,
        start: usize,
        end: usize,
        stop: &[TokenKind],
    ) -> Result<Vec<usize>, SequenceError> {
        self.check_position(start, "start")?;
        self.check_position(end, "end")?;

        let mut found = Vec::new();
        for position in Scan::new(start, end) {
            let kind = self[position].kind;
            if target.matches(kind) {
                found.push(position);
            } else if stop.contains(&kind) {
                break;
            }
        }
        Ok(found)
    }

    /// Searches forward from the position after `from`.
    pub fn find_next(
        &self,
        target: impl Target,
        from: usize,
        stop: &[TokenKind],
    ) -> Result<Option<usize>, SequenceError> {
        self.check_position(from, "offset")?;
        if from + 1 >= self.len() {
            return Ok(None);
        }
        self.find_between(target, from + 1, self.len() - 1, stop)
    }

    /// Searches backward from the position before `from`.
    pub fn find_previous(
        &self,
        target: impl Target,
        from: usize,
        stop: &[TokenKind],
    ) -> Result<Option<usize>, SequenceError> {
        self.check_position(from, "offset")?;
        if from == 0 {
            return Ok(None);
        }
        self.find_between(target, from - 1, 0, stop)
    }

    /// Returns the position of the bracket that structurally matches the
    /// one at `position`. Opening brackets are matched forward, closing
    /// brackets backward; only brackets of the same kind count towards
    /// nesting.
    pub fn find_matching_brace(&self, position: usize) -> Result<usize, SequenceError> {
        let token = self.get(position).ok_or_else(|| {
            SequenceError::InvalidArgument(format!(
                "bracket position {position} is outside of [0, {})",
                self.len()
            ))
        })?;
        let own = token.kind;
        let Some(partner) = own.matching_bracket() else {
            return Err(SequenceError::InvalidArgument(format!(
                "token '{}' at position {position} is not a bracket",
                token.text
            )));
        };

        let scan = if own.is_opening_bracket() {
            Scan::new(position, self.len() - 1)
        } else {
            Scan::new(position, 0)
        };

        let mut depth = 0usize;
        for candidate in scan {
            let kind = self[candidate].kind;
            if kind == own {
                depth += 1;
            } else if kind == partner {
                depth -= 1;
                if depth == 0 {
                    return Ok(candidate);
                }
            }
        }

        Err(SequenceError::MalformedInput {
            position,
            line: token.line,
            text: token.text.clone(),
        })
    }
}
