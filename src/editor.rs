//! Staged, position-based editing of a token sequence.
//!
//! Edits are logged against *original* positions and only applied by
//! [`TokenEditor::commit`], which merges them in a single ordered pass.
//! Because nothing moves while edits are being planned, every position
//! found by a search stays valid until the commit.

use crate::search::Target;
use crate::sequence::{SequenceError, TokenSequence};
use crate::token::TokenKind;

/// Error produced by the staged editor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Operation not allowed in the editor's current state.
    #[error("illegal editor state: {0}")]
    IllegalState(&'static str),
    /// Edit targets a position outside of the sequence.
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// A single logged edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Emit `text` before the token at `position`.
    InsertBefore { position: usize, text: String },
    /// Emit `text` instead of the token at `position`.
    Replace { position: usize, text: String },
    /// Emit `text` as the new name of the identifier at `position`.
    Rename { position: usize, text: String },
}

impl Edit {
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::InsertBefore { position, .. }
            | Self::Replace { position, .. }
            | Self::Rename { position, .. } => *position,
        }
    }
}

/// Per-position merge state built at commit time.
#[derive(Debug, Default, Clone)]
struct Slot<'a> {
    inserts: Vec<&'a str>,
    replacement: Option<&'a str>,
}

/// Accumulates edits against a [`TokenSequence`] and applies them
/// atomically.
#[derive(Debug, Clone)]
pub struct TokenEditor {
    tokens: TokenSequence,
    log: Vec<Edit>,
    output: Option<String>,
}

impl TokenEditor {
    #[must_use]
    pub const fn new(tokens: TokenSequence) -> Self {
        Self {
            tokens,
            log: Vec::new(),
            output: None,
        }
    }

    /// The original, unedited tokens. All searches run against these.
    #[must_use]
    pub const fn tokens(&self) -> &TokenSequence {
        &self.tokens
    }

    /// Edits logged so far, in registration order.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.log
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.log.len()
    }

    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.output.is_some()
    }

    fn record(&mut self, edit: Edit) -> Result<(), EditError> {
        if self.is_committed() {
            return Err(EditError::IllegalState("cannot edit after commit"));
        }
        self.tokens.at(edit.position())?;
        self.log.push(edit);
        Ok(())
    }

    /// Queue `text` to be emitted before the token at `position`.
    /// Several insertions at the same position keep their order.
    pub fn insert_before(
        &mut self,
        position: usize,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        self.record(Edit::InsertBefore {
            position,
            text: text.into(),
        })
    }

    /// Queue replacement of the token at `position`. The last
    /// replacement or rename registered for a position wins.
    pub fn replace(&mut self, position: usize, text: impl Into<String>) -> Result<(), EditError> {
        self.record(Edit::Replace {
            position,
            text: text.into(),
        })
    }

    /// Queue the same replacement for every position in `positions`.
    pub fn replace_all(&mut self, positions: &[usize], text: &str) -> Result<(), EditError> {
        positions
            .iter()
            .try_for_each(|&position| self.replace(position, text))
    }

    /// Queue a rename of the identifier at `position`.
    pub fn rename(&mut self, position: usize, text: impl Into<String>) -> Result<(), EditError> {
        self.record(Edit::Rename {
            position,
            text: text.into(),
        })
    }

    /// Convenience for searches during planning.
    pub fn find_next(
        &self,
        target: impl Target,
        from: usize,
        stop: &[TokenKind],
    ) -> Result<Option<usize>, SequenceError> {
        self.tokens.find_next(target, from, stop)
    }

    /// Apply all logged edits and freeze the editor.
    pub fn commit(&mut self) -> Result<(), EditError> {
        if self.is_committed() {
            return Err(EditError::IllegalState("editor was already committed"));
        }

        let mut slots: Vec<Slot<'_>> = vec![Slot::default(); self.tokens.len()];
        for edit in &self.log {
            match edit {
                Edit::InsertBefore { position, text } => slots[*position].inserts.push(text),
                Edit::Replace { position, text } | Edit::Rename { position, text } => {
                    slots[*position].replacement = Some(text);
                }
            }
        }

        let mut out = String::new();
        for (token, slot) in self.tokens.iter().zip(&slots) {
            for insert in &slot.inserts {
                out.push_str(insert);
            }
            out.push_str(slot.replacement.unwrap_or(&token.text));
        }

        self.output = Some(out);
        Ok(())
    }

    /// The transformed source. Fails before [`commit`](Self::commit).
    pub fn source(&self) -> Result<&str, EditError> {
        self.output
            .as_deref()
            .ok_or(EditError::IllegalState("editor has not been committed"))
    }

    /// Consume the editor and return the transformed source.
    pub fn into_source(self) -> Result<String, EditError> {
        self.output
            .ok_or(EditError::IllegalState("editor has not been committed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(source: &str) -> TokenEditor {
        TokenEditor::new(TokenSequence::parse(source).expect("parse"))
    }

    #[test]
    fn commit_without_edits_returns_original() {
        let source = "<?php\nclass A {}\n";
        let mut ed = editor(source);
        ed.commit().expect("commit");
        assert_eq!(ed.source(), Ok(source));
    }

    #[test]
    fn inserts_accumulate_in_order() {
        let mut ed = editor("<?php a;");
        let a = ed
            .find_next(TokenKind::Identifier, 0, &[])
            .expect("search")
            .expect("identifier");
        ed.insert_before(a, "x").expect("insert");
        ed.insert_before(a, "y").expect("insert");
        ed.commit().expect("commit");
        assert_eq!(ed.source(), Ok("<?php xya;"));
    }

    #[test]
    fn last_replacement_wins() {
        let mut ed = editor("<?php a;");
        ed.replace(1, "b").expect("replace");
        ed.rename(1, "c").expect("rename");
        ed.commit().expect("commit");
        assert_eq!(ed.source(), Ok("<?php c;"));
    }

    #[test]
    fn insert_and_replace_on_same_position() {
        let mut ed = editor("<?php a;");
        ed.replace(1, "b").expect("replace");
        ed.insert_before(1, "private ").expect("insert");
        ed.commit().expect("commit");
        assert_eq!(ed.source(), Ok("<?php private b;"));
    }

    #[test]
    fn replace_all_hits_every_position() {
        let mut ed = editor("<?php a; a;");
        let positions = ed
            .tokens()
            .find_all_between(TokenKind::Identifier, 0, ed.tokens().len() - 1, &[])
            .expect("search");
        ed.replace_all(&positions, "z").expect("replace");
        ed.commit().expect("commit");
        assert_eq!(ed.source(), Ok("<?php z; z;"));
    }

    #[test]
    fn source_before_commit_is_illegal() {
        let ed = editor("<?php");
        assert!(matches!(ed.source(), Err(EditError::IllegalState(_))));
    }

    #[test]
    fn second_commit_is_illegal() {
        let mut ed = editor("<?php");
        ed.commit().expect("commit");
        assert!(matches!(ed.commit(), Err(EditError::IllegalState(_))));
    }

    #[test]
    fn edits_after_commit_are_illegal() {
        let mut ed = editor("<?php a;");
        ed.commit().expect("commit");
        assert!(matches!(
            ed.insert_before(0, "x"),
            Err(EditError::IllegalState(_))
        ));
    }

    #[test]
    fn out_of_range_edit_is_rejected() {
        let mut ed = editor("<?php");
        assert!(matches!(
            ed.replace(5, "x"),
            Err(EditError::Sequence(SequenceError::OutOfRange { index: 5, .. }))
        ));
        assert_eq!(ed.pending(), 0);
    }
}
