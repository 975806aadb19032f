//! Token sequence access and search tests on real source.

mod common;

use aspect_weaver::{SequenceError, TokenKind};
use common::{MODIFIERS_FIXTURE, sequence};

// -----------------------------------------------------------
// Access.
// -----------------------------------------------------------

#[test]
fn sequence_round_trips_source() {
    let seq = sequence(MODIFIERS_FIXTURE);
    assert_eq!(seq.to_string(), MODIFIERS_FIXTURE);
}

#[test]
fn sequence_indices_are_contiguous() {
    let seq = sequence("<?php $a = 1;");
    assert!(seq.at(seq.len() - 1).is_ok());
    assert_eq!(
        seq.at(seq.len()),
        Err(SequenceError::OutOfRange {
            index: seq.len(),
            len: seq.len()
        })
    );
}

// -----------------------------------------------------------
// Search.
// -----------------------------------------------------------

#[test]
fn find_between_scans_in_both_directions() {
    let seq = sequence("<?php a(); b(); c();");
    let last = seq.len() - 1;
    let first = seq
        .find_between(TokenKind::Identifier, 0, last, &[])
        .expect("search")
        .expect("hit");
    let final_ident = seq
        .find_between(TokenKind::Identifier, last, 0, &[])
        .expect("search")
        .expect("hit");
    assert_eq!(seq[first].text, "a");
    assert_eq!(seq[final_ident].text, "c");
}

#[test]
fn find_between_stop_set_short_circuits() {
    let seq = sequence("<?php a; b");
    let last = seq.len() - 1;
    let b = seq
        .find_between(TokenKind::Identifier, last, 0, &[])
        .expect("search")
        .expect("b");
    // Scanning on from just after `a`, the `;` comes before `b`.
    let after_a = seq
        .find_next(TokenKind::Identifier, 0, &[])
        .expect("search")
        .expect("a");
    assert_eq!(
        seq.find_next(TokenKind::Identifier, after_a, &[TokenKind::Semicolon]),
        Ok(None)
    );
    assert_eq!(
        seq.find_next(TokenKind::Identifier, after_a, &[]),
        Ok(Some(b))
    );
}

#[test]
fn find_between_rejects_positions_outside_sequence() {
    let seq = sequence("<?php a;");
    assert!(matches!(
        seq.find_between(TokenKind::Identifier, 0, seq.len(), &[]),
        Err(SequenceError::InvalidArgument(_))
    ));
    assert!(matches!(
        seq.find_next(TokenKind::Identifier, seq.len(), &[]),
        Err(SequenceError::InvalidArgument(_))
    ));
}

#[test]
fn find_previous_finds_visibility_of_method() {
    let seq = sequence("<?php class A { protected static function b() {} }");
    let function = seq
        .find_between(TokenKind::Function, 0, seq.len() - 1, &[])
        .expect("search")
        .expect("function");
    let visibility = seq
        .find_previous(TokenKind::VISIBILITY, function, &TokenKind::BOUNDARIES)
        .expect("search")
        .expect("visibility");
    assert_eq!(seq[visibility].kind, TokenKind::Protected);
}

#[test]
fn find_all_between_collects_in_scan_order() {
    let seq = sequence("<?php class A { function a() {} function b() {} }");
    let last = seq.len() - 1;
    let forward = seq
        .find_all_between(TokenKind::Function, 0, last, &[])
        .expect("search");
    let mut backward = seq
        .find_all_between(TokenKind::Function, last, 0, &[])
        .expect("search");
    assert_eq!(forward.len(), 2);
    backward.reverse();
    assert_eq!(forward, backward);
}

// -----------------------------------------------------------
// Brace matching.
// -----------------------------------------------------------

#[test]
fn matching_brace_is_its_own_inverse() {
    let seq = sequence(MODIFIERS_FIXTURE);
    for (position, token) in seq.iter().enumerate() {
        if token.is_bracket() {
            let partner = seq.find_matching_brace(position).expect("balanced");
            assert_eq!(seq.find_matching_brace(partner), Ok(position));
        }
    }
}

#[test]
fn matching_brace_of_class_body_is_last_brace() {
    let seq = sequence("<?php class A { function a() { if (1) { } } }");
    let open = seq
        .find_next(TokenKind::OpenBrace, 0, &[])
        .expect("search")
        .expect("brace");
    let close = seq.find_matching_brace(open).expect("balanced");
    assert_eq!(close, seq.len() - 1);
}

#[test]
fn matching_brace_on_non_bracket_is_invalid() {
    let seq = sequence("<?php a;");
    assert!(matches!(
        seq.find_matching_brace(1),
        Err(SequenceError::InvalidArgument(_))
    ));
}

#[test]
fn unbalanced_brace_is_malformed() {
    let seq = sequence("<?php\nclass A {\n");
    let open = seq
        .find_next(TokenKind::OpenBrace, 0, &[])
        .expect("search")
        .expect("brace");
    assert!(matches!(
        seq.find_matching_brace(open),
        Err(SequenceError::MalformedInput { line: 2, .. })
    ));
}
