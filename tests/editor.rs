//! Staged editor tests: edits refer to original positions and are only
//! applied on commit.

mod common;

use aspect_weaver::{Edit, EditError, TokenEditor, TokenKind};
use common::sequence;
use pretty_assertions::assert_eq;

fn position_of(editor: &TokenEditor, kind: TokenKind, text: &str) -> usize {
    editor
        .tokens()
        .iter()
        .position(|t| t.kind == kind && t.text == text)
        .expect("token present")
}

#[test]
fn edits_keep_original_positions_valid() {
    let source = "<?php\nclass A {\n    function run() { return 1; }\n}\n";
    let mut editor = TokenEditor::new(sequence(source));
    let class_close = editor.tokens().len() - 2;
    let function = position_of(&editor, TokenKind::Function, "function");
    let name = position_of(&editor, TokenKind::Identifier, "run");

    // Inserting text in front of the function does not shift `name`.
    editor.insert_before(function, "private ").expect("insert");
    editor.rename(name, "_run").expect("rename");
    editor.insert_before(class_close, "    // end\n").expect("insert");
    editor.commit().expect("commit");

    assert_eq!(
        editor.source().expect("committed"),
        "<?php\nclass A {\n    private function _run() { return 1; }\n    // end\n}\n"
    );
}

#[test]
fn edit_log_is_kept_in_registration_order() {
    let mut editor = TokenEditor::new(sequence("<?php a;"));
    editor.replace(1, "b").expect("replace");
    editor.insert_before(0, "#!/usr/bin/env php\n").expect("insert");
    assert_eq!(
        editor.edits(),
        [
            Edit::Replace {
                position: 1,
                text: "b".to_string()
            },
            Edit::InsertBefore {
                position: 0,
                text: "#!/usr/bin/env php\n".to_string()
            },
        ]
    );
    assert_eq!(editor.pending(), 2);
    assert!(!editor.is_committed());
}

#[test]
fn into_source_requires_commit() {
    let editor = TokenEditor::new(sequence("<?php"));
    assert!(matches!(
        editor.into_source(),
        Err(EditError::IllegalState(_))
    ));
}

#[test]
fn replacing_multiple_positions_with_one_edit_each() {
    let source = "<?php\nfunction f() { return __METHOD__ . __METHOD__; }\n";
    let mut editor = TokenEditor::new(sequence(source));
    let positions = editor
        .tokens()
        .find_all_between(TokenKind::MethodConst, 0, editor.tokens().len() - 1, &[])
        .expect("search");
    assert_eq!(positions.len(), 2);
    editor.replace_all(&positions, "'f'").expect("replace");
    editor.commit().expect("commit");
    assert_eq!(
        editor.into_source().expect("committed"),
        "<?php\nfunction f() { return 'f' . 'f'; }\n"
    );
}
