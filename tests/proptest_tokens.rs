//! Property-based tests with proptest.
//!
//! Generate random class sources, then check that tokenizing is
//! lossless, that brace matching is symmetric and that weaving keeps
//! every original statement on its line.

use aspect_weaver::{HELPER_METHOD, TokenKind, TokenSequence, Weaver, tokenize, weave};
use proptest::prelude::*;

// -- Leaf strategies --

fn class_name() -> impl Strategy<Value = String> {
    "C[a-z]{0,8}".prop_map(|s| s)
}

/// Visibility and static keywords in front of `function`.
fn modifiers() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just(""),
            Just("public "),
            Just("protected "),
            Just("private "),
        ],
        prop::bool::ANY,
    )
        .prop_map(|(visibility, is_static)| {
            format!("{visibility}{}", if is_static { "static " } else { "" })
        })
}

/// A single statement. None of them touch name constants, so weaving
/// must leave them byte for byte unchanged.
fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        (0..1000_i64).prop_map(|n| format!("return $a + {n};")),
        "[a-z ]{0,20}".prop_map(|s| format!("echo 'say {s}';")),
        "[a-z]{1,10}".prop_map(|s| format!("throw new RuntimeException(\"{s}\");")),
        "[a-z]{1,8}".prop_map(|s| format!("${s} = array(1, 2);")),
        Just("if ($a) { $a = [$a]; }".to_string()),
        Just("// nothing".to_string()),
    ]
}

#[derive(Debug, Clone)]
struct Method {
    modifiers: String,
    statements: Vec<String>,
}

fn method() -> impl Strategy<Value = Method> {
    (modifiers(), prop::collection::vec(statement(), 0..=4)).prop_map(
        |(modifiers, statements)| Method {
            modifiers,
            statements,
        },
    )
}

fn class_source() -> impl Strategy<Value = (String, Vec<Method>)> {
    (class_name(), prop::collection::vec(method(), 0..=5))
}

fn render(class: &str, methods: &[Method]) -> String {
    let mut out = format!("<?php\nclass {class}\n{{\n");
    for (i, method) in methods.iter().enumerate() {
        out.push_str(&format!(
            "    {}function m{i}($a = null)\n    {{\n",
            method.modifiers
        ));
        for statement in &method.statements {
            out.push_str(&format!("        {statement}\n"));
        }
        out.push_str("    }\n\n");
    }
    out.push_str("}\n");
    out
}

// -- Properties --

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn tokenize_is_lossless((class, methods) in class_source()) {
        let source = render(&class, &methods);
        let tokens = tokenize(&source).expect("tokenize");
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        prop_assert_eq!(joined, source);
    }

    #[test]
    fn matching_brace_is_symmetric((class, methods) in class_source()) {
        let source = render(&class, &methods);
        let seq = TokenSequence::parse(&source).expect("tokenize");
        for (position, token) in seq.iter().enumerate() {
            if token.is_bracket() {
                let partner = seq.find_matching_brace(position).expect("balanced");
                prop_assert_ne!(partner, position);
                prop_assert_eq!(seq.find_matching_brace(partner), Ok(position));
            }
        }
    }

    #[test]
    fn weave_keeps_statement_lines((class, methods) in class_source()) {
        let source = render(&class, &methods);
        let woven = weave(&source).expect("weave");
        for (index, line) in source.lines().enumerate() {
            if line.starts_with("        ") {
                prop_assert_eq!(woven.lines().nth(index), Some(line));
            }
        }
    }

    #[test]
    fn weave_intercepts_every_method((class, methods) in class_source()) {
        let source = render(&class, &methods);
        let woven = weave(&source).expect("weave");
        let tokens = tokenize(&woven).expect("woven output tokenizes");
        let declared: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text.as_str())
            .collect();
        for i in 0..methods.len() {
            let name = format!("m{i}");
            let internal = format!("_aspectWeaverm{i}");
            prop_assert!(declared.contains(&name.as_str()));
            prop_assert!(declared.contains(&internal.as_str()));
        }
        let helper = format!("function {HELPER_METHOD}(");
        prop_assert_eq!(woven.matches(&helper).count(), 1);
    }

    #[test]
    fn analyze_reports_one_entry_per_method((class, methods) in class_source()) {
        let source = render(&class, &methods);
        let woven = Weaver::default().analyze(&source).expect("analyze");
        prop_assert_eq!(woven.len(), methods.len());
        for (report, method) in woven.iter().zip(&methods) {
            prop_assert_eq!(report.is_static, method.modifiers.contains("static"));
        }
    }
}
