#![allow(dead_code)]

use aspect_weaver::{Token, TokenKind, TokenSequence, tokenize};

/// A class whose method throws from a known line.
pub const LINE_NUMBER_FIXTURE: &str = "<?php

/**
 * Checks that weaving keeps line numbers.
 */
class Fixture_LineNumber {

    /**
     * Throws from line 13.
     */
    public function lineNumber()
    {
        throw new RuntimeException('This exception was thrown in line 13.');
    }

}

?>
";

/// A class with every modifier combination the weaver handles.
pub const MODIFIERS_FIXTURE: &str = "<?php
class Fixture_Modifiers
{
    public function publicMethod($a, $b = 2)
    {
        return $a + $b;
    }

    protected function protectedMethod()
    {
        return __METHOD__;
    }

    private function privateMethod()
    {
        return __FUNCTION__;
    }

    public static function staticMethod()
    {
        return new static();
    }

    final public function finalMethod()
    {
        return function () {
            return __FUNCTION__;
        };
    }

    function implicitMethod()
    {
        return 1;
    }
}
";

pub fn sequence(source: &str) -> TokenSequence {
    TokenSequence::parse(source).expect("tokenize failed")
}

/// Tokens of `source` without whitespace and comments.
pub fn significant(source: &str) -> Vec<Token> {
    tokenize(source)
        .expect("tokenize failed")
        .into_iter()
        .filter(|t| {
            !matches!(
                t.kind,
                TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
            )
        })
        .collect()
}

/// 1-based line of the first line containing `needle`.
pub fn line_of(source: &str, needle: &str) -> Option<usize> {
    source
        .lines()
        .position(|line| line.contains(needle))
        .map(|index| index + 1)
}

/// Modifier keywords of the first declaration named `name` in `source`,
/// read back to the previous statement boundary.
pub fn modifiers_of(source: &str, name: &str) -> Vec<TokenKind> {
    let tokens = significant(source);
    let Some(position) = tokens
        .iter()
        .position(|t| t.kind == TokenKind::Identifier && t.text == name)
    else {
        return Vec::new();
    };
    let start = tokens[..position]
        .iter()
        .rposition(|t| TokenKind::BOUNDARIES.contains(&t.kind))
        .map_or(0, |p| p + 1);
    tokens[start..position]
        .iter()
        .map(|t| t.kind)
        .filter(|k| {
            matches!(
                k,
                TokenKind::Public
                    | TokenKind::Protected
                    | TokenKind::Private
                    | TokenKind::Static
                    | TokenKind::Final
                    | TokenKind::Abstract
            )
        })
        .collect()
}
