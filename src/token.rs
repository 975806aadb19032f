use std::fmt;

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

/// Token kinds produced by the lexer.
///
/// The set is closed: every landmark the weaver looks for has its own
/// variant and everything else collapses into [`TokenKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `<?php`, `<?=` or `<?` including trailing whitespace.
    OpenTag,
    /// `?>`.
    CloseTag,
    /// Text outside of PHP tags.
    InlineHtml,
    /// Run of spaces, tabs and line breaks.
    Whitespace,
    /// `// ...`, `# ...` or `/* ... */`.
    Comment,
    /// `/** ... */`.
    DocComment,
    /// `class` keyword.
    Class,
    /// `interface` keyword.
    Interface,
    /// `trait` keyword.
    Trait,
    /// `function` keyword.
    Function,
    /// `public` keyword.
    Public,
    /// `protected` keyword.
    Protected,
    /// `private` keyword.
    Private,
    /// `static` keyword.
    Static,
    /// `final` keyword.
    Final,
    /// `abstract` keyword.
    Abstract,
    /// Bare name (identifier or non-landmark keyword).
    Identifier,
    /// `$name`.
    Variable,
    /// `__METHOD__`.
    MethodConst,
    /// `__FUNCTION__`.
    FunctionConst,
    /// `__CLASS__`.
    ClassConst,
    /// Quoted, backtick, heredoc or nowdoc string.
    StringLiteral,
    /// Integer or float literal.
    Number,
    /// `{`.
    OpenBrace,
    /// `}`.
    CloseBrace,
    /// `(`.
    OpenParen,
    /// `)`.
    CloseParen,
    /// `;`.
    Semicolon,
    /// `::`.
    DoubleColon,
    /// `->` or `?->`.
    Arrow,
    /// Any other operator or punctuation.
    Other,
}

impl TokenKind {
    /// Visibility modifiers.
    pub const VISIBILITY: [Self; 3] = [Self::Public, Self::Protected, Self::Private];

    /// Statement and block boundaries that end a backwards modifier scan.
    pub const BOUNDARIES: [Self; 3] = [Self::Semicolon, Self::OpenBrace, Self::CloseBrace];

    /// Returns the counterpart of a bracket kind, or `None` for
    /// non-bracket kinds.
    #[must_use]
    pub const fn matching_bracket(self) -> Option<Self> {
        match self {
            Self::OpenBrace => Some(Self::CloseBrace),
            Self::CloseBrace => Some(Self::OpenBrace),
            Self::OpenParen => Some(Self::CloseParen),
            Self::CloseParen => Some(Self::OpenParen),
            _ => None,
        }
    }

    /// True for `{` and `(`.
    #[must_use]
    pub const fn is_opening_bracket(self) -> bool {
        matches!(self, Self::OpenBrace | Self::OpenParen)
    }

    /// Maps a bare word to its keyword kind. Keywords and magic
    /// constants are both case-insensitive.
    #[must_use]
    pub fn from_word(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "class" => Self::Class,
            "interface" => Self::Interface,
            "trait" => Self::Trait,
            "function" => Self::Function,
            "public" => Self::Public,
            "protected" => Self::Protected,
            "private" => Self::Private,
            "static" => Self::Static,
            "final" => Self::Final,
            "abstract" => Self::Abstract,
            "__method__" => Self::MethodConst,
            "__function__" => Self::FunctionConst,
            "__class__" => Self::ClassConst,
            _ => Self::Identifier,
        }
    }
}

/// Method visibility, ordered from least to most restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    #[must_use]
    pub const fn from_kind(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Public => Some(Self::Public),
            TokenKind::Protected => Some(Self::Protected),
            TokenKind::Private => Some(Self::Private),
            _ => None,
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }

    /// The more restricted of `self` and `other`.
    #[must_use]
    pub fn tighten(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single token with its kind, exact source text, and starting line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    /// True if this token is one of `{ } ( )`.
    #[must_use]
    pub const fn is_bracket(&self) -> bool {
        self.kind.matching_bracket().is_some()
    }

    /// Number of line breaks contained in the token text.
    #[must_use]
    pub fn line_breaks(&self) -> usize {
        self.text.matches('\n').count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(TokenKind::from_word("Function"), TokenKind::Function);
        assert_eq!(TokenKind::from_word("PUBLIC"), TokenKind::Public);
        assert_eq!(TokenKind::from_word("__method__"), TokenKind::MethodConst);
        assert_eq!(TokenKind::from_word("strlen"), TokenKind::Identifier);
    }

    #[test]
    fn bracket_pairs() {
        assert_eq!(
            TokenKind::OpenBrace.matching_bracket(),
            Some(TokenKind::CloseBrace)
        );
        assert_eq!(
            TokenKind::CloseParen.matching_bracket(),
            Some(TokenKind::OpenParen)
        );
        assert_eq!(TokenKind::Semicolon.matching_bracket(), None);
        assert!(TokenKind::OpenParen.is_opening_bracket());
        assert!(!TokenKind::CloseBrace.is_opening_bracket());
    }

    #[test]
    fn visibility_tightening() {
        assert_eq!(
            Visibility::Public.tighten(Visibility::Private),
            Visibility::Private
        );
        assert_eq!(
            Visibility::Private.tighten(Visibility::Protected),
            Visibility::Private
        );
        assert_eq!(
            Visibility::from_kind(TokenKind::Protected),
            Some(Visibility::Protected)
        );
        assert_eq!(Visibility::from_kind(TokenKind::Static), None);
    }

    #[test]
    fn counts_line_breaks() {
        let token = Token::new(TokenKind::Whitespace, "\n    \n", 3);
        assert_eq!(token.line_breaks(), 2);
        assert!(!token.is_bracket());
    }
}
