//! Method weaving: turns every method of a class into a forwarding stub
//! that routes calls through the join-point dispatcher.
//!
//! For each method with a body the weaver
//!
//! 1. renames the original to `<prefix><name>` and tightens its
//!    visibility,
//! 2. rewrites `__METHOD__` and `__FUNCTION__` in its body to literals of
//!    the original name,
//! 3. appends a stub with the original signature before the class'
//!    closing brace.
//!
//! All multi-line code is injected at the closing brace, and the
//! in-place edits never contain line breaks, so every line up to that
//! brace keeps its number. Code after the class moves down.

use std::sync::LazyLock;

use tracing::{debug, warn};

use crate::editor::{EditError, TokenEditor};
use crate::lexer::LexError;
use crate::sequence::{SequenceError, TokenSequence};
use crate::token::{TokenKind, Visibility};

/// Name of the per-class helper that forwards to the dispatcher.
pub const HELPER_METHOD: &str = "_aspectWeaverHandleCall";

/// Globally addressable dispatch routine called by the helper.
pub const DISPATCH_ROUTINE: &str = "AspectWeaver_JoinPointHandler::forwardToHandleCall";

/// Default prefix for renamed original methods.
pub const DEFAULT_PREFIX: &str = "_aspectWeaver";

static HELPER_BLOCK: LazyLock<String> = LazyLock::new(|| {
    format!(
        "
    /**
     * Forwards an intercepted call to the join point dispatcher.
     *
     * @param string $method Name of the called method.
     * @param string $compiledMethod Name of the renamed original.
     * @param object|string $context Instance or class name.
     * @param array $args Arguments of the call.
     * @return mixed
     */
    private static function {HELPER_METHOD}($method, $compiledMethod, $context, $args)
    {{
        return {DISPATCH_ROUTINE}($method, $compiledMethod, $context, $args);
    }}
"
    )
});

/// The dispatch helper injected into every woven class. Identical for
/// every class and built once per process.
#[must_use]
pub fn helper_block() -> &'static str {
    HELPER_BLOCK.as_str()
}

/// Error produced while weaving a source unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeaveError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Edit(#[from] EditError),
    /// Structure the weaver cannot handle, e.g. a class without body.
    #[error("{reason} at line {line}")]
    MalformedInput { line: usize, reason: String },
    #[error("invalid weaver configuration: {0}")]
    Config(String),
}

/// Weaver settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeaverConfig {
    pub prefix: String,
    pub restricted_visibility: Visibility,
}

impl Default for WeaverConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            restricted_visibility: Visibility::Private,
        }
    }
}

impl WeaverConfig {
    /// Set the prefix used for renamed originals.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Set the visibility renamed originals are reduced to.
    #[must_use]
    pub const fn restricted_visibility(mut self, visibility: Visibility) -> Self {
        self.restricted_visibility = visibility;
        self
    }

    pub fn validate(&self) -> Result<(), WeaveError> {
        let mut chars = self.prefix.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(WeaveError::Config(format!(
                "prefix '{}' is not a valid identifier",
                self.prefix
            )));
        }
        if self.restricted_visibility == Visibility::Public {
            return Err(WeaveError::Config(
                "renamed methods cannot stay public".to_string(),
            ));
        }
        Ok(())
    }
}

/// A method that the weaver intercepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WovenMethod {
    pub name: String,
    pub internal_name: String,
    /// Declared visibility; implicit visibility is public.
    pub visibility: Visibility,
    pub is_static: bool,
    pub line: usize,
}

/// Token positions of one method, collected before any edit is queued.
#[derive(Debug, Clone)]
struct MethodLayout {
    keyword: usize,
    name_position: usize,
    name: String,
    visibility: Option<(usize, Visibility)>,
    is_static: bool,
    signature: String,
    /// False for `void` and `never` methods, whose stub must not return.
    returns_value: bool,
    method_constants: Vec<usize>,
    function_constants: Vec<usize>,
    line: usize,
}

/// What a `function` keyword inside a class body declares.
#[derive(Debug, Clone)]
enum Declaration {
    /// No body, e.g. an abstract method.
    Bodiless,
    /// A method that is left alone, with the position of its closing
    /// brace.
    Skipped(usize),
    Method(MethodLayout, usize),
}

#[derive(Debug, Clone)]
struct ClassLayout {
    name: String,
    close: usize,
    methods: Vec<MethodLayout>,
}

/// Source transformer that injects join points into the first class of
/// a source unit.
#[derive(Debug, Clone, Default)]
pub struct Weaver {
    config: WeaverConfig,
}

impl Weaver {
    pub fn new(config: WeaverConfig) -> Result<Self, WeaveError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &WeaverConfig {
        &self.config
    }

    fn internal_name(&self, name: &str) -> String {
        format!("{}{name}", self.config.prefix)
    }

    /// Weave `source`. Sources without a class come back unchanged.
    ///
    /// # Errors
    ///
    /// Fails on lexer errors and unbalanced class or method braces. No
    /// partial result is produced in that case.
    pub fn transform(&self, source: &str) -> Result<String, WeaveError> {
        let tokens = TokenSequence::parse(source)?;
        let Some(class) = analyze_class(&tokens)? else {
            debug!("no class found, source left unchanged");
            return Ok(source.to_string());
        };

        debug!(
            class = %class.name,
            methods = class.methods.len(),
            "weaving class"
        );

        let restricted = self.config.restricted_visibility;
        let mut editor = TokenEditor::new(tokens);

        for method in &class.methods {
            let internal = self.internal_name(&method.name);
            debug!(
                method = %method.name,
                internal = %internal,
                line = method.line,
                is_static = method.is_static,
                "intercepting method"
            );

            let context = if method.is_static { "__CLASS__" } else { "$this" };
            editor.insert_before(
                class.close,
                forwarding_stub(
                    &method.signature,
                    &internal,
                    context,
                    method.returns_value,
                ),
            )?;
            editor.rename(method.name_position, &internal)?;

            match method.visibility {
                Some((position, declared)) => {
                    let tightened = declared.tighten(restricted);
                    if tightened != declared {
                        editor.replace(position, tightened.keyword())?;
                    }
                }
                None => {
                    editor.insert_before(method.keyword, format!("{} ", restricted.keyword()))?;
                }
            }

            editor.replace_all(
                &method.method_constants,
                &format!("(__CLASS__ . '::{}')", method.name),
            )?;
            editor.replace_all(&method.function_constants, &format!("'{}'", method.name))?;
        }

        editor.insert_before(class.close, helper_block())?;
        editor.commit()?;
        Ok(editor.into_source()?)
    }

    /// Weave `source`, falling back to the unchanged input on any error.
    #[must_use]
    pub fn transform_or_passthrough(&self, source: &str) -> String {
        match self.transform(source) {
            Ok(woven) => woven,
            Err(e) => {
                warn!(error = %e, "source unit left unwoven");
                source.to_string()
            }
        }
    }

    /// List the methods `transform` would intercept.
    pub fn analyze(&self, source: &str) -> Result<Vec<WovenMethod>, WeaveError> {
        let tokens = TokenSequence::parse(source)?;
        let Some(class) = analyze_class(&tokens)? else {
            return Ok(Vec::new());
        };
        Ok(class
            .methods
            .into_iter()
            .map(|m| WovenMethod {
                internal_name: self.internal_name(&m.name),
                visibility: m.visibility.map_or(Visibility::Public, |(_, v)| v),
                is_static: m.is_static,
                line: m.line,
                name: m.name,
            })
            .collect())
    }
}

/// Weave with the default configuration.
pub fn weave(source: &str) -> Result<String, WeaveError> {
    Weaver::default().transform(source)
}

/// Weave with the default configuration, passing broken input through.
#[must_use]
pub fn weave_or_passthrough(source: &str) -> String {
    Weaver::default().transform_or_passthrough(source)
}

fn forwarding_stub(
    signature: &str,
    internal: &str,
    context: &str,
    returns_value: bool,
) -> String {
    let call = if returns_value { "return " } else { "" };
    format!(
        "
    {signature}
    {{
        $args = func_get_args();
        {call}self::{HELPER_METHOD}(__FUNCTION__, '{internal}', {context}, $args);
    }}
"
    )
}

fn analyze_class(tokens: &TokenSequence) -> Result<Option<ClassLayout>, WeaveError> {
    if tokens.is_empty() {
        return Ok(None);
    }
    let Some(class) = tokens.find_between(TokenKind::Class, 0, tokens.len() - 1, &[])? else {
        return Ok(None);
    };
    let class_line = tokens[class].line;

    let name = tokens
        .find_next(TokenKind::Identifier, class, &[TokenKind::OpenBrace])?
        .map_or_else(|| "class@anonymous".to_string(), |p| tokens[p].text.clone());

    let open = tokens
        .find_next(TokenKind::OpenBrace, class, &[TokenKind::Semicolon])?
        .ok_or_else(|| WeaveError::MalformedInput {
            line: class_line,
            reason: format!("class {name} has no body"),
        })?;
    let close = tokens.find_matching_brace(open)?;

    let mut methods = Vec::new();
    let mut cursor = open;
    while let Some(keyword) = tokens.find_between(TokenKind::Function, cursor, close, &[])? {
        match analyze_method(tokens, keyword)? {
            Declaration::Method(method, body_close) => {
                methods.push(method);
                cursor = body_close + 1;
            }
            Declaration::Skipped(body_close) => cursor = body_close + 1,
            Declaration::Bodiless => cursor = keyword + 1,
        }
    }

    Ok(Some(ClassLayout {
        name,
        close,
        methods,
    }))
}

/// Significant token texts between `start` and `end`, both inclusive.
fn significant_text(tokens: &TokenSequence, start: usize, end: usize) -> Vec<&str> {
    (start..=end)
        .filter_map(|i| tokens.get(i))
        .filter(|t| {
            !matches!(
                t.kind,
                TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
            )
        })
        .map(|t| t.text.as_str())
        .collect()
}

/// True unless the return type between the parameter list and the body
/// is `void` or `never`.
fn returns_value(tokens: &TokenSequence, params_close: usize, body_open: usize) -> bool {
    if params_close + 1 >= body_open {
        return true;
    }
    match significant_text(tokens, params_close + 1, body_open - 1).as_slice() {
        [":", ty] => !ty.eq_ignore_ascii_case("void") && !ty.eq_ignore_ascii_case("never"),
        _ => true,
    }
}

/// True if a parameter between the parentheses carries a visibility or
/// `readonly` modifier.
fn has_promoted_parameters(
    tokens: &TokenSequence,
    params_open: usize,
    params_close: usize,
) -> bool {
    (params_open..params_close).filter_map(|i| tokens.get(i)).any(|t| {
        Visibility::from_kind(t.kind).is_some()
            || (t.kind == TokenKind::Identifier && t.text.eq_ignore_ascii_case("readonly"))
    })
}

/// Collect the layout of the method declared at `keyword`.
fn analyze_method(tokens: &TokenSequence, keyword: usize) -> Result<Declaration, WeaveError> {
    let line = tokens[keyword].line;
    let Some(body_open) = tokens.find_next(
        TokenKind::OpenBrace,
        keyword,
        &[TokenKind::Semicolon, TokenKind::CloseBrace],
    )?
    else {
        return Ok(Declaration::Bodiless);
    };
    let body_close = tokens.find_matching_brace(body_open)?;

    let missing_name = || WeaveError::MalformedInput {
        line,
        reason: "method declaration without a name".to_string(),
    };
    let name_position = tokens
        .find_next(TokenKind::Identifier, keyword, &[TokenKind::OpenParen])?
        .ok_or_else(missing_name)?;
    let params_open = tokens
        .find_next(TokenKind::OpenParen, name_position, &[TokenKind::OpenBrace])?
        .ok_or_else(missing_name)?;
    let params_close = tokens.find_matching_brace(params_open)?;

    let name = &tokens[name_position].text;
    // Promoted parameters are only legal in the constructor itself.
    if name.eq_ignore_ascii_case("__construct")
        && has_promoted_parameters(tokens, params_open, params_close)
    {
        debug!(line, "constructor with promoted parameters left unwoven");
        return Ok(Declaration::Skipped(body_close));
    }

    let visibility = tokens
        .find_previous(TokenKind::VISIBILITY, keyword, &TokenKind::BOUNDARIES)?
        .and_then(|p| Visibility::from_kind(tokens[p].kind).map(|v| (p, v)));

    let is_static = tokens
        .find_previous(
            TokenKind::Static,
            keyword,
            &[
                TokenKind::DocComment,
                TokenKind::Semicolon,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
            ],
        )?
        .is_some();

    let signature_start = tokens
        .find_all_between(
            [
                TokenKind::DocComment,
                TokenKind::Public,
                TokenKind::Protected,
                TokenKind::Private,
                TokenKind::Static,
                TokenKind::Final,
                TokenKind::Function,
            ],
            keyword,
            0,
            &TokenKind::BOUNDARIES,
        )?
        .into_iter()
        .min()
        .unwrap_or(keyword);
    let signature = tokens
        .text_between(signature_start, body_open - 1)?
        .trim_end()
        .to_string();

    let method_constants =
        tokens.find_all_between(TokenKind::MethodConst, body_open, body_close, &[])?;
    let function_constants =
        tokens.find_all_between(TokenKind::FunctionConst, body_open, body_close, &[])?;

    Ok(Declaration::Method(
        MethodLayout {
            keyword,
            name_position,
            name: name.clone(),
            visibility,
            is_static,
            signature,
            returns_value: returns_value(tokens, params_close, body_open),
            method_constants,
            function_constants,
            line,
        },
        body_close,
    ))
}
