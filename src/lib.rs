//! Token-level method weaver and join-point dispatcher for PHP-style
//! aspect-oriented programming.
//!
//! The crate has two halves. The transformer lexes a source unit,
//! renames every method of its class and injects forwarding stubs that
//! route calls through a dispatcher. The dispatcher runs before, after
//! returning, after throwing and after advice around the renamed
//! original.
//!
//! # Quick start
//!
//! ## Weave a class
//!
//! ```
//! use aspect_weaver::weave;
//!
//! let source = "<?php\nclass Greeter\n{\n    public function hello()\n    {\n        return 'hi';\n    }\n}\n";
//! let woven = weave(source).unwrap();
//! assert!(woven.contains("private function _aspectWeaverhello()"));
//! assert!(woven.contains("return self::_aspectWeaverHandleCall(__FUNCTION__"));
//! // Original statements keep their line numbers.
//! assert_eq!(woven.lines().nth(5), Some("        return 'hi';"));
//! ```
//!
//! ## Dispatch a call through an aspect
//!
//! ```
//! use aspect_weaver::{
//!     AspectManager, AspectType, Call, CallTarget, Fault, MethodDef, Methods, Receiver, Value,
//!     dispatch,
//! };
//!
//! struct Greeter;
//!
//! impl CallTarget for Greeter {
//!     fn class_name(&self) -> &str {
//!         "Greeter"
//!     }
//!     fn receiver(&self) -> Receiver {
//!         Receiver::Class("Greeter".to_string())
//!     }
//!     fn invoke(&mut self, _method: &str, _args: &[Value]) -> Result<Value, Fault> {
//!         Ok(Value::from("hi"))
//!     }
//! }
//!
//! let aspect = AspectType::new("Shout")
//!     .method(MethodDef::new("pointcutHello").pointcut(Methods::new(["Greeter::hello"])))
//!     .method(
//!         MethodDef::new("shout")
//!             .doc("/** @afterReturning pointcutHello() */")
//!             .callback(|jp| {
//!                 jp.set_return_value("HI");
//!                 Ok(())
//!             }),
//!     );
//!
//! let mut manager = AspectManager::new();
//! manager.add_aspect(&aspect).unwrap();
//!
//! let call = Call::new("hello", "_aspectWeaverhello", Vec::new());
//! let result = dispatch(Some(&manager), call, &mut Greeter);
//! assert_eq!(result, Ok(Value::from("HI")));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod advice;
pub mod dispatch;
pub mod doc_comment;
pub mod editor;
pub mod joinpoint;
pub mod lexer;
pub mod manager;
pub mod reflection;
pub mod search;
pub mod sequence;
pub mod token;
pub mod weaver;

pub use advice::{
    AdviceCallback, AdviceType, Advisor, AdvisorContainer, AdvisorGroup, All, Methods, Nothing,
    Pointcut,
};
pub use dispatch::{
    AdviceRegistry, Call, CallTarget, clear_registry, dispatch, handle_call, has_registry,
    registry, set_registry,
};
pub use doc_comment::DocComment;
pub use editor::{Edit, EditError, TokenEditor};
pub use joinpoint::{ArgumentError, ArgumentKey, Fault, JoinPoint, MethodId, Receiver, Value};
pub use lexer::{LexError, LexErrorKind, tokenize};
pub use manager::AspectManager;
pub use reflection::{
    Advice, AspectReflection, AspectType, MethodBody, MethodDef, PointcutMethod,
    PointcutReference, ReflectionError,
};
pub use search::Target;
pub use sequence::{SequenceError, TokenSequence};
pub use token::{Span, Token, TokenKind, Visibility};
pub use weaver::{
    DEFAULT_PREFIX, DISPATCH_ROUTINE, HELPER_METHOD, WeaveError, Weaver, WeaverConfig,
    WovenMethod, weave, weave_or_passthrough,
};

/// Unified error type covering every fallible operation of the crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Sequence(#[from] SequenceError),
    #[error("{0}")]
    Edit(#[from] EditError),
    #[error("{0}")]
    Weave(#[from] WeaveError),
    #[error("{0}")]
    Reflection(#[from] ReflectionError),
    #[error("{0}")]
    Argument(#[from] ArgumentError),
    /// An exception escaping a dispatched call.
    #[error("{0}")]
    Fault(#[from] Fault),
}

/// Weave `source` and return the methods that were intercepted.
pub fn weave_with_report(
    source: &str,
    config: WeaverConfig,
) -> Result<(String, Vec<WovenMethod>), Error> {
    let weaver = Weaver::new(config)?;
    let methods = weaver.analyze(source)?;
    Ok((weaver.transform(source)?, methods))
}
