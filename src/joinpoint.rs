//! Call context handed to advice callbacks.

use std::fmt;

/// Dynamic value passed through an intercepted call.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

/// Exception raised by an original method or an advice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{class}: {message}")]
pub struct Fault {
    pub class: String,
    pub message: String,
    pub line: Option<usize>,
}

impl Fault {
    #[must_use]
    pub fn new(class: &str, message: &str) -> Self {
        Self {
            class: class.to_string(),
            message: message.to_string(),
            line: None,
        }
    }

    #[must_use]
    pub const fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Identity of an intercepted method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodId {
    pub class: String,
    pub method: String,
}

impl MethodId {
    #[must_use]
    pub fn new(class: &str, method: &str) -> Self {
        Self {
            class: class.to_string(),
            method: method.to_string(),
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.method)
    }
}

/// What a call was made on: an instance, or the class for static calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    Instance { class: String },
    Class(String),
}

impl Receiver {
    #[must_use]
    pub fn class_name(&self) -> &str {
        match self {
            Self::Instance { class } | Self::Class(class) => class,
        }
    }

    #[must_use]
    pub const fn is_static(&self) -> bool {
        matches!(self, Self::Class(_))
    }
}

/// Position or parameter name of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for ArgumentKey<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a str> for ArgumentKey<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("no argument at index {0}")]
    MissingIndex(usize),
    #[error("no argument named '{0}'")]
    MissingName(String),
}

/// State of one intercepted call, mutated by advice callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPoint {
    method: MethodId,
    arguments: Vec<Value>,
    parameter_names: Vec<String>,
    return_value: Option<Value>,
    exception: Option<Fault>,
    receiver: Receiver,
}

impl JoinPoint {
    #[must_use]
    pub const fn new(method: MethodId, arguments: Vec<Value>, receiver: Receiver) -> Self {
        Self {
            method,
            arguments,
            parameter_names: Vec::new(),
            return_value: None,
            exception: None,
            receiver,
        }
    }

    /// Names used for [`ArgumentKey::Name`] lookups, in declaration
    /// order.
    #[must_use]
    pub fn with_parameter_names(mut self, names: Vec<String>) -> Self {
        self.parameter_names = names;
        self
    }

    #[must_use]
    pub const fn method(&self) -> &MethodId {
        &self.method
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.method.class
    }

    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method.method
    }

    #[must_use]
    pub const fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Replace the arguments passed on to the original method.
    pub fn set_arguments(&mut self, arguments: Vec<Value>) -> &mut Self {
        self.arguments = arguments;
        self
    }

    pub fn argument<'a>(&self, key: impl Into<ArgumentKey<'a>>) -> Result<&Value, ArgumentError> {
        match key.into() {
            ArgumentKey::Index(index) => self
                .arguments
                .get(index)
                .ok_or(ArgumentError::MissingIndex(index)),
            ArgumentKey::Name(name) => self
                .parameter_names
                .iter()
                .position(|p| p == name)
                .and_then(|index| self.arguments.get(index))
                .ok_or_else(|| ArgumentError::MissingName(name.to_string())),
        }
    }

    #[must_use]
    pub const fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    pub fn set_return_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.return_value = Some(value.into());
        self
    }

    pub fn clear_return_value(&mut self) -> &mut Self {
        self.return_value = None;
        self
    }

    pub(crate) fn take_return_value(&mut self) -> Option<Value> {
        self.return_value.take()
    }

    #[must_use]
    pub const fn exception(&self) -> Option<&Fault> {
        self.exception.as_ref()
    }

    /// Set or clear the pending exception.
    pub fn set_exception(&mut self, exception: Option<Fault>) -> &mut Self {
        self.exception = exception;
        self
    }

    pub(crate) fn take_exception(&mut self) -> Option<Fault> {
        self.exception.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_point() -> JoinPoint {
        JoinPoint::new(
            MethodId::new("Greeter", "greet"),
            vec![Value::from("Bert"), Value::Bool(false)],
            Receiver::Instance {
                class: "Greeter".to_string(),
            },
        )
        .with_parameter_names(vec!["name".to_string(), "register".to_string()])
    }

    #[test]
    fn slots_start_empty() {
        let jp = join_point();
        assert_eq!(jp.return_value(), None);
        assert_eq!(jp.exception(), None);
        assert_eq!(jp.class_name(), "Greeter");
        assert_eq!(jp.method_name(), "greet");
    }

    #[test]
    fn arguments_by_index_and_name() {
        let jp = join_point();
        assert_eq!(jp.argument(0_usize), Ok(&Value::from("Bert")));
        assert_eq!(jp.argument("register"), Ok(&Value::Bool(false)));
        assert_eq!(jp.argument(2_usize), Err(ArgumentError::MissingIndex(2)));
        assert_eq!(
            jp.argument("missing"),
            Err(ArgumentError::MissingName("missing".to_string()))
        );
    }

    #[test]
    fn named_lookup_past_passed_arguments_is_missing() {
        let mut jp = join_point();
        jp.set_arguments(vec![Value::from("Ernie")]);
        assert!(jp.argument("register").is_err());
    }

    #[test]
    fn exception_can_be_cleared() {
        let mut jp = join_point();
        jp.set_exception(Some(Fault::new("RuntimeException", "Test.")));
        jp.set_exception(None);
        assert_eq!(jp.exception(), None);
    }

    #[test]
    fn return_value_can_be_cleared() {
        let mut jp = join_point();
        jp.set_return_value(7_i64);
        jp.clear_return_value();
        assert_eq!(jp.return_value(), None);
    }

    #[test]
    fn setters_chain() {
        let mut jp = join_point();
        jp.set_return_value(1_i64).set_return_value("Demo");
        assert_eq!(jp.return_value(), Some(&Value::from("Demo")));
    }

    #[test]
    fn display_forms() {
        assert_eq!(
            Value::List(vec![Value::Int(3), Value::from("x"), Value::Null]).to_string(),
            "[3, 'x', null]"
        );
        assert_eq!(
            Fault::new("LogicException", "boom").to_string(),
            "LogicException: boom"
        );
        assert_eq!(MethodId::new("A", "b").to_string(), "A::b");
    }
}
