//! Declarative aspect types and the resolver that classifies their
//! methods into pointcuts and advices.
//!
//! An aspect is described with [`AspectType`] and [`MethodDef`] instead
//! of being read from source. [`AspectReflection`] validates every advice
//! up front, so an aspect that was accepted never fails later on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::advice::{AdviceCallback, AdviceType, Pointcut};
use crate::doc_comment::DocComment;
use crate::joinpoint::{Fault, JoinPoint, MethodId};
use crate::token::Visibility;

/// Methods whose name starts with this prefix are pointcuts.
pub const POINTCUT_PREFIX: &str = "pointcut";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectionError {
    #[error("method {method}() in aspect {aspect} is not an advice: {reason}")]
    NotAnAdvice {
        method: String,
        aspect: String,
        reason: &'static str,
    },
    #[error(
        "pointcut method {pointcut}() referenced by advice {advice}() does not exist in aspect {aspect}"
    )]
    UnknownPointcut {
        pointcut: String,
        advice: String,
        aspect: String,
    },
    #[error("no pointcut reference provided for tag @{tag} of advice {advice}()")]
    EmptyPointcutReference { tag: AdviceType, advice: String },
    #[error("aspect {aspect} has no {kind} named {name}")]
    NotFound {
        kind: &'static str,
        name: String,
        aspect: String,
    },
}

/// An advice type bound to the name of a pointcut method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointcutReference {
    pub advice_type: AdviceType,
    pub pointcut: String,
}

impl PointcutReference {
    /// Trailing call parentheses are stripped, so `pointcutAll()` and
    /// `pointcutAll` name the same method.
    #[must_use]
    pub fn new(advice_type: AdviceType, pointcut: &str) -> Self {
        Self {
            advice_type,
            pointcut: pointcut.trim_end_matches(['(', ')']).to_string(),
        }
    }
}

/// Executable part of a method definition.
#[derive(Clone, Default)]
pub enum MethodBody {
    #[default]
    None,
    Pointcut(Arc<dyn Pointcut>),
    Advice(AdviceCallback),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Pointcut(_) => f.write_str("Pointcut(..)"),
            Self::Advice(_) => f.write_str("Advice(..)"),
        }
    }
}

/// One method of an aspect.
#[derive(Debug, Clone)]
pub struct MethodDef {
    name: String,
    visibility: Visibility,
    is_static: bool,
    required_parameters: usize,
    doc_comment: Option<DocComment>,
    references: Vec<PointcutReference>,
    body: MethodBody,
}

impl MethodDef {
    /// A public, non-static method without parameters.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            visibility: Visibility::Public,
            is_static: false,
            required_parameters: 0,
            doc_comment: None,
            references: Vec::new(),
            body: MethodBody::None,
        }
    }

    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub const fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    #[must_use]
    pub const fn required_parameters(mut self, count: usize) -> Self {
        self.required_parameters = count;
        self
    }

    /// Attach a doc comment. Its advice tags are added to the pointcut
    /// references.
    #[must_use]
    pub fn doc(mut self, text: &str) -> Self {
        let doc = DocComment::parse(text);
        self.references.extend(doc.pointcut_references());
        self.doc_comment = Some(doc);
        self
    }

    /// Declare a pointcut reference without a doc comment.
    #[must_use]
    pub fn reference(mut self, advice_type: AdviceType, pointcut: &str) -> Self {
        self.references
            .push(PointcutReference::new(advice_type, pointcut));
        self
    }

    /// Use `pointcut` as the predicate of this pointcut method.
    #[must_use]
    pub fn pointcut<P: Pointcut + 'static>(mut self, pointcut: P) -> Self {
        self.body = MethodBody::Pointcut(Arc::new(pointcut));
        self
    }

    /// Use `callback` as the body of this advice method.
    #[must_use]
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut JoinPoint) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.body = MethodBody::Advice(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_public(&self) -> bool {
        matches!(self.visibility, Visibility::Public)
    }

    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    #[must_use]
    pub const fn doc_comment(&self) -> Option<&DocComment> {
        self.doc_comment.as_ref()
    }

    #[must_use]
    pub fn references(&self) -> &[PointcutReference] {
        &self.references
    }

    #[must_use]
    pub const fn body(&self) -> &MethodBody {
        &self.body
    }
}

/// Declarative description of an aspect class.
#[derive(Debug, Clone)]
pub struct AspectType {
    name: String,
    methods: Vec<MethodDef>,
}

impl AspectType {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.find_method(name).is_some()
    }
}

/// A pointcut method together with its predicate.
#[derive(Clone)]
pub struct PointcutMethod {
    name: String,
    predicate: Option<Arc<dyn Pointcut>>,
}

impl PointcutMethod {
    fn from_def(def: &MethodDef) -> Self {
        let predicate = match &def.body {
            MethodBody::Pointcut(p) => Some(Arc::clone(p)),
            MethodBody::None | MethodBody::Advice(_) => None,
        };
        Self {
            name: def.name.clone(),
            predicate,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn predicate(&self) -> Option<Arc<dyn Pointcut>> {
        self.predicate.clone()
    }

    /// A pointcut without a predicate matches nothing.
    #[must_use]
    pub fn matches(&self, method: &MethodId) -> bool {
        self.predicate.as_ref().is_some_and(|p| p.matches(method))
    }
}

impl fmt::Debug for PointcutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointcutMethod")
            .field("name", &self.name)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}

/// A validated advice method.
#[derive(Clone)]
pub struct Advice {
    aspect: String,
    name: String,
    references: Vec<PointcutReference>,
    pointcuts: HashMap<String, PointcutMethod>,
    callback: Option<AdviceCallback>,
}

impl Advice {
    /// Validate method `name` of `aspect` as an advice and resolve every
    /// pointcut it references.
    pub fn resolve(aspect: &AspectType, name: &str) -> Result<Self, ReflectionError> {
        let def = aspect
            .find_method(name)
            .ok_or_else(|| ReflectionError::NotFound {
                kind: "method",
                name: name.to_string(),
                aspect: aspect.name.clone(),
            })?;

        let not_an_advice = |reason| ReflectionError::NotAnAdvice {
            method: name.to_string(),
            aspect: aspect.name.clone(),
            reason,
        };
        if def.doc_comment.is_none() && def.references.is_empty() {
            return Err(not_an_advice("no doc comment provided"));
        }
        if def.references.is_empty() {
            return Err(not_an_advice("no pointcut references declared"));
        }
        if !def.is_public() {
            return Err(not_an_advice("advice must be public"));
        }
        if def.required_parameters > 1 {
            return Err(not_an_advice(
                "advice must require at most one join point parameter",
            ));
        }

        let mut pointcuts = HashMap::new();
        for reference in &def.references {
            if reference.pointcut.is_empty() {
                return Err(ReflectionError::EmptyPointcutReference {
                    tag: reference.advice_type,
                    advice: name.to_string(),
                });
            }
            if pointcuts.contains_key(&reference.pointcut) {
                continue;
            }
            let target = aspect.find_method(&reference.pointcut).ok_or_else(|| {
                ReflectionError::UnknownPointcut {
                    pointcut: reference.pointcut.clone(),
                    advice: name.to_string(),
                    aspect: aspect.name.clone(),
                }
            })?;
            pointcuts.insert(reference.pointcut.clone(), PointcutMethod::from_def(target));
        }

        let callback = match &def.body {
            MethodBody::Advice(cb) => Some(Arc::clone(cb)),
            MethodBody::None | MethodBody::Pointcut(_) => None,
        };

        Ok(Self {
            aspect: aspect.name.clone(),
            name: name.to_string(),
            references: def.references.clone(),
            pointcuts,
            callback,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn aspect(&self) -> &str {
        &self.aspect
    }

    #[must_use]
    pub fn references(&self) -> &[PointcutReference] {
        &self.references
    }

    #[must_use]
    pub fn callback(&self) -> Option<&AdviceCallback> {
        self.callback.as_ref()
    }

    /// Pointcuts referenced for `advice_type`, in declaration order.
    #[must_use]
    pub fn pointcuts_by_type(&self, advice_type: AdviceType) -> Vec<&PointcutMethod> {
        self.references
            .iter()
            .filter(|r| r.advice_type == advice_type)
            .filter_map(|r| self.pointcuts.get(&r.pointcut))
            .collect()
    }
}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advice")
            .field("aspect", &self.aspect)
            .field("name", &self.name)
            .field("references", &self.references)
            .finish_non_exhaustive()
    }
}

/// Classification of every method of an aspect.
#[derive(Debug, Clone)]
pub struct AspectReflection {
    name: String,
    pointcuts: Vec<PointcutMethod>,
    advices: Vec<Advice>,
}

impl AspectReflection {
    /// Classify the methods of `aspect`. Fails on the first method that
    /// declares pointcut references but is not a valid advice.
    pub fn new(aspect: &AspectType) -> Result<Self, ReflectionError> {
        let advices = aspect
            .methods
            .iter()
            .filter(|m| !m.references.is_empty())
            .map(|m| Advice::resolve(aspect, &m.name))
            .collect::<Result<Vec<_>, _>>()?;

        let pointcuts = aspect
            .methods
            .iter()
            .filter(|m| m.references.is_empty())
            .filter(|m| {
                m.name.starts_with(POINTCUT_PREFIX)
                    || advices.iter().any(|a| a.pointcuts.contains_key(&m.name))
            })
            .map(PointcutMethod::from_def)
            .collect();

        Ok(Self {
            name: aspect.name.clone(),
            pointcuts,
            advices,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn pointcuts(&self) -> &[PointcutMethod] {
        &self.pointcuts
    }

    pub fn pointcut(&self, name: &str) -> Result<&PointcutMethod, ReflectionError> {
        self.pointcuts
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| self.not_found("pointcut", name))
    }

    #[must_use]
    pub fn has_pointcut(&self, name: &str) -> bool {
        self.pointcut(name).is_ok()
    }

    #[must_use]
    pub fn advices(&self) -> &[Advice] {
        &self.advices
    }

    pub fn advice(&self, name: &str) -> Result<&Advice, ReflectionError> {
        self.advices
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| self.not_found("advice", name))
    }

    #[must_use]
    pub fn has_advice(&self, name: &str) -> bool {
        self.advice(name).is_ok()
    }

    fn not_found(&self, kind: &'static str, name: &str) -> ReflectionError {
        ReflectionError::NotFound {
            kind,
            name: name.to_string(),
            aspect: self.name.clone(),
        }
    }
}
