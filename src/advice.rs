//! Advice types, pointcut predicates and advisor containers.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::joinpoint::{Fault, JoinPoint, MethodId};

/// When an advice runs relative to the original method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdviceType {
    Before,
    AfterReturning,
    AfterThrowing,
    After,
}

impl AdviceType {
    /// All types in execution order.
    pub const ALL: [Self; 4] = [
        Self::Before,
        Self::AfterReturning,
        Self::AfterThrowing,
        Self::After,
    ];

    /// Doc-comment tag that declares this advice type.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::AfterReturning => "afterReturning",
            Self::AfterThrowing => "afterThrowing",
            Self::After => "after",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

impl fmt::Display for AdviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Decides whether an advisor applies to a method.
pub trait Pointcut: Send + Sync {
    fn matches(&self, method: &MethodId) -> bool;
}

impl<F> Pointcut for F
where
    F: Fn(&MethodId) -> bool + Send + Sync,
{
    fn matches(&self, method: &MethodId) -> bool {
        self(method)
    }
}

/// Matches every method.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

impl Pointcut for All {
    fn matches(&self, _method: &MethodId) -> bool {
        true
    }
}

/// Matches no method.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nothing;

impl Pointcut for Nothing {
    fn matches(&self, _method: &MethodId) -> bool {
        false
    }
}

/// Matches an exact set of `Class::method` names.
#[derive(Debug, Clone, Default)]
pub struct Methods {
    methods: HashSet<MethodId>,
}

impl Methods {
    /// Build from `Class::method` strings. Entries without `::` are
    /// ignored.
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let methods = names
            .into_iter()
            .filter_map(|name| name.split_once("::"))
            .map(|(class, method)| MethodId::new(class, method))
            .collect();
        Self { methods }
    }

    #[must_use]
    pub fn with(mut self, method: MethodId) -> Self {
        self.methods.insert(method);
        self
    }
}

impl Pointcut for Methods {
    fn matches(&self, method: &MethodId) -> bool {
        self.methods.contains(method)
    }
}

/// Advice body, run with exclusive access to the call context.
pub type AdviceCallback = Arc<dyn Fn(&mut JoinPoint) -> Result<(), Fault> + Send + Sync>;

/// A pointcut paired with the callback it triggers.
#[derive(Clone)]
pub struct Advisor {
    pointcut: Arc<dyn Pointcut>,
    callback: AdviceCallback,
}

impl Advisor {
    pub fn new<P, F>(pointcut: P, callback: F) -> Self
    where
        P: Pointcut + 'static,
        F: Fn(&mut JoinPoint) -> Result<(), Fault> + Send + Sync + 'static,
    {
        Self {
            pointcut: Arc::new(pointcut),
            callback: Arc::new(callback),
        }
    }

    /// Build from already shared parts.
    #[must_use]
    pub fn from_parts(pointcut: Arc<dyn Pointcut>, callback: AdviceCallback) -> Self {
        Self { pointcut, callback }
    }

    #[must_use]
    pub fn pointcut(&self) -> &dyn Pointcut {
        self.pointcut.as_ref()
    }

    #[must_use]
    pub fn applies_to(&self, method: &MethodId) -> bool {
        self.pointcut.matches(method)
    }

    pub fn invoke(&self, join_point: &mut JoinPoint) -> Result<(), Fault> {
        (self.callback)(join_point)
    }
}

impl fmt::Debug for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advisor").finish_non_exhaustive()
    }
}

/// Ordered advisors of one advice type.
#[derive(Debug, Clone, Default)]
pub struct AdvisorGroup {
    advisors: Vec<Advisor>,
}

impl AdvisorGroup {
    pub fn add(&mut self, advisor: Advisor) -> &mut Self {
        self.advisors.push(advisor);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.advisors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.advisors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Advisor> {
        self.advisors.iter()
    }

    /// Advisors whose pointcut matches `method`, order preserved.
    #[must_use]
    pub fn matching(&self, method: &MethodId) -> Self {
        Self {
            advisors: self
                .advisors
                .iter()
                .filter(|a| a.applies_to(method))
                .cloned()
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AdvisorGroup {
    type Item = &'a Advisor;
    type IntoIter = std::slice::Iter<'a, Advisor>;

    fn into_iter(self) -> Self::IntoIter {
        self.advisors.iter()
    }
}

/// One [`AdvisorGroup`] per [`AdviceType`].
#[derive(Debug, Clone, Default)]
pub struct AdvisorContainer {
    before: AdvisorGroup,
    after_returning: AdvisorGroup,
    after_throwing: AdvisorGroup,
    after: AdvisorGroup,
}

impl AdvisorContainer {
    #[must_use]
    pub const fn group(&self, advice_type: AdviceType) -> &AdvisorGroup {
        match advice_type {
            AdviceType::Before => &self.before,
            AdviceType::AfterReturning => &self.after_returning,
            AdviceType::AfterThrowing => &self.after_throwing,
            AdviceType::After => &self.after,
        }
    }

    pub const fn group_mut(&mut self, advice_type: AdviceType) -> &mut AdvisorGroup {
        match advice_type {
            AdviceType::Before => &mut self.before,
            AdviceType::AfterReturning => &mut self.after_returning,
            AdviceType::AfterThrowing => &mut self.after_throwing,
            AdviceType::After => &mut self.after,
        }
    }

    #[must_use]
    pub const fn before(&self) -> &AdvisorGroup {
        &self.before
    }

    #[must_use]
    pub const fn after_returning(&self) -> &AdvisorGroup {
        &self.after_returning
    }

    #[must_use]
    pub const fn after_throwing(&self) -> &AdvisorGroup {
        &self.after_throwing
    }

    #[must_use]
    pub const fn after(&self) -> &AdvisorGroup {
        &self.after
    }

    /// Add `advisor` to the group of `advice_type`.
    pub fn add(&mut self, advice_type: AdviceType, advisor: Advisor) -> &mut Self {
        self.group_mut(advice_type).add(advisor);
        self
    }

    /// Total number of advisors across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        AdviceType::ALL.iter().map(|&t| self.group(t).len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A container holding only the advisors that apply to `method`.
    #[must_use]
    pub fn matching(&self, method: &MethodId) -> Self {
        Self {
            before: self.before.matching(method),
            after_returning: self.after_returning.matching(method),
            after_throwing: self.after_throwing.matching(method),
            after: self.after.matching(method),
        }
    }
}
