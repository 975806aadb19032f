//! Default [`AdviceRegistry`]: binds resolved aspects into advisors.

use std::sync::Arc;

use tracing::debug;

use crate::advice::{AdviceType, Advisor, AdvisorContainer, Nothing, Pointcut};
use crate::dispatch::AdviceRegistry;
use crate::joinpoint::MethodId;
use crate::reflection::{AspectReflection, AspectType, ReflectionError};

/// Holds the advisors of every registered aspect.
#[derive(Debug, Default)]
pub struct AspectManager {
    advisors: AdvisorContainer,
    aspects: Vec<String>,
}

impl AspectManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `aspect` and bind one advisor per advice and pointcut
    /// reference. Nothing is registered if the aspect is invalid.
    pub fn add_aspect(&mut self, aspect: &AspectType) -> Result<&mut Self, ReflectionError> {
        let reflection = AspectReflection::new(aspect)?;

        let mut bound = 0;
        for advice in reflection.advices() {
            let Some(callback) = advice.callback() else {
                debug!(aspect = %aspect.name(), advice = %advice.name(), "advice has no body, skipped");
                continue;
            };
            for advice_type in AdviceType::ALL {
                for pointcut in advice.pointcuts_by_type(advice_type) {
                    let predicate = pointcut
                        .predicate()
                        .unwrap_or_else(|| Arc::new(Nothing) as Arc<dyn Pointcut>);
                    self.advisors.add(
                        advice_type,
                        Advisor::from_parts(predicate, Arc::clone(callback)),
                    );
                    bound += 1;
                }
            }
        }

        debug!(
            aspect = %aspect.name(),
            advices = reflection.advices().len(),
            advisors = bound,
            "aspect registered"
        );
        self.aspects.push(aspect.name().to_string());
        Ok(self)
    }

    pub fn add_advisor(&mut self, advice_type: AdviceType, advisor: Advisor) -> &mut Self {
        self.advisors.add(advice_type, advisor);
        self
    }

    /// Names of the registered aspects, in registration order.
    #[must_use]
    pub fn aspects(&self) -> &[String] {
        &self.aspects
    }

    /// All advisors, regardless of pointcut.
    #[must_use]
    pub const fn advisors(&self) -> &AdvisorContainer {
        &self.advisors
    }
}

impl AdviceRegistry for AspectManager {
    fn advices_for(&self, method: &MethodId) -> AdvisorContainer {
        self.advisors.matching(method)
    }
}
