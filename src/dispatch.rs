//! Join-point dispatch: runs advisor groups around an intercepted call.
//!
//! Every intercepted call walks the same state machine:
//!
//! ```text
//! Start -> RunBefore -> ShortCircuit ------------------------> RunAfter -> Done
//!                    \-> InvokeOriginal -> RunAfterReturning -/
//!                                      \-> RunAfterThrowing --/
//! ```
//!
//! A before advisor that sets a return value short-circuits the call and
//! the original method never runs. After advisors always run. A pending
//! exception is raised once they are done; otherwise the return value is
//! the result.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::advice::{AdviceType, AdvisorContainer, AdvisorGroup};
use crate::joinpoint::{Fault, JoinPoint, MethodId, Receiver, Value};

/// Source of the advisors that apply to a method.
pub trait AdviceRegistry: Send + Sync {
    fn advices_for(&self, method: &MethodId) -> AdvisorContainer;
}

/// The object or class an intercepted call is made on.
pub trait CallTarget {
    fn class_name(&self) -> &str;

    fn receiver(&self) -> Receiver;

    /// Call the renamed original method.
    fn invoke(&mut self, method: &str, arguments: &[Value]) -> Result<Value, Fault>;

    /// Parameter names of `method`, used for named argument lookups.
    fn parameter_names(&self, _method: &str) -> Vec<String> {
        Vec::new()
    }
}

/// An intercepted call as forwarded by a woven stub.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub internal_method: String,
    pub arguments: Vec<Value>,
}

impl Call {
    #[must_use]
    pub fn new(method: &str, internal_method: &str, arguments: Vec<Value>) -> Self {
        Self {
            method: method.to_string(),
            internal_method: internal_method.to_string(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    RunBefore,
    ShortCircuit,
    InvokeOriginal,
    RunAfterReturning,
    RunAfterThrowing,
    RunAfter,
    Done,
}

/// Run the before group. Returns `true` if an advisor provided a return
/// value.
fn run_before(group: &AdvisorGroup, join_point: &mut JoinPoint) -> Result<bool, Fault> {
    for advisor in group {
        advisor.invoke(join_point)?;
        if join_point.return_value().is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run the after-throwing group. Each advisor's own change decides the
/// outcome: a new exception replaces any suppression, a new return value
/// suppresses the pending exception.
fn run_after_throwing(group: &AdvisorGroup, join_point: &mut JoinPoint) -> Result<(), Fault> {
    for advisor in group {
        let returned = join_point.return_value().cloned();
        let raised = join_point.exception().cloned();
        advisor.invoke(join_point)?;

        if join_point.exception().is_some() && join_point.exception() != raised.as_ref() {
            join_point.clear_return_value();
        } else if join_point.return_value().is_some()
            && join_point.return_value() != returned.as_ref()
        {
            join_point.set_exception(None);
        }
    }
    Ok(())
}

fn run_all(group: &AdvisorGroup, join_point: &mut JoinPoint) -> Result<(), Fault> {
    group.iter().try_for_each(|advisor| advisor.invoke(join_point))
}

/// Dispatch `call` on `target` through the advisors `registry` provides.
///
/// Without a registry, or when no advisor applies, the original is
/// called directly.
pub fn dispatch(
    registry: Option<&dyn AdviceRegistry>,
    call: Call,
    target: &mut dyn CallTarget,
) -> Result<Value, Fault> {
    let Call {
        method,
        internal_method,
        arguments,
    } = call;
    let id = MethodId::new(target.class_name(), &method);

    let advisors = registry.map(|r| r.advices_for(&id)).unwrap_or_default();
    if advisors.is_empty() {
        trace!(method = %id, "no advisors, calling original");
        return target.invoke(&internal_method, &arguments);
    }

    let mut join_point = JoinPoint::new(id, arguments, target.receiver())
        .with_parameter_names(target.parameter_names(&method));
    let mut advice_failure = None;
    let mut phase = Phase::Start;

    while phase != Phase::Done {
        let next = match phase {
            Phase::Start => Phase::RunBefore,
            Phase::RunBefore => {
                match run_before(advisors.group(AdviceType::Before), &mut join_point) {
                    Ok(true) => Phase::ShortCircuit,
                    Ok(false) => Phase::InvokeOriginal,
                    Err(fault) => {
                        advice_failure = Some(fault);
                        Phase::RunAfter
                    }
                }
            }
            Phase::ShortCircuit => Phase::RunAfter,
            Phase::InvokeOriginal => {
                match target.invoke(&internal_method, join_point.arguments()) {
                    Ok(value) => {
                        join_point.set_return_value(value);
                        Phase::RunAfterReturning
                    }
                    Err(fault) => {
                        join_point.set_exception(Some(fault));
                        Phase::RunAfterThrowing
                    }
                }
            }
            Phase::RunAfterReturning => {
                if let Err(fault) = run_all(advisors.after_returning(), &mut join_point) {
                    advice_failure = Some(fault);
                }
                Phase::RunAfter
            }
            Phase::RunAfterThrowing => {
                if let Err(fault) = run_after_throwing(advisors.after_throwing(), &mut join_point) {
                    advice_failure = Some(fault);
                }
                Phase::RunAfter
            }
            Phase::RunAfter => {
                run_all(advisors.after(), &mut join_point)?;
                Phase::Done
            }
            Phase::Done => Phase::Done,
        };
        trace!(method = %join_point.method(), from = ?phase, to = ?next, "dispatch");
        phase = next;
    }

    if let Some(fault) = advice_failure {
        return Err(fault);
    }
    if let Some(fault) = join_point.take_exception() {
        return Err(fault);
    }
    Ok(join_point.take_return_value().unwrap_or_default())
}

static REGISTRY: RwLock<Option<Arc<dyn AdviceRegistry>>> = RwLock::new(None);

/// Install the process-wide registry used by [`handle_call`]. Returns
/// the previous one.
pub fn set_registry(
    registry: Option<Arc<dyn AdviceRegistry>>,
) -> Option<Arc<dyn AdviceRegistry>> {
    std::mem::replace(&mut *REGISTRY.write(), registry)
}

#[must_use]
pub fn has_registry() -> bool {
    REGISTRY.read().is_some()
}

#[must_use]
pub fn registry() -> Option<Arc<dyn AdviceRegistry>> {
    REGISTRY.read().clone()
}

pub fn clear_registry() {
    set_registry(None);
}

/// Entry point for woven stubs: dispatches through the process-wide
/// registry.
pub fn handle_call(
    method: &str,
    internal_method: &str,
    target: &mut dyn CallTarget,
    arguments: Vec<Value>,
) -> Result<Value, Fault> {
    let registry = registry();
    dispatch(
        registry.as_deref(),
        Call::new(method, internal_method, arguments),
        target,
    )
}
