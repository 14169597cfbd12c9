//! Deterministic fault injection for testing
//!
//! Tests describe which requests should fail in a [`FaultPlan`]; the
//! simulated service consults a [`FaultInjector`] before serving each request.
//! A request failed by injection does not touch any volume.
//!
//! ## Example
//!
//! ```
//! use fs_api::FsError;
//! use sim_fs::fault_injection::{FaultPlan, RequestFault};
//! use sim_fs::RequestKind;
//!
//! let plan = FaultPlan::new()
//!     .with_fault(RequestFault::FailNext {
//!         kind: RequestKind::Write,
//!         count: 1,
//!         error: FsError::Io("card removed".to_string()),
//!     })
//!     .with_fault(RequestFault::FailAfter {
//!         kind: RequestKind::Read,
//!         successes: 3,
//!         error: FsError::Io("timeout".to_string()),
//!     });
//! assert_eq!(plan.faults().len(), 2);
//! ```

use crate::RequestKind;
use fs_api::FsError;

/// A fault to inject into request handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFault {
    /// Fail the next `count` requests of `kind`
    FailNext {
        kind: RequestKind,
        count: usize,
        error: FsError,
    },

    /// Let `successes` requests of `kind` through, then fail every later one
    FailAfter {
        kind: RequestKind,
        successes: usize,
        error: FsError,
    },
}

/// A plan describing all faults to inject
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    faults: Vec<RequestFault>,
}

impl FaultPlan {
    /// Creates a new empty fault plan
    pub fn new() -> Self {
        Self { faults: Vec::new() }
    }

    /// Adds a fault to the plan
    pub fn with_fault(mut self, fault: RequestFault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Shorthand for failing the next request of `kind` once
    pub fn fail_next(kind: RequestKind, error: FsError) -> Self {
        Self::new().with_fault(RequestFault::FailNext {
            kind,
            count: 1,
            error,
        })
    }

    pub fn faults(&self) -> &[RequestFault] {
        &self.faults
    }
}

#[derive(Debug, Clone)]
enum Trigger {
    Next { remaining: usize },
    After { remaining_successes: usize },
}

#[derive(Debug, Clone)]
struct ArmedFault {
    kind: RequestKind,
    trigger: Trigger,
    error: FsError,
}

/// Fault injector that decides, per request, whether to fail it
#[derive(Debug, Default)]
pub struct FaultInjector {
    armed: Vec<ArmedFault>,
    injected: usize,
}

impl FaultInjector {
    /// Creates a new fault injector with the given plan
    pub fn new(plan: FaultPlan) -> Self {
        let armed = plan
            .faults
            .into_iter()
            .map(|fault| match fault {
                RequestFault::FailNext { kind, count, error } => ArmedFault {
                    kind,
                    trigger: Trigger::Next { remaining: count },
                    error,
                },
                RequestFault::FailAfter {
                    kind,
                    successes,
                    error,
                } => ArmedFault {
                    kind,
                    trigger: Trigger::After {
                        remaining_successes: successes,
                    },
                    error,
                },
            })
            .collect();

        Self { armed, injected: 0 }
    }

    /// Returns the error to fail this request with, if any
    ///
    /// `FailNext` faults take precedence over `FailAfter` faults.
    pub fn check(&mut self, kind: RequestKind) -> Option<FsError> {
        for fault in self.armed.iter_mut().filter(|f| f.kind == kind) {
            if let Trigger::Next { remaining } = &mut fault.trigger {
                if *remaining > 0 {
                    *remaining -= 1;
                    self.injected += 1;
                    return Some(fault.error.clone());
                }
            }
        }

        let mut result = None;
        for fault in self.armed.iter_mut().filter(|f| f.kind == kind) {
            if let Trigger::After {
                remaining_successes,
            } = &mut fault.trigger
            {
                if *remaining_successes == 0 {
                    result.get_or_insert_with(|| fault.error.clone());
                } else {
                    *remaining_successes -= 1;
                }
            }
        }

        if result.is_some() {
            self.injected += 1;
        }
        result
    }

    /// Returns how many requests have been failed by injection
    pub fn injected(&self) -> usize {
        self.injected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io(msg: &str) -> FsError {
        FsError::Io(msg.to_string())
    }

    #[test]
    fn test_fault_plan_creation() {
        let plan = FaultPlan::new();
        assert!(plan.faults().is_empty());
    }

    #[test]
    fn test_fail_next() {
        let plan = FaultPlan::new().with_fault(RequestFault::FailNext {
            kind: RequestKind::Write,
            count: 2,
            error: io("boom"),
        });
        let mut injector = FaultInjector::new(plan);

        assert_eq!(injector.check(RequestKind::Read), None);
        assert_eq!(injector.check(RequestKind::Write), Some(io("boom")));
        assert_eq!(injector.check(RequestKind::Write), Some(io("boom")));
        assert_eq!(injector.check(RequestKind::Write), None);
        assert_eq!(injector.injected(), 2);
    }

    #[test]
    fn test_fail_after() {
        let plan = FaultPlan::new().with_fault(RequestFault::FailAfter {
            kind: RequestKind::OpenArchive,
            successes: 1,
            error: FsError::NoSpace,
        });
        let mut injector = FaultInjector::new(plan);

        assert_eq!(injector.check(RequestKind::OpenArchive), None);
        assert_eq!(
            injector.check(RequestKind::OpenArchive),
            Some(FsError::NoSpace)
        );
        assert_eq!(
            injector.check(RequestKind::OpenArchive),
            Some(FsError::NoSpace)
        );
    }

    #[test]
    fn test_fail_next_shorthand() {
        let mut injector = FaultInjector::new(FaultPlan::fail_next(
            RequestKind::ControlArchive,
            io("commit"),
        ));
        assert_eq!(
            injector.check(RequestKind::ControlArchive),
            Some(io("commit"))
        );
        assert_eq!(injector.check(RequestKind::ControlArchive), None);
    }

    #[test]
    fn test_empty_plan_never_fails() {
        let mut injector = FaultInjector::new(FaultPlan::new());
        assert_eq!(injector.check(RequestKind::Connect), None);
        assert_eq!(injector.injected(), 0);
    }
}
