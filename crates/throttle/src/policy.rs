//! What happens to in-flight tasks once the first failure settles the outcome.

/// Failure handling for tasks still running when another task fails.
///
/// Whichever failure settles first in wall-clock time is the one returned.
/// With tasks of comparable latency this can differ between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return immediately. Workers keep running in the background: in-flight
    /// tasks finish and the remaining tasks are still claimed and invoked,
    /// but their results, successful or not, are never observed.
    #[default]
    Detach,
    /// Stop claiming new tasks and wait for in-flight tasks to settle before
    /// returning the first failure.
    Drain,
    /// Cancel in-flight tasks at their next suspension point.
    Abort,
}

impl FailurePolicy {
    /// Whether workers go on claiming tasks once the outcome has settled.
    pub fn claims_after_failure(self) -> bool {
        matches!(self, FailurePolicy::Detach)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_detach_keeps_claiming() {
        assert!(FailurePolicy::default().claims_after_failure());
        assert!(!FailurePolicy::Drain.claims_after_failure());
        assert!(!FailurePolicy::Abort.claims_after_failure());
    }
}
