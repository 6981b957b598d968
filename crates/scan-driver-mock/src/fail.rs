//! Deterministic failure injection for mock devices.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

/// Fails an operation after a configured number of successful calls.
///
/// Once tripped, the operation keeps failing until the plan is replaced.
pub(crate) struct FailPlan<Op> {
    plans: Mutex<HashMap<Op, u32>>,
}

impl<Op: Eq + Hash + Copy> FailPlan<Op> {
    pub fn new() -> Self {
        Self {
            plans: Mutex::new(HashMap::new()),
        }
    }

    /// Let `op` succeed `successes` more times, then fail every call.
    pub fn fail_after(&self, op: Op, successes: u32) {
        self.plans.lock().insert(op, successes);
    }

    pub fn check(&self, op: Op, label: &str) -> anyhow::Result<()> {
        if let Some(remaining) = self.plans.lock().get_mut(&op) {
            if *remaining == 0 {
                anyhow::bail!("injected {label} failure");
            }
            *remaining -= 1;
        }
        Ok(())
    }
}
