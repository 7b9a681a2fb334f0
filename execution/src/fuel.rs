//! Fuel metering for transaction execution.
//!
//! A meter tracks a monotonically non-decreasing `consumed` counter against a
//! fixed `limit`. Exceeding the limit is an abnormal termination, not an error
//! return: [FuelMeter::consume] raises an [OutOfFuel] fault that unwinds until
//! a recovery scope catches it. The overshooting charge is recorded *before*
//! the fault is raised so that [FuelMeter::consumed_to_limit] reflects real
//! usage when the block meter is reconciled afterwards.

use std::panic::panic_any;

/// Fault raised when a meter's limit is exceeded. Carries a descriptor naming
/// the charge site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutOfFuel {
    pub descriptor: String,
}

/// Fault raised when fuel accounting itself goes wrong: a counter would wrap,
/// or a block counter was observed moving backwards during reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuelOverflow {
    pub descriptor: String,
}

/// Budget tracker for one execution scope (a transaction or a block).
///
/// Implementations must keep `consumed` monotonically non-decreasing.
pub trait FuelMeter: Send {
    /// Maximum budget, fixed at creation.
    fn limit(&self) -> u64;

    /// Total fuel charged so far. May exceed [FuelMeter::limit].
    fn consumed(&self) -> u64;

    /// Consumed fuel, capped at the meter's limit. This is the amount a
    /// transaction meter contributes to its block meter.
    fn consumed_to_limit(&self) -> u64 {
        self.consumed().min(self.limit())
    }

    fn remaining(&self) -> u64 {
        self.limit().saturating_sub(self.consumed())
    }

    fn is_exhausted(&self) -> bool {
        self.consumed() >= self.limit()
    }

    /// Charge `amount` fuel for the site named by `descriptor`. Raises an
    /// [OutOfFuel] fault once the total passes the limit (the charge itself is
    /// still recorded first) and a [FuelOverflow] fault if the counter would
    /// wrap.
    fn consume(&mut self, amount: u64, descriptor: &str);
}

/// The standard limit-bound meter used for both transaction and block scopes.
#[derive(Clone, Debug)]
pub struct BoundedFuelMeter {
    limit: u64,
    consumed: u64,
}

impl BoundedFuelMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }
}

impl FuelMeter for BoundedFuelMeter {
    fn limit(&self) -> u64 {
        self.limit
    }

    fn consumed(&self) -> u64 {
        self.consumed
    }

    fn consume(&mut self, amount: u64, descriptor: &str) {
        let Some(total) = self.consumed.checked_add(amount) else {
            panic_any(FuelOverflow {
                descriptor: descriptor.to_string(),
            });
        };
        self.consumed = total;
        if self.consumed > self.limit {
            panic_any(OutOfFuel {
                descriptor: descriptor.to_string(),
            });
        }
    }
}

/// Meter that never exhausts. Used where execution should not be budget-bound
/// (e.g. simulation without a caller-provided limit).
#[derive(Clone, Debug, Default)]
pub struct UnboundedFuelMeter {
    consumed: u64,
}

impl FuelMeter for UnboundedFuelMeter {
    fn limit(&self) -> u64 {
        u64::MAX
    }

    fn consumed(&self) -> u64 {
        self.consumed
    }

    fn consume(&mut self, amount: u64, descriptor: &str) {
        let Some(total) = self.consumed.checked_add(amount) else {
            panic_any(FuelOverflow {
                descriptor: descriptor.to_string(),
            });
        };
        self.consumed = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_consume_within_limit() {
        let mut meter = BoundedFuelMeter::new(100);
        meter.consume(40, "work");
        meter.consume(60, "work");

        assert_eq!(meter.consumed(), 100);
        assert_eq!(meter.remaining(), 0);
        assert!(meter.is_exhausted());
    }

    #[test]
    fn test_consume_past_limit_records_then_faults() {
        let mut meter = BoundedFuelMeter::new(100);
        meter.consume(90, "work");

        let result = catch_unwind(AssertUnwindSafe(|| meter.consume(30, "storage read")));
        let payload = result.unwrap_err();
        let fault = payload.downcast_ref::<OutOfFuel>().expect("OutOfFuel fault");
        assert_eq!(fault.descriptor, "storage read");

        // The overshooting charge is recorded; the contribution to a block
        // meter is capped.
        assert_eq!(meter.consumed(), 120);
        assert_eq!(meter.consumed_to_limit(), 100);
    }

    #[test]
    fn test_consume_overflow_faults_without_recording() {
        let mut meter = BoundedFuelMeter::new(u64::MAX);
        meter.consume(u64::MAX - 1, "work");

        let result = catch_unwind(AssertUnwindSafe(|| meter.consume(2, "work")));
        let payload = result.unwrap_err();
        assert!(payload.downcast_ref::<FuelOverflow>().is_some());
        assert_eq!(meter.consumed(), u64::MAX - 1);
    }

    #[test]
    fn test_unbounded_never_exhausts() {
        let mut meter = UnboundedFuelMeter::default();
        meter.consume(1 << 40, "work");

        assert_eq!(meter.consumed(), 1 << 40);
        assert!(!meter.is_exhausted());
        assert_eq!(meter.consumed_to_limit(), 1 << 40);
    }

    proptest! {
        #[test]
        fn test_consumed_is_monotonic(limit in 0u64..10_000, charges in prop::collection::vec(0u64..1_000, 0..32)) {
            let mut meter = BoundedFuelMeter::new(limit);
            let mut last = 0;
            for charge in charges {
                let before = meter.consumed();
                // Exceeding the limit faults, but the charge must still land.
                let _ = catch_unwind(AssertUnwindSafe(|| meter.consume(charge, "work")));
                prop_assert_eq!(meter.consumed(), before + charge);
                prop_assert!(meter.consumed() >= last);
                prop_assert!(meter.consumed_to_limit() <= limit);
                last = meter.consumed();
            }
        }
    }
}
