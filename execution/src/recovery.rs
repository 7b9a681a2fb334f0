//! Resolution of abnormal terminations into structured errors.
//!
//! A [RecoveryChain] is an ordered sequence of fault handlers. Each link
//! either resolves a caught payload into an [ExecutionError] or defers to the
//! next; a mandatory terminal formatter matches whatever is left, so
//! resolution can never silently swallow a fault. Links run forward-only and
//! at most once per resolution.
//!
//! A fault raised *inside* a link is deliberately not caught here: it unwinds
//! into whatever recovery scope wraps the call site (the fault boundary's
//! outer scope).

use crate::fuel::{FuelOverflow, OutOfFuel};
use palisade_types::ExecutionError;
use std::{any::Any, backtrace::Backtrace};

/// Payload carried by an abnormal termination, as yielded by the catch site.
pub type FaultPayload = Box<dyn Any + Send + 'static>;

type Link = Box<dyn Fn(&FaultPayload) -> Option<ExecutionError>>;

pub struct RecoveryChain {
    links: Vec<Link>,
    terminal: Box<dyn Fn(&FaultPayload) -> ExecutionError>,
}

impl RecoveryChain {
    /// Chain containing only the terminal formatter.
    pub fn new(terminal: impl Fn(&FaultPayload) -> ExecutionError + 'static) -> Self {
        Self {
            links: Vec::new(),
            terminal: Box::new(terminal),
        }
    }

    /// Append a link. Links are evaluated in insertion order, ahead of the
    /// terminal formatter.
    pub fn link(
        mut self,
        link: impl Fn(&FaultPayload) -> Option<ExecutionError> + 'static,
    ) -> Self {
        self.links.push(Box::new(link));
        self
    }

    /// Walk the chain until a link resolves the payload; the terminal
    /// formatter handles anything the links deferred on.
    pub fn resolve(&self, payload: &FaultPayload) -> ExecutionError {
        for link in &self.links {
            if let Some(err) = link(payload) {
                return err;
            }
        }
        (self.terminal)(payload)
    }

    /// The standard chain used by the fault boundary, head to tail:
    /// recognized fuel exhaustion, fuel accounting drift, then the catch-all.
    ///
    /// `fuel_wanted` is the transaction meter's limit and `fuel_used` its
    /// consumed total, both read at catch time.
    pub fn standard(fuel_wanted: u64, fuel_used: u64) -> Self {
        Self::new(aborted)
            .link(move |payload| {
                let fault = payload.downcast_ref::<OutOfFuel>()?;
                Some(ExecutionError::OutOfFuel(format!(
                    "out of fuel at {}: wanted {fuel_wanted}, used {fuel_used}",
                    fault.descriptor
                )))
            })
            .link(|payload| {
                let fault = payload.downcast_ref::<FuelOverflow>()?;
                Some(ExecutionError::FuelAccounting(format!(
                    "fuel counter drift at {}",
                    fault.descriptor
                )))
            })
    }
}

/// Terminal formatter: any payload becomes a generic abort carrying the
/// payload's text and a stack snapshot from the catch site.
fn aborted(payload: &FaultPayload) -> ExecutionError {
    let backtrace = Backtrace::force_capture();
    ExecutionError::Aborted(format!("{}\nstack:\n{backtrace}", describe(payload)))
}

/// Best-effort textual form of a fault payload.
pub fn describe(payload: &FaultPayload) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(fault) = payload.downcast_ref::<OutOfFuel>() {
        format!("out of fuel at {}", fault.descriptor)
    } else if let Some(fault) = payload.downcast_ref::<FuelOverflow>() {
        format!("fuel counter drift at {}", fault.descriptor)
    } else {
        "non-textual payload".to_string()
    }
}
