//! Palisade execution layer.
//!
//! This crate contains the fault-isolated transaction execution pipeline: a
//! base ledger state machine ([Ledger]) and the containment machinery that
//! keeps abnormal terminations inside it ([FaultBoundary], [RecoveryChain]).
//!
//! ## Fault containment
//! Untrusted transaction logic runs behind [FaultBoundary], which intercepts
//! any unwinding fault at the three entry points (check, deliver, simulate)
//! and resolves it into a structured [palisade_types::ExecutionError] through
//! an ordered recovery chain. On the deliver path a second, nested recovery
//! scope reconciles the transaction fuel meter into the block meter after
//! every execution attempt, so a fault during the accounting itself is shaped
//! by the same machinery. Callers never observe a panic, only a response or
//! an error.
//!
//! ## Fuel accounting invariants
//! - A meter's `consumed` counter never decreases.
//! - Charges past the limit are recorded before the fault is raised, so
//!   reconciliation charges the block for real usage, capped at the
//!   transaction's limit.
//! - A block counter observed moving backwards across reconciliation is an
//!   accounting violation and surfaces as its own error kind.
//!
//! ## Minimal pipeline (example)
//! ```rust,ignore
//! use palisade_execution::{
//!     BoundedFuelMeter, ExecutionContext, FaultBoundary, Ledger, Memory, TxHandler,
//! };
//!
//! # async fn example(tx: &palisade_types::execution::Transaction,
//! #                  req: palisade_types::execution::DeliverTxRequest) {
//! let mut handler = FaultBoundary::new(Ledger::new(Memory::default()));
//! let mut block_meter = BoundedFuelMeter::new(1_000_000);
//! let mut ctx = ExecutionContext::new(
//!     Box::new(BoundedFuelMeter::new(10_000)),
//!     &mut block_meter,
//! );
//! // Never panics: faults come back as structured errors.
//! let _result = handler.deliver_tx(&mut ctx, tx, req).await;
//! # }
//! ```

pub mod fuel;
pub mod recovery;

mod boundary;
mod context;
mod handler;
mod ledger;
mod state;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use boundary::FaultBoundary;
pub use context::ExecutionContext;
pub use fuel::{BoundedFuelMeter, FuelMeter, FuelOverflow, OutOfFuel, UnboundedFuelMeter};
pub use handler::TxHandler;
pub use ledger::Ledger;
pub use recovery::{FaultPayload, RecoveryChain};
pub use state::{Overlay, State, Status};

#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;
