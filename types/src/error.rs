use thiserror::Error;

/// Structured error returned across the execution call boundary.
///
/// Every abnormal termination inside the execution pipeline is resolved into
/// one of these kinds before it reaches the caller: the variant is the
/// error-kind tag and the payload is the human-readable message. Callers never
/// observe an unwinding panic from an entry point, only a response or one of
/// these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// A fuel meter's limit was exceeded, either inside transaction execution
    /// or by the block-level pre-check that refuses to start a transaction
    /// once the block budget is spent.
    #[error("out of fuel: {0}")]
    OutOfFuel(String),

    /// The wrapped handler terminated abnormally with an unrecognized fault.
    /// The message carries the fault payload's textual form and a stack
    /// snapshot captured at the catch site.
    #[error("execution aborted: {0}")]
    Aborted(String),

    /// Fuel accounting drifted: a counter overflowed, or the block counter
    /// moved backwards during reconciliation. Signals a bug in resource
    /// accounting, not a problem with the transaction.
    #[error("fuel accounting violation: {0}")]
    FuelAccounting(String),

    /// The transaction failed validation before or during application.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The state backend failed.
    #[error("state error: {0}")]
    State(String),
}
