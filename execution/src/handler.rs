use crate::context::ExecutionContext;
use palisade_types::{
    execution::{
        CheckTxRequest, CheckTxResponse, DeliverTxRequest, DeliverTxResponse, SimulateTxRequest,
        SimulateTxResponse, Transaction,
    },
    ExecutionError,
};
use std::future::Future;

/// The three-operation transaction handler contract.
///
/// Both the base executor ([crate::Ledger]) and the fault boundary
/// ([crate::FaultBoundary]) implement this trait, so the boundary slots into a
/// handler chain as a decorator: it consumes the same contract it exposes.
pub trait TxHandler {
    /// Validate a transaction without applying it.
    fn check_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
        req: CheckTxRequest,
    ) -> impl Future<Output = Result<CheckTxResponse, ExecutionError>>;

    /// Execute a transaction and commit its effects.
    fn deliver_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
        req: DeliverTxRequest,
    ) -> impl Future<Output = Result<DeliverTxResponse, ExecutionError>>;

    /// Execute a transaction against scratch state, discarding all effects.
    fn simulate_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
        req: SimulateTxRequest,
    ) -> impl Future<Output = Result<SimulateTxResponse, ExecutionError>>;
}
