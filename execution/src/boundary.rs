//! Fault containment around the three execution entry points.
//!
//! [FaultBoundary] decorates a [TxHandler] so that no abnormal termination
//! inside it can cross the call boundary: every caught fault is resolved into
//! an [ExecutionError] through the standard [RecoveryChain]. On the commit
//! path it additionally reconciles the transaction fuel meter into the block
//! meter after every execution attempt, inside a second recovery scope nested
//! under the first, so a fault raised by the reconciliation itself is shaped
//! by the same machinery.

use crate::{
    context::ExecutionContext,
    fuel::FuelOverflow,
    handler::TxHandler,
    recovery::{FaultPayload, RecoveryChain},
};
use futures::FutureExt;
use palisade_types::{
    execution::{
        CheckTxRequest, CheckTxResponse, DeliverTxRequest, DeliverTxResponse, SimulateTxRequest,
        SimulateTxResponse, Transaction,
    },
    ExecutionError,
};
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

pub struct FaultBoundary<H> {
    inner: H,
}

impl<H> FaultBoundary<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

/// Resolve a caught fault through the standard recovery chain.
///
/// The transaction meter's limit is expected to have been set by an earlier
/// processing stage (fee handling); if it wasn't, the reported `wanted` is
/// whatever the caller constructed the meter with.
fn resolve(ctx: &ExecutionContext<'_>, payload: FaultPayload) -> ExecutionError {
    let chain = RecoveryChain::standard(ctx.fuel_meter().limit(), ctx.fuel_meter().consumed());
    let err = chain.resolve(&payload);
    warn!(%err, "recovered abnormal termination");
    err
}

/// Fold the transaction meter into the block meter and verify the block
/// counter did not move backwards.
///
/// Runs after every execution attempt on the commit path, normal or aborted.
/// Charges what the transaction actually used, capped at its limit (not the
/// full limit). Its own faults, including the block meter exhausting, unwind
/// into the caller's outer recovery scope.
fn reconcile_block_fuel(ctx: &mut ExecutionContext<'_>, starting_consumed: u64) {
    let used = ctx.fuel_meter().consumed_to_limit();
    ctx.block_fuel_meter_mut().consume(used, "block fuel meter");

    if ctx.block_fuel_meter().consumed() < starting_consumed {
        panic::panic_any(FuelOverflow {
            descriptor: "transaction fuel summation".to_string(),
        });
    }
}

impl<H: TxHandler> TxHandler for FaultBoundary<H> {
    async fn check_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
        req: CheckTxRequest,
    ) -> Result<CheckTxResponse, ExecutionError> {
        match AssertUnwindSafe(self.inner.check_tx(ctx, tx, req))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(resolve(ctx, payload)),
        }
    }

    async fn deliver_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
        req: DeliverTxRequest,
    ) -> Result<DeliverTxResponse, ExecutionError> {
        // Only run the transaction if there is block fuel remaining.
        if ctx.block_fuel_meter().is_exhausted() {
            return Err(ExecutionError::OutOfFuel(
                "no block fuel left to run transaction".to_string(),
            ));
        }
        let starting_consumed = ctx.block_fuel_meter().consumed();

        // Two nested recovery scopes. The inner one intercepts the handler's
        // fault so reconciliation runs on every exit path, then re-raises it;
        // the outer one resolves whatever reaches it, whether that fault came
        // from the handler or from the reconciliation itself.
        let outcome = AssertUnwindSafe(async {
            let result = AssertUnwindSafe(self.inner.deliver_tx(ctx, tx, req))
                .catch_unwind()
                .await;
            reconcile_block_fuel(ctx, starting_consumed);
            match result {
                Ok(result) => result,
                Err(payload) => panic::resume_unwind(payload),
            }
        })
        .catch_unwind()
        .await;

        match outcome {
            Ok(result) => result,
            Err(payload) => Err(resolve(ctx, payload)),
        }
    }

    async fn simulate_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
        req: SimulateTxRequest,
    ) -> Result<SimulateTxResponse, ExecutionError> {
        // Simulation never touches committed block state, so there is no
        // block-fuel interaction here.
        match AssertUnwindSafe(self.inner.simulate_tx(ctx, tx, req))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(resolve(ctx, payload)),
        }
    }
}
