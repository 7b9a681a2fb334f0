use crate::{context::ExecutionContext, fuel::OutOfFuel, handler::TxHandler};
use commonware_codec::Encode;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_math::algebra::Random;
use palisade_types::{
    execution::{
        CheckTxRequest, CheckTxResponse, DeliverTxRequest, DeliverTxResponse, SimulateTxRequest,
        SimulateTxResponse, Transaction,
    },
    ExecutionError,
};
use rand::{rngs::StdRng, SeedableRng};
use std::panic::panic_any;

/// Creates an account keypair for Ed25519 signatures used by users
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::random(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Build the check request matching a signed transaction.
pub fn check_request(tx: &Transaction, recheck: bool) -> CheckTxRequest {
    CheckTxRequest {
        tx: tx.encode().to_vec(),
        recheck,
    }
}

/// Build the deliver request matching a signed transaction.
pub fn deliver_request(tx: &Transaction) -> DeliverTxRequest {
    DeliverTxRequest {
        tx: tx.encode().to_vec(),
    }
}

/// Build the simulate request matching a signed transaction.
pub fn simulate_request(tx: &Transaction) -> SimulateTxRequest {
    SimulateTxRequest {
        tx: tx.encode().to_vec(),
    }
}

/// What a [ScriptedHandler] does after burning its fuel.
#[derive(Clone, Copy, Debug)]
pub enum Fault {
    /// Return a canned success.
    None,
    /// Raise a recognized out-of-fuel fault with this descriptor.
    OutOfFuel(&'static str),
    /// Raise an arbitrary payload.
    Message(&'static str),
}

/// Handler that burns a scripted amount of transaction fuel, then faults or
/// succeeds, counting how often each entry point ran.
pub struct ScriptedHandler {
    consume: u64,
    fault: Fault,
    pub check_calls: usize,
    pub deliver_calls: usize,
    pub simulate_calls: usize,
}

impl ScriptedHandler {
    pub fn new(consume: u64, fault: Fault) -> Self {
        Self {
            consume,
            fault,
            check_calls: 0,
            deliver_calls: 0,
            simulate_calls: 0,
        }
    }

    fn run(&self, ctx: &mut ExecutionContext<'_>) -> u64 {
        if self.consume > 0 {
            ctx.fuel_meter_mut().consume(self.consume, "work");
        }
        match self.fault {
            Fault::None => ctx.fuel_meter().consumed(),
            Fault::OutOfFuel(descriptor) => panic_any(OutOfFuel {
                descriptor: descriptor.to_string(),
            }),
            Fault::Message(msg) => panic_any(msg),
        }
    }
}

impl TxHandler for ScriptedHandler {
    async fn check_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        _tx: &Transaction,
        _req: CheckTxRequest,
    ) -> Result<CheckTxResponse, ExecutionError> {
        self.check_calls += 1;
        let fuel_used = self.run(ctx);
        Ok(CheckTxResponse {
            fuel_wanted: ctx.fuel_meter().limit(),
            fuel_used,
        })
    }

    async fn deliver_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        _tx: &Transaction,
        _req: DeliverTxRequest,
    ) -> Result<DeliverTxResponse, ExecutionError> {
        self.deliver_calls += 1;
        let fuel_used = self.run(ctx);
        Ok(DeliverTxResponse {
            fuel_used,
            events: Vec::new(),
        })
    }

    async fn simulate_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        _tx: &Transaction,
        _req: SimulateTxRequest,
    ) -> Result<SimulateTxResponse, ExecutionError> {
        self.simulate_calls += 1;
        let fuel_used = self.run(ctx);
        Ok(SimulateTxResponse {
            fuel_used,
            events: Vec::new(),
        })
    }
}
