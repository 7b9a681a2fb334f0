use crate::{
    context::ExecutionContext,
    handler::TxHandler,
    state::{Overlay, State},
};
use commonware_cryptography::{ed25519::PublicKey, sha256::Sha256, Hasher};
use palisade_types::{
    execution::{
        Account, CheckTxRequest, CheckTxResponse, DeliverTxRequest, DeliverTxResponse, Event,
        Instruction, Key, SimulateTxRequest, SimulateTxResponse, Transaction, Value,
        MAX_STORE_BYTES,
    },
    ExecutionError,
};
use tracing::debug;

/// Flat charge applied to every submitted transaction.
const FUEL_TX_BASE: u64 = 10;
/// Charge per byte of encoded transaction.
const FUEL_TX_BYTE: u64 = 1;
/// Charge per state read.
const FUEL_STATE_READ: u64 = 5;
/// Charge per state write.
const FUEL_STATE_WRITE: u64 = 10;
/// Charge per byte of stored blob data.
const FUEL_STORE_BYTE: u64 = 2;

fn state_error(err: anyhow::Error) -> ExecutionError {
    ExecutionError::State(err.to_string())
}

async fn load_account<S: State>(
    state: &S,
    public: &PublicKey,
) -> Result<Account, ExecutionError> {
    Ok(
        match state
            .get(&Key::Account(public.clone()))
            .await
            .map_err(state_error)?
        {
            Some(Value::Account(account)) => account,
            _ => Account::default(),
        },
    )
}

/// Charge the flat and per-byte intake cost for a submitted transaction.
fn charge_intake(ctx: &mut ExecutionContext<'_>, tx_bytes: usize) {
    let charge = FUEL_TX_BASE.saturating_add(FUEL_TX_BYTE.saturating_mul(tx_bytes as u64));
    ctx.fuel_meter_mut().consume(charge, "transaction bytes");
}

/// Minimal ledger state machine: the wrapped handler the fault boundary
/// protects.
///
/// Applies transfers, mints, and blob stores against a [State], charging fuel
/// through the context's transaction meter as it goes. Exhausting the meter
/// mid-execution is an abnormal termination; it only becomes an error once a
/// [crate::FaultBoundary] wraps this handler.
pub struct Ledger<S: State> {
    state: S,
}

impl<S: State> Ledger<S> {
    pub fn new(state: S) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    /// Validate the nonce and apply the instruction against `view`.
    async fn execute<T: State>(
        view: &mut T,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
    ) -> Result<Vec<Event>, ExecutionError> {
        ctx.fuel_meter_mut().consume(FUEL_STATE_READ, "account read");
        let mut account = load_account(view, &tx.public).await?;
        if account.nonce != tx.nonce {
            debug!(
                public = ?tx.public,
                expected = account.nonce,
                got = tx.nonce,
                "nonce mismatch"
            );
            return Err(ExecutionError::InvalidTransaction(format!(
                "nonce mismatch: expected {}, got {}",
                account.nonce, tx.nonce
            )));
        }
        account.nonce += 1;

        let mut events = Vec::new();
        match &tx.instruction {
            Instruction::Transfer { to, amount } => {
                let Some(debited) = account.balance.checked_sub(*amount) else {
                    return Err(ExecutionError::InvalidTransaction(format!(
                        "insufficient balance: have {}, need {}",
                        account.balance, amount
                    )));
                };
                account.balance = debited;
                view.insert(Key::Account(tx.public.clone()), Value::Account(account))
                    .await
                    .map_err(state_error)?;
                ctx.fuel_meter_mut()
                    .consume(FUEL_STATE_WRITE, "account write");

                // Reading back through the view makes self-transfers a no-op
                // on the balance while still bumping the nonce.
                ctx.fuel_meter_mut().consume(FUEL_STATE_READ, "account read");
                let mut recipient = load_account(view, to).await?;
                recipient.balance = recipient.balance.checked_add(*amount).ok_or_else(|| {
                    ExecutionError::InvalidTransaction("recipient balance overflow".to_string())
                })?;
                view.insert(Key::Account(to.clone()), Value::Account(recipient))
                    .await
                    .map_err(state_error)?;
                ctx.fuel_meter_mut()
                    .consume(FUEL_STATE_WRITE, "account write");

                events.push(Event::Transferred {
                    from: tx.public.clone(),
                    to: to.clone(),
                    amount: *amount,
                });
            }
            Instruction::Mint { amount } => {
                account.balance = account.balance.checked_add(*amount).ok_or_else(|| {
                    ExecutionError::InvalidTransaction("balance overflow".to_string())
                })?;
                view.insert(Key::Account(tx.public.clone()), Value::Account(account))
                    .await
                    .map_err(state_error)?;
                ctx.fuel_meter_mut()
                    .consume(FUEL_STATE_WRITE, "account write");

                events.push(Event::Minted {
                    account: tx.public.clone(),
                    amount: *amount,
                });
            }
            Instruction::Store { data } => {
                if data.len() > MAX_STORE_BYTES {
                    return Err(ExecutionError::InvalidTransaction(format!(
                        "store payload too large: {} bytes (max {MAX_STORE_BYTES})",
                        data.len()
                    )));
                }
                view.insert(Key::Account(tx.public.clone()), Value::Account(account))
                    .await
                    .map_err(state_error)?;
                ctx.fuel_meter_mut()
                    .consume(FUEL_STATE_WRITE, "account write");

                ctx.fuel_meter_mut()
                    .consume(FUEL_STORE_BYTE.saturating_mul(data.len() as u64), "store bytes");
                let digest = Sha256::hash(data);
                view.insert(Key::Blob(digest), Value::Blob(data.clone()))
                    .await
                    .map_err(state_error)?;
                ctx.fuel_meter_mut().consume(FUEL_STATE_WRITE, "blob write");

                events.push(Event::Stored {
                    digest,
                    bytes: data.len() as u64,
                });
            }
        }

        Ok(events)
    }
}

impl<S: State> TxHandler for Ledger<S> {
    async fn check_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
        req: CheckTxRequest,
    ) -> Result<CheckTxResponse, ExecutionError> {
        charge_intake(ctx, req.tx.len());
        if !req.recheck && !tx.verify() {
            return Err(ExecutionError::InvalidTransaction(
                "signature verification failed".to_string(),
            ));
        }

        ctx.fuel_meter_mut().consume(FUEL_STATE_READ, "account read");
        let account = load_account(&self.state, &tx.public).await?;
        if account.nonce != tx.nonce {
            return Err(ExecutionError::InvalidTransaction(format!(
                "nonce mismatch: expected {}, got {}",
                account.nonce, tx.nonce
            )));
        }

        Ok(CheckTxResponse {
            fuel_wanted: ctx.fuel_meter().limit(),
            fuel_used: ctx.fuel_meter().consumed(),
        })
    }

    async fn deliver_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
        req: DeliverTxRequest,
    ) -> Result<DeliverTxResponse, ExecutionError> {
        charge_intake(ctx, req.tx.len());
        if !tx.verify() {
            return Err(ExecutionError::InvalidTransaction(
                "signature verification failed".to_string(),
            ));
        }

        let mut view = Overlay::new(&self.state);
        let events = Self::execute(&mut view, ctx, tx).await?;
        let changes = view.commit();
        self.state.apply(changes).await.map_err(state_error)?;

        Ok(DeliverTxResponse {
            fuel_used: ctx.fuel_meter().consumed(),
            events,
        })
    }

    async fn simulate_tx(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        tx: &Transaction,
        req: SimulateTxRequest,
    ) -> Result<SimulateTxResponse, ExecutionError> {
        charge_intake(ctx, req.tx.len());

        // Simulations run against a throwaway view and skip signature
        // verification (dry runs may be unsigned).
        let mut view = Overlay::new(&self.state);
        let events = Self::execute(&mut view, ctx, tx).await?;

        Ok(SimulateTxResponse {
            fuel_used: ctx.fuel_meter().consumed(),
            events,
        })
    }
}
