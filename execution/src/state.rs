use anyhow::Result;
use palisade_types::execution::{Key, Value};
use std::{collections::BTreeMap, future::Future};

#[cfg(any(test, feature = "mocks"))]
use std::collections::HashMap;

/// Pending mutation for a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Update(Value),
    Delete,
}

pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = Result<()>>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = Result<()>>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = Result<()>> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await?,
                    Status::Delete => self.delete(&key).await?,
                }
            }
            Ok(())
        }
    }
}

/// Buffers writes over a read-only view of `S` until committed.
///
/// Reads see pending writes first, then fall through to the underlying state.
/// Dropping the overlay discards everything (the simulation path);
/// [Overlay::commit] extracts the changes for application (the deliver path).
pub struct Overlay<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,
}

impl<'a, S: State> Overlay<'a, S> {
    pub fn new(state: &'a S) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),
        }
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Overlay<'a, S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.pending.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.pending.insert(key.clone(), Status::Delete);
        Ok(())
    }
}

#[cfg(any(test, feature = "mocks"))]
#[derive(Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

#[cfg(any(test, feature = "mocks"))]
impl State for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.state.get(key).cloned())
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.state.insert(key, value);
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.state.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_runtime::{deterministic::Runner, Runner as _};
    use palisade_types::execution::Account;

    fn account_key(seed: u64) -> Key {
        use commonware_cryptography::{ed25519::PrivateKey, Signer};
        use commonware_math::algebra::Random;
        use rand::{rngs::StdRng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(seed);
        Key::Account(PrivateKey::random(&mut rng).public_key())
    }

    #[test]
    fn test_overlay_reads_through_and_shadows() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut base = Memory::default();
            let key = account_key(1);
            base.insert(
                key.clone(),
                Value::Account(Account {
                    nonce: 1,
                    balance: 50,
                }),
            )
            .await
            .unwrap();

            let mut overlay = Overlay::new(&base);
            assert_eq!(
                overlay.get(&key).await.unwrap(),
                Some(Value::Account(Account {
                    nonce: 1,
                    balance: 50,
                }))
            );

            overlay
                .insert(
                    key.clone(),
                    Value::Account(Account {
                        nonce: 2,
                        balance: 40,
                    }),
                )
                .await
                .unwrap();
            assert_eq!(
                overlay.get(&key).await.unwrap(),
                Some(Value::Account(Account {
                    nonce: 2,
                    balance: 40,
                }))
            );

            overlay.delete(&key).await.unwrap();
            assert_eq!(overlay.get(&key).await.unwrap(), None);

            // The base is untouched until changes are applied.
            assert_eq!(
                base.get(&key).await.unwrap(),
                Some(Value::Account(Account {
                    nonce: 1,
                    balance: 50,
                }))
            );
        });
    }

    #[test]
    fn test_commit_then_apply() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut base = Memory::default();
            let key = account_key(1);

            let mut overlay = Overlay::new(&base);
            overlay
                .insert(
                    key.clone(),
                    Value::Account(Account {
                        nonce: 1,
                        balance: 10,
                    }),
                )
                .await
                .unwrap();
            let changes = overlay.commit();

            base.apply(changes).await.unwrap();
            assert_eq!(
                base.get(&key).await.unwrap(),
                Some(Value::Account(Account {
                    nonce: 1,
                    balance: 10,
                }))
            );
        });
    }
}
