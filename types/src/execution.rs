use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

pub const NAMESPACE: &[u8] = b"_PALISADE";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

/// Largest accepted payload for [Instruction::Store].
pub const MAX_STORE_BYTES: usize = 4096;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // We don't include the signature as part of the digest (any valid
        // signature will be valid for the transaction)
        hasher.finalize()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Move balance to another account.
    /// Binary: [0] [to:32] [amount:u64 BE]
    Transfer { to: PublicKey, amount: u64 },

    /// Credit the sender's own balance (for testing/faucet).
    /// Binary: [1] [amount:u64 BE]
    Mint { amount: u64 },

    /// Store a content-addressed blob.
    /// Binary: [2] [dataLen:u32 BE] [data...]
    Store { data: Vec<u8> },
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Transfer { to, amount } => {
                0u8.write(writer);
                to.write(writer);
                amount.write(writer);
            }
            Self::Mint { amount } => {
                1u8.write(writer);
                amount.write(writer);
            }
            Self::Store { data } => {
                2u8.write(writer);
                (data.len() as u32).write(writer);
                writer.put_slice(data);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match reader.get_u8() {
            0 => Self::Transfer {
                to: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            1 => Self::Mint {
                amount: u64::read(reader)?,
            },
            2 => {
                let data_len = u32::read(reader)? as usize;
                if data_len > MAX_STORE_BYTES {
                    return Err(Error::Invalid("Instruction", "store payload too long"));
                }
                if reader.remaining() < data_len {
                    return Err(Error::EndOfBuffer);
                }
                let mut data = vec![0u8; data_len];
                reader.copy_to_slice(&mut data);
                Self::Store { data }
            }

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Transfer { to, amount } => to.encode_size() + amount.encode_size(),
                Self::Mint { amount } => amount.encode_size(),
                Self::Store { data } => 4 + data.len(),
            }
    }
}

/// Account state: replay-protection nonce and spendable balance.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
    pub balance: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.balance.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
            balance: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size() + self.balance.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account state (tag 0)
    Account(PublicKey),

    /// Content-addressed blob written by [Instruction::Store] (tag 1)
    Blob(Digest),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::Blob(digest) => {
                1u8.write(writer);
                digest.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match reader.get_u8() {
            0 => Self::Account(PublicKey::read(reader)?),
            1 => Self::Blob(Digest::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => PublicKey::SIZE,
                Self::Blob(_) => Digest::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    /// Account state (tag 0)
    Account(Account),

    /// Content-addressed blob (tag 1)
    Blob(Vec<u8>),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Blob(data) => {
                1u8.write(writer);
                (data.len() as u32).write(writer);
                writer.put_slice(data);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match reader.get_u8() {
            0 => Self::Account(Account::read(reader)?),
            1 => {
                let data_len = u32::read(reader)? as usize;
                if data_len > MAX_STORE_BYTES {
                    return Err(Error::Invalid("Value", "blob too long"));
                }
                if reader.remaining() < data_len {
                    return Err(Error::EndOfBuffer);
                }
                let mut data = vec![0u8; data_len];
                reader.copy_to_slice(&mut data);
                Self::Blob(data)
            }

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::Blob(data) => 4 + data.len(),
            }
    }
}

/// Emitted by the executor as transactions are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Transferred {
        from: PublicKey,
        to: PublicKey,
        amount: u64,
    },
    Minted {
        account: PublicKey,
        amount: u64,
    },
    Stored {
        digest: Digest,
        bytes: u64,
    },
}

/// Request to validate a transaction without applying it.
#[derive(Clone, Debug)]
pub struct CheckTxRequest {
    /// Encoded transaction bytes as submitted.
    pub tx: Vec<u8>,
    /// Whether this transaction already passed a full check and is only being
    /// re-validated (signature verification may be skipped).
    pub recheck: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckTxResponse {
    pub fuel_wanted: u64,
    pub fuel_used: u64,
}

/// Request to execute a transaction and commit its effects.
#[derive(Clone, Debug)]
pub struct DeliverTxRequest {
    /// Encoded transaction bytes as submitted.
    pub tx: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliverTxResponse {
    pub fuel_used: u64,
    pub events: Vec<Event>,
}

/// Request to execute a transaction against scratch state.
#[derive(Clone, Debug)]
pub struct SimulateTxRequest {
    /// Encoded transaction bytes as submitted.
    pub tx: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulateTxResponse {
    pub fuel_used: u64,
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_cryptography::ed25519::PrivateKey;
    use commonware_math::algebra::Random;
    use rand::{rngs::StdRng, SeedableRng};

    fn keypair(seed: u64) -> (PrivateKey, PublicKey) {
        let mut rng = StdRng::seed_from_u64(seed);
        let private = PrivateKey::random(&mut rng);
        let public = private.public_key();
        (private, public)
    }

    #[test]
    fn test_transaction_sign_verify() {
        let (private, public) = keypair(1);
        let (_, other) = keypair(2);

        let tx = Transaction::sign(&private, 0, Instruction::Transfer { to: other, amount: 10 });
        assert_eq!(tx.public, public);
        assert!(tx.verify());

        // Tampering with the nonce invalidates the signature.
        let mut tampered = tx.clone();
        tampered.nonce = 1;
        assert!(!tampered.verify());
    }

    #[test]
    fn test_transaction_codec_round_trip() {
        let (private, _) = keypair(1);
        let tx = Transaction::sign(
            &private,
            7,
            Instruction::Store {
                data: vec![1, 2, 3, 4],
            },
        );

        let encoded = tx.encode();
        assert_eq!(encoded.len(), tx.encode_size());
        let decoded = Transaction::read(&mut &encoded[..]).unwrap();
        assert_eq!(decoded, tx);
        assert!(decoded.verify());
    }

    #[test]
    fn test_store_rejects_oversized_payload() {
        let mut encoded = Vec::new();
        2u8.write(&mut encoded);
        ((MAX_STORE_BYTES + 1) as u32).write(&mut encoded);
        encoded.extend(std::iter::repeat(0u8).take(MAX_STORE_BYTES + 1));

        assert!(Instruction::read(&mut &encoded[..]).is_err());
    }

    #[test]
    fn test_digest_ignores_signature() {
        let (private, _) = keypair(1);
        let a = Transaction::sign(&private, 0, Instruction::Mint { amount: 5 });
        let b = Transaction::sign(&private, 0, Instruction::Mint { amount: 5 });
        assert_eq!(a.digest(), b.digest());

        let c = Transaction::sign(&private, 1, Instruction::Mint { amount: 5 });
        assert_ne!(a.digest(), c.digest());
    }
}
