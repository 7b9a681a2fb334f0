pub mod error;
pub use error::ExecutionError;
pub mod execution;
pub use execution::{transaction_namespace, MAX_STORE_BYTES, NAMESPACE, TRANSACTION_SUFFIX};
