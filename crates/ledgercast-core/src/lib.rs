//! Ledgercast Core Library
//!
//! Transaction model, the shared dataset and the sources that feed it.

pub mod error;
pub mod transaction;

pub use error::{LedgercastError, LedgercastResult};
pub use transaction::model::{Dataset, Transaction};
pub use transaction::source::{MockTransactionSource, TransactionSource};
