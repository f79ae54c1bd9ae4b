//! Producers of new transactions for the broadcast loop.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::Transaction;
use crate::error::LedgercastResult;

/// Supplies the transaction appended on every broadcast tick.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn next_transaction(&self) -> LedgercastResult<Transaction>;
}

/// Returns the same fixed record on every call.
#[derive(Debug, Clone)]
pub struct MockTransactionSource {
    template: Transaction,
}

impl MockTransactionSource {
    pub fn new(template: Transaction) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &Transaction {
        &self.template
    }
}

impl Default for MockTransactionSource {
    fn default() -> Self {
        let date = NaiveDate::from_ymd_opt(2024, 2, 12).unwrap_or_default();
        Self::new(Transaction::new(date, -30.00, "Uber Ride"))
    }
}

#[async_trait]
impl TransactionSource for MockTransactionSource {
    async fn next_transaction(&self) -> LedgercastResult<Transaction> {
        Ok(self.template.clone())
    }
}
