//! Transaction domain models.

use chrono::NaiveDate;
use serde::{ser::Error as _, Deserialize, Serialize, Serializer};

use crate::error::LedgercastResult;

/// A single ledger entry.
///
/// Negative amounts are debits, positive amounts are credits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_finite")]
    pub amount: f64,
    pub description: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, amount: f64, description: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            description: description.into(),
        }
    }

    pub fn is_debit(&self) -> bool {
        self.amount < 0.0
    }
}

/// JSON has no representation for NaN or infinity; refuse instead of emitting `null`.
fn serialize_finite<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !amount.is_finite() {
        return Err(S::Error::custom(format!("amount {} is not a finite number", amount)));
    }
    serializer.serialize_f64(*amount)
}

/// Append-only, ordered collection of transactions shared by every client.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    transactions: Vec<Transaction>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Append a transaction at the end. A record that cannot be encoded is
    /// rejected and the dataset is left unchanged.
    pub fn try_push(&mut self, transaction: Transaction) -> LedgercastResult<()> {
        serde_json::to_value(&transaction)?;
        self.transactions.push(transaction);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn last(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Encode the whole dataset as the JSON array pushed to clients.
    pub fn to_payload(&self) -> LedgercastResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgercastError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_transaction_wire_format() {
        let tx = Transaction::new(date(2024, 2, 12), -30.0, "Uber Ride");
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "date": "2024-02-12", "amount": -30.0, "description": "Uber Ride" })
        );
    }

    #[test]
    fn test_payload_is_full_array_in_append_order() {
        let mut dataset = Dataset::new();
        dataset
            .try_push(Transaction::new(date(2025, 1, 1), -50.75, "Grocery Store"))
            .unwrap();
        dataset
            .try_push(Transaction::new(date(2025, 1, 17), 1000.0, "Salary Deposit"))
            .unwrap();

        let payload = dataset.to_payload().unwrap();
        let decoded: Vec<Transaction> = serde_json::from_str(&payload).unwrap();
        assert_eq!(decoded, dataset.transactions());
        assert!(payload.starts_with(r#"[{"date":"2025-01-01","amount":-50.75"#));
    }

    #[test]
    fn test_empty_dataset_payload() {
        assert_eq!(Dataset::new().to_payload().unwrap(), "[]");
    }

    #[test]
    fn test_non_finite_amount_fails_to_encode() {
        let dataset = Dataset::from_transactions(vec![Transaction::new(
            date(2025, 1, 1),
            f64::NAN,
            "Broken",
        )]);
        assert!(matches!(dataset.to_payload(), Err(LedgercastError::Json(_))));
    }

    #[test]
    fn test_try_push_rejects_unencodable_record() {
        let mut dataset = Dataset::new();
        dataset.try_push(Transaction::new(date(2025, 1, 1), 10.0, "Ok")).unwrap();
        assert!(dataset
            .try_push(Transaction::new(date(2025, 1, 2), f64::INFINITY, "Bad"))
            .is_err());
        assert_eq!(dataset.len(), 1);
        assert!(dataset.to_payload().is_ok());
    }

    #[test]
    fn test_is_debit() {
        assert!(Transaction::new(date(2025, 1, 1), -0.01, "x").is_debit());
        assert!(!Transaction::new(date(2025, 1, 1), 0.0, "x").is_debit());
    }
}
