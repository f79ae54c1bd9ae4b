//! Transaction feed.

pub mod model;
pub mod source;

use chrono::NaiveDate;
use model::{Dataset, Transaction};

/// Transactions every dataset starts with, in append order.
const SEED_TRANSACTIONS: &[((i32, u32, u32), f64, &str)] = &[
    ((2025, 1, 1), -50.75, "Grocery Store"),
    ((2025, 1, 17), 1000.00, "Salary Deposit"),
    ((2025, 2, 2), 30.20, "Tax refund"),
    ((2025, 2, 15), 1000.00, "Salary Deposit"),
    ((2025, 3, 3), -15.50, "Transport"),
    ((2025, 3, 4), -80.00, "Entertainment"),
    ((2025, 4, 1), 1000.00, "Salary Deposit"),
    ((2025, 4, 2), -120.00, "Shopping"),
];

/// Build the seed transactions.
pub fn seed_transactions() -> Vec<Transaction> {
    SEED_TRANSACTIONS
        .iter()
        .filter_map(|&((y, m, d), amount, description)| {
            NaiveDate::from_ymd_opt(y, m, d).map(|date| Transaction::new(date, amount, description))
        })
        .collect()
}

/// Create a dataset pre-populated with the seed transactions.
pub fn seeded_dataset() -> Dataset {
    Dataset::from_transactions(seed_transactions())
}
