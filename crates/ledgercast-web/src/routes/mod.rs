//! Route handlers.

pub mod status;
pub mod transactions;
