//! Client Module
//!
//! The public face of the crate: single-operation transactions and the
//! classification of their outcomes.

mod classifier;
mod transaction;

pub use classifier::ErrorClassifier;
pub use transaction::TransactionSingleOp;
