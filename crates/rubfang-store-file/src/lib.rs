//! JSON-file backend for the Rubfang survey store.
//!
//! Each collection is one pretty-printed JSON array in the data directory:
//! `feedback.json` and `registrations.json`.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::FileStore;
