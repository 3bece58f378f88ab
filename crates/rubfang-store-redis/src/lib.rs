//! Redis backend for the Rubfang survey store.
//!
//! Each collection is one string key holding the JSON array:
//! `<prefix>:feedback` and `<prefix>:registrations`.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{DEFAULT_KEY_PREFIX, RedisStore};
