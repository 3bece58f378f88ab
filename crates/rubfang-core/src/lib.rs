//! Core types and rules for the Rubfang survey backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::DocumentStore`]; the HTTP layer drives
//! [`Survey`].

// Store traits use native `async fn`; the futures are bounded `Send`
// explicitly in the trait signatures.
#![allow(async_fn_in_trait)]

pub mod dashboard;
pub mod error;
pub mod feedback;
pub mod gate;
pub mod memory;
pub mod registration;
pub mod service;
pub mod store;

pub use error::{Error, Result};
pub use service::{Survey, SurveyRules};
