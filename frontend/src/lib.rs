//! Field-agent client for the Loan Book microfinance ledger.
//!
//! - [`services`]: HTTP client, configuration and date helpers
//! - [`domain`]: form validation, ledger totals and re-fetch signalling
//! - [`state`]: one state struct per screen

pub mod domain;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_utils;

pub use services::api::{ApiClient, ApiError};
pub use services::config::{ClientConfig, ConflictDraftPolicy};
