//! # Screen State
//!
//! One explicit state struct per screen. Each owns its records, drafts,
//! deletion flow and the notice currently shown to the agent, and talks to
//! the backend only through [`ApiClient`](crate::services::api::ApiClient).

pub mod deposit_state;
pub mod depositor_state;
pub mod installment_state;
pub mod modal_state;
pub mod registration_state;

pub use deposit_state::DepositScreen;
pub use depositor_state::DepositorList;
pub use installment_state::InstallmentScreen;
pub use modal_state::{DeletionFlow, DeletionOutcome, DeletionTarget, Notice};
pub use registration_state::{CustomerRegistration, LoanRegistration};

/// Where a screen asks to go next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Depositors,
    Loans,
    Deposit(String),
}
