//! # Modal State Module
//!
//! Alerts and the two-step deletion flow.
//!
//! ## Responsibilities:
//! - [`Notice`]: the single title/message alert a screen shows after an action
//! - [`DeletionFlow`]: `Idle` / `ConfirmPending` state machine; the delete
//!   request is only sent from [`DeletionFlow::confirm`]

use log::{info, warn};

use crate::domain::forms::ValidationError;
use crate::domain::invalidation::{EntityKind, Invalidated};
use crate::services::api::{ApiClient, ApiError};
use crate::state::Route;

/// An alert shown to the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.title != "Success"
    }
}

impl From<&ApiError> for Notice {
    fn from(error: &ApiError) -> Self {
        Notice::error(error.user_message())
    }
}

impl From<ValidationError> for Notice {
    fn from(error: ValidationError) -> Self {
        Self {
            title: error.title().to_string(),
            message: error.to_string(),
        }
    }
}

/// What a pending deletion will remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionTarget {
    Deposit { account_number: String, id: String },
    Installment { account_number: String, id: String },
    /// The depositor and every deposit of the account
    DepositAccount { account_number: String },
    /// The loan and every installment of the account
    LoanAccount { account_number: String },
}

impl DeletionTarget {
    pub fn account_number(&self) -> &str {
        match self {
            DeletionTarget::Deposit { account_number, .. }
            | DeletionTarget::Installment { account_number, .. }
            | DeletionTarget::DepositAccount { account_number }
            | DeletionTarget::LoanAccount { account_number } => account_number,
        }
    }

    /// Question shown while the deletion waits for confirmation
    pub fn prompt(&self) -> String {
        match self {
            DeletionTarget::Deposit { .. } => {
                "Are you sure you want to delete this deposit?".to_string()
            }
            DeletionTarget::Installment { .. } => {
                "Are you sure you want to delete this installment?".to_string()
            }
            DeletionTarget::DepositAccount { account_number } => format!(
                "Delete account {} and all of its deposits? This cannot be undone.",
                account_number
            ),
            DeletionTarget::LoanAccount { account_number } => format!(
                "Delete the loan on {} and all of its installments? This cannot be undone.",
                account_number
            ),
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            DeletionTarget::Deposit { .. } => "Deposit deleted successfully",
            DeletionTarget::Installment { .. } => "Installment deleted successfully",
            DeletionTarget::DepositAccount { .. } => "Account deleted successfully",
            DeletionTarget::LoanAccount { .. } => "Loan deleted successfully",
        }
    }

    /// Every record kind the backend removes along with the target
    fn invalidates(&self) -> &'static [EntityKind] {
        match self {
            DeletionTarget::Deposit { .. } => &[EntityKind::Deposit],
            DeletionTarget::Installment { .. } => &[EntityKind::Installment],
            DeletionTarget::DepositAccount { .. } => {
                &[EntityKind::Customer, EntityKind::Deposit]
            }
            DeletionTarget::LoanAccount { .. } => &[EntityKind::Loan, EntityKind::Installment],
        }
    }

    fn navigates_to(&self) -> Option<Route> {
        match self {
            DeletionTarget::DepositAccount { .. } => Some(Route::Depositors),
            DeletionTarget::LoanAccount { .. } => Some(Route::Loans),
            _ => None,
        }
    }
}

/// Result of a confirmed deletion
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionOutcome {
    pub target: DeletionTarget,
    pub result: Result<(), ApiError>,
    /// Emitted whether or not the delete succeeded; the screen re-fetches
    /// to show whatever the backend now holds
    pub invalidated: Vec<Invalidated>,
    /// Set only for account-level deletions that succeeded
    pub navigate_to: Option<Route>,
}

impl DeletionOutcome {
    pub fn notice(&self) -> Notice {
        match &self.result {
            Ok(()) => Notice::success(self.target.success_message()),
            Err(e) => Notice::from(e),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeletionFlow {
    #[default]
    Idle,
    ConfirmPending(DeletionTarget),
}

impl DeletionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for confirmation. Replaces any deletion already pending.
    pub fn request(&mut self, target: DeletionTarget) {
        *self = DeletionFlow::ConfirmPending(target);
    }

    pub fn cancel(&mut self) {
        *self = DeletionFlow::Idle;
    }

    pub fn pending(&self) -> Option<&DeletionTarget> {
        match self {
            DeletionFlow::Idle => None,
            DeletionFlow::ConfirmPending(target) => Some(target),
        }
    }

    /// Send the pending delete. Returns `None` when nothing was pending.
    pub async fn confirm(&mut self, api: &ApiClient) -> Option<DeletionOutcome> {
        let target = match std::mem::take(self) {
            DeletionFlow::Idle => return None,
            DeletionFlow::ConfirmPending(target) => target,
        };

        let result = match &target {
            DeletionTarget::Deposit { id, .. } => api.delete_deposit(id).await,
            DeletionTarget::Installment { id, .. } => api.delete_installment(id).await,
            DeletionTarget::DepositAccount { account_number } => {
                api.delete_customer_and_deposits(account_number).await
            }
            DeletionTarget::LoanAccount { account_number } => api.delete_loan(account_number).await,
        };

        match &result {
            Ok(()) => info!("Deletion confirmed: {:?}", target),
            Err(e) => warn!("Deletion of {:?} failed: {}", target, e),
        }

        let navigate_to = if result.is_ok() { target.navigates_to() } else { None };
        Some(DeletionOutcome {
            invalidated: target
                .invalidates()
                .iter()
                .map(|kind| Invalidated::new(*kind, target.account_number()))
                .collect(),
            navigate_to,
            result,
            target,
        })
    }
}
