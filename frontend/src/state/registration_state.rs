//! # Registration State
//!
//! The add-customer and add-loan screens.
//!
//! ## Responsibilities:
//! - Hold the draft and validate it before anything is sent
//! - On success: show a notice, reset the draft, route to the list screen
//! - On a duplicate account number: apply the configured [`ConflictDraftPolicy`]

use log::{info, warn};
use shared::CustomerType;

use crate::domain::forms::{CustomerForm, LoanForm};
use crate::services::api::{ApiClient, ApiError};
use crate::services::config::ConflictDraftPolicy;
use crate::state::{Notice, Route};

fn keeps_draft(error: &ApiError, policy: ConflictDraftPolicy) -> bool {
    !matches!(
        (error, policy),
        (ApiError::Conflict(_), ConflictDraftPolicy::Clear)
    )
}

/// Customer registration screen. New customers are depositors unless the
/// agent picks otherwise.
#[derive(Debug, Clone)]
pub struct CustomerRegistration {
    pub form: CustomerForm,
    policy: ConflictDraftPolicy,
    notice: Option<Notice>,
}

impl CustomerRegistration {
    const DEFAULT_TYPE: CustomerType = CustomerType::Depositor;

    pub fn new(policy: ConflictDraftPolicy) -> Self {
        Self {
            form: CustomerForm::new(Self::DEFAULT_TYPE),
            policy,
            notice: None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Validate and send the draft. Returns the next screen on success.
    pub async fn submit(&mut self, api: &ApiClient) -> Option<Route> {
        let request = match self.form.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.notice = Some(Notice::from(e));
                return None;
            }
        };

        match api.create_customer(&request).await {
            Ok(customer) => {
                info!("Registered customer {}", customer.account_number);
                self.notice = Some(Notice::success("Customer added successfully"));
                self.form.reset(Self::DEFAULT_TYPE);
                Some(Route::Depositors)
            }
            Err(e) => {
                warn!("Customer registration failed: {}", e);
                if !keeps_draft(&e, self.policy) {
                    self.form.reset(Self::DEFAULT_TYPE);
                }
                self.notice = Some(Notice::from(&e));
                None
            }
        }
    }
}

/// Loan issue screen
#[derive(Debug, Clone)]
pub struct LoanRegistration {
    pub form: LoanForm,
    policy: ConflictDraftPolicy,
    notice: Option<Notice>,
}

impl LoanRegistration {
    pub fn new(policy: ConflictDraftPolicy) -> Self {
        Self {
            form: LoanForm::new(),
            policy,
            notice: None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub async fn submit(&mut self, api: &ApiClient) -> Option<Route> {
        let request = match self.form.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.notice = Some(Notice::from(e));
                return None;
            }
        };

        match api.create_loan(&request).await {
            Ok(loan) => {
                info!("Issued loan of {} to {}", loan.loan_amount, loan.account_number);
                self.notice = Some(Notice::success("Loan Issued Successfully."));
                self.form.reset();
                Some(Route::Loans)
            }
            Err(e) => {
                warn!("Loan issue failed: {}", e);
                if !keeps_draft(&e, self.policy) {
                    self.form.reset();
                }
                self.notice = Some(Notice::from(&e));
                None
            }
        }
    }
}
