//! # Deposit Screen State
//!
//! One depositor's account: the customer record, the deposit ledger, the
//! add/edit deposit modals and the deletion flow.
//!
//! ## Responsibilities:
//! - Load the customer and deposits when the screen mounts
//! - Submit, edit and delete deposits, then re-fetch through [`DepositScreen::sync`]
//! - Close the whole account (customer plus deposits) in one call

use log::{debug, warn};
use shared::{Customer, NewDeposit};

use crate::domain::forms::AmountForm;
use crate::domain::invalidation::{EntityKind, Invalidated, InvalidationQueue};
use crate::domain::ledger::DepositLedger;
use crate::services::api::{ApiClient, ApiError};
use crate::state::{DeletionFlow, DeletionTarget, Notice, Route};

/// Deposit being edited
#[derive(Debug, Clone, PartialEq)]
pub struct DepositEdit {
    pub id: String,
    pub form: AmountForm,
}

#[derive(Debug, Clone)]
pub struct DepositScreen {
    account_number: String,
    customer: Option<Customer>,
    ledger: DepositLedger,
    /// Add-deposit modal draft
    pub draft: AmountForm,
    pub show_add_modal: bool,
    pub edit: Option<DepositEdit>,
    pub deletion: DeletionFlow,
    invalidations: InvalidationQueue,
    notice: Option<Notice>,
}

impl DepositScreen {
    pub fn new(account_number: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            customer: None,
            ledger: DepositLedger::default(),
            draft: AmountForm::new(),
            show_add_modal: false,
            edit: None,
            deletion: DeletionFlow::new(),
            invalidations: InvalidationQueue::new(),
            notice: None,
        }
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn ledger(&self) -> &DepositLedger {
        &self.ledger
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Load the customer and the deposits of the account
    pub async fn mount(&mut self, api: &ApiClient) {
        self.refresh_customer(api).await;
        self.refresh(api).await;
    }

    /// Re-fetch the customer record. A 404 means the account no longer
    /// exists; any other failure keeps the record already shown.
    pub async fn refresh_customer(&mut self, api: &ApiClient) {
        match api.get_customer(&self.account_number).await {
            Ok(customer) => self.customer = Some(customer),
            Err(ApiError::Server { status: 404, .. }) => {
                debug!("No customer on account {}", self.account_number);
                self.customer = None;
            }
            Err(e) => {
                warn!("Could not load customer {}: {}", self.account_number, e);
                self.notice = Some(Notice::from(&e));
            }
        }
    }

    /// Re-fetch the deposits. On failure the ledger keeps its last good state.
    pub async fn refresh(&mut self, api: &ApiClient) {
        match api.list_deposits(&self.account_number).await {
            Ok(deposits) => self.ledger = DepositLedger::derive(deposits),
            Err(e) => {
                warn!("Keeping previous deposits of {}: {}", self.account_number, e);
                self.notice = Some(Notice::from(&e));
            }
        }
    }

    /// Drain pending invalidations: at most one customer fetch and one
    /// deposit fetch
    pub async fn sync(&mut self, api: &ApiClient) {
        let (mut customer, mut deposits) = (false, false);
        for event in self.invalidations.drain() {
            if event.account_number != self.account_number {
                debug!("Ignoring invalidation for {}", event.account_number);
                continue;
            }
            match event.kind {
                EntityKind::Customer => customer = true,
                EntityKind::Deposit => deposits = true,
                EntityKind::Loan | EntityKind::Installment => {}
            }
        }
        if customer {
            self.refresh_customer(api).await;
        }
        if deposits {
            self.refresh(api).await;
        }
    }

    pub fn open_add_modal(&mut self) {
        self.show_add_modal = true;
    }

    pub fn close_add_modal(&mut self) {
        self.show_add_modal = false;
        self.draft.clear_amount();
    }

    /// Submit the add-deposit draft.
    ///
    /// A validation failure keeps the modal and draft as they are. Once the
    /// request has been sent the modal closes and the amount is cleared,
    /// whatever the outcome.
    pub async fn submit_deposit(&mut self, api: &ApiClient) {
        let amount = match self.draft.to_amount() {
            Ok(amount) => amount,
            Err(e) => {
                self.notice = Some(Notice::from(e));
                return;
            }
        };

        let request = NewDeposit {
            account_number: self.account_number.clone(),
            date: self.draft.date,
            amount,
        };
        let result = api.add_deposit(&request).await;
        self.close_add_modal();

        match result {
            Ok(_) => {
                self.notice = Some(Notice::success("Deposit submitted successfully!"));
                self.invalidate();
                self.sync(api).await;
            }
            Err(e) => self.notice = Some(Notice::from(&e)),
        }
    }

    /// Open the edit modal for a deposit. Returns false when `id` is unknown.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        match self.ledger.find(id) {
            Some(deposit) => {
                self.edit = Some(DepositEdit {
                    id: deposit.id.clone(),
                    form: AmountForm::with_amount(deposit.amount, deposit.date),
                });
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Send the edit. The edit modal closes once the request is sent,
    /// whatever the outcome.
    pub async fn submit_edit(&mut self, api: &ApiClient) {
        let Some(edit) = self.edit.as_ref() else {
            return;
        };
        let amount = match edit.form.to_amount() {
            Ok(amount) => amount,
            Err(e) => {
                self.notice = Some(Notice::from(e));
                return;
            }
        };

        let update = NewDeposit {
            account_number: self.account_number.clone(),
            date: edit.form.date,
            amount,
        };
        let result = api.update_deposit(&edit.id, &update).await;
        self.edit = None;

        match result {
            Ok(()) => {
                self.notice = Some(Notice::success("Deposit updated successfully"));
                self.invalidate();
                self.sync(api).await;
            }
            Err(e) => self.notice = Some(Notice::from(&e)),
        }
    }

    pub fn request_delete(&mut self, id: impl Into<String>) {
        self.deletion.request(DeletionTarget::Deposit {
            account_number: self.account_number.clone(),
            id: id.into(),
        });
    }

    pub fn request_close_account(&mut self) {
        self.deletion.request(DeletionTarget::DepositAccount {
            account_number: self.account_number.clone(),
        });
    }

    pub fn cancel_delete(&mut self) {
        self.deletion.cancel();
    }

    /// Execute the pending deletion and re-fetch. Returns the screen to go to
    /// when the whole account was closed.
    pub async fn confirm_delete(&mut self, api: &ApiClient) -> Option<Route> {
        let outcome = self.deletion.confirm(api).await?;
        self.notice = Some(outcome.notice());
        for event in outcome.invalidated {
            self.invalidations.push(event);
        }
        self.sync(api).await;
        outcome.navigate_to
    }

    fn invalidate(&mut self) {
        self.invalidations
            .push(Invalidated::new(EntityKind::Deposit, self.account_number.clone()));
    }
}
