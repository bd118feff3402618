//! # Installment Screen State
//!
//! One borrower's loan: the loan record, its installments and the
//! outstanding amount, plus the installment, duration and deletion modals.

use log::{debug, warn};
use shared::{CalendarDay, NewInstallment};

use crate::domain::forms::{AmountForm, DurationForm};
use crate::domain::invalidation::{EntityKind, Invalidated, InvalidationQueue};
use crate::domain::ledger::LoanLedger;
use crate::services::api::ApiClient;
use crate::state::{DeletionFlow, DeletionTarget, Notice, Route};

/// Installment being edited. Installments are updated by account and date,
/// so the date is fixed for the lifetime of the edit.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentEdit {
    pub date: CalendarDay,
    pub amount: String,
}

#[derive(Debug, Clone)]
pub struct InstallmentScreen {
    account_number: String,
    ledger: LoanLedger,
    pub draft: AmountForm,
    pub show_add_modal: bool,
    pub edit: Option<InstallmentEdit>,
    pub duration: Option<DurationForm>,
    pub deletion: DeletionFlow,
    invalidations: InvalidationQueue,
    notice: Option<Notice>,
}

impl InstallmentScreen {
    pub fn new(account_number: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            ledger: LoanLedger::default(),
            draft: AmountForm::new(),
            show_add_modal: false,
            edit: None,
            duration: None,
            deletion: DeletionFlow::new(),
            invalidations: InvalidationQueue::new(),
            notice: None,
        }
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn ledger(&self) -> &LoanLedger {
        &self.ledger
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub async fn mount(&mut self, api: &ApiClient) {
        self.refresh_loan(api).await;
        self.refresh_installments(api).await;
    }

    pub async fn refresh_loan(&mut self, api: &ApiClient) {
        match api.get_loan(&self.account_number).await {
            Ok(loan) => {
                if loan.is_none() {
                    debug!("No loan on account {}", self.account_number);
                }
                self.ledger = std::mem::take(&mut self.ledger).with_loan(loan);
            }
            Err(e) => {
                warn!("Keeping previous loan of {}: {}", self.account_number, e);
                self.notice = Some(Notice::from(&e));
            }
        }
    }

    pub async fn refresh_installments(&mut self, api: &ApiClient) {
        match api.list_installments(&self.account_number).await {
            Ok(installments) => {
                let ledger = std::mem::take(&mut self.ledger);
                self.ledger = ledger.with_installments(installments);
            }
            Err(e) => {
                warn!("Keeping previous installments of {}: {}", self.account_number, e);
                self.notice = Some(Notice::from(&e));
            }
        }
    }

    /// Drain pending invalidations: at most one loan fetch and one
    /// installment fetch
    pub async fn sync(&mut self, api: &ApiClient) {
        let (mut loan, mut installments) = (false, false);
        for event in self.invalidations.drain() {
            if event.account_number != self.account_number {
                debug!("Ignoring invalidation for {}", event.account_number);
                continue;
            }
            match event.kind {
                EntityKind::Loan => loan = true,
                EntityKind::Installment => installments = true,
                EntityKind::Customer | EntityKind::Deposit => {}
            }
        }
        if loan {
            self.refresh_loan(api).await;
        }
        if installments {
            self.refresh_installments(api).await;
        }
    }

    pub fn open_add_modal(&mut self) {
        self.show_add_modal = true;
    }

    pub fn close_add_modal(&mut self) {
        self.show_add_modal = false;
        self.draft.clear_amount();
    }

    /// Submit the add-installment draft. Behaves like the deposit modal: the
    /// modal only stays open on a validation failure.
    pub async fn submit_installment(&mut self, api: &ApiClient) {
        let amount = match self.draft.to_amount() {
            Ok(amount) => amount,
            Err(e) => {
                self.notice = Some(Notice::from(e));
                return;
            }
        };

        let request = NewInstallment {
            account_number: self.account_number.clone(),
            date: self.draft.date,
            amount,
        };
        let result = api.add_installment(&request).await;
        self.close_add_modal();

        match result {
            Ok(_) => {
                self.notice = Some(Notice::success("Installment added successfully"));
                self.invalidate(EntityKind::Installment);
                self.sync(api).await;
            }
            Err(e) => self.notice = Some(Notice::from(&e)),
        }
    }

    /// Open the edit modal for an installment. Returns false when `id` is unknown.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        match self.ledger.find(id) {
            Some(installment) => {
                self.edit = Some(InstallmentEdit {
                    date: installment.date,
                    amount: installment.amount.to_string(),
                });
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Send the edit. Once the request is sent the edit modal closes and the
    /// installments are re-fetched, whatever the outcome.
    pub async fn submit_edit(&mut self, api: &ApiClient) {
        let Some(edit) = self.edit.as_ref() else {
            return;
        };
        let form = AmountForm {
            amount: edit.amount.clone(),
            date: edit.date,
        };
        let amount = match form.to_amount() {
            Ok(amount) => amount,
            Err(e) => {
                self.notice = Some(Notice::from(e));
                return;
            }
        };

        let result = api.update_installment(&self.account_number, form.date, amount).await;
        self.edit = None;
        self.notice = Some(match result {
            Ok(()) => Notice::success("Installment updated successfully"),
            Err(e) => Notice::from(&e),
        });
        self.invalidate(EntityKind::Installment);
        self.sync(api).await;
    }

    /// Open the duration modal prefilled with the current duration.
    /// Returns false when no loan is loaded.
    pub fn begin_duration_edit(&mut self) -> bool {
        match self.ledger.loan() {
            Some(loan) => {
                self.duration = Some(DurationForm::new(loan.duration));
                true
            }
            None => false,
        }
    }

    pub fn cancel_duration_edit(&mut self) {
        self.duration = None;
    }

    /// Change the loan duration, then re-fetch the loan so the outstanding
    /// amount reflects the new term
    pub async fn submit_duration(&mut self, api: &ApiClient) {
        let Some(form) = self.duration.as_ref() else {
            return;
        };
        let months = match form.to_duration() {
            Ok(months) => months,
            Err(e) => {
                self.notice = Some(Notice::from(e));
                return;
            }
        };

        match api.update_loan_duration(&self.account_number, months).await {
            Ok(()) => {
                self.duration = None;
                self.notice = Some(Notice::success("Duration updated successfully"));
                self.invalidate(EntityKind::Loan);
                self.sync(api).await;
            }
            Err(e) => self.notice = Some(Notice::from(&e)),
        }
    }

    pub fn request_delete(&mut self, id: impl Into<String>) {
        self.deletion.request(DeletionTarget::Installment {
            account_number: self.account_number.clone(),
            id: id.into(),
        });
    }

    pub fn request_delete_loan(&mut self) {
        self.deletion.request(DeletionTarget::LoanAccount {
            account_number: self.account_number.clone(),
        });
    }

    pub fn cancel_delete(&mut self) {
        self.deletion.cancel();
    }

    /// Execute the pending deletion and re-fetch. Returns the screen to go to
    /// when the loan itself was deleted.
    pub async fn confirm_delete(&mut self, api: &ApiClient) -> Option<Route> {
        let outcome = self.deletion.confirm(api).await?;
        self.notice = Some(outcome.notice());
        for event in outcome.invalidated {
            self.invalidations.push(event);
        }
        self.sync(api).await;
        outcome.navigate_to
    }

    fn invalidate(&mut self, kind: EntityKind) {
        self.invalidations.push(Invalidated::new(kind, self.account_number.clone()));
    }
}
