//! # Depositor List State
//!
//! The list of depositors with its optional filter. The list is re-fetched
//! every time the screen gains focus; a failed fetch keeps what was shown.

use log::warn;
use shared::{Customer, CustomerFilter};

use crate::services::api::ApiClient;
use crate::state::{Notice, Route};

#[derive(Debug, Clone, Default)]
pub struct DepositorList {
    depositors: Vec<Customer>,
    pub filter: CustomerFilter,
    notice: Option<Notice>,
}

impl DepositorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depositors(&self) -> &[Customer] {
        &self.depositors
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Re-fetch with the current filter. On failure the last good list stays.
    pub async fn refresh(&mut self, api: &ApiClient) {
        let result = if self.filter.is_empty() {
            api.list_depositors().await
        } else {
            api.list_depositors_filtered(&self.filter).await
        };

        match result {
            Ok(depositors) => {
                self.depositors = depositors;
                self.notice = None;
            }
            Err(e) => {
                warn!("Keeping {} depositors after failed refresh: {}", self.depositors.len(), e);
                self.notice = Some(Notice::from(&e));
            }
        }
    }

    pub async fn apply_filter(&mut self, api: &ApiClient, filter: CustomerFilter) {
        self.filter = filter;
        self.refresh(api).await;
    }

    pub async fn clear_filter(&mut self, api: &ApiClient) {
        self.filter = CustomerFilter::default();
        self.refresh(api).await;
    }

    /// Open the deposit screen of the depositor at `index`
    pub fn open(&self, index: usize) -> Option<Route> {
        self.depositors
            .get(index)
            .map(|c| Route::Deposit(c.account_number.clone()))
    }
}
