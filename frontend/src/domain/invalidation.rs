//! Re-fetch signalling.
//!
//! A screen never patches its records after a mutation. It pushes an
//! [`Invalidated`] event instead, and its `sync` step drains the queue and
//! re-fetches each invalidated list once.

/// Kind of record whose remote state changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Customer,
    Deposit,
    Loan,
    Installment,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Invalidated {
    pub kind: EntityKind,
    pub account_number: String,
}

impl Invalidated {
    pub fn new(kind: EntityKind, account_number: impl Into<String>) -> Self {
        Self {
            kind,
            account_number: account_number.into(),
        }
    }
}

/// Pending invalidations in arrival order, without duplicates
#[derive(Debug, Clone, Default)]
pub struct InvalidationQueue {
    pending: Vec<Invalidated>,
}

impl InvalidationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event unless an identical one is already pending
    pub fn push(&mut self, event: Invalidated) {
        if !self.pending.contains(&event) {
            self.pending.push(event);
        }
    }

    pub fn drain(&mut self) -> Vec<Invalidated> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
