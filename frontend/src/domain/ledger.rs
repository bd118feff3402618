//! Balance and outstanding-amount derivation.
//!
//! Every figure here is recomputed from the records of the latest fetch. The
//! ledger types keep their records and derived totals private and can only be
//! rebuilt wholesale through `derive`, so a total can never disagree with the
//! records it was computed from.

use shared::{Deposit, Installment, Loan};

/// Sign of an amount for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountType {
    NonNegative,
    Negative,
}

impl AmountType {
    pub fn of(amount: f64) -> Self {
        if amount < 0.0 {
            AmountType::Negative
        } else {
            AmountType::NonNegative
        }
    }
}

/// Sum of all deposit amounts; withdrawals are negative deposits
pub fn total_balance(deposits: &[Deposit]) -> f64 {
    deposits.iter().map(|d| d.amount).sum()
}

/// Principal plus flat (non-compounding) interest over the whole duration.
///
/// `interest` is a percentage per month and `duration` is in months. Interest
/// accrues over the full duration regardless of how much time has elapsed.
pub fn total_with_interest(loan_amount: f64, interest: f64, duration: f64) -> f64 {
    loan_amount + loan_amount * (interest / 100.0) * duration
}

pub fn total_installments(installments: &[Installment]) -> f64 {
    installments.iter().map(|i| i.amount).sum()
}

pub fn outstanding(
    loan_amount: f64,
    interest: f64,
    duration: f64,
    installments: &[Installment],
) -> f64 {
    total_with_interest(loan_amount, interest, duration) - total_installments(installments)
}

/// Deposits of one account with their running total
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepositLedger {
    deposits: Vec<Deposit>,
    total_balance: f64,
}

impl DepositLedger {
    pub fn derive(deposits: Vec<Deposit>) -> Self {
        let total_balance = total_balance(&deposits);
        Self {
            deposits,
            total_balance,
        }
    }

    pub fn deposits(&self) -> &[Deposit] {
        &self.deposits
    }

    pub fn total_balance(&self) -> f64 {
        self.total_balance
    }

    pub fn find(&self, id: &str) -> Option<&Deposit> {
        self.deposits.iter().find(|d| d.id == id)
    }

    /// Deposits paired with their display sign
    pub fn rows(&self) -> impl Iterator<Item = (&Deposit, AmountType)> + '_ {
        self.deposits.iter().map(|d| (d, AmountType::of(d.amount)))
    }
}

/// A loan, its installments and what remains to be paid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanLedger {
    loan: Option<Loan>,
    installments: Vec<Installment>,
    total_with_interest: f64,
    total_paid: f64,
    outstanding: f64,
}

impl LoanLedger {
    pub fn derive(loan: Option<Loan>, installments: Vec<Installment>) -> Self {
        let total_paid = total_installments(&installments);
        let total_with_interest = loan
            .as_ref()
            .map(|l| total_with_interest(l.loan_amount, l.interest, l.duration))
            .unwrap_or_default();
        Self {
            loan,
            installments,
            total_with_interest,
            total_paid,
            outstanding: total_with_interest - total_paid,
        }
    }

    /// Rebuild with a freshly fetched loan, keeping the current installments
    pub fn with_loan(self, loan: Option<Loan>) -> Self {
        Self::derive(loan, self.installments)
    }

    /// Rebuild with freshly fetched installments, keeping the current loan
    pub fn with_installments(self, installments: Vec<Installment>) -> Self {
        Self::derive(self.loan, installments)
    }

    pub fn loan(&self) -> Option<&Loan> {
        self.loan.as_ref()
    }

    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    pub fn total_with_interest(&self) -> f64 {
        self.total_with_interest
    }

    pub fn total_paid(&self) -> f64 {
        self.total_paid
    }

    pub fn outstanding(&self) -> f64 {
        self.outstanding
    }

    pub fn find(&self, id: &str) -> Option<&Installment> {
        self.installments.iter().find(|i| i.id == id)
    }
}
