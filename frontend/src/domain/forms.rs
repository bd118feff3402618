//! Form drafts and their validation rules.
//!
//! Validation runs a fixed, ordered rule list and stops at the first failure:
//! the agent is shown one problem at a time. Drafts hold raw text as typed;
//! trimming happens in `to_request`, which is the only way to obtain a
//! request body from a draft.

use shared::{CalendarDay, CustomerType, NewCustomer, NewLoan, NO_IMAGE};
use thiserror::Error;

use crate::services::date_utils;

/// A broken form rule. `Display` gives the message; [`title`](Self::title)
/// gives the heading of the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Customer name cannot be empty.")]
    EmptyCustomerName,
    #[error("Account number cannot be empty.")]
    EmptyAccountNumber,
    #[error("Phone number must be exactly 10 digits.")]
    InvalidPhoneNumber,
    #[error("Address cannot be empty.")]
    EmptyArea,
    #[error("Agent name cannot be empty.")]
    EmptyHandler,
    #[error("Duration cannot be empty.")]
    EmptyDuration,
    #[error("Duration must be a number of months.")]
    InvalidDuration,
    #[error("Interest rate cannot be empty.")]
    EmptyInterest,
    #[error("Interest rate must be a number.")]
    InvalidInterest,
    #[error("Loan amount cannot be empty.")]
    EmptyLoanAmount,
    #[error("Loan amount must be a number.")]
    InvalidLoanAmount,
    #[error("Please enter an amount")]
    EmptyAmount,
    #[error("Please enter a valid amount")]
    InvalidAmount,
}

impl ValidationError {
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::EmptyCustomerName => "Invalid Customer Name",
            ValidationError::EmptyAccountNumber => "Invalid Account Number",
            ValidationError::InvalidPhoneNumber => "Invalid Phone Number",
            ValidationError::EmptyArea => "Invalid Address",
            ValidationError::EmptyHandler => "Invalid Agent Name",
            ValidationError::EmptyDuration | ValidationError::InvalidDuration => "Invalid Duration",
            ValidationError::EmptyInterest | ValidationError::InvalidInterest => {
                "Invalid Interest Rate"
            }
            ValidationError::EmptyLoanAmount | ValidationError::InvalidLoanAmount => {
                "Invalid Loan Amount"
            }
            ValidationError::EmptyAmount | ValidationError::InvalidAmount => "Error",
        }
    }
}

fn required(value: &str, error: ValidationError) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(error)
    } else {
        Ok(value.to_string())
    }
}

fn number(
    value: &str,
    empty: ValidationError,
    invalid: ValidationError,
) -> Result<f64, ValidationError> {
    let value = required(value, empty)?;
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(invalid)
}

fn phone(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.len() == 10 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(value.to_string())
    } else {
        Err(ValidationError::InvalidPhoneNumber)
    }
}

/// Draft of a customer registration
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerForm {
    /// Encoded photo, if one was captured
    pub customer_image: Option<String>,
    pub account_number: String,
    pub customer_name: String,
    pub phone_no: String,
    pub area: String,
    pub handler: String,
    pub type_of_customer: CustomerType,
    pub issue_date: CalendarDay,
}

impl CustomerForm {
    /// Empty draft for a customer of `kind`, issued today
    pub fn new(kind: CustomerType) -> Self {
        Self {
            customer_image: None,
            account_number: String::new(),
            customer_name: String::new(),
            phone_no: String::new(),
            area: String::new(),
            handler: String::new(),
            type_of_customer: kind,
            issue_date: date_utils::today(),
        }
    }

    /// The first broken rule, if any
    pub fn validate(&self) -> Vec<ValidationError> {
        self.to_request().err().into_iter().collect()
    }

    /// Trim every field, check the rules in order and build the request body
    pub fn to_request(&self) -> Result<NewCustomer, ValidationError> {
        let customer_name = required(&self.customer_name, ValidationError::EmptyCustomerName)?;
        let account_number = required(&self.account_number, ValidationError::EmptyAccountNumber)?;
        let phone_no = phone(&self.phone_no)?;
        let area = required(&self.area, ValidationError::EmptyArea)?;
        let handler = required(&self.handler, ValidationError::EmptyHandler)?;

        let customer_image = self
            .customer_image
            .clone()
            .filter(|image| !image.is_empty())
            .unwrap_or_else(|| NO_IMAGE.to_string());

        Ok(NewCustomer {
            account_number,
            customer_name,
            phone_no,
            area,
            handler,
            type_of_customer: self.type_of_customer,
            issue_date: self.issue_date,
            customer_image,
        })
    }

    /// Back to an empty draft of `kind`
    pub fn reset(&mut self, kind: CustomerType) {
        *self = Self::new(kind);
    }
}

/// Draft of a loan: the borrower's identity plus the loan terms
#[derive(Debug, Clone, PartialEq)]
pub struct LoanForm {
    pub customer: CustomerForm,
    pub duration: String,
    pub interest: String,
    pub loan_amount: String,
}

impl LoanForm {
    pub fn new() -> Self {
        Self {
            customer: CustomerForm::new(CustomerType::Borrower),
            duration: String::new(),
            interest: String::new(),
            loan_amount: String::new(),
        }
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        self.to_request().err().into_iter().collect()
    }

    pub fn to_request(&self) -> Result<NewLoan, ValidationError> {
        let customer = self.customer.to_request()?;
        let duration = number(
            &self.duration,
            ValidationError::EmptyDuration,
            ValidationError::InvalidDuration,
        )?;
        let interest = number(
            &self.interest,
            ValidationError::EmptyInterest,
            ValidationError::InvalidInterest,
        )?;
        let loan_amount = number(
            &self.loan_amount,
            ValidationError::EmptyLoanAmount,
            ValidationError::InvalidLoanAmount,
        )?;

        Ok(NewLoan {
            customer,
            duration,
            interest,
            loan_amount,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for LoanForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Draft of a dated amount: a new deposit, installment, or an edit of one
#[derive(Debug, Clone, PartialEq)]
pub struct AmountForm {
    pub amount: String,
    pub date: CalendarDay,
}

impl AmountForm {
    pub fn new() -> Self {
        Self {
            amount: String::new(),
            date: date_utils::today(),
        }
    }

    pub fn with_amount(amount: f64, date: CalendarDay) -> Self {
        Self {
            amount: amount.to_string(),
            date,
        }
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        self.to_amount().err().into_iter().collect()
    }

    pub fn to_amount(&self) -> Result<f64, ValidationError> {
        number(&self.amount, ValidationError::EmptyAmount, ValidationError::InvalidAmount)
    }

    /// Clear the amount; the chosen date is kept for the next entry
    pub fn clear_amount(&mut self) {
        self.amount.clear();
    }
}

impl Default for AmountForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Draft of a loan duration change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationForm {
    pub new_duration: String,
}

impl DurationForm {
    pub fn new(current: f64) -> Self {
        Self {
            new_duration: current.to_string(),
        }
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        self.to_duration().err().into_iter().collect()
    }

    pub fn to_duration(&self) -> Result<f64, ValidationError> {
        number(&self.new_duration, ValidationError::EmptyDuration, ValidationError::InvalidDuration)
    }
}
