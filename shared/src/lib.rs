use serde::{Deserialize, Deserializer, Serialize};

mod calendar_day;

pub use calendar_day::{CalendarDay, CalendarDayParseError, IST_OFFSET_SECONDS};

/// Sentinel stored in `customerImage` when no photo was captured
pub const NO_IMAGE: &str = "none";

/// Which list a customer belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerType {
    #[default]
    Depositor,
    Borrower,
}

/// A customer record as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unique account key, enforced by the backend
    pub account_number: String,
    pub customer_name: String,
    /// Exactly 10 digits
    pub phone_no: String,
    pub area: String,
    /// Name of the field agent responsible for this customer
    pub handler: String,
    pub type_of_customer: CustomerType,
    pub issue_date: CalendarDay,
    /// Encoded image data, or [`NO_IMAGE`]
    #[serde(default = "no_image")]
    pub customer_image: String,
}

impl Customer {
    pub fn has_image(&self) -> bool {
        self.customer_image != NO_IMAGE && !self.customer_image.is_empty()
    }
}

fn no_image() -> String {
    NO_IMAGE.to_string()
}

/// Request body for registering a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub account_number: String,
    pub customer_name: String,
    pub phone_no: String,
    pub area: String,
    pub handler: String,
    pub type_of_customer: CustomerType,
    pub issue_date: CalendarDay,
    pub customer_image: String,
}

/// Optional criteria for the filtered depositor list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFilter {
    pub account_number: Option<String>,
    pub customer_name: Option<String>,
    pub area: Option<String>,
    pub handler: Option<String>,
}

impl CustomerFilter {
    /// Query parameters for the filter, trimmed, with blank fields omitted
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("accountNumber", &self.account_number),
            ("customerName", &self.customer_name),
            ("area", &self.area),
            ("handler", &self.handler),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value.as_deref()?.trim();
            (!value.is_empty()).then(|| (key, value.to_string()))
        })
        .collect()
    }

    /// True when no field would be sent
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}

/// A single deposit (or withdrawal, when negative) against an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub account_number: String,
    pub date: CalendarDay,
    #[serde(deserialize_with = "flexible_number")]
    pub amount: f64,
}

/// Request body for adding a deposit, also used for amount updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeposit {
    pub account_number: String,
    pub date: CalendarDay,
    pub amount: f64,
}

/// A loan issued to a borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub account_number: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone_no: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub handler: String,
    /// Length of the loan in months
    #[serde(deserialize_with = "flexible_number")]
    pub duration: f64,
    /// Flat interest rate per month, in percent
    #[serde(deserialize_with = "flexible_number")]
    pub interest: f64,
    #[serde(deserialize_with = "flexible_number")]
    pub loan_amount: f64,
    pub issue_date: CalendarDay,
    #[serde(default = "no_image")]
    pub customer_image: String,
}

/// Request body for issuing a loan; carries the borrower's identity fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoan {
    #[serde(flatten)]
    pub customer: NewCustomer,
    pub duration: f64,
    pub interest: f64,
    pub loan_amount: f64,
}

/// Request body for changing a loan's duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationUpdate {
    pub account_number: String,
    pub new_duration: f64,
}

/// An installment paid against a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub account_number: String,
    pub date: CalendarDay,
    #[serde(deserialize_with = "flexible_number")]
    pub amount: f64,
}

/// Request body for recording an installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstallment {
    pub account_number: String,
    pub date: CalendarDay,
    pub amount: f64,
}

/// Request body for changing an installment; the backend locates it by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentUpdate {
    pub account_number: String,
    pub date: CalendarDay,
    pub new_amount: f64,
}

/// Body of the account-level delete endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRef {
    pub account_number: String,
}

/// Error body returned by the backend on non-2xx responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

/// Accepts a JSON number or a numeric string. Older records hold the raw text
/// typed into the form; an empty string reads as zero.
fn flexible_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(0.0);
            }
            text.parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("expected a number, got '{}'", text)))
        }
    }
}
