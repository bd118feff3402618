use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    AccountRef, ApiMessage, CalendarDay, Customer, CustomerFilter, Deposit, DurationUpdate,
    Installment, InstallmentUpdate, Loan, NewCustomer, NewDeposit, NewInstallment, NewLoan,
};
use thiserror::Error;

use crate::services::config::ClientConfig;

/// Message shown for any failure below the HTTP layer
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred. Please check your connection.";

const CONFLICT_MESSAGE: &str = "Account number already exists";

/// Failure of a single API call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// 409: the account number is already registered
    #[error("{0}")]
    Conflict(String),
    /// Non-2xx response with a JSON body
    #[error("{message}")]
    Server { status: u16, message: String },
    /// Non-2xx response whose body is not JSON
    #[error("{fallback} (status {status})")]
    MalformedResponse { status: u16, fallback: String },
    /// Connection failure, or a success body that could not be read
    #[error("Network error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Text for the notice shown to the agent
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

/// API client for the Loan Book record-keeping backend
///
/// Every method is a single request. Nothing is cached: after a mutation the
/// caller re-fetches to observe the new state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:5000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ---- customers ----

    /// Register a customer. A duplicate account number yields [`ApiError::Conflict`].
    pub async fn create_customer(&self, request: &NewCustomer) -> Result<Customer, ApiError> {
        let response = self
            .send(self.http.post(self.url("/api/customers")).json(request))
            .await?;
        let response = Self::check_create(response, "Failed to add customer").await?;
        info!("Customer {} registered", request.account_number);
        Self::decode(response).await
    }

    /// Fetch one customer by account number
    pub async fn get_customer(&self, account_number: &str) -> Result<Customer, ApiError> {
        let request = self
            .http
            .get(self.url("/api/customers/accountNumber"))
            .query(&[("accountNumber", account_number.trim())]);
        let response = self.send(request).await?;
        let response = Self::check(response, "Failed to fetch customer data").await?;
        Self::decode(response).await
    }

    pub async fn list_depositors(&self) -> Result<Vec<Customer>, ApiError> {
        let request = self.http.get(self.url("/api/customers/depositors"));
        self.fetch_list(request, "Failed to fetch depositors").await
    }

    /// Depositors matching every non-blank field of `filter`
    pub async fn list_depositors_filtered(
        &self,
        filter: &CustomerFilter,
    ) -> Result<Vec<Customer>, ApiError> {
        let request = self
            .http
            .get(self.url("/api/customers/depositors/filtered"))
            .query(&filter.query_pairs());
        self.fetch_list(request, "Failed to fetch filtered depositors").await
    }

    /// Close a deposit account. The backend removes the customer and every
    /// deposit in one call.
    pub async fn delete_customer_and_deposits(&self, account_number: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url("/api/customers/deleteCustomerAndDepositeds"))
            .json(&AccountRef {
                account_number: account_number.to_string(),
            });
        let response = self.send(request).await?;
        Self::check(response, "Failed to delete account").await?;
        info!("Account {} closed", account_number);
        Ok(())
    }

    // ---- deposits ----

    pub async fn list_deposits(&self, account_number: &str) -> Result<Vec<Deposit>, ApiError> {
        let request = self
            .http
            .get(self.url("/api/deposit/accountNumber"))
            .query(&[("accountNumber", account_number.trim())]);
        self.fetch_list(request, "Failed to fetch deposits").await
    }

    pub async fn add_deposit(&self, request: &NewDeposit) -> Result<Deposit, ApiError> {
        let response = self
            .send(self.http.post(self.url("/api/deposit/addDeposit")).json(request))
            .await?;
        let response = Self::check(response, "Failed to submit deposit").await?;
        info!("Deposit of {} recorded for {}", request.amount, request.account_number);
        Self::decode(response).await
    }

    /// Replace the amount (and date) of the deposit with `id`
    pub async fn update_deposit(&self, id: &str, update: &NewDeposit) -> Result<(), ApiError> {
        let request = self
            .http
            .put(self.url("/api/deposit/updateAmount"))
            .query(&[("id", id.trim())])
            .json(update);
        let response = self.send(request).await?;
        Self::check(response, "Failed to update deposit").await?;
        info!("Deposit {} updated", id);
        Ok(())
    }

    pub async fn delete_deposit(&self, id: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url("/api/deposit/deleteDepositById"))
            .query(&[("id", id.trim())]);
        let response = self.send(request).await?;
        Self::check(response, "Failed to delete deposit").await?;
        info!("Deposit {} deleted", id);
        Ok(())
    }

    // ---- loans ----

    /// Issue a loan. A duplicate account number yields [`ApiError::Conflict`].
    pub async fn create_loan(&self, request: &NewLoan) -> Result<Loan, ApiError> {
        let response = self
            .send(self.http.post(self.url("/api/loan")).json(request))
            .await?;
        let response = Self::check_create(response, "Failed to issue loan").await?;
        info!("Loan issued to {}", request.customer.account_number);
        Self::decode(response).await
    }

    /// The loan for an account, if one exists. The backend answers with a
    /// list; only its first record is meaningful.
    pub async fn get_loan(&self, account_number: &str) -> Result<Option<Loan>, ApiError> {
        let request = self
            .http
            .get(self.url("/api/loan/account"))
            .query(&[("accountNumber", account_number.trim())]);
        let loans: Vec<Loan> = self.fetch_list(request, "Failed to fetch loan data").await?;
        Ok(loans.into_iter().next())
    }

    pub async fn update_loan_duration(
        &self,
        account_number: &str,
        new_duration: f64,
    ) -> Result<(), ApiError> {
        let request = self
            .http
            .patch(self.url("/api/loan/account/updateDuration"))
            .json(&DurationUpdate {
                account_number: account_number.to_string(),
                new_duration,
            });
        let response = self.send(request).await?;
        Self::check(response, "Failed to update duration").await?;
        info!("Loan {} duration set to {} months", account_number, new_duration);
        Ok(())
    }

    /// Delete a loan. The backend removes its installments in the same call.
    pub async fn delete_loan(&self, account_number: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url("/api/loan/account/deleteLoan"))
            .json(&AccountRef {
                account_number: account_number.to_string(),
            });
        let response = self.send(request).await?;
        Self::check(response, "Failed to delete loan").await?;
        info!("Loan {} deleted", account_number);
        Ok(())
    }

    // ---- installments ----

    pub async fn list_installments(
        &self,
        account_number: &str,
    ) -> Result<Vec<Installment>, ApiError> {
        let request = self
            .http
            .get(self.url("/api/installment"))
            .query(&[("accountNumber", account_number.trim())]);
        self.fetch_list(request, "Failed to fetch installments").await
    }

    pub async fn add_installment(&self, request: &NewInstallment) -> Result<Installment, ApiError> {
        let response = self
            .send(self.http.post(self.url("/api/installment")).json(request))
            .await?;
        let response = Self::check(response, "Failed to add installment").await?;
        info!("Installment of {} recorded for {}", request.amount, request.account_number);
        Self::decode(response).await
    }

    /// Change the amount of the installment paid on `date`
    pub async fn update_installment(
        &self,
        account_number: &str,
        date: CalendarDay,
        new_amount: f64,
    ) -> Result<(), ApiError> {
        let request = self
            .http
            .patch(self.url("/api/installment/updateInstallment"))
            .json(&InstallmentUpdate {
                account_number: account_number.to_string(),
                date,
                new_amount,
            });
        let response = self.send(request).await?;
        Self::check(response, "Failed to update installment").await?;
        info!("Installment of {} on {} updated", account_number, date);
        Ok(())
    }

    pub async fn delete_installment(&self, id: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url("/api/installment/deleteInstallmentById"))
            .query(&[("id", id.trim())]);
        let response = self.send(request).await?;
        Self::check(response, "Failed to delete installment").await?;
        info!("Installment {} deleted", id);
        Ok(())
    }

    // ---- plumbing ----

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request = request.build()?;
        debug!("{} {}", request.method(), request.url());
        self.http.execute(request).await.map_err(|e| {
            warn!("Request failed: {}", e);
            ApiError::from(e)
        })
    }

    /// List endpoints: a 404 means "no matches", not an error
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<Vec<T>, ApiError> {
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("List endpoint returned 404, treating as empty");
            return Ok(Vec::new());
        }
        let response = Self::check(response, fallback).await?;
        Self::decode(response).await
    }

    async fn check_create(response: Response, fallback: &str) -> Result<Response, ApiError> {
        if response.status() == StatusCode::CONFLICT {
            warn!("Backend rejected duplicate account number");
            return Err(ApiError::Conflict(CONFLICT_MESSAGE.to_string()));
        }
        Self::check(response, fallback).await
    }

    /// Pass 2xx responses through; turn anything else into an [`ApiError`]
    async fn check(response: Response, fallback: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        let error = match serde_json::from_str::<ApiMessage>(&body) {
            Ok(parsed) => ApiError::Server {
                status: status.as_u16(),
                message: parsed
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            },
            Err(_) => ApiError::MalformedResponse {
                status: status.as_u16(),
                fallback: fallback.to_string(),
            },
        };
        warn!("Backend returned {}: {}", status, error);
        Err(error)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Transport(format!("Failed to parse response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{day, unreachable_client, FakeBackend};
    use axum::http::StatusCode as FakeStatus;
    use shared::{CustomerType, NO_IMAGE};

    fn new_customer(account_number: &str) -> NewCustomer {
        NewCustomer {
            account_number: account_number.to_string(),
            customer_name: "Lakshmi".to_string(),
            phone_no: "9876543210".to_string(),
            area: "Ward 4".to_string(),
            handler: "Mohan".to_string(),
            type_of_customer: CustomerType::Depositor,
            issue_date: day("01/01/2024"),
            customer_image: NO_IMAGE.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_customer_returns_stored_record() {
        let backend = FakeBackend::start().await;
        let api = backend.client();

        let customer = api.create_customer(&new_customer("AC-1")).await.unwrap();

        assert_eq!(customer.account_number, "AC-1");
        assert!(customer.id.is_some());
        assert_eq!(api.list_depositors().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_customer_is_conflict() {
        let backend = FakeBackend::start().await;
        let api = backend.client();
        api.create_customer(&new_customer("AC-1")).await.unwrap();

        let err = api.create_customer(&new_customer("AC-1")).await.unwrap_err();

        assert_eq!(err, ApiError::Conflict("Account number already exists".to_string()));
        assert_eq!(err.user_message(), "Account number already exists");
    }

    #[tokio::test]
    async fn test_list_with_no_matches_is_empty() {
        let backend = FakeBackend::start().await;
        let api = backend.client();

        assert!(api.list_deposits("NOPE").await.unwrap().is_empty());
        assert!(api.list_installments("NOPE").await.unwrap().is_empty());
        assert_eq!(api.get_loan("NOPE").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_treats_404_as_empty() {
        let backend = FakeBackend::start().await;
        backend.fail(
            "/api/deposit/accountNumber",
            FakeStatus::NOT_FOUND,
            r#"{"message":"No deposits found"}"#,
        );

        let deposits = backend.client().list_deposits("AC-1").await.unwrap();
        assert!(deposits.is_empty());
    }

    #[tokio::test]
    async fn test_filter_omits_blank_fields_from_query() {
        let backend = FakeBackend::start().await;
        let filter = CustomerFilter {
            account_number: Some("".to_string()),
            customer_name: Some("  Ravi ".to_string()),
            area: None,
            handler: Some("   ".to_string()),
        };

        backend.client().list_depositors_filtered(&filter).await.unwrap();

        assert_eq!(
            backend.requests(),
            vec!["GET /api/customers/depositors/filtered?customerName=Ravi".to_string()]
        );
    }

    #[tokio::test]
    async fn test_ids_travel_in_the_query_string() {
        let backend = FakeBackend::start().await;
        let id = backend.seed_deposit("AC-1", "01/01/2024", 100.0);
        let api = backend.client();

        api.update_deposit(
            &id,
            &NewDeposit {
                account_number: "AC-1".to_string(),
                date: day("01/01/2024"),
                amount: 150.0,
            },
        )
        .await
        .unwrap();
        api.delete_deposit(&id).await.unwrap();

        assert_eq!(
            backend.requests(),
            vec![
                format!("PUT /api/deposit/updateAmount?id={}", id),
                format!("DELETE /api/deposit/deleteDepositById?id={}", id),
            ]
        );
    }

    #[tokio::test]
    async fn test_server_message_is_surfaced() {
        let backend = FakeBackend::start().await;
        backend.fail(
            "/api/deposit/addDeposit",
            FakeStatus::BAD_REQUEST,
            r#"{"message":"Amount is required"}"#,
        );

        let err = backend
            .client()
            .add_deposit(&NewDeposit {
                account_number: "AC-1".to_string(),
                date: day("01/01/2024"),
                amount: 10.0,
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::Server {
                status: 400,
                message: "Amount is required".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_json_error_without_message_uses_fallback() {
        let backend = FakeBackend::start().await;
        backend.fail("/api/loan/account/deleteLoan", FakeStatus::INTERNAL_SERVER_ERROR, "{}");

        let err = backend.client().delete_loan("L-1").await.unwrap_err();

        assert_eq!(err.user_message(), "Failed to delete loan");
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_malformed_response() {
        let backend = FakeBackend::start().await;
        backend.fail(
            "/api/installment/deleteInstallmentById",
            FakeStatus::BAD_GATEWAY,
            "<html>Bad Gateway</html>",
        );

        let err = backend.client().delete_installment("i-1").await.unwrap_err();

        assert_eq!(
            err,
            ApiError::MalformedResponse {
                status: 502,
                fallback: "Failed to delete installment".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_conflict_only_applies_to_creates() {
        let backend = FakeBackend::start().await;
        backend.fail(
            "/api/loan/account/updateDuration",
            FakeStatus::CONFLICT,
            r#"{"message":"Loan is locked"}"#,
        );

        let err = backend.client().update_loan_duration("L-1", 6.0).await.unwrap_err();

        assert!(matches!(err, ApiError::Server { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let api = unreachable_client().await;

        let err = api.list_depositors().await.unwrap_err();

        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_transport_error() {
        let backend = FakeBackend::start().await;
        backend.fail("/api/customers/depositors", FakeStatus::OK, "not json");

        let err = backend.client().list_depositors().await.unwrap_err();

        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_loan_lifecycle() {
        let backend = FakeBackend::start().await;
        let api = backend.client();
        let request = NewLoan {
            customer: NewCustomer {
                type_of_customer: CustomerType::Borrower,
                ..new_customer("L-1")
            },
            duration: 12.0,
            interest: 10.0,
            loan_amount: 1000.0,
        };

        api.create_loan(&request).await.unwrap();
        assert!(matches!(api.create_loan(&request).await, Err(ApiError::Conflict(_))));

        api.update_loan_duration("L-1", 6.0).await.unwrap();
        let loan = api.get_loan("L-1").await.unwrap().unwrap();
        assert_eq!(loan.duration, 6.0);

        api.add_installment(&NewInstallment {
            account_number: "L-1".to_string(),
            date: day("05/02/2024"),
            amount: 200.0,
        })
        .await
        .unwrap();
        api.update_installment("L-1", day("05/02/2024"), 250.0).await.unwrap();
        let installments = api.list_installments("L-1").await.unwrap();
        assert_eq!(installments.len(), 1);
        assert_eq!(installments[0].amount, 250.0);

        api.delete_loan("L-1").await.unwrap();
        assert_eq!(api.get_loan("L-1").await.unwrap(), None);
        assert!(api.list_installments("L-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_account_removes_customer_and_deposits() {
        let backend = FakeBackend::start().await;
        let api = backend.client();
        api.create_customer(&new_customer("AC-1")).await.unwrap();
        backend.seed_deposit("AC-1", "01/01/2024", 100.0);

        api.delete_customer_and_deposits("AC-1").await.unwrap();

        assert!(api.list_depositors().await.unwrap().is_empty());
        assert!(api.list_deposits("AC-1").await.unwrap().is_empty());
        assert!(matches!(
            api.get_customer("AC-1").await,
            Err(ApiError::Server { status: 404, .. })
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let api = ApiClient::new("http://ledger.local:5000/");
        assert_eq!(api.base_url(), "http://ledger.local:5000");
        assert_eq!(api.url("/api/loan"), "http://ledger.local:5000/api/loan");
    }
}
