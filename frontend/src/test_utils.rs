//! In-process stand-in for the record-keeping backend.
//!
//! Serves the same routes as the real API from memory, records every request
//! line (`METHOD /path?query`) and can be told to answer a path with a canned
//! failure.

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::json;
use shared::{
    AccountRef, CalendarDay, Customer, CustomerType, Deposit, DurationUpdate, Installment,
    InstallmentUpdate, Loan, NewCustomer, NewDeposit, NewInstallment, NewLoan, NO_IMAGE,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::services::api::ApiClient;

pub fn day(text: &str) -> CalendarDay {
    text.parse().unwrap()
}

/// A client pointed at a port nobody listens on
pub async fn unreachable_client() -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ApiClient::new(format!("http://{}", addr))
}

#[derive(Default)]
struct Ledger {
    customers: Vec<Customer>,
    deposits: Vec<Deposit>,
    loans: Vec<Loan>,
    installments: Vec<Installment>,
    requests: Vec<String>,
    failures: HashMap<String, (StatusCode, String)>,
}

type Shared = Arc<Mutex<Ledger>>;
type Params = Query<HashMap<String, String>>;

#[derive(Clone)]
pub struct FakeBackend {
    base_url: String,
    ledger: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let ledger: Shared = Arc::default();
        let router = routes(ledger.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self {
            base_url: format!("http://{}", addr),
            ledger,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone())
    }

    pub fn requests(&self) -> Vec<String> {
        self.ledger.lock().unwrap().requests.clone()
    }

    /// Number of requests made to `path`, ignoring the query string
    pub fn hits(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|line| {
                let target = line.split_once(' ').map(|(_, t)| t).unwrap_or_default();
                target.split('?').next() == Some(path)
            })
            .count()
    }

    pub fn clear_requests(&self) {
        self.ledger.lock().unwrap().requests.clear();
    }

    /// Answer every request to `path` with `status` and a raw `body`
    pub fn fail(&self, path: &str, status: StatusCode, body: &str) {
        self.ledger
            .lock()
            .unwrap()
            .failures
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn recover(&self, path: &str) {
        self.ledger.lock().unwrap().failures.remove(path);
    }

    pub fn seed_customer(&self, account_number: &str, name: &str, kind: CustomerType) {
        self.ledger.lock().unwrap().customers.push(Customer {
            id: Some(new_id()),
            account_number: account_number.to_string(),
            customer_name: name.to_string(),
            phone_no: "9876543210".to_string(),
            area: "Ward 4".to_string(),
            handler: "Mohan".to_string(),
            type_of_customer: kind,
            issue_date: day("01/01/2024"),
            customer_image: NO_IMAGE.to_string(),
        });
    }

    pub fn seed_deposit(&self, account_number: &str, date: &str, amount: f64) -> String {
        let id = new_id();
        self.ledger.lock().unwrap().deposits.push(Deposit {
            id: id.clone(),
            account_number: account_number.to_string(),
            date: day(date),
            amount,
        });
        id
    }

    pub fn seed_loan(&self, account_number: &str, loan_amount: f64, interest: f64, duration: f64) {
        self.ledger.lock().unwrap().loans.push(Loan {
            id: Some(new_id()),
            account_number: account_number.to_string(),
            customer_name: "Asha".to_string(),
            phone_no: "9876543210".to_string(),
            area: "Ward 4".to_string(),
            handler: "Mohan".to_string(),
            duration,
            interest,
            loan_amount,
            issue_date: day("01/01/2024"),
            customer_image: NO_IMAGE.to_string(),
        });
    }

    pub fn seed_installment(&self, account_number: &str, date: &str, amount: f64) -> String {
        let id = new_id();
        self.ledger.lock().unwrap().installments.push(Installment {
            id: id.clone(),
            account_number: account_number.to_string(),
            date: day(date),
            amount,
        });
        id
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or_default()
}

fn routes(ledger: Shared) -> Router {
    Router::new()
        .route("/api/customers", post(create_customer))
        .route("/api/customers/accountNumber", get(get_customer))
        .route("/api/customers/depositors", get(list_depositors))
        .route("/api/customers/depositors/filtered", get(list_depositors_filtered))
        .route("/api/customers/deleteCustomerAndDepositeds", delete(delete_customer_and_deposits))
        .route("/api/deposit/addDeposit", post(add_deposit))
        .route("/api/deposit/accountNumber", get(list_deposits))
        .route("/api/deposit/updateAmount", put(update_deposit))
        .route("/api/deposit/deleteDepositById", delete(delete_deposit))
        .route("/api/loan", post(create_loan))
        .route("/api/loan/account", get(get_loans))
        .route("/api/loan/account/updateDuration", patch(update_duration))
        .route("/api/loan/account/deleteLoan", delete(delete_loan))
        .route("/api/installment", get(list_installments).post(add_installment))
        .route("/api/installment/updateInstallment", patch(update_installment))
        .route("/api/installment/deleteInstallmentById", delete(delete_installment))
        .layer(middleware::from_fn_with_state(ledger.clone(), record))
        .with_state(ledger)
}

async fn record(State(ledger): State<Shared>, request: Request, next: Next) -> Response {
    let failure = {
        let mut ledger = ledger.lock().unwrap();
        ledger
            .requests
            .push(format!("{} {}", request.method(), request.uri()));
        ledger.failures.get(request.uri().path()).cloned()
    };
    match failure {
        Some((status, body)) => (status, body).into_response(),
        None => next.run(request).await,
    }
}

async fn create_customer(
    State(ledger): State<Shared>,
    Json(request): Json<NewCustomer>,
) -> Response {
    let mut ledger = ledger.lock().unwrap();
    if ledger
        .customers
        .iter()
        .any(|c| c.account_number == request.account_number)
    {
        return message(StatusCode::CONFLICT, "Account number already exists");
    }
    let customer = Customer {
        id: Some(new_id()),
        account_number: request.account_number,
        customer_name: request.customer_name,
        phone_no: request.phone_no,
        area: request.area,
        handler: request.handler,
        type_of_customer: request.type_of_customer,
        issue_date: request.issue_date,
        customer_image: request.customer_image,
    };
    ledger.customers.push(customer.clone());
    (StatusCode::CREATED, Json(customer)).into_response()
}

async fn get_customer(State(ledger): State<Shared>, Query(params): Params) -> Response {
    let ledger = ledger.lock().unwrap();
    let account_number = param(&params, "accountNumber");
    match ledger
        .customers
        .iter()
        .find(|c| c.account_number == account_number)
    {
        Some(customer) => Json(customer.clone()).into_response(),
        None => message(StatusCode::NOT_FOUND, "Customer not found"),
    }
}

async fn list_depositors(State(ledger): State<Shared>) -> Response {
    let ledger = ledger.lock().unwrap();
    let depositors: Vec<Customer> = ledger
        .customers
        .iter()
        .filter(|c| c.type_of_customer == CustomerType::Depositor)
        .cloned()
        .collect();
    Json(depositors).into_response()
}

async fn list_depositors_filtered(State(ledger): State<Shared>, Query(params): Params) -> Response {
    let ledger = ledger.lock().unwrap();
    let matches = |value: &str, key: &str| match params.get(key) {
        Some(wanted) => value.to_lowercase().contains(&wanted.to_lowercase()),
        None => true,
    };
    let depositors: Vec<Customer> = ledger
        .customers
        .iter()
        .filter(|c| c.type_of_customer == CustomerType::Depositor)
        .filter(|c| {
            matches(&c.account_number, "accountNumber")
                && matches(&c.customer_name, "customerName")
                && matches(&c.area, "area")
                && matches(&c.handler, "handler")
        })
        .cloned()
        .collect();
    Json(depositors).into_response()
}

async fn delete_customer_and_deposits(
    State(ledger): State<Shared>,
    Json(request): Json<AccountRef>,
) -> Response {
    let mut ledger = ledger.lock().unwrap();
    let before = ledger.customers.len();
    ledger
        .customers
        .retain(|c| c.account_number != request.account_number);
    if ledger.customers.len() == before {
        return message(StatusCode::NOT_FOUND, "Customer not found");
    }
    ledger
        .deposits
        .retain(|d| d.account_number != request.account_number);
    message(StatusCode::OK, "Customer and deposits deleted")
}

async fn add_deposit(State(ledger): State<Shared>, Json(request): Json<NewDeposit>) -> Response {
    let deposit = Deposit {
        id: new_id(),
        account_number: request.account_number,
        date: request.date,
        amount: request.amount,
    };
    ledger.lock().unwrap().deposits.push(deposit.clone());
    (StatusCode::CREATED, Json(deposit)).into_response()
}

async fn list_deposits(State(ledger): State<Shared>, Query(params): Params) -> Response {
    let ledger = ledger.lock().unwrap();
    let account_number = param(&params, "accountNumber");
    let deposits: Vec<Deposit> = ledger
        .deposits
        .iter()
        .filter(|d| d.account_number == account_number)
        .cloned()
        .collect();
    Json(deposits).into_response()
}

async fn update_deposit(
    State(ledger): State<Shared>,
    Query(params): Params,
    Json(request): Json<NewDeposit>,
) -> Response {
    let mut ledger = ledger.lock().unwrap();
    let id = param(&params, "id");
    match ledger.deposits.iter_mut().find(|d| d.id == id) {
        Some(deposit) => {
            deposit.date = request.date;
            deposit.amount = request.amount;
            Json(deposit.clone()).into_response()
        }
        None => message(StatusCode::NOT_FOUND, "Deposit not found"),
    }
}

async fn delete_deposit(State(ledger): State<Shared>, Query(params): Params) -> Response {
    let mut ledger = ledger.lock().unwrap();
    let id = param(&params, "id").to_string();
    let before = ledger.deposits.len();
    ledger.deposits.retain(|d| d.id != id);
    if ledger.deposits.len() == before {
        return message(StatusCode::NOT_FOUND, "Deposit not found");
    }
    message(StatusCode::OK, "Deposit deleted")
}

async fn create_loan(State(ledger): State<Shared>, Json(request): Json<NewLoan>) -> Response {
    let mut ledger = ledger.lock().unwrap();
    let customer = request.customer;
    if ledger
        .loans
        .iter()
        .any(|l| l.account_number == customer.account_number)
    {
        return message(StatusCode::CONFLICT, "Account number already exists");
    }
    let loan = Loan {
        id: Some(new_id()),
        account_number: customer.account_number,
        customer_name: customer.customer_name,
        phone_no: customer.phone_no,
        area: customer.area,
        handler: customer.handler,
        duration: request.duration,
        interest: request.interest,
        loan_amount: request.loan_amount,
        issue_date: customer.issue_date,
        customer_image: customer.customer_image,
    };
    ledger.loans.push(loan.clone());
    (StatusCode::CREATED, Json(loan)).into_response()
}

async fn get_loans(State(ledger): State<Shared>, Query(params): Params) -> Response {
    let ledger = ledger.lock().unwrap();
    let account_number = param(&params, "accountNumber");
    let loans: Vec<Loan> = ledger
        .loans
        .iter()
        .filter(|l| l.account_number == account_number)
        .cloned()
        .collect();
    Json(loans).into_response()
}

async fn update_duration(
    State(ledger): State<Shared>,
    Json(request): Json<DurationUpdate>,
) -> Response {
    let mut ledger = ledger.lock().unwrap();
    match ledger
        .loans
        .iter_mut()
        .find(|l| l.account_number == request.account_number)
    {
        Some(loan) => {
            loan.duration = request.new_duration;
            message(StatusCode::OK, "Duration updated")
        }
        None => message(StatusCode::NOT_FOUND, "Loan not found"),
    }
}

async fn delete_loan(State(ledger): State<Shared>, Json(request): Json<AccountRef>) -> Response {
    let mut ledger = ledger.lock().unwrap();
    let before = ledger.loans.len();
    ledger.loans.retain(|l| l.account_number != request.account_number);
    if ledger.loans.len() == before {
        return message(StatusCode::NOT_FOUND, "Loan not found");
    }
    ledger
        .installments
        .retain(|i| i.account_number != request.account_number);
    message(StatusCode::OK, "Loan deleted")
}

async fn list_installments(State(ledger): State<Shared>, Query(params): Params) -> Response {
    let ledger = ledger.lock().unwrap();
    let account_number = param(&params, "accountNumber");
    let installments: Vec<Installment> = ledger
        .installments
        .iter()
        .filter(|i| i.account_number == account_number)
        .cloned()
        .collect();
    Json(installments).into_response()
}

async fn add_installment(
    State(ledger): State<Shared>,
    Json(request): Json<NewInstallment>,
) -> Response {
    let installment = Installment {
        id: new_id(),
        account_number: request.account_number,
        date: request.date,
        amount: request.amount,
    };
    ledger.lock().unwrap().installments.push(installment.clone());
    (StatusCode::CREATED, Json(installment)).into_response()
}

async fn update_installment(
    State(ledger): State<Shared>,
    Json(request): Json<InstallmentUpdate>,
) -> Response {
    let mut ledger = ledger.lock().unwrap();
    match ledger
        .installments
        .iter_mut()
        .find(|i| i.account_number == request.account_number && i.date == request.date)
    {
        Some(installment) => {
            installment.amount = request.new_amount;
            message(StatusCode::OK, "Installment updated")
        }
        None => message(StatusCode::NOT_FOUND, "Installment not found"),
    }
}

async fn delete_installment(State(ledger): State<Shared>, Query(params): Params) -> Response {
    let mut ledger = ledger.lock().unwrap();
    let id = param(&params, "id").to_string();
    let before = ledger.installments.len();
    ledger.installments.retain(|i| i.id != id);
    if ledger.installments.len() == before {
        return message(StatusCode::NOT_FOUND, "Installment not found");
    }
    message(StatusCode::OK, "Installment deleted")
}
