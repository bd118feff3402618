use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use shared::{CalendarDay, CustomerFilter, CustomerType};

use loan_book::domain::forms::{CustomerForm, DurationForm};
use loan_book::domain::ledger::AmountType;
use loan_book::services::api::ApiClient;
use loan_book::services::config::ClientConfig;
use loan_book::services::date_utils;
use loan_book::state::{
    CustomerRegistration, DepositScreen, DepositorList, InstallmentScreen, LoanRegistration,
    Notice, Route,
};

#[derive(Parser)]
#[command(name = "loan-book", version)]
#[command(about = "Record deposits, loans and installments against the Loan Book ledger")]
struct Cli {
    /// YAML configuration file
    #[arg(long, default_value = "loan-book.yaml")]
    config: PathBuf,

    /// Base URL of the ledger API; overrides the file and LOAN_BOOK_API_URL
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List depositors, optionally filtered
    Depositors {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Register a customer
    AddCustomer {
        #[command(flatten)]
        customer: CustomerArgs,
        /// Register as a borrower instead of a depositor
        #[arg(long)]
        borrower: bool,
    },
    /// Issue a loan to a new borrower
    AddLoan {
        #[command(flatten)]
        customer: CustomerArgs,
        /// Duration in months
        #[arg(long)]
        duration: String,
        /// Interest rate in percent
        #[arg(long)]
        interest: String,
        #[arg(long)]
        amount: String,
    },
    /// Show the deposits and balance of an account
    Deposits { account: String },
    /// Record a deposit (negative for a withdrawal)
    Deposit {
        account: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
        #[arg(long, value_parser = parse_day)]
        date: Option<CalendarDay>,
    },
    /// Change the amount of a deposit
    EditDeposit {
        account: String,
        id: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    DeleteDeposit {
        account: String,
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Delete a depositor and all of their deposits
    CloseAccount {
        account: String,
        #[arg(long)]
        yes: bool,
    },
    /// Show a loan, its installments and the outstanding amount
    Installments { account: String },
    /// Record an installment payment
    Installment {
        account: String,
        amount: String,
        #[arg(long, value_parser = parse_day)]
        date: Option<CalendarDay>,
    },
    /// Change the amount of the installment paid on a date
    EditInstallment {
        account: String,
        #[arg(value_parser = parse_day)]
        date: CalendarDay,
        amount: String,
    },
    DeleteInstallment {
        account: String,
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Delete a loan and all of its installments
    DeleteLoan {
        account: String,
        #[arg(long)]
        yes: bool,
    },
    /// Change the duration of a loan
    Duration { account: String, months: String },
}

#[derive(Args)]
struct CustomerArgs {
    #[arg(long)]
    account: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    area: String,
    #[arg(long)]
    agent: String,
    /// Encoded customer photo
    #[arg(long)]
    image: Option<String>,
    #[arg(long, value_parser = parse_day)]
    issue_date: Option<CalendarDay>,
}

impl CustomerArgs {
    fn fill(self, form: &mut CustomerForm) {
        form.account_number = self.account;
        form.customer_name = self.name;
        form.phone_no = self.phone;
        form.area = self.area;
        form.handler = self.agent;
        form.customer_image = self.image;
        if let Some(day) = self.issue_date {
            form.issue_date = day;
        }
    }
}

fn parse_day(input: &str) -> Result<CalendarDay, String> {
    date_utils::parse_date_input(input)
        .ok_or_else(|| format!("'{}' is not a date (use DD/MM/YYYY or YYYY-MM-DD)", input))
}

/// Print a notice left over from loading a screen
fn report(notice: Option<&Notice>) {
    if let Some(notice) = notice {
        if notice.is_error() {
            eprintln!("{}: {}", notice.title, notice.message);
        } else {
            println!("{}", notice.message);
        }
    }
}

/// Turn the notice of a finished action into the command's result
fn finish(notice: Option<&Notice>) -> Result<()> {
    match notice {
        Some(notice) if notice.is_error() => bail!("{}: {}", notice.title, notice.message),
        Some(notice) => {
            println!("{}", notice.message);
            Ok(())
        }
        None => Ok(()),
    }
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_deposits(screen: &DepositScreen) {
    if let Some(customer) = screen.customer() {
        println!(
            "{} ({}) - {}, agent {}",
            customer.customer_name, customer.account_number, customer.area, customer.handler
        );
        if !customer.has_image() {
            println!("No photo on file");
        }
    }
    for (deposit, sign) in screen.ledger().rows() {
        let marker = match sign {
            AmountType::Negative => " (withdrawal)",
            AmountType::NonNegative => "",
        };
        println!("{}  {}  {}{}", deposit.id, deposit.date, deposit.amount, marker);
    }
    println!("Total balance: {}", screen.ledger().total_balance());
}

fn print_loan(screen: &InstallmentScreen) {
    let ledger = screen.ledger();
    match ledger.loan() {
        Some(loan) => {
            println!("{} ({}) issued {}", loan.customer_name, loan.account_number, loan.issue_date);
            println!(
                "Loan {} at {}% for {} months, total with interest {}",
                loan.loan_amount,
                loan.interest,
                loan.duration,
                ledger.total_with_interest()
            );
        }
        None => println!("No loan on account {}", screen.account_number()),
    }
    for installment in ledger.installments() {
        println!("{}  {}  {}", installment.id, installment.date, installment.amount);
    }
    println!("Paid: {}", ledger.total_paid());
    println!("Outstanding: {}", ledger.outstanding());
}

async fn delete_from_deposits(api: &ApiClient, mut screen: DepositScreen, yes: bool) -> Result<()> {
    let Some(prompt) = screen.deletion.pending().map(|t| t.prompt()) else {
        return Ok(());
    };
    if !confirm(&prompt, yes)? {
        screen.cancel_delete();
        println!("Cancelled");
        return Ok(());
    }
    if let Some(Route::Depositors) = screen.confirm_delete(api).await {
        info!("Account {} closed", screen.account_number());
        return finish(screen.notice());
    }
    finish(screen.notice())?;
    print_deposits(&screen);
    Ok(())
}

async fn delete_from_loan(api: &ApiClient, mut screen: InstallmentScreen, yes: bool) -> Result<()> {
    let Some(prompt) = screen.deletion.pending().map(|t| t.prompt()) else {
        return Ok(());
    };
    if !confirm(&prompt, yes)? {
        screen.cancel_delete();
        println!("Cancelled");
        return Ok(());
    }
    if let Some(Route::Loans) = screen.confirm_delete(api).await {
        info!("Loan {} deleted", screen.account_number());
        return finish(screen.notice());
    }
    finish(screen.notice())?;
    print_loan(&screen);
    Ok(())
}

async fn mounted_deposits(api: &ApiClient, account: String) -> DepositScreen {
    let mut screen = DepositScreen::new(account);
    screen.mount(api).await;
    report(screen.notice());
    screen.dismiss_notice();
    screen
}

async fn mounted_loan(api: &ApiClient, account: String) -> InstallmentScreen {
    let mut screen = InstallmentScreen::new(account);
    screen.mount(api).await;
    report(screen.notice());
    screen.dismiss_notice();
    screen
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::load(Some(&cli.config))?;
    if let Some(url) = &cli.api_url {
        config.apply_api_url_override(url);
    }
    let api = ApiClient::from_config(&config);
    info!("Using ledger API at {}", api.base_url());

    match cli.command {
        Command::Depositors {
            account,
            name,
            area,
            agent,
        } => {
            let mut list = DepositorList::new();
            let filter = CustomerFilter {
                account_number: account,
                customer_name: name,
                area,
                handler: agent,
            };
            list.apply_filter(&api, filter).await;
            finish(list.notice())?;
            for customer in list.depositors() {
                println!(
                    "{}  {}  {}  {}  {}",
                    customer.account_number,
                    customer.customer_name,
                    customer.phone_no,
                    customer.area,
                    customer.handler
                );
            }
        }
        Command::AddCustomer { customer, borrower } => {
            let mut screen = CustomerRegistration::new(config.conflict_draft_policy);
            customer.fill(&mut screen.form);
            if borrower {
                screen.form.type_of_customer = CustomerType::Borrower;
            }
            screen.submit(&api).await;
            finish(screen.notice())?;
        }
        Command::AddLoan {
            customer,
            duration,
            interest,
            amount,
        } => {
            let mut screen = LoanRegistration::new(config.conflict_draft_policy);
            customer.fill(&mut screen.form.customer);
            screen.form.duration = duration;
            screen.form.interest = interest;
            screen.form.loan_amount = amount;
            screen.submit(&api).await;
            finish(screen.notice())?;
        }
        Command::Deposits { account } => {
            let screen = mounted_deposits(&api, account).await;
            print_deposits(&screen);
        }
        Command::Deposit {
            account,
            amount,
            date,
        } => {
            let mut screen = mounted_deposits(&api, account).await;
            screen.open_add_modal();
            screen.draft.amount = amount;
            if let Some(date) = date {
                screen.draft.date = date;
            }
            screen.submit_deposit(&api).await;
            finish(screen.notice())?;
            print_deposits(&screen);
        }
        Command::EditDeposit {
            account,
            id,
            amount,
        } => {
            let mut screen = mounted_deposits(&api, account).await;
            if !screen.begin_edit(&id) {
                bail!("No deposit {} on account {}", id, screen.account_number());
            }
            if let Some(edit) = screen.edit.as_mut() {
                edit.form.amount = amount;
            }
            screen.submit_edit(&api).await;
            finish(screen.notice())?;
            print_deposits(&screen);
        }
        Command::DeleteDeposit { account, id, yes } => {
            let mut screen = mounted_deposits(&api, account).await;
            screen.request_delete(id);
            delete_from_deposits(&api, screen, yes).await?;
        }
        Command::CloseAccount { account, yes } => {
            let mut screen = mounted_deposits(&api, account).await;
            screen.request_close_account();
            delete_from_deposits(&api, screen, yes).await?;
        }
        Command::Installments { account } => {
            let screen = mounted_loan(&api, account).await;
            print_loan(&screen);
        }
        Command::Installment {
            account,
            amount,
            date,
        } => {
            let mut screen = mounted_loan(&api, account).await;
            screen.open_add_modal();
            screen.draft.amount = amount;
            if let Some(date) = date {
                screen.draft.date = date;
            }
            screen.submit_installment(&api).await;
            finish(screen.notice())?;
            print_loan(&screen);
        }
        Command::EditInstallment {
            account,
            date,
            amount,
        } => {
            let mut screen = mounted_loan(&api, account).await;
            let id = screen
                .ledger()
                .installments()
                .iter()
                .find(|i| i.date == date)
                .map(|i| i.id.clone())
                .with_context(|| {
                    format!("No installment on {} for {}", date, screen.account_number())
                })?;
            screen.begin_edit(&id);
            if let Some(edit) = screen.edit.as_mut() {
                edit.amount = amount;
            }
            screen.submit_edit(&api).await;
            finish(screen.notice())?;
            print_loan(&screen);
        }
        Command::DeleteInstallment { account, id, yes } => {
            let mut screen = mounted_loan(&api, account).await;
            screen.request_delete(id);
            delete_from_loan(&api, screen, yes).await?;
        }
        Command::DeleteLoan { account, yes } => {
            let mut screen = mounted_loan(&api, account).await;
            screen.request_delete_loan();
            delete_from_loan(&api, screen, yes).await?;
        }
        Command::Duration { account, months } => {
            let mut screen = mounted_loan(&api, account).await;
            if !screen.begin_duration_edit() {
                bail!("No loan on account {}", screen.account_number());
            }
            screen.duration = Some(DurationForm {
                new_duration: months,
            });
            screen.submit_duration(&api).await;
            finish(screen.notice())?;
            print_loan(&screen);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse()).await
}
