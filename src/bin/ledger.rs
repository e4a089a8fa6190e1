use std::{error::Error, io, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use frugal_ledger::{
    CategoryForm, CategoryId, LogInForm, RegisterForm, TransactionId,
    client::{
        ApiClient, ClientApp, ClientError, NewTransactionRequest, ReceiptImage, SessionStore,
        View, render_dashboard, render_transaction,
    },
};

/// A command line client for the Frugal Ledger API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The URL of the Frugal Ledger server.
    #[arg(long, env = "LEDGER_SERVER", default_value = "http://localhost:5000")]
    server: String,

    /// Where the session is saved between commands.
    #[arg(long, env = "LEDGER_SESSION_FILE", default_value = "ledger-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in. The password is prompted for.
    Register {
        /// Your display name.
        #[arg(long)]
        name: String,
        /// The email address you will log in with.
        #[arg(long)]
        email: String,
    },
    /// Log in to an existing account. The password is prompted for.
    LogIn {
        /// The email address you registered with.
        #[arg(long)]
        email: String,
    },
    /// Forget the saved session.
    LogOut,
    /// Show the totals, chart and transactions.
    Dashboard,
    /// Manage categories.
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Manage transactions.
    #[command(subcommand)]
    Transaction(TransactionCommand),
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// List your categories, newest first.
    List,
    /// Create a category.
    Add {
        /// The name of the category.
        #[arg(long)]
        name: String,
        /// Either INCOME or EXPENSE.
        #[arg(long = "type")]
        kind: String,
    },
    /// Delete a category that no transactions use.
    Delete {
        /// The ID of the category.
        id: CategoryId,
    },
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    /// Record a transaction.
    Add {
        /// How much money was spent or earned.
        #[arg(long)]
        amount: f64,
        /// What the transaction was for.
        #[arg(long)]
        description: String,
        /// The ID of the category.
        #[arg(long)]
        category_id: CategoryId,
        /// When the transaction happened, e.g. 2025-04-01. Defaults to now.
        #[arg(long)]
        date: Option<String>,
        /// A JPEG or PNG photo of the receipt.
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Show a single transaction.
    Show {
        /// The ID of the transaction.
        id: TransactionId,
    },
    /// Delete a transaction.
    Delete {
        /// The ID of the transaction.
        id: TransactionId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            print_error(&error);

            if let Some(client_error) = error.downcast_ref::<ClientError>()
                && client_error.is_unauthorized()
            {
                eprintln!("Log in with `ledger log-in --email <EMAIL>` and try again.");
            }

            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let now = OffsetDateTime::now_utc();
    let sessions = SessionStore::open(&args.session_file)?;
    let mut app = ClientApp::new(ApiClient::new(&args.server), sessions, now);

    match args.command {
        Command::Register { name, email } => {
            app.show(View::Register);
            let Some(password) = prompt_new_password()? else {
                return Ok(());
            };

            let identity = app
                .register(
                    &RegisterForm {
                        name,
                        email,
                        password,
                    },
                    now,
                )
                .await?;
            println!("Registered and logged in as {}.", identity.name);
        }
        Command::LogIn { email } => {
            let password = rpassword::prompt_password("Password: ")?;
            let identity = app.log_in(&LogInForm { email, password }, now).await?;
            println!("Logged in as {}.", identity.name);
        }
        Command::LogOut => {
            app.log_out()?;
            println!("Logged out.");
        }
        Command::Dashboard => print_dashboard(&mut app, now).await?,
        Command::Category(command) => run_category_command(&mut app, command, now).await?,
        Command::Transaction(command) => run_transaction_command(&mut app, command, now).await?,
    }

    Ok(())
}

async fn print_dashboard(app: &mut ClientApp, now: OffsetDateTime) -> Result<(), ClientError> {
    app.refresh(now).await?;
    let identity = app.identity(now).cloned().ok_or(ClientError::NoSession)?;

    print!("{}", render_dashboard(&identity, app.dashboard()));

    Ok(())
}

async fn run_category_command(
    app: &mut ClientApp,
    command: CategoryCommand,
    now: OffsetDateTime,
) -> Result<(), ClientError> {
    match command {
        CategoryCommand::List => {
            let dashboard = app.refresh(now).await?;

            if dashboard.categories.is_empty() {
                println!("No categories yet.");
            }

            for category in &dashboard.categories {
                println!("{:>5}  {:<8}  {}", category.id, category.kind, category.name);
            }
        }
        CategoryCommand::Add { name, kind } => {
            let category = app
                .create_category(&CategoryForm { name, kind }, now)
                .await?;
            println!(
                "Created {} category \"{}\" with ID {}.",
                category.kind, category.name, category.id
            );
        }
        CategoryCommand::Delete { id } => {
            println!("{}", app.delete_category(id, now).await?);
        }
    }

    Ok(())
}

async fn run_transaction_command(
    app: &mut ClientApp,
    command: TransactionCommand,
    now: OffsetDateTime,
) -> Result<(), Box<dyn Error>> {
    match command {
        TransactionCommand::Add {
            amount,
            description,
            category_id,
            date,
            image,
        } => {
            let image = image
                .map(|path| ReceiptImage::from_path(&path))
                .transpose()?;

            let transaction = app
                .create_transaction(
                    NewTransactionRequest {
                        amount,
                        description,
                        category_id,
                        date,
                        image,
                    },
                    now,
                )
                .await?;
            println!("Recorded transaction #{}.", transaction.id);
        }
        TransactionCommand::Show { id } => {
            let detail = app.transaction(id, now).await?;
            let receipt_url = detail
                .transaction
                .image_url
                .as_deref()
                .map(|image_url| app.api().receipt_url(image_url));

            print!("{}", render_transaction(&detail, receipt_url.as_deref()));
        }
        TransactionCommand::Delete { id } => {
            println!("{}", app.delete_transaction(id, now).await?);
        }
    }

    Ok(())
}

/// Prompt for a password twice. Returns `None` if stdin was closed.
fn prompt_new_password() -> Result<Option<String>, io::Error> {
    loop {
        let first_password = match rpassword::prompt_password("Password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(error) => return Err(error),
        };

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(error) => return Err(error),
        };

        if first_password == second_password {
            return Ok(Some(first_password));
        }

        print_error("Passwords must match, try again.");
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
