use clap::Parser;
use donation_ledger::args::{
    AdminCommand, Args, Command, DonationCommand, ExpenseCommand, TokenCommand,
};
use donation_ledger::{commands, App, Config, Mode, Result};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().ledger_home().path();

    // This allows for testing the program without hitting GitHub. When LEDGER_SYNC_IN_TEST_MODE
    // is set and non-zero in length, then the mode will be Mode::Test, otherwise it will be
    // Mode::GitHub.
    let mode = Mode::from_env();

    match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.owner(),
            init_args.repo(),
            init_args.pages_url(),
        )
        .await?
        .print(),

        Command::Pull => commands::pull(&open(home, mode).await?).await?.print(),

        Command::Push => commands::push(&open(home, mode).await?).await?.print(),

        Command::Donation(donation) => {
            let app = open(home, mode).await?;
            match donation {
                DonationCommand::Add(a) => commands::donation_add(&app, a).await?.print(),
                DonationCommand::Edit(a) => commands::donation_edit(&app, a).await?.print(),
                DonationCommand::Remove(a) => commands::donation_remove(&app, a).await?.print(),
                DonationCommand::List(a) => commands::donation_list(&app, a).await?.print(),
            }
        }

        Command::Expense(expense) => {
            let app = open(home, mode).await?;
            match expense {
                ExpenseCommand::Add(a) => commands::expense_add(&app, a).await?.print(),
                ExpenseCommand::Edit(a) => commands::expense_edit(&app, a).await?.print(),
                ExpenseCommand::Remove(a) => commands::expense_remove(&app, a).await?.print(),
                ExpenseCommand::List => commands::expense_list(&app).await?.print(),
            }
        }

        Command::Summary => commands::summary(&open(home, mode).await?).await?.print(),

        Command::Admin(admin) => {
            let mut app = open(home, mode).await?;
            match admin {
                AdminCommand::Login(a) => commands::admin_login(&mut app, a.password())
                    .await?
                    .print(),
                AdminCommand::Logout => commands::admin_logout(&mut app).await?.print(),
                AdminCommand::Status => commands::admin_status(&app).await?.print(),
            }
        }

        Command::Token(token) => {
            let mut app = open(home, mode).await?;
            match token {
                TokenCommand::Set(a) => commands::token_set(&mut app, a.token()).await?.print(),
                TokenCommand::Remove => commands::token_remove(&mut app).await?.print(),
                TokenCommand::Status => commands::token_status(&app).await?.print(),
            }
        }

        Command::Theme(theme_args) => {
            let mut app = open(home, mode).await?;
            commands::theme(&mut app, theme_args.theme()).await?.print()
        }
    }
    Ok(())
}

/// Loads the config from the ledger home and opens the app on it.
async fn open(home: &Path, mode: Mode) -> Result<App> {
    let config = Config::load(home).await?;
    App::open(config, mode).await
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                "donation_ledger",
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
