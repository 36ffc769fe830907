//! These structs provide the CLI interface for the ledger CLI.

use crate::model::{parse_month, LedgerError, MonthKey};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// ledger: keep a donation and expense ledger in a GitHub repository.
///
/// The ledger is two JSON files, one for donations grouped by month and one for expenses. They
/// are read from the repository's GitHub Pages site and written back through the GitHub API. A
/// copy of each is kept in a local cache so that the ledger keeps working when GitHub cannot be
/// reached.
///
/// Commands that change the ledger need admin mode (`ledger admin login`). Changes are only
/// written to GitHub when a token has been stored with `ledger token set`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and its configuration file.
    ///
    /// By default the ledger lives in $HOME/ledger and points at the sayprob/website-for-yassin
    /// repository. Use --ledger-home, --owner and --repo to change that.
    Init(InitArgs),
    /// Download both collections from GitHub and refresh the local cache.
    Pull,
    /// Upload both locally cached collections to GitHub.
    Push,
    /// Add, edit, remove or list donations.
    #[command(subcommand)]
    Donation(DonationCommand),
    /// Add, edit, remove or list expenses.
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Show the total donations per year, the total expenses and the balance.
    Summary,
    /// Turn admin mode on or off.
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Store, remove or check the GitHub token used for writes.
    #[command(subcommand)]
    Token(TokenCommand),
    /// Set the display theme preference.
    Theme(ThemeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where ledger data and configuration is held. Defaults to ~/ledger
    #[arg(long, env = "LEDGER_HOME", default_value_t = default_ledger_home())]
    ledger_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, ledger_home: PathBuf) -> Self {
        Self {
            log_level,
            ledger_home: ledger_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn ledger_home(&self) -> &DisplayPath {
        &self.ledger_home
    }
}

/// (Not shown): Args for the `ledger init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The GitHub user or organization that owns the repository.
    #[arg(long, default_value = crate::config::DEFAULT_OWNER)]
    owner: String,

    /// The repository that holds the ledger files.
    #[arg(long, default_value = crate::config::DEFAULT_REPO)]
    repo: String,

    /// Where the repository is published. Defaults to https://<owner>.github.io/<repo>/
    #[arg(long)]
    pages_url: Option<String>,
}

impl InitArgs {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        pages_url: Option<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            pages_url,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn pages_url(&self) -> Option<&str> {
        self.pages_url.as_deref()
    }
}

/// Selects a month of a year.
#[derive(Debug, Parser, Clone)]
pub struct MonthArgs {
    /// The year, e.g. 2024.
    #[arg(long)]
    year: i32,

    /// The month: a number from 1 to 12, an English name like January, or an Arabic name.
    #[arg(long)]
    month: String,
}

impl MonthArgs {
    pub fn new(year: i32, month: impl Into<String>) -> Self {
        Self {
            year,
            month: month.into(),
        }
    }

    pub fn key(&self) -> Result<MonthKey, LedgerError> {
        let month = parse_month(&self.month)
            .ok_or_else(|| LedgerError::InvalidMonthKey(format!("{}-{}", self.year, self.month)))?;
        MonthKey::new(self.year, month)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DonationCommand {
    /// Record a donation for a month.
    Add(DonationAddArgs),
    /// Replace a donation. Use `ledger donation list` to find its index.
    Edit(DonationEditArgs),
    /// Remove a donation. Use `ledger donation list` to find its index.
    Remove(DonationRemoveArgs),
    /// List the years, the months of a year, or the donations of a month.
    List(DonationListArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct DonationAddArgs {
    #[clap(flatten)]
    month: MonthArgs,

    /// The donor's name.
    #[arg(long)]
    name: String,

    /// The donated amount, e.g. 100 or 1,250.50
    #[arg(long)]
    amount: String,
}

impl DonationAddArgs {
    pub fn new(month: MonthArgs, name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            month,
            name: name.into(),
            amount: amount.into(),
        }
    }

    pub fn month(&self) -> &MonthArgs {
        &self.month
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

#[derive(Debug, Parser, Clone)]
pub struct DonationEditArgs {
    #[clap(flatten)]
    month: MonthArgs,

    /// The position of the donation within the month, starting at 0.
    #[arg(long)]
    index: usize,

    /// The donor's name.
    #[arg(long)]
    name: String,

    /// The donated amount.
    #[arg(long)]
    amount: String,
}

impl DonationEditArgs {
    pub fn new(
        month: MonthArgs,
        index: usize,
        name: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            month,
            index,
            name: name.into(),
            amount: amount.into(),
        }
    }

    pub fn month(&self) -> &MonthArgs {
        &self.month
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

#[derive(Debug, Parser, Clone)]
pub struct DonationRemoveArgs {
    #[clap(flatten)]
    month: MonthArgs,

    /// The position of the donation within the month, starting at 0.
    #[arg(long)]
    index: usize,
}

impl DonationRemoveArgs {
    pub fn new(month: MonthArgs, index: usize) -> Self {
        Self { month, index }
    }

    pub fn month(&self) -> &MonthArgs {
        &self.month
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Parser, Clone)]
pub struct DonationListArgs {
    /// List the months of this year.
    #[arg(long)]
    year: Option<i32>,

    /// List the donations of this month. Requires --year.
    #[arg(long, requires = "year")]
    month: Option<String>,
}

impl DonationListArgs {
    pub fn new(year: Option<i32>, month: Option<String>) -> Self {
        Self { year, month }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ExpenseCommand {
    /// Record an expense.
    Add(ExpenseArgs),
    /// Replace an expense. Use `ledger expense list` to find its index.
    Edit(ExpenseEditArgs),
    /// Remove an expense. Use `ledger expense list` to find its index.
    Remove(IndexArgs),
    /// List all expenses, most recent first.
    List,
}

#[derive(Debug, Parser, Clone)]
pub struct ExpenseArgs {
    /// The date of the expense as YYYY-MM-DD.
    #[arg(long)]
    date: String,

    /// The amount spent.
    #[arg(long)]
    amount: String,

    /// What the money was spent on.
    #[arg(long)]
    description: String,
}

impl ExpenseArgs {
    pub fn new(
        date: impl Into<String>,
        amount: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            amount: amount.into(),
            description: description.into(),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ExpenseEditArgs {
    /// The position of the expense in `ledger expense list`, starting at 0.
    #[arg(long)]
    index: usize,

    #[clap(flatten)]
    expense: ExpenseArgs,
}

impl ExpenseEditArgs {
    pub fn new(index: usize, expense: ExpenseArgs) -> Self {
        Self { index, expense }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn expense(&self) -> &ExpenseArgs {
        &self.expense
    }
}

#[derive(Debug, Parser, Clone)]
pub struct IndexArgs {
    /// The position of the entry, starting at 0.
    #[arg(long)]
    index: usize,
}

impl IndexArgs {
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommand {
    /// Turn admin mode on. It stays on until `ledger admin logout`.
    Login(LoginArgs),
    /// Turn admin mode off.
    Logout,
    /// Show whether admin mode is on.
    Status,
}

#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// The admin password from config.json.
    #[arg(long, env = "LEDGER_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

impl LoginArgs {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TokenCommand {
    /// Check a GitHub token against the repository and store it.
    Set(TokenArgs),
    /// Forget the stored token. Changes will only be saved locally.
    Remove,
    /// Show whether a token is stored.
    Status,
}

#[derive(Debug, Parser, Clone)]
pub struct TokenArgs {
    /// A GitHub personal access token with write access to the repository contents.
    #[arg(long, env = "LEDGER_GITHUB_TOKEN", hide_env_values = true)]
    token: String,
}

impl TokenArgs {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Dark,
    Light,
    #[default]
    Toggle,
}

serde_plain::derive_display_from_serialize!(Theme);
serde_plain::derive_fromstr_from_deserialize!(Theme);

/// (Not shown): Args for the `ledger theme` command.
#[derive(Debug, Parser, Clone)]
pub struct ThemeArgs {
    /// "dark", "light" or "toggle"
    #[arg(default_value_t = Theme::Toggle)]
    theme: Theme,
}

impl ThemeArgs {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }
}

fn default_ledger_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --ledger-home or LEDGER_HOME instead of relying on the default \
                ledger home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("ledger")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_donation_add() {
        let args = Args::try_parse_from([
            "ledger",
            "--ledger-home",
            "/tmp/ledger",
            "donation",
            "add",
            "--year",
            "2024",
            "--month",
            "يناير",
            "--name",
            "Ahmad",
            "--amount",
            "1,000",
        ])
        .unwrap();
        assert_eq!(args.common().ledger_home().path(), Path::new("/tmp/ledger"));
        let Command::Donation(DonationCommand::Add(add)) = args.command() else {
            panic!("wrong command: {:?}", args.command());
        };
        assert_eq!(add.month().key().unwrap(), MonthKey::new(2024, 1).unwrap());
        assert_eq!(add.amount(), "1,000");
    }

    #[test]
    fn test_month_args_rejects_unknown_month() {
        let err = MonthArgs::new(2024, "Smarch").key().unwrap_err();
        assert_eq!(err, LedgerError::InvalidMonthKey("2024-Smarch".to_string()));
    }

    #[test]
    fn test_parse_theme() {
        let args = Args::try_parse_from(["ledger", "theme", "dark"]).unwrap();
        let Command::Theme(theme) = args.command() else {
            panic!("wrong command");
        };
        assert_eq!(theme.theme(), Theme::Dark);

        let args = Args::try_parse_from(["ledger", "theme"]).unwrap();
        let Command::Theme(theme) = args.command() else {
            panic!("wrong command");
        };
        assert_eq!(theme.theme(), Theme::Toggle);
        assert!(Args::try_parse_from(["ledger", "theme", "blue"]).is_err());
    }

    #[test]
    fn test_donation_list_month_requires_year() {
        assert!(Args::try_parse_from(["ledger", "donation", "list", "--month", "May"]).is_err());
        assert!(
            Args::try_parse_from(["ledger", "donation", "list", "--year", "2024", "--month", "May"])
                .is_ok()
        );
    }

    #[test]
    fn test_log_level() {
        let args = Args::try_parse_from(["ledger", "--log-level", "debug", "summary"]).unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
    }
}
