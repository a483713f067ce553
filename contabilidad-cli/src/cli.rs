use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "contabilidad")]
#[command(about = "Daily incomes, expenses and recurring payments from the terminal")]
pub struct Cli {
    /// Use local in-memory data instead of the backend
    #[arg(long, global = true)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List recent movements with their totals
    List {
        /// How many days to show (defaults to the configured limit)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show the incomes and expenses of one day
    Show {
        /// Day as YYYY-MM-DD
        date: String,
    },
    /// Add, change or delete lines of one day and save it
    Edit(EditArgs),
    /// Delete a whole day
    Delete {
        /// Day as YYYY-MM-DD
        date: String,
    },
    /// Per-day summary of one month from the backend
    Month {
        /// Month as YYYY-MM
        month: String,
    },
    /// Recurring expenses that are due but not recorded
    Pending {
        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },
    /// Record a pending recurring expense on its due date
    Record {
        /// Label of the recurring expense
        label: Option<String>,
        /// Due date as YYYY-MM-DD
        date: Option<String>,
        /// Record every pending occurrence
        #[arg(long, conflicts_with_all = ["label", "date"])]
        all: bool,
    },
    /// Stop reporting a pending recurring expense
    Dismiss {
        /// Label of the recurring expense
        label: Option<String>,
        /// Due date as YYYY-MM-DD
        date: Option<String>,
        /// Dismiss every pending occurrence
        #[arg(long, conflicts_with_all = ["label", "date"])]
        all: bool,
    },
    /// Manage recurring expense definitions
    Recurring {
        #[command(subcommand)]
        command: RecurringCommand,
    },
    /// Expense labels grouped by how they are paid
    Kinds,
    /// Monthly or yearly totals
    Breakdown {
        #[arg(value_enum)]
        period: Period,
        #[arg(long, value_enum, default_value_t = SortBy::Date)]
        sort: SortBy,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
    },
    /// List and manage tags
    Tags {
        #[command(subcommand)]
        command: Option<TagCommand>,
    },
    /// Find lines by label
    Search {
        label: String,
        /// Search incomes instead of expenses
        #[arg(long)]
        income: bool,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Show notifications about automatically recorded expenses
    Notifications {
        /// Show every notification from the last 30 days, not just unseen ones
        #[arg(long)]
        all: bool,
        /// Mark a notification as seen
        #[arg(long)]
        close: Option<String>,
    },
    /// Show or toggle the dark mode preference
    Theme {
        #[arg(long)]
        toggle: bool,
    },
    /// Print config path and create default file if missing
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Day as YYYY-MM-DD
    pub date: String,
    /// New income as LABEL=AMOUNT
    #[arg(long = "add-income", value_name = "LABEL=AMOUNT")]
    pub add_income: Vec<String>,
    /// New expense as LABEL=AMOUNT
    #[arg(long = "add-expense", value_name = "LABEL=AMOUNT")]
    pub add_expense: Vec<String>,
    /// Change an income as ID=LABEL=AMOUNT
    #[arg(long = "update-income", value_name = "ID=LABEL=AMOUNT")]
    pub update_income: Vec<String>,
    /// Change an expense as ID=LABEL=AMOUNT
    #[arg(long = "update-expense", value_name = "ID=LABEL=AMOUNT")]
    pub update_expense: Vec<String>,
    /// Delete an income right away
    #[arg(long = "delete-income", value_name = "ID")]
    pub delete_income: Vec<String>,
    /// Delete an expense right away
    #[arg(long = "delete-expense", value_name = "ID")]
    pub delete_expense: Vec<String>,
    /// Move the day to another date (YYYY-MM-DD)
    #[arg(long = "date", value_name = "DATE")]
    pub new_date: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum RecurringCommand {
    /// List definitions with their index
    List,
    /// Add a definition
    Add {
        label: String,
        amount: f64,
        #[arg(long, value_enum)]
        frequency: FrequencyArg,
        /// Day of month (monthly)
        #[arg(long, required_if_eq("frequency", "monthly"))]
        day: Option<u8>,
        /// Weekday, e.g. lunes or monday (weekly)
        #[arg(long, required_if_eq("frequency", "weekly"))]
        weekday: Option<String>,
        /// Date as MM-DD (annual)
        #[arg(long, required_if_eq("frequency", "annual"))]
        on: Option<String>,
        /// First day it can be due (defaults to today)
        #[arg(long)]
        since: Option<String>,
    },
    /// Change the amount of a definition
    SetAmount { index: usize, amount: f64 },
    /// Remove a definition and forget its dismissals
    Remove { index: usize },
}

#[derive(Debug, Subcommand)]
pub enum TagCommand {
    /// List every tag
    List,
    /// Create a tag
    Add {
        name: String,
        /// Tag for incomes instead of expenses
        #[arg(long)]
        income: bool,
        /// Mark as an essential expense
        #[arg(long)]
        essential: bool,
    },
    /// Rename a tag
    Rename { id: i64, name: String },
    /// Delete a tag
    Remove { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    Date,
    Gross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FrequencyArg {
    Monthly,
    Weekly,
    Annual,
}
