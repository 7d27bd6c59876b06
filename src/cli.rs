use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "finley")]
#[command(about = "Terminal client for the Finley personal-finance backend", long_about = None)]
pub struct Cli {
    /// Override Finley home directory (config/data subdirs will be created inside it).
    #[arg(long, env = "FINLEY_HOME")]
    pub home: Option<std::path::PathBuf>,

    /// Backend base URL, overriding the configured one.
    #[arg(long, env = "FINLEY_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Login(LoginArgs),
    Register(RegisterArgs),
    Logout,
    Status,

    Dashboard(DashboardArgs),

    Tx(TxArgs),
    Budget(BudgetArgs),
    Rule(RuleArgs),
    Goal(GoalArgs),
    Piggy(PiggyArgs),
    Challenge(ChallengeArgs),
    Leaderboard(LeaderboardArgs),

    Convert(ConvertArgs),
    Currency(CurrencyArgs),
    Settings(SettingsArgs),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    pub email: String,

    /// Read from the FINLEY_PASSWORD env var when omitted.
    #[arg(long, env = "FINLEY_PASSWORD")]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    pub name: String,
    pub email: String,

    #[arg(long, env = "FINLEY_PASSWORD")]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Month to summarize, 1-12. Defaults to the current month.
    #[arg(long)]
    pub month: Option<u32>,

    /// Year to summarize. Defaults to the current year.
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Debug, Subcommand)]
pub enum TxCmd {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },
    Add {
        /// "income" or "expense".
        kind: String,
        amount: String,
        #[arg(long)]
        category: i64,
        /// YYYY-MM-DD, defaults to today.
        #[arg(long)]
        date: Option<String>,
        #[arg(long, short = 'm')]
        note: Option<String>,
        /// Treat the amount as display-currency units and convert to storage.
        #[arg(long)]
        as_display: bool,
    },
    /// Replaces a transaction wholesale.
    Edit {
        id: i64,
        /// "income" or "expense".
        kind: String,
        amount: String,
        #[arg(long)]
        category: i64,
        #[arg(long)]
        date: String,
        #[arg(long, short = 'm')]
        note: Option<String>,
    },
    Rm {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct TxArgs {
    #[command(subcommand)]
    pub cmd: TxCmd,
}

#[derive(Debug, Subcommand)]
pub enum BudgetCmd {
    List,
    Create {
        amount: String,
        #[arg(long)]
        category: i64,
        /// weekly | monthly | yearly | points_harvest
        #[arg(long, default_value = "monthly")]
        period: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Replaces a budget wholesale.
    Update {
        id: i64,
        amount: String,
        #[arg(long)]
        category: i64,
        #[arg(long, default_value = "monthly")]
        period: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    Rm {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct BudgetArgs {
    #[command(subcommand)]
    pub cmd: BudgetCmd,
}

#[derive(Debug, Subcommand)]
pub enum RuleCmd {
    /// Lists all rules, marking the ones active today.
    List,
    Create {
        #[arg(long)]
        category: i64,
        /// exam_week | summer_break | custom
        #[arg(long)]
        event: String,
        /// percentage | fixed_amount
        #[arg(long)]
        adjustment: String,
        /// Percent delta or fixed delta, sign included.
        #[arg(long, allow_hyphen_values = true)]
        value: String,
        /// Required for custom rules (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
        /// Required for custom rules (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,
    },
    Rm {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct RuleArgs {
    #[command(subcommand)]
    pub cmd: RuleCmd,
}

#[derive(Debug, Subcommand)]
pub enum GoalCmd {
    List,
    Create {
        name: String,
        target: String,
        #[arg(long)]
        deadline: Option<String>,
    },
    Deposit {
        id: i64,
        amount: String,
    },
    Rm {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct GoalArgs {
    #[command(subcommand)]
    pub cmd: GoalCmd,
}

#[derive(Debug, Subcommand)]
pub enum PiggyCmd {
    Status,
    Deposit { amount: String },
}

#[derive(Debug, Args)]
pub struct PiggyArgs {
    #[command(subcommand)]
    pub cmd: PiggyCmd,
}

#[derive(Debug, Subcommand)]
pub enum ChallengeCmd {
    List,
    /// Draws a random challenge without starting it.
    Draw,
    Start {
        id: i64,
    },
    Complete {
        id: i64,
    },
    Rm {
        id: i64,
    },
    /// Polls for pending challenges until Ctrl-C.
    Watch {
        /// Seconds between checks.
        #[arg(long, default_value_t = 30)]
        interval: u64,
        /// Stop after this many checks instead of running until Ctrl-C.
        #[arg(long)]
        checks: Option<u32>,
    },
}

#[derive(Debug, Args)]
pub struct ChallengeArgs {
    #[command(subcommand)]
    pub cmd: ChallengeCmd,
}

#[derive(Debug, Args)]
pub struct LeaderboardArgs {
    /// Show point history for this user instead of the standings.
    #[arg(long)]
    pub history: Option<i64>,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    pub amount: String,
    #[arg(long, default_value = "AUD")]
    pub from: String,
    #[arg(long, default_value = "VND")]
    pub to: String,

    /// Convert locally with this rate instead of asking the backend.
    #[arg(long)]
    pub rate: Option<String>,

    /// Print past conversions instead of converting.
    #[arg(long)]
    pub history: bool,

    /// Print the recent business-day rate chart.
    #[arg(long)]
    pub chart: bool,
}

#[derive(Debug, Subcommand)]
pub enum CurrencyCmd {
    /// Flips the display currency between AUD and VND.
    Toggle,
    Status,
}

#[derive(Debug, Args)]
pub struct CurrencyArgs {
    #[command(subcommand)]
    pub cmd: CurrencyCmd,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCmd {
    Show,
    /// Enables or disables the mood-based theme and sets the mood.
    Theme {
        #[arg(long)]
        mood_based: Option<bool>,
        /// happy | sad | productive | relaxed
        #[arg(long)]
        mood: Option<String>,
    },
    /// Converts reward points into piggy-bank money (multiples of 100).
    ConvertPoints {
        points: i64,
    },
    Export,
    /// Lists expense/income categories or adds one.
    Category {
        #[arg(long)]
        add: Option<String>,
        /// income | expense, used with --add.
        #[arg(long, default_value = "expense")]
        kind: String,
    },
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub cmd: SettingsCmd,
}
