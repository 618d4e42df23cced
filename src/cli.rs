use std::path::PathBuf;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormatArg {
    /// Totals, per-model breakdown and the most expensive sessions
    Summary,
    /// One block per session
    Detailed,
    Csv,
    Json,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortByArg {
    /// Oldest first
    Date,
    /// Most expensive first
    Cost,
    /// Longest first
    Duration,
    /// Most tokens first
    Tokens,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Run the cost logger, the user input logger and the git commit hook in order
    SessionEnd,
    /// Record token usage and cost for the session, then refresh costs_aggregation.json
    Costs,
    /// Record the user's inputs for the session, then refresh user_inputs_aggregation.json
    UserInputs,
    /// Commit and push plugin changes once a wrap-up report exists
    GitCommit,
    /// Summarize stored session cost files
    Report(ReportArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// Directory containing session JSON files. Defaults to the workspace costs directory
    pub directory: Option<PathBuf>,

    /// Output format: summary|detailed|csv|json
    #[arg(long, value_enum, default_value_t = ReportFormatArg::Summary)]
    pub format: ReportFormatArg,

    /// Only include sessions since this date (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,

    /// Filter by model name substring (e.g. claude-sonnet-4-5)
    #[arg(long)]
    pub model: Option<String>,

    /// Sort sessions by: date|cost|duration|tokens
    #[arg(long, value_enum, default_value_t = SortByArg::Date)]
    pub sort_by: SortByArg,
}

#[derive(clap::Parser, Debug)]
#[command(name = "cpa-hooks", version, about = "Session-end hooks for the plugin assistant workflow")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Hooks only run when this is "1"
    #[arg(long, env = "CPA_RUNNING", global = true)]
    pub cpa_running: Option<String>,

    /// Workspace root holding all plugins
    #[arg(long, env = "CPA_WORKSPACE_DIR", global = true)]
    pub workspace_dir: Option<PathBuf>,

    /// Plugin currently being worked on; takes precedence over the workspace dir
    #[arg(long, env = "CPA_PLUGIN_DIR", global = true)]
    pub plugin_dir: Option<PathBuf>,

    /// Model pricing table (per-million-token prices)
    #[arg(long, env = "CPA_PRICING_FILE", global = true)]
    pub pricing_file: Option<PathBuf>,

    /// Debug logging on stderr (CPA_LOG overrides)
    #[arg(
        long,
        env = "CPA_DEBUG",
        global = true,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}
