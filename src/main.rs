use std::process::ExitCode;

use anyhow::Result;

use cpa_hooks::cli::{Args, Command, ReportArgs, ReportFormatArg, SortByArg};
use cpa_hooks::config::Settings;
use cpa_hooks::costs::{self, CostsLogger};
use cpa_hooks::git::GitCommitPlugin;
use cpa_hooks::logger::{HookExit, hook_information, run_logger};
use cpa_hooks::logging::init_logging;
use cpa_hooks::models::HookInformation;
use cpa_hooks::orchestrator::SessionEndOrchestrator;
use cpa_hooks::pricing::PricingTable;
use cpa_hooks::report::{
    ReportFilter, ReportFormat, SortBy, load_report_sessions, parse_since, render, sort_sessions,
};
use cpa_hooks::user_inputs::UserInputsLogger;
use cpa_hooks::utils::read_stdin;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);
    let settings = Settings::from_args(&args);

    if let Command::Report(report_args) = &args.command {
        return match run_report(report_args, &settings) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{e:#}");
                ExitCode::FAILURE
            }
        };
    }

    if !settings.cpa_running {
        tracing::debug!("CPA_RUNNING is not 1, skipping session-end hooks");
        return ExitCode::SUCCESS;
    }

    let info = match read_hook_information(&settings) {
        Ok(info) => info,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let exit = match args.command {
        Command::SessionEnd => SessionEndOrchestrator::standard(&settings).run(&info),
        Command::Costs => {
            let pricing = PricingTable::load_or_empty(&settings.pricing_file);
            run_logger(&CostsLogger::new(pricing), &info)
        }
        Command::UserInputs => run_logger(&UserInputsLogger, &info),
        Command::GitCommit => GitCommitPlugin::new().run(&info),
        Command::Report(_) => HookExit::Success,
    };
    exit.into()
}

fn read_hook_information(settings: &Settings) -> Result<HookInformation> {
    let stdin = read_stdin()?;
    Ok(hook_information(&stdin[..], settings.workspace_dir.clone())?)
}

fn run_report(args: &ReportArgs, settings: &Settings) -> Result<()> {
    let filter = ReportFilter {
        since: args.since.as_deref().map(parse_since).transpose()?,
        model: args.model.clone(),
    };
    let directory = args
        .directory
        .clone()
        .unwrap_or_else(|| settings.artifacts_dir().join(costs::CATEGORY));

    let mut sessions = load_report_sessions(&directory, &filter)?;
    if sessions.is_empty() {
        tracing::warn!("No session files found matching criteria.");
        return Ok(());
    }

    let sort_by = match args.sort_by {
        SortByArg::Date => SortBy::Date,
        SortByArg::Cost => SortBy::Cost,
        SortByArg::Duration => SortBy::Duration,
        SortByArg::Tokens => SortBy::Tokens,
    };
    let format = match args.format {
        ReportFormatArg::Summary => ReportFormat::Summary,
        ReportFormatArg::Detailed => ReportFormat::Detailed,
        ReportFormatArg::Csv => ReportFormat::Csv,
        ReportFormatArg::Json => ReportFormat::Json,
    };
    sort_sessions(&mut sessions, sort_by);
    print!("{}", render(&sessions, format)?);
    Ok(())
}
