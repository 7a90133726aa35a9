pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "quoteflow",
    about = "Quoteflow operator CLI",
    long_about = "Operate the quote approval store: migrations, demo data, config inspection, and workflow changes.",
    after_help = "Examples:\n  quoteflow migrate\n  quoteflow quotes --status pending --sort amount-desc\n  quoteflow advance Q-2025-001 quoting\n  quoteflow set-workflow Q-2025-001 configuration pricing billing --assignee billing=Dana"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Insert the demo quotes that are not stored yet")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "List quotes with optional search, status filter and sort order")]
    Quotes {
        #[arg(long, help = "Match against quote id, customer or amount")]
        search: Option<String>,
        #[arg(long, help = "pending | approved | rejected")]
        status: Option<String>,
        #[arg(long, help = "date-desc | date-asc | amount-desc | amount-asc | customer")]
        sort: Option<String>,
    },
    #[command(about = "Mark the pending step of a quote as completed")]
    Advance {
        quote_id: String,
        step_id: String,
    },
    #[command(about = "Replace a quote's workflow with the given personas, in order")]
    SetWorkflow {
        quote_id: String,
        personas: Vec<String>,
        #[arg(long = "assignee", value_name = "PERSONA=NAME", help = "Override a step's assignee")]
        assignees: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Quotes { search, status, sort } => commands::quotes::run(search, status, sort),
        Command::Advance { quote_id, step_id } => commands::advance::run(quote_id, step_id),
        Command::SetWorkflow { quote_id, personas, assignees } => {
            commands::set_workflow::run(quote_id, personas, assignees)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn set_workflow_collects_personas_and_overrides() {
        let cli = Cli::try_parse_from([
            "quoteflow",
            "set-workflow",
            "Q-2025-001",
            "configuration",
            "billing",
            "--assignee",
            "billing=Dana",
        ])
        .expect("parse");

        match cli.command {
            Command::SetWorkflow { quote_id, personas, assignees } => {
                assert_eq!(quote_id, "Q-2025-001");
                assert_eq!(personas, ["configuration", "billing"]);
                assert_eq!(assignees, ["billing=Dana"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn advance_requires_quote_and_step() {
        assert!(Cli::try_parse_from(["quoteflow", "advance", "Q-2025-001"]).is_err());
    }
}
