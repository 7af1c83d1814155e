use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod actions;
mod config;
mod db;
mod import;
mod ledger;
mod models;
mod prompt;
mod report;
mod schedule;
mod store;

use actions::{DealPrefill, MeetingPrefill, Outcome};
use config::{Settings, StorageSettings};
use ledger::{Ledger, LedgerError};
use models::{DealDraft, DealStatus, Kpi, MeetingDraft, SalesPersonDraft};
use prompt::{Prompter, TerminalPrompter};
use store::KeyValueStore;

#[derive(Parser)]
#[command(name = "sales-kpi-tracker")]
#[command(about = "Weekly meeting and deal KPIs for a sales team", long_about = None)]
struct Cli {
    /// Postgres connection string; takes precedence over --data-dir
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,
    /// Directory holding the JSON collections
    #[arg(long, env = "SALES_TRACKER_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<String>,
    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    #[command(flatten)]
    Ledger(LedgerCommand),
}

/// Commands that work against an open store.
#[derive(Subcommand)]
enum LedgerCommand {
    /// Load the default sales team into an empty store
    Seed,
    /// List sales people and their progress
    List,
    /// Show one sales person with bucketed meetings and deals
    Show { id: String },
    /// Add a sales person
    AddPerson {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = 20)]
        target_meetings: u32,
        #[arg(long, default_value_t = 10)]
        target_deals: u32,
    },
    /// Delete a sales person with all their meetings and deals
    DeletePerson { id: String },
    /// Add a meeting; prompts unless --client and --date are given
    AddMeeting {
        person: String,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Edit a meeting; prompts when no field is given
    EditMeeting {
        id: String,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        outcome: Option<String>,
    },
    /// Record what came of a meeting that has already happened
    RecordOutcome {
        id: String,
        /// Omit to clear the outcome
        outcome: Option<String>,
    },
    /// Delete a meeting
    DeleteMeeting { id: String },
    /// Add a closed deal; prompts unless --client, --value and --won or --lost are given
    #[command(group(
        ArgGroup::new("result")
            .args(["won", "lost"])
            .multiple(false)
    ))]
    AddDeal {
        person: String,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        won: bool,
        #[arg(long)]
        lost: bool,
    },
    /// Delete a deal
    DeleteDeal { id: String },
    /// Import meetings for a sales person from a CSV file
    ImportMeetings {
        #[arg(long)]
        person: String,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Report counters that disagree with their records
    Audit,
    /// Generate a markdown dashboard
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(
        cli.database_url.clone(),
        cli.data_dir.clone(),
        cli.today.as_deref(),
    )?;

    let command = match cli.command {
        Commands::InitDb => return init_db(&settings),
        Commands::Ledger(command) => command,
    };

    let store = settings.open_store()?;
    let mut ledger = Ledger::new(store, settings.today);
    let mut prompter = TerminalPrompter::new(cli.yes)?;

    match run(command, &mut ledger, &mut prompter) {
        Err(err) => match err.downcast_ref::<LedgerError>() {
            Some(missing) if missing.is_not_found() => {
                tracing::warn!(error = %missing, "showing list instead");
                println!("{missing}");
                println!();
                print!("{}", report::build_list(&ledger.sales_people(), ledger.today()));
                Ok(())
            }
            _ => Err(err),
        },
        ok => ok,
    }
}

fn init_db(settings: &Settings) -> anyhow::Result<()> {
    match &settings.storage {
        StorageSettings::Postgres { url } => {
            db::PgStore::connect(url)?.init_schema()?;
            println!("Schema ready.");
        }
        StorageSettings::Files { dir } => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            println!("Data directory ready at {}.", dir.display());
        }
    }
    Ok(())
}

fn run<S: KeyValueStore>(
    command: LedgerCommand,
    ledger: &mut Ledger<S>,
    prompter: &mut dyn Prompter,
) -> anyhow::Result<()> {
    match command {
        LedgerCommand::Seed => {
            let seeded = ledger.seed_defaults();
            if seeded == 0 {
                println!("Sales people already exist; nothing seeded.");
            } else {
                println!("Seeded {seeded} sales people.");
            }
        }
        LedgerCommand::List => {
            print!("{}", report::build_list(&ledger.sales_people(), ledger.today()));
        }
        LedgerCommand::Show { id } => {
            let view = ledger.open_sales_person(&id)?;
            print!("{}", report::build_detail(&view, ledger.today()));
        }
        LedgerCommand::AddPerson {
            name,
            email,
            target_meetings,
            target_deals,
        } => {
            let draft = SalesPersonDraft {
                name,
                email,
                target: Kpi {
                    meetings: target_meetings,
                    deals: target_deals,
                },
            };
            if let Some(person) = actions::settle(prompter, ledger.add_sales_person(draft))?.applied() {
                println!("Added {} ({}).", person.name, person.id);
            }
        }
        LedgerCommand::DeletePerson { id } => {
            if let Outcome::Applied(summary) = actions::delete_sales_person(ledger, prompter, &id)? {
                println!(
                    "Deleted sales person {id} with {} meetings and {} deals.",
                    summary.meetings_removed, summary.deals_removed
                );
            }
        }
        LedgerCommand::AddMeeting {
            person,
            client,
            date,
            notes,
        } => {
            let outcome = match (client, date) {
                (Some(client_name), Some(date)) => {
                    let draft = MeetingDraft {
                        client_name,
                        date,
                        notes,
                        outcome: None,
                    };
                    let result = ledger.add_meeting(&person, draft);
                    actions::settle(prompter, result)?
                }
                (client_name, date) => {
                    let prefill = MeetingPrefill {
                        client_name,
                        date,
                        notes,
                    };
                    actions::add_meeting(ledger, prompter, &person, prefill)?
                }
            };
            if let Outcome::Applied(meeting) = outcome {
                println!("Added meeting {} on {}.", meeting.id, meeting.date);
            }
        }
        LedgerCommand::EditMeeting {
            id,
            client,
            date,
            notes,
            outcome,
        } => {
            let flagged = client.is_some() || date.is_some() || notes.is_some() || outcome.is_some();
            let result = if flagged {
                let existing = ledger.meeting(&id)?;
                let draft = MeetingDraft {
                    client_name: client.unwrap_or(existing.client_name),
                    date: date.unwrap_or_else(|| existing.date.to_string()),
                    notes: notes.or(existing.notes),
                    outcome: outcome.or(existing.outcome),
                };
                let result = ledger.edit_meeting(&id, draft);
                actions::settle(prompter, result)?
            } else {
                actions::edit_meeting(ledger, prompter, &id)?
            };
            if let Outcome::Applied(meeting) = result {
                println!("Updated meeting {} ({}).", meeting.id, meeting.date);
            }
        }
        LedgerCommand::RecordOutcome { id, outcome } => {
            let result = ledger.record_outcome(&id, outcome);
            if let Outcome::Applied(meeting) = actions::settle(prompter, result)? {
                match meeting.outcome {
                    Some(outcome) => println!("Recorded outcome for {}: {outcome}.", meeting.id),
                    None => println!("Cleared outcome for {}.", meeting.id),
                }
            }
        }
        LedgerCommand::DeleteMeeting { id } => {
            if let Outcome::Applied(meeting) = actions::delete_meeting(ledger, prompter, &id)? {
                println!("Deleted meeting {} with {}.", meeting.id, meeting.client_name);
            }
        }
        LedgerCommand::AddDeal {
            person,
            client,
            value,
            won,
            lost,
        } => {
            let status = (won || lost).then(|| DealStatus::from_won(won));
            let outcome = match (client, value, status) {
                (Some(client_name), Some(value), Some(status)) => {
                    let draft = DealDraft {
                        client_name,
                        value,
                        status,
                    };
                    let result = ledger.add_deal(&person, draft);
                    actions::settle(prompter, result)?
                }
                (client_name, value, status) => {
                    let prefill = DealPrefill {
                        client_name,
                        value,
                        status,
                    };
                    actions::add_deal(ledger, prompter, &person, prefill)?
                }
            };
            if let Outcome::Applied(deal) = outcome {
                println!(
                    "Added {} deal {} worth {}.",
                    deal.status.label(),
                    deal.id,
                    report::format_currency(deal.value)
                );
            }
        }
        LedgerCommand::DeleteDeal { id } => {
            if let Outcome::Applied(deal) = actions::delete_deal(ledger, prompter, &id)? {
                println!("Deleted deal {} with {}.", deal.id, deal.client_name);
            }
        }
        LedgerCommand::ImportMeetings { person, csv } => {
            let summary = import::import_meetings(ledger, &person, &csv)?;
            println!(
                "Imported {} meetings from {} ({} skipped).",
                summary.imported,
                csv.display(),
                summary.skipped
            );
        }
        LedgerCommand::Audit => {
            print!("{}", report::build_audit(&ledger.audit()));
        }
        LedgerCommand::Report { out } => {
            let mut views = Vec::new();
            for person in ledger.sales_people() {
                views.push(ledger.open_sales_person(&person.id)?);
            }
            let report = report::build_report(&views, ledger.today());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn init_db_is_split_from_ledger_commands() {
        let cli = Cli::try_parse_from(["sales-kpi-tracker", "init-db"]).unwrap();
        assert!(matches!(cli.command, Commands::InitDb));

        let cli = Cli::try_parse_from(["sales-kpi-tracker", "add-deal", "1", "--lost"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Ledger(LedgerCommand::AddDeal { lost: true, client: None, .. })
        ));
    }
}
