use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

mod config;
mod db;
mod error;
mod grading;
mod logging;
mod models;
mod report;
mod state;
mod views;

use crate::config::Config;
use crate::db::Store;
use crate::models::{GradeFilter, RecordForm, SortOrder, View};
use crate::report::Notice;
use crate::state::{AppState, ViewOptions};

/// Search terms shorter than this are ignored.
const MIN_SEARCH_LEN: usize = 3;

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(about = "Roster manager with derived grades, statistics and CSV export", long_about = None)]
struct Cli {
    /// Directory holding the file-backed store (ignored when DATABASE_URL is set)
    #[arg(long, global = true, default_value = "roster-data")]
    data_dir: PathBuf,
    /// Simulated latency before the roster becomes available
    #[arg(long, global = true, default_value_t = 800)]
    load_delay_ms: u64,
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare the backing store
    InitDb,
    /// Replace the stored roster with the seed records
    Seed,
    /// Import records from a CSV file in the export layout
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Render one view of the roster
    Show {
        #[arg(value_enum, default_value_t = View::Dashboard)]
        view: View,
        /// Letter grade to keep on the students view, or "all"
        #[arg(long, default_value = "all")]
        grade: GradeFilter,
        #[arg(long, value_enum, default_value_t = SortOrder::NameAsc)]
        sort: SortOrder,
    },
    /// Add a record to the front of the roster
    Add {
        /// Left blank, an id is generated
        #[arg(long, default_value = "")]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        value1: String,
        #[arg(long, allow_hyphen_values = true)]
        value2: String,
        #[arg(long, allow_hyphen_values = true)]
        value3: String,
        #[arg(long, allow_hyphen_values = true)]
        value4: String,
    },
    /// Delete every record with the given id
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Find the first record whose name contains a term
    Find { term: String },
    /// Export the roster as CSV
    Export {
        #[arg(long, default_value = "data_export.csv")]
        out: PathBuf,
    },
    /// Write a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);

    let config = Config::from_env(cli.data_dir, cli.load_delay_ms);
    let store = Store::connect(&config.store).await?;

    match cli.command {
        Commands::InitDb => {
            store.init().await?;
            println!("Store ready.");
        }
        Commands::Seed => {
            let roster = db::seed_roster()?;
            db::save_roster(&store, &roster).await?;
            println!("Seeded {} records.", roster.len());
        }
        Commands::Import { csv } => {
            let state = AppState::new(db::load(&store, config.load_delay).await?);
            let forms = db::import_csv(&csv)?;
            let outcome = state.import(&forms, Utc::now());

            for err in &outcome.rejected {
                warn!(error = %err, "skipped csv row");
            }
            if outcome.inserted > 0 {
                db::save_roster(&store, outcome.state.roster()).await?;
            }
            println!(
                "{}",
                Notice::info(format!(
                    "Inserted {} records from {} ({} skipped).",
                    outcome.inserted,
                    csv.display(),
                    outcome.rejected.len()
                ))
            );
        }
        Commands::Show { view, grade, sort } => {
            let state = AppState::new(db::load(&store, config.load_delay).await?)
                .with_options(ViewOptions {
                    filter: grade,
                    sort,
                })
                .navigate(view);
            debug!(view = ?state.view(), options = ?state.options(), "rendering view");
            print!("{}", report::render_view(state.view(), &state.views()));
        }
        Commands::Add {
            id,
            name,
            value1,
            value2,
            value3,
            value4,
        } => {
            let state = AppState::new(db::load(&store, config.load_delay).await?);
            let form = RecordForm {
                id,
                name,
                scores: [value1, value2, value3, value4],
            };

            match state.add(&form, Utc::now()) {
                Ok(next) => {
                    db::save_roster(&store, next.roster()).await?;
                    info!(records = next.roster().len(), "record added");
                    println!("{}", Notice::info(format!("Entry {} added.", form.name.trim())));
                    print!("{}", report::render_view(next.view(), &next.views()));
                }
                Err(err) => {
                    warn!(error = %err, "rejected new record");
                    println!(
                        "{}",
                        Notice::error(format!("Please ensure all fields are valid: {err}."))
                    );
                }
            }
        }
        Commands::Delete { id } => {
            let state = AppState::new(db::load(&store, config.load_delay).await?);
            let (next, removed) = state.delete(&id);

            if removed == 0 {
                info!(%id, "no record to delete");
            }
            db::save_roster(&store, next.roster()).await?;
            println!("{}", Notice::info(format!("Removed {removed} records with id {id}.")));
            let next = next.navigate(View::Students);
            print!("{}", report::render_view(next.view(), &next.views()));
        }
        Commands::Find { term } => {
            if term.trim().chars().count() < MIN_SEARCH_LEN {
                println!(
                    "{}",
                    Notice::error(format!(
                        "Search terms need at least {MIN_SEARCH_LEN} characters."
                    ))
                );
                return Ok(());
            }

            let roster = db::load(&store, config.load_delay).await?;
            match grading::find_by_name(&roster, term.trim()) {
                Some(record) => {
                    let row = views::to_row(record);
                    println!(
                        "Found: {} (ID: {}) average {}% level {}",
                        row.name, row.id, row.average, row.letter
                    );
                }
                None => println!("No record matches \"{}\".", term.trim()),
            }
        }
        Commands::Export { out } => {
            let roster = db::load(&store, config.load_delay).await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            db::export_csv(&roster, file)?;
            println!("{}", Notice::info(format!("Data exported to {}.", out.display())));
        }
        Commands::Report { out } => {
            let state = AppState::new(db::load(&store, config.load_delay).await?);
            report::write_report(&out, &state.views(), Utc::now()).await?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
