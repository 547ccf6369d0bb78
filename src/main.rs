mod config;
mod export;
mod logging;
mod models;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use crate::config::{AppConfig, LoggingConfig};
use crate::export::ExportFormat;
use crate::pipeline::Pipeline;
use crate::scraper::ScrapeContext;
use crate::scraper::discovery::GroupDiscoverer;
use crate::scraper::http_client::HttpClient;
use crate::storage::Repository;

#[derive(Parser)]
#[command(name = "velo-calendar", about = "Velogames season calendar scraper", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// List the competition groups under "All Contests"
    Groups,

    /// Scrape the whole season and print it
    Show {
        #[arg(long)]
        json: bool,
    },

    /// Scrape the whole season and store it in DuckDB
    Update,

    /// Scrape the whole season as flat calendar rows
    Export {
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show database statistics
    Stats,

    /// Apply schema migrations without scraping
    Migrate,

    /// Look up a configuration value by section and key
    ConfigValue {
        section: String,
        key: String,

        #[arg(long)]
        default: Option<String>,
    },
}

impl Command {
    /// Process name used for the log file.
    fn name(&self) -> &'static str {
        match self {
            Command::Groups => "groups",
            Command::Show { .. } => "show",
            Command::Update => "update",
            Command::Export { .. } => "export",
            Command::Stats => "stats",
            Command::Migrate => "migrate",
            Command::ConfigValue { .. } => "config-value",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            let console_only = LoggingConfig {
                file_output: false,
                ..LoggingConfig::default()
            };
            let _guard = logging::init(&console_only, cli.verbose, cli.command.name());
            error!("{}", utils::cause_chain(&e));
            return ExitCode::FAILURE;
        }
    };

    let _guard = logging::init(&config.logging, cli.verbose, cli.command.name());

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", utils::cause_chain(&*e));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Groups => {
            let ctx = context(config)?;
            let groups = GroupDiscoverer::new(&ctx)
                .discover(&ctx.config().discovery.index_url)
                .await?;
            if groups.is_empty() {
                println!("No competition groups found.");
            }
            for g in &groups {
                println!("{:<40} {:<7} {}", g.name, g.gender, g.url);
            }
        }

        Command::Show { json } => {
            let _t = utils::Timer::start("Season scrape");
            let pipeline = Pipeline::new(context(config)?);
            let run = pipeline.run().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&run.groups)?);
            } else {
                let fmt = &pipeline.context().config().dates.generic_format;
                print!("{}", utils::render_calendar(&run.groups, fmt));
            }
        }

        Command::Update => {
            let _t = utils::Timer::start("Season update");
            let repo = Repository::open(&config.storage.db_path)?;
            if config.storage.run_migrations {
                repo.run_migrations()?;
            }
            let run_id = repo.begin_scrape_run()?;

            match Pipeline::new(context(config)?).run().await {
                Ok(run) => {
                    let saved = repo.save_breakdowns(&run.groups)?;
                    repo.finish_scrape_run(run_id, saved.groups, saved.items(), None)?;
                    info!(
                        "Done: {} groups, {} stage races, {} classics, {} errors",
                        saved.groups, saved.stages, saved.races, run.errors
                    );
                }
                Err(e) => {
                    repo.finish_scrape_run(run_id, 0, 0, Some(&utils::cause_chain(&e)))?;
                    return Err(e.into());
                }
            }
        }

        Command::Export { format, out } => {
            let _t = utils::Timer::start("Season export");
            let date_format = config.dates.generic_format.clone();
            let run = Pipeline::new(context(config)?).run().await?;
            let entries = export::calendar_entries(&run.groups, &date_format);
            match &out {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("Could not create {:?}", path))?;
                    export::write_entries(&entries, format, BufWriter::new(file))?;
                    info!("Wrote {} rows to {:?}", entries.len(), path);
                }
                None => export::write_entries(&entries, format, io::stdout().lock())?,
            }
        }

        Command::Stats => {
            let repo = Repository::open(&config.storage.db_path)?;
            let groups = repo.group_count()?;
            let stages = repo.stage_count()?;
            let races = repo.race_count()?;
            let (first, last) = repo.season_range().unwrap_or((None, None));
            let last_run = repo
                .last_scrape_run()?
                .map(|(at, status)| format!("{} ({})", at.format("%Y-%m-%d %H:%M"), status))
                .unwrap_or("—".into());
            let day = |d: Option<chrono::NaiveDateTime>| {
                d.map(|d| d.date().to_string()).unwrap_or("—".into())
            };
            println!("─────────────────────────────────");
            println!("  Velogames calendar: Database Stats");
            println!("─────────────────────────────────");
            println!("  Groups       : {}", groups);
            println!("  Stage races  : {}", stages);
            println!("  Classics     : {}", races);
            println!("  From         : {}", day(first));
            println!("  To           : {}", day(last));
            println!("  Last run     : {}", last_run);
            println!("─────────────────────────────────");
        }

        Command::Migrate => {
            Repository::open(&config.storage.db_path)?.run_migrations()?;
            println!("Migrations applied.");
        }

        Command::ConfigValue {
            section,
            key,
            default,
        } => match default {
            Some(default) => {
                let ctx = context(config)?;
                println!("{}", ctx.config_value(&section, &key, &default));
            }
            None => match config.value(&section, &key) {
                Some(value) => println!("{}", value),
                None => anyhow::bail!("no value for `{}.{}`", section, key),
            },
        },
    }

    Ok(())
}

fn context(config: AppConfig) -> Result<ScrapeContext> {
    let client = HttpClient::new(&config.http).context("Failed to build HTTP client")?;
    Ok(ScrapeContext::new(config, Box::new(client)))
}
