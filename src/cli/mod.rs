//! Command line front-end over the reconciliation engine.

pub mod output;
pub mod report;
pub mod table;

use std::path::Path;

use chrono::NaiveDate;
use daybook_config::Config;
use daybook_core::{
    snapshot_warnings, CoreError, LedgerBuilder, OutstandingAggregator, OutstandingQuery,
    OutstandingSort, RateService, ReconcileService, SnapshotStorage,
};
use daybook_domain::{DateRange, DaybookSnapshot, FuelType, RecordId};
use daybook_storage_json::{load_snapshot_from_path, JsonSnapshotStorage};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::CliError;
use crate::utils::build_info;
use output::OutputPreferences;

pub const USAGE: &str = "\
Usage: daybook_cli [--json] <command> [args]

Commands:
  stats <daybook> <from> [to]          cash position and fuel totals
  ledger <daybook> <customer> <from> <to>
                                       running balance of one customer
  outstanding <daybook> <till> [--hide-zero] [--hide-negative] [--by-name]
                                       balances of every customer
  rate <daybook> <fuel> <date>         price in effect on a day
  rates <daybook> <date>               every fuel price on a day
  check <daybook>                      report inconsistencies
  list                                 day-books in the data directory
  backup <daybook> [note]              back up a stored day-book
  backups <daybook>                    list backups of a day-book
  version                              build information
  help                                 this message

<daybook> is a path to a snapshot file or the name of a stored day-book.
Dates use YYYY-MM-DD.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stats {
        daybook: String,
        from: NaiveDate,
        to: NaiveDate,
    },
    Ledger {
        daybook: String,
        customer: String,
        from: NaiveDate,
        to: NaiveDate,
    },
    Outstanding {
        daybook: String,
        till: NaiveDate,
        hide_zero: bool,
        hide_negative: bool,
        by_name: bool,
    },
    Rate {
        daybook: String,
        fuel: String,
        date: NaiveDate,
    },
    Rates {
        daybook: String,
        date: NaiveDate,
    },
    Check {
        daybook: String,
    },
    List,
    Backup {
        daybook: String,
        note: Option<String>,
    },
    Backups {
        daybook: String,
    },
    Version,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub json: bool,
}

/// Parses the arguments that follow the program name.
pub fn parse_args<I, S>(args: I) -> Result<Invocation, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut json = false;
    let mut flags = Vec::new();
    let mut positional = Vec::new();
    for arg in args.into_iter().map(Into::into) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => positional.insert(0, "help".to_string()),
            flag if flag.starts_with("--") => flags.push(arg),
            _ => positional.push(arg),
        }
    }

    let mut words = positional.into_iter();
    let name = words.next().unwrap_or_else(|| "help".to_string());
    let rest: Vec<String> = words.collect();

    let command = match name.as_str() {
        "stats" => {
            let (daybook, from, to) = match rest.as_slice() {
                [daybook, from] => (daybook, from, from),
                [daybook, from, to] => (daybook, from, to),
                _ => return Err(usage("stats expects <daybook> <from> [to]")),
            };
            Command::Stats {
                daybook: daybook.clone(),
                from: parse_date(from)?,
                to: parse_date(to)?,
            }
        }
        "ledger" => match rest.as_slice() {
            [daybook, customer, from, to] => Command::Ledger {
                daybook: daybook.clone(),
                customer: customer.clone(),
                from: parse_date(from)?,
                to: parse_date(to)?,
            },
            _ => return Err(usage("ledger expects <daybook> <customer> <from> <to>")),
        },
        "outstanding" => match rest.as_slice() {
            [daybook, till] => Command::Outstanding {
                daybook: daybook.clone(),
                till: parse_date(till)?,
                hide_zero: take_flag(&mut flags, "--hide-zero"),
                hide_negative: take_flag(&mut flags, "--hide-negative"),
                by_name: take_flag(&mut flags, "--by-name"),
            },
            _ => return Err(usage("outstanding expects <daybook> <till>")),
        },
        "rate" => match rest.as_slice() {
            [daybook, fuel, date] => Command::Rate {
                daybook: daybook.clone(),
                fuel: fuel.clone(),
                date: parse_date(date)?,
            },
            _ => return Err(usage("rate expects <daybook> <fuel> <date>")),
        },
        "rates" => match rest.as_slice() {
            [daybook, date] => Command::Rates {
                daybook: daybook.clone(),
                date: parse_date(date)?,
            },
            _ => return Err(usage("rates expects <daybook> <date>")),
        },
        "check" => match rest.as_slice() {
            [daybook] => Command::Check {
                daybook: daybook.clone(),
            },
            _ => return Err(usage("check expects <daybook>")),
        },
        "list" => match rest.as_slice() {
            [] => Command::List,
            _ => return Err(usage("list takes no arguments")),
        },
        "backup" => match rest.as_slice() {
            [daybook] => Command::Backup {
                daybook: daybook.clone(),
                note: None,
            },
            [daybook, note @ ..] => Command::Backup {
                daybook: daybook.clone(),
                note: Some(note.join(" ")),
            },
            _ => return Err(usage("backup expects <daybook> [note]")),
        },
        "backups" => match rest.as_slice() {
            [daybook] => Command::Backups {
                daybook: daybook.clone(),
            },
            _ => return Err(usage("backups expects <daybook>")),
        },
        "version" => Command::Version,
        "help" => Command::Help,
        other => return Err(usage(format!("unknown command `{other}`"))),
    };

    if let Some(flag) = flags.first() {
        return Err(usage(format!("unknown option `{flag}`")));
    }
    Ok(Invocation { command, json })
}

/// Runs one command and prints its output to stdout.
pub fn run_cli<I, S>(args: I, config: &Config) -> Result<(), CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    output::set_preferences(OutputPreferences::from_environment(config.ui_color_enabled));
    let invocation = parse_args(args)?;
    tracing::debug!(command = ?invocation.command, "running command");
    let rendered = execute(&invocation, config)?;
    println!("{rendered}");
    Ok(())
}

/// Executes a parsed invocation and returns what should be printed.
pub fn execute(invocation: &Invocation, config: &Config) -> Result<String, CliError> {
    let json = invocation.json;
    let currency = config.currency.as_str();

    match &invocation.command {
        Command::Stats { daybook, from, to } => {
            let snapshot = load_daybook(daybook, config)?;
            let range = date_range(*from, *to)?;
            let stats = ReconcileService::statistics(&snapshot, range);
            render(json, &stats, || report::render_statistics(&stats, currency))
        }
        Command::Ledger {
            daybook,
            customer,
            from,
            to,
        } => {
            let snapshot = load_daybook(daybook, config)?;
            let range = date_range(*from, *to)?;
            let ledger = match LedgerBuilder::generate_by_name(&snapshot, customer, range) {
                Some(ledger) => ledger,
                None => {
                    let id = customer
                        .parse::<RecordId>()
                        .ok()
                        .filter(|id| snapshot.customer(*id).is_some())
                        .ok_or_else(|| CliError::UnknownCustomer(customer.clone()))?;
                    LedgerBuilder::generate(&snapshot, id, range)
                }
            };
            render(json, &ledger, || report::render_ledger(&ledger, currency))
        }
        Command::Outstanding {
            daybook,
            till,
            hide_zero,
            hide_negative,
            by_name,
        } => {
            let snapshot = load_daybook(daybook, config)?;
            let query = OutstandingQuery {
                hide_zero: *hide_zero,
                hide_negative: *hide_negative,
                sort: if *by_name {
                    OutstandingSort::ByName
                } else {
                    OutstandingSort::ByOutstandingDesc
                },
                ..OutstandingQuery::till(*till)
            };
            let outstanding = OutstandingAggregator::compute(&snapshot, &query);
            render(json, &outstanding, || report::render_outstanding(&outstanding, currency))
        }
        Command::Rate {
            daybook,
            fuel,
            date,
        } => {
            let snapshot = with_config_prices(load_daybook(daybook, config)?, config);
            let fuel = FuelType::new(fuel.as_str());
            let rate = RateService::require(&snapshot.rates, &fuel, *date)?;
            let payload = RateLookup {
                fuel_type: &fuel,
                date: *date,
                rate,
            };
            render(json, &payload, || report::render_rate(&fuel, *date, rate, currency))
        }
        Command::Rates { daybook, date } => {
            let snapshot = with_config_prices(load_daybook(daybook, config)?, config);
            let rates = snapshot.rates.rates_on(*date);
            render(json, &rates, || report::render_rates_on(&snapshot.rates, *date, currency))
        }
        Command::Check { daybook } => {
            let snapshot = load_daybook(daybook, config)?;
            let warnings = snapshot_warnings(&snapshot);
            render(json, &warnings, || {
                if warnings.is_empty() {
                    format!("{}: no issues found", snapshot.name)
                } else {
                    let prefs = output::current_preferences();
                    warnings
                        .iter()
                        .map(|warning| output::styled(output::MessageKind::Warning, warning, &prefs))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            })
        }
        Command::List => {
            let storage = open_storage(config)?;
            let names = storage.list_snapshots()?;
            render(json, &names, || {
                if names.is_empty() {
                    "No day-books found.".to_string()
                } else {
                    names.join("\n")
                }
            })
        }
        Command::Backup { daybook, note } => {
            let storage = open_storage(config)?;
            let snapshot = storage.load_snapshot(daybook)?;
            let info = storage.backup_snapshot(daybook, &snapshot, note.as_deref())?;
            tracing::info!(daybook = %daybook, backup = %info.id, "backup created");
            let path = info.path.display().to_string();
            render(json, &path, || format!("Backup created: {path}"))
        }
        Command::Backups { daybook } => {
            let storage = open_storage(config)?;
            let backups: Vec<String> = storage
                .list_backups(daybook)?
                .into_iter()
                .map(|backup| format!("{}  {}", backup.created_at, backup.id))
                .collect();
            render(json, &backups, || {
                if backups.is_empty() {
                    format!("No backups for `{daybook}`.")
                } else {
                    backups.join("\n")
                }
            })
        }
        Command::Version => Ok(build_info::CURRENT.to_string()),
        Command::Help => Ok(USAGE.to_string()),
    }
}

#[derive(Serialize)]
struct RateLookup<'a> {
    fuel_type: &'a FuelType,
    date: NaiveDate,
    rate: Decimal,
}

fn render<T, F>(json: bool, value: &T, text: F) -> Result<String, CliError>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text())
    }
}

fn usage(message: impl Into<String>) -> CliError {
    CliError::Usage(message.into())
}

fn take_flag(flags: &mut Vec<String>, flag: &str) -> bool {
    let before = flags.len();
    flags.retain(|candidate| candidate != flag);
    flags.len() != before
}

fn parse_date(value: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| CliError::InvalidDate(value.to_string()))
}

fn date_range(from: NaiveDate, to: NaiveDate) -> Result<DateRange, CliError> {
    DateRange::new(from, to).map_err(|err| CliError::Core(CoreError::from(err)))
}

fn open_storage(config: &Config) -> Result<JsonSnapshotStorage, CliError> {
    Ok(JsonSnapshotStorage::with_retention(
        config.resolve_daybooks_dir(),
        config.resolve_backup_root(),
        config.backup_retention,
    )?)
}

/// Loads a snapshot from an explicit path, else by name from the data directory.
fn load_daybook(reference: &str, config: &Config) -> Result<DaybookSnapshot, CliError> {
    let path = Path::new(reference);
    if path.is_file() {
        return Ok(load_snapshot_from_path(path)?);
    }
    Ok(open_storage(config)?.load_snapshot(reference)?)
}

/// Seeds static prices for fuel types the snapshot has no default for.
fn with_config_prices(mut snapshot: DaybookSnapshot, config: &Config) -> DaybookSnapshot {
    for (fuel, price) in &config.fuel_prices {
        let fuel = FuelType::new(fuel.as_str());
        if snapshot.rates.default_price(&fuel).is_none() {
            snapshot.rates.set_default(fuel, *price);
        }
    }
    snapshot
}
