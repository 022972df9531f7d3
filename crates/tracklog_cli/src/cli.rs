use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracklog_core::config::{ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_USER_SCOPE};
use tracklog_core::{SeriesFields, TrainingType};

#[derive(Parser, Debug, Clone)]
#[command(name = "tracklog")]
#[command(version)]
#[command(about = "Record, inspect and maintain a training log", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// SQLite database file
    #[arg(long, global = true, env = ENV_DB_PATH)]
    pub db: Option<PathBuf>,

    /// User scope owning the collections
    #[arg(long, global = true, env = ENV_USER_SCOPE)]
    pub user: Option<String>,

    /// Directory for rolling log files (logging is off when unset)
    #[arg(long, global = true, env = ENV_LOG_DIR)]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = ENV_LOG_LEVEL)]
    pub log_level: Option<String>,
}

impl GlobalArgs {
    /// Value given for a `TRACKLOG_*` key on the command line or environment.
    pub fn lookup(&self, key: &str) -> Option<String> {
        match key {
            ENV_DB_PATH => self.db.as_ref().map(|path| path.display().to_string()),
            ENV_USER_SCOPE => self.user.clone(),
            ENV_LOG_DIR => self.log_dir.as_ref().map(|path| path.display().to_string()),
            ENV_LOG_LEVEL => self.log_level.clone(),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List cycles ordered by start date
    Cycles,
    /// List workouts, optionally of one cycle
    Workouts {
        #[arg(long)]
        cycle: Option<String>,
    },
    /// List day entries with their series, newest first
    Entries(EntriesArgs),
    /// List distinct track distances and the number of legacy series
    Distances,
    /// Show every run over one distance, oldest first
    Progression {
        /// Distance in meters
        meters: f64,
    },
    /// Report referential warnings
    Warnings,
    /// Record a new cycle
    AddCycle(AddCycleArgs),
    /// Record a new workout under a cycle
    AddWorkout(AddWorkoutArgs),
    /// Record a day entry with its series
    AddEntry(AddEntryArgs),
    /// Append one series to an existing day entry
    AddSeries {
        entry: String,
        /// `track:RUN[,DIST[,REC|last]]` or `gym:REPS[,WEIGHT]`
        #[arg(value_parser = parse_series)]
        series: SeriesFields,
    },
    /// Delete a cycle with its workouts, day entries and series
    DeleteCycle(DeleteArgs),
    /// Delete a workout with its day entries and series
    DeleteWorkout(DeleteArgs),
    /// Delete a day entry with its series
    DeleteEntry(DeleteArgs),
    /// Import a JSON data set
    Import {
        file: PathBuf,
    },
    /// Export the scope as a JSON data set
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct EntriesArgs {
    #[arg(long)]
    pub cycle: Option<String>,

    #[arg(long)]
    pub workout: Option<String>,

    /// YYYY-MM-DD
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long = "type", value_enum)]
    pub kind: Option<KindArg>,
}

#[derive(Args, Debug, Clone)]
pub struct AddCycleArgs {
    pub name: String,

    /// YYYY-MM-DD
    #[arg(long)]
    pub start: String,

    /// YYYY-MM-DD
    #[arg(long)]
    pub end: String,
}

#[derive(Args, Debug, Clone)]
pub struct AddWorkoutArgs {
    #[arg(long)]
    pub cycle: String,

    pub name: String,

    #[arg(long = "type", value_enum)]
    pub kind: KindArg,
}

#[derive(Args, Debug, Clone)]
pub struct AddEntryArgs {
    #[arg(long)]
    pub workout: String,

    /// YYYY-MM-DD
    #[arg(long)]
    pub date: String,

    #[arg(long, default_value = "")]
    pub notes: String,

    /// Repeatable; `track:RUN[,DIST[,REC|last]]` or `gym:REPS[,WEIGHT]`
    #[arg(long = "series", value_parser = parse_series)]
    pub series: Vec<SeriesFields>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    pub id: String,

    /// Print the deletion plan without deleting anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Track,
    Gym,
}

impl From<KindArg> for TrainingType {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Track => TrainingType::Track,
            KindArg::Gym => TrainingType::Gym,
        }
    }
}

/// Parses one series card, e.g. `track:62.1,400,3:00`, `track:60.8,400,last`
/// or `gym:5x5,100kg`. Values are checked later by the service.
pub fn parse_series(text: &str) -> Result<SeriesFields, String> {
    let (kind, rest) = text
        .split_once(':')
        .ok_or_else(|| format!("expected `track:...` or `gym:...`, got `{text}`"))?;
    let mut parts = rest.split(',').map(str::trim);
    let mut next = || parts.next().unwrap_or_default().to_string();

    match kind.trim().to_ascii_lowercase().as_str() {
        "track" => {
            let run_time = next();
            let distance_meters = next();
            let recovery = next();
            let is_last = recovery.eq_ignore_ascii_case("last");
            Ok(SeriesFields::Track {
                run_time,
                distance_meters,
                recovery: if is_last { String::new() } else { recovery },
                is_last,
            })
        }
        "gym" => Ok(SeriesFields::Gym {
            reps: next(),
            weight: next(),
        }),
        other => Err(format!("unknown series type `{other}`; expected track or gym")),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_series, Cli, Command, KindArg};
    use clap::Parser;
    use tracklog_core::SeriesFields;

    #[test]
    fn parses_entry_filters() {
        let cli = Cli::parse_from([
            "tracklog",
            "entries",
            "--cycle",
            "CYC-1",
            "--date",
            "2024-05-01",
            "--type",
            "track",
        ]);
        let Command::Entries(args) = cli.command else {
            panic!("expected entries command");
        };
        assert_eq!(args.cycle.as_deref(), Some("CYC-1"));
        assert_eq!(args.kind, Some(KindArg::Track));
        assert_eq!(args.date.unwrap().to_string(), "2024-05-01");
    }

    #[test]
    fn global_flags_feed_config_lookup() {
        let cli = Cli::parse_from(["tracklog", "distances", "--user", "alice"]);
        assert_eq!(
            cli.global.lookup(tracklog_core::config::ENV_USER_SCOPE),
            Some("alice".to_string())
        );
    }

    #[test]
    fn parses_series_cards() {
        assert_eq!(
            parse_series("track:62.1,400,3:00").unwrap(),
            SeriesFields::Track {
                run_time: "62.1".to_string(),
                distance_meters: "400".to_string(),
                recovery: "3:00".to_string(),
                is_last: false,
            }
        );
        assert_eq!(
            parse_series("track:60.8,,last").unwrap(),
            SeriesFields::Track {
                run_time: "60.8".to_string(),
                distance_meters: String::new(),
                recovery: String::new(),
                is_last: true,
            }
        );
        assert_eq!(
            parse_series("gym:5x5").unwrap(),
            SeriesFields::Gym {
                reps: "5x5".to_string(),
                weight: String::new(),
            }
        );
        assert!(parse_series("swim:100").is_err());
        assert!(parse_series("62.1").is_err());
    }

    #[test]
    fn add_entry_collects_repeated_series() {
        let cli = Cli::parse_from([
            "tracklog",
            "add-entry",
            "--workout",
            "WK-1",
            "--date",
            "2024-05-01",
            "--series",
            "track:62.1,400,3:00",
            "--series",
            "track:60.8,400,last",
        ]);
        let Command::AddEntry(args) = cli.command else {
            panic!("expected add-entry command");
        };
        assert_eq!(args.workout, "WK-1");
        assert_eq!(args.notes, "");
        assert_eq!(args.series.len(), 2);
    }
}
