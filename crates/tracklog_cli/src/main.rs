//! Command-line front end over `tracklog_core`.
//!
//! # Responsibility
//! - Resolve configuration from flags and `TRACKLOG_*` variables.
//! - Run read commands against a live mirror and record, import and delete
//!   through the training service.

mod cli;

use clap::Parser;
use cli::{AddCycleArgs, AddEntryArgs, AddWorkoutArgs, Cli, Command, DeleteArgs, EntriesArgs};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use tracklog_core::{
    init_logging, open_db, CascadeDeleter, Collection, CoreConfig, CycleFields, DayEntryFields,
    DayEntryFilter, DeletionPlan, DeletionReport, DocumentStore, RecoveryDisplay, SessionContext,
    SqliteDocumentStore, SyncEngine, SyncState, TrainingDataSet, TrainingQuery, TrainingService,
    TrainingType, UserScope, WorkoutFields,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = CoreConfig::from_lookup(|key| {
        cli.global
            .lookup(key)
            .or_else(|| std::env::var(key).ok())
    })?;
    if let Some(logging) = config.logging()? {
        init_logging(&logging)?;
    }

    let scope = config.scope()?;
    let conn = open_db(&config.db_path)?;
    let store = SqliteDocumentStore::try_new(&conn)?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match cli.command {
        Command::Cycles => with_mirror(&store, &scope, print_cycles),
        Command::Workouts { cycle } => {
            with_mirror(&store, &scope, |query| print_workouts(query, cycle.as_deref()))
        }
        Command::Entries(args) => with_mirror(&store, &scope, |query| print_entries(query, &args)),
        Command::Distances => with_mirror(&store, &scope, print_distances),
        Command::Progression { meters } => {
            with_mirror(&store, &scope, |query| print_progression(query, meters))
        }
        Command::Warnings => with_mirror(&store, &scope, print_warnings),
        Command::AddCycle(args) => add_cycle(TrainingService::new(&store, scope), &args),
        Command::AddWorkout(args) => add_workout(TrainingService::new(&store, scope), &args),
        Command::AddEntry(args) => add_entry(TrainingService::new(&store, scope), &args),
        Command::AddSeries { entry, series } => {
            let created = TrainingService::new(&store, scope).create_series_set(&entry, &series)?;
            println!("{}  {}. {created}", created.id, created.index);
            Ok(())
        }
        Command::DeleteCycle(args) => delete(&store, scope, Collection::Cycles, &args),
        Command::DeleteWorkout(args) => delete(&store, scope, Collection::Workouts, &args),
        Command::DeleteEntry(args) => delete(&store, scope, Collection::DayEntries, &args),
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let data = TrainingDataSet::from_json_str(&text)?;
            let written = TrainingService::new(&store, scope).import_dataset(data)?;
            println!("imported {written} documents");
            Ok(())
        }
        Command::Export { output } => {
            let data = TrainingService::new(&store, scope).export_dataset()?;
            let text = data.to_json_pretty()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    println!(
                        "exported {} documents to {}",
                        data.document_count(),
                        path.display()
                    );
                }
                None => println!("{text}"),
            }
            Ok(())
        }
    }
}

/// Syncs a fresh mirror for `scope` and hands it to `render`.
fn with_mirror(
    store: &SqliteDocumentStore<'_>,
    scope: &UserScope,
    render: impl FnOnce(TrainingQuery<'_>),
) -> CliResult<()> {
    let mut engine = SyncEngine::new(store);
    engine.start_session(SessionContext::new(scope.clone()))?;
    let outcome = engine.pump();
    if let Some(err) = outcome.errors.into_iter().next() {
        return Err(err.into());
    }
    if engine.state() != SyncState::Live {
        return Err(format!("mirror did not become live (state={})", engine.state()).into());
    }

    render(TrainingQuery::new(engine.mirror()));
    engine.end_session();
    Ok(())
}

fn print_cycles(query: TrainingQuery<'_>) {
    for cycle in query.cycles_by_start() {
        println!(
            "{}  {} .. {}  {}",
            cycle.id, cycle.start_date, cycle.end_date, cycle.name
        );
        for workout in query.workouts_for_cycle(&cycle.id) {
            println!("    {}  [{}]  {}", workout.id, workout.kind, workout.name);
        }
    }
}

fn print_workouts(query: TrainingQuery<'_>, cycle_id: Option<&str>) {
    let cycle_ids: Vec<String> = match cycle_id {
        Some(id) => vec![id.to_string()],
        None => query
            .cycles_by_start()
            .into_iter()
            .map(|cycle| cycle.id.clone())
            .collect(),
    };
    for cycle_id in &cycle_ids {
        for workout in query.workouts_for_cycle(cycle_id) {
            println!(
                "{}  {}  [{}]  {}",
                workout.id, workout.cycle_id, workout.kind, workout.name
            );
        }
    }
}

fn print_entries(query: TrainingQuery<'_>, args: &EntriesArgs) {
    let filter = DayEntryFilter {
        cycle_id: args.cycle.clone(),
        workout_id: args.workout.clone(),
        date: args.date,
        kind: args.kind.map(Into::into),
    };
    for summary in query.day_entry_summaries(&filter) {
        println!(
            "{}  {}  {}",
            summary.entry.date,
            summary.workout_name().unwrap_or("(missing workout)"),
            summary.entry.id
        );
        if !summary.entry.notes.is_empty() {
            println!("    notes: {}", summary.entry.notes);
        }
        for series in &summary.series {
            println!("    {}. {series}", series.index);
        }
        for warning in &summary.warnings {
            println!("    ! {warning}");
        }
    }
}

fn print_distances(query: TrainingQuery<'_>) {
    let distances = query.distinct_track_distances();
    for distance in &distances.distances {
        println!("{distance}m");
    }
    if distances.legacy_count > 0 {
        println!("{} track series without distance", distances.legacy_count);
    }
}

fn print_progression(query: TrainingQuery<'_>, meters: f64) {
    for point in query.progression_series(meters) {
        println!(
            "{}  {}s  rec {}  {}",
            point.date,
            point.run_time,
            RecoveryDisplay(point.recovery_seconds),
            point.workout_name.as_deref().unwrap_or("(missing workout)")
        );
    }
}

fn print_warnings(query: TrainingQuery<'_>) {
    let warnings = query.referential_warnings();
    for warning in &warnings {
        println!("{warning}");
    }
    println!("{} warnings", warnings.len());
}

fn add_cycle<S: DocumentStore>(service: TrainingService<S>, args: &AddCycleArgs) -> CliResult<()> {
    let cycle = service.create_cycle(&CycleFields {
        name: args.name.clone(),
        start_date: args.start.clone(),
        end_date: args.end.clone(),
    })?;
    println!("{}", cycle.id);
    Ok(())
}

fn add_workout<S: DocumentStore>(
    service: TrainingService<S>,
    args: &AddWorkoutArgs,
) -> CliResult<()> {
    let kind: TrainingType = args.kind.into();
    let workout = service.create_workout(&WorkoutFields {
        cycle_id: args.cycle.clone(),
        name: args.name.clone(),
        kind: kind.as_str().to_string(),
    })?;
    println!("{}", workout.id);
    Ok(())
}

fn add_entry<S: DocumentStore>(service: TrainingService<S>, args: &AddEntryArgs) -> CliResult<()> {
    let (entry, series) = service.create_day_entry_with_series(
        &DayEntryFields {
            workout_id: args.workout.clone(),
            date: args.date.clone(),
            notes: args.notes.clone(),
        },
        &args.series,
    )?;
    println!("{}", entry.id);
    for series_set in &series {
        println!("    {}. {series_set}", series_set.index);
    }
    Ok(())
}

fn delete(
    store: &SqliteDocumentStore<'_>,
    scope: UserScope,
    collection: Collection,
    args: &DeleteArgs,
) -> CliResult<()> {
    if args.dry_run {
        let deleter = CascadeDeleter::new(store, scope);
        let plan = match collection {
            Collection::Cycles => deleter.plan_cycle(&args.id)?,
            Collection::Workouts => deleter.plan_workout(&args.id)?,
            _ => deleter.plan_day_entry(&args.id)?,
        };
        print_plan(&plan);
        return Ok(());
    }

    let service = TrainingService::new(store, scope);
    let report = match collection {
        Collection::Cycles => service.delete_cycle(&args.id)?,
        Collection::Workouts => service.delete_workout(&args.id)?,
        _ => service.delete_day_entry(&args.id)?,
    };
    print_report(&report);
    Ok(())
}

fn print_plan(plan: &DeletionPlan) {
    if !plan.root_exists() {
        println!("{} does not exist", plan.root());
    }
    for collection in Collection::ALL {
        let ids = plan.ids(collection);
        if !ids.is_empty() {
            println!("would delete {} {collection}", ids.len());
        }
    }
    println!("would delete {} documents", plan.total());
}

fn print_report(report: &DeletionReport) {
    for collection in Collection::ALL {
        let count = report.count(collection);
        if count > 0 {
            println!("deleted {count} {collection}");
        }
    }
    println!("deleted {} documents", report.total());
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Cycles => "cycles",
        Command::Workouts { .. } => "workouts",
        Command::Entries(_) => "entries",
        Command::Distances => "distances",
        Command::Progression { .. } => "progression",
        Command::Warnings => "warnings",
        Command::AddCycle(_) => "add-cycle",
        Command::AddWorkout(_) => "add-workout",
        Command::AddEntry(_) => "add-entry",
        Command::AddSeries { .. } => "add-series",
        Command::DeleteCycle(_) => "delete-cycle",
        Command::DeleteWorkout(_) => "delete-workout",
        Command::DeleteEntry(_) => "delete-entry",
        Command::Import { .. } => "import",
        Command::Export { .. } => "export",
    }
}
