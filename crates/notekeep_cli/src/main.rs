//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `notekeep_core` linkage with a deterministic probe.
//! - Optionally open a SQLite snapshot file and print the visible notes.
//! - Optionally start core file logging before touching storage.
//!
//! Usage: `notekeep_cli [DB_PATH] [--tag TAG] [--includes PATTERN] [--desc] [--log-dir DIR]`

use notekeep_core::{FilterSpec, NoteStore, SortOrder, SqliteBackend};
use std::process::ExitCode;

struct Args {
    db_path: Option<String>,
    log_dir: Option<String>,
    filters: FilterSpec,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args {
        db_path: None,
        log_dir: None,
        filters: FilterSpec::default(),
    };

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--tag" => {
                args.filters.tag = raw.next().ok_or("--tag expects a value")?;
            }
            "--includes" => {
                args.filters.includes = raw.next().ok_or("--includes expects a value")?;
            }
            "--desc" => args.filters.sort = SortOrder::Descending,
            "--log-dir" => {
                args.log_dir = Some(raw.next().ok_or("--log-dir expects a value")?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag `{flag}`")),
            path if args.db_path.is_none() => args.db_path = Some(path.to_string()),
            extra => return Err(format!("unexpected argument `{extra}`")),
        }
    }

    Ok(args)
}

fn run(args: Args) -> Result<(), String> {
    if let Some(log_dir) = args.log_dir.as_deref() {
        notekeep_core::init_logging(notekeep_core::default_log_level(), log_dir)?;
    }

    println!("notekeep_core ping={}", notekeep_core::ping());
    println!("notekeep_core version={}", notekeep_core::core_version());

    let Some(db_path) = args.db_path else {
        return Ok(());
    };

    let backend = SqliteBackend::open(&db_path).map_err(|err| err.to_string())?;
    let mut store = NoteStore::open_with_system_clock(backend).map_err(|err| err.to_string())?;
    store
        .set_filters(args.filters)
        .map_err(|err| err.to_string())?;

    let tags: Vec<&str> = store.tags().iter().map(String::as_str).collect();
    println!("tags=[{}]", tags.join(", "));
    for note in store.visible_notes().map_err(|err| err.to_string())? {
        println!(
            "{} {} [{}] {}",
            note.id,
            note.last_update,
            note.tags.join(", "),
            note.text.lines().next().unwrap_or_default()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let result = parse_args(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
