//! Notebook smoke probe.
//!
//! # Responsibility
//! - Resolve and load the notebook for the current directory.
//! - Print summary counts, or search hits as JSON lines when given a query.
//!   A query with no exact hit falls back to fuzzy ranking.
//!
//! Usage: `hnote-probe [query]`

use hypernote_core::registry::note_registry::FUZZY_DEFAULT_LIMIT;
use hypernote_core::{
    core_version, default_log_level, init_logging, log_dir_from_env, Notebook, RegistryLocation,
};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    if let Some(log_dir) = log_dir_from_env() {
        init_logging(default_log_level(), &log_dir).map_err(|err| err.to_string())?;
    }

    let cwd = std::env::current_dir().map_err(|err| format!("cannot read current dir: {err}"))?;
    let location = RegistryLocation::discover(&cwd)
        .ok_or_else(|| "Registry not found! Create a `.hnote` notebook first.".to_string())?;
    let notebook = Notebook::open(location.clone(), cwd).map_err(|err| err.to_string())?;

    let Some(query) = std::env::args().nth(1) else {
        println!("hypernote_core version={}", core_version());
        println!("registry={}", location.registry_path.display());
        println!("notes={}", notebook.notes().len());
        println!("relations={}", notebook.relation_store().len());
        return Ok(());
    };

    let mut hits = notebook.search(&query);
    if hits.is_empty() {
        hits = notebook.notes().search_fuzzy(&query, FUZZY_DEFAULT_LIMIT);
        info!(
            "event=probe_search module=cli status=ok mode=fuzzy hits={}",
            hits.len()
        );
    }
    for uid in hits {
        let note = notebook.lookup(uid).map_err(|err| err.to_string())?;
        let line = serde_json::to_string(note).map_err(|err| err.to_string())?;
        println!("{line}");
    }
    Ok(())
}
