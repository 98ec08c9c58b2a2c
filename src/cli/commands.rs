//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use tracing::info;

use crate::cli::BatchArgs;
use crate::config::Config;
use crate::error::Result;
use crate::inventory::Inventory;
use crate::notes::{all_notes, parse_note_list, PianoNote, KEY_COUNT};
use crate::pipeline::{Pipeline, RunReport};

/// Build the effective config: defaults, file, environment, then flags.
pub fn load_config(path: Option<&Path>, batch: &BatchArgs) -> Result<Config> {
    let mut config = match path {
        Some(p) => {
            info!("Loading config from {}", p.display());
            Config::from_file(p)?
        }
        None => Config::default(),
    };
    config.apply_env()?;
    batch.apply(&mut config);
    Ok(config)
}

/// Notes selected by `--notes`, or the whole keyboard.
pub fn selected_notes(batch: &BatchArgs) -> Result<Vec<PianoNote>> {
    match batch.notes.as_deref() {
        Some(list) => parse_note_list(list),
        None => Ok(all_notes()),
    }
}

/// Run the pipeline and print a summary.
pub fn run_batch(config: Config, notes: &[PianoNote]) -> Result<RunReport> {
    info!(
        "Processing {} notes (download: {}, convert: {})",
        notes.len(),
        config.download,
        config.convert
    );

    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run(notes)?;

    println!(
        "Done: {} succeeded, {} failed ({:.1}s)",
        report.succeeded(),
        report.failed(),
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );

    for failure in report.failures() {
        println!(
            "  {}: {}",
            failure.note,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(report)
}

/// Print download/convert status for every key.
pub fn show_status(config: &Config) -> Result<()> {
    let inventory = Inventory::scan(config)?;

    println!("Sources:  {}", config.aiff_dir.display());
    println!("Outputs:  {}", config.output_dir.display());
    println!("{:-<60}", "");

    for note in all_notes() {
        let source = if inventory.downloaded.contains(&note) { "aiff" } else { "----" };
        let output = if inventory.converted.contains(&note) {
            config.format.extension()
        } else {
            "---"
        };
        println!("{:<4} {} {}", note.name(), source, output);
    }

    println!("{:-<60}", "");
    println!(
        "Downloaded: {}/{} | Converted: {}/{} | Pending conversion: {}",
        inventory.downloaded.len(),
        KEY_COUNT,
        inventory.converted.len(),
        KEY_COUNT,
        inventory.pending_conversions().len()
    );

    let missing = inventory.missing_sources();
    if !missing.is_empty() && missing.len() < KEY_COUNT {
        let names: Vec<String> = missing.iter().map(|n| n.name()).collect();
        println!("Missing sources: {}", names.join(", "));
    }

    Ok(())
}

/// Print every key name with their MIDI numbers.
pub fn list_notes() -> Result<()> {
    for note in all_notes() {
        println!("{:>3}  {:<4} {:>8.2} Hz", note.midi(), note.name(), note.frequency());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_LOCK;
    use pretty_assertions::assert_eq;
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_flags_override_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "length_ms": 1500, "chunk_ms": 5 }"#).unwrap();

        let batch = BatchArgs {
            chunk_ms: Some(20),
            ..BatchArgs::default()
        };
        let config = load_config(Some(&path), &batch).unwrap();
        assert_eq!(config.length_ms, 1500);
        assert_eq!(config.chunk_ms, 20);
    }

    #[test]
    fn test_flag_beats_env_beats_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "base_url": "http://file.example/piano" }"#).unwrap();

        env::set_var("PIANO_SAMPLES_BASE_URL", "http://env.example/piano");
        let from_env = load_config(Some(&path), &BatchArgs::default());
        let batch = BatchArgs {
            base_url: Some("http://flag.example/piano".to_string()),
            ..BatchArgs::default()
        };
        let from_flag = load_config(Some(&path), &batch);
        env::remove_var("PIANO_SAMPLES_BASE_URL");

        assert_eq!(from_env.unwrap().base_url, "http://env.example/piano");
        assert_eq!(from_flag.unwrap().base_url, "http://flag.example/piano");
    }

    #[test]
    fn test_selected_notes_defaults_to_keyboard() {
        assert_eq!(selected_notes(&BatchArgs::default()).unwrap().len(), KEY_COUNT);

        let batch = BatchArgs {
            notes: Some("C4,A0".to_string()),
            ..BatchArgs::default()
        };
        let names: Vec<String> = selected_notes(&batch)
            .unwrap()
            .iter()
            .map(|n| n.name())
            .collect();
        assert_eq!(names, vec!["A0", "C4"]);
    }

    #[test]
    fn test_bad_note_list() {
        let batch = BatchArgs {
            notes: Some("A0,X9".to_string()),
            ..BatchArgs::default()
        };
        assert!(selected_notes(&batch).is_err());
    }
}
