//! On-disk inventory of source recordings and rendered samples

use std::collections::BTreeSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Result;
use crate::notes::{all_notes, PianoNote};

/// Which notes are present in the source and output directories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub downloaded: BTreeSet<PianoNote>,
    pub converted: BTreeSet<PianoNote>,
}

impl Inventory {
    /// Scan the directories named by `config`
    pub fn scan(config: &Config) -> Result<Self> {
        Ok(Self {
            downloaded: scan(&config.aiff_dir, "aiff")?,
            converted: scan(&config.output_dir, config.format.extension())?,
        })
    }

    /// Keys with no source recording yet
    pub fn missing_sources(&self) -> Vec<PianoNote> {
        all_notes()
            .into_iter()
            .filter(|n| !self.downloaded.contains(n))
            .collect()
    }

    /// Keys that have a source but no rendered sample
    pub fn pending_conversions(&self) -> Vec<PianoNote> {
        self.downloaded
            .difference(&self.converted)
            .copied()
            .collect()
    }
}

/// Collect notes whose files in `dir` carry `extension`
///
/// Only the top level of `dir` is read. A missing directory is empty, and
/// files not named after a piano key are ignored.
pub fn scan(dir: &Path, extension: &str) -> Result<BTreeSet<PianoNote>> {
    let mut notes = BTreeSet::new();
    if !dir.exists() {
        return Ok(notes);
    }

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches_ext {
            continue;
        }

        if let Some(note) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<PianoNote>().ok())
        {
            notes.insert(note);
        }
    }

    Ok(notes)
}
