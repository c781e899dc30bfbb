//! Run directories and CSV writers shared by the command-line tools.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::WriterBuilder;

/// Create `<base_dir>/<UTC timestamp>`, or `<timestamp>-NN` when a run in
/// the same second already took the plain name.
pub fn create_timestamped_run_dir(base_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(base_dir)?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let run_dir = base_dir.join(&timestamp);
    if !run_dir.exists() {
        fs::create_dir_all(&run_dir)?;
        return Ok(run_dir);
    }

    let mut counter: usize = 1;
    loop {
        let candidate = base_dir.join(format!("{timestamp}-{counter:02}"));
        if !candidate.exists() {
            fs::create_dir_all(&candidate)?;
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// Relative paths resolve against the current working directory.
pub fn resolve_output_base_dir(requested: &Path) -> PathBuf {
    if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(requested))
            .unwrap_or_else(|_| requested.to_path_buf())
    }
}

pub fn headerless_writer(path: &Path) -> csv::Result<csv::Writer<File>> {
    WriterBuilder::new().has_headers(false).from_path(path)
}
