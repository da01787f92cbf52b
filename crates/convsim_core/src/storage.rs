//! Reading and writing results files.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ResultsError;
use crate::model::{ResultsFile, RunResult};

/// Load a results file.
///
/// Accepts the `{ "metadata": ..., "results": [...] }` layout as well as a
/// bare list of run records.
pub fn load_results(path: &Path) -> Result<ResultsFile, ResultsError> {
    let content = fs::read_to_string(path).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let json_err = |source| ResultsError::Json {
        path: path.to_path_buf(),
        source,
    };
    let value: serde_json::Value = serde_json::from_str(&content).map_err(json_err)?;

    let file = if value.get("results").is_some() {
        serde_json::from_value::<ResultsFile>(value).map_err(json_err)?
    } else if value.is_array() {
        ResultsFile {
            metadata: None,
            results: serde_json::from_value::<Vec<RunResult>>(value).map_err(json_err)?,
        }
    } else {
        return Err(ResultsError::Schema(path.to_path_buf()));
    };
    debug!(path = %path.display(), runs = file.len(), "Loaded results");
    Ok(file)
}

/// Write a results file as pretty JSON, creating parent directories
pub fn write_results(file: &ResultsFile, path: &Path) -> Result<(), ResultsError> {
    let io_err = |source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let handle = File::create(path).map_err(io_err)?;
    write_json(file, path, handle)
}

/// Write a fresh results file in `output_dir`, never replacing an existing one.
///
/// Tries the name from [`results_path`] first, then appends `_2`, `_3`, ...
/// until a name is free. Returns the path written.
pub fn write_new_results(
    file: &ResultsFile,
    output_dir: &Path,
    created_at: jiff::Timestamp,
    name: &str,
) -> Result<PathBuf, ResultsError> {
    if !output_dir.as_os_str().is_empty() {
        fs::create_dir_all(output_dir).map_err(|source| ResultsError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
    }
    let first = results_path(output_dir, created_at, name);
    let stem = first
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut attempt = 1u32;
    loop {
        let path = if attempt == 1 {
            first.clone()
        } else {
            first.with_file_name(format!("{stem}_{attempt}.json"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(handle) => {
                write_json(file, &path, handle)?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Results file exists, trying the next name");
                attempt += 1;
            }
            Err(source) => return Err(ResultsError::Io { path, source }),
        }
    }
}

fn write_json(file: &ResultsFile, path: &Path, handle: File) -> Result<(), ResultsError> {
    let mut writer = BufWriter::new(handle);
    serde_json::to_writer_pretty(&mut writer, file).map_err(|source| ResultsError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), runs = file.len(), "Wrote results");
    Ok(())
}

/// `<YYYYMMDD_HHMMSS>_<name>.json`, with the name reduced to safe characters
pub fn results_file_name(created_at: &jiff::Zoned, name: &str) -> String {
    let safe: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{safe}.json", created_at.strftime("%Y%m%d_%H%M%S"))
}

/// Where `run` stores a results file, named after the local creation time
pub fn results_path(output_dir: &Path, created_at: jiff::Timestamp, name: &str) -> PathBuf {
    let local = created_at.to_zoned(jiff::tz::TimeZone::system());
    output_dir.join(results_file_name(&local, name))
}

/// Where `run --dashboard` stores the dashboard for a results file
pub fn dashboard_path(results_path: &Path) -> PathBuf {
    let dir = results_path.parent().unwrap_or_else(|| Path::new(""));
    let stem = results_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    dir.join("dashboards").join(format!("{stem}.html"))
}
