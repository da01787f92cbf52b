use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Size bounds of the persistent log file
#[derive(Debug, Clone, Copy)]
struct LogLimits {
    /// Trim once the file grows past this many bytes
    max_bytes: u64,
    /// Roughly how much of the newest output survives a trim
    keep_bytes: u64,
}

const LOG_LIMITS: LogLimits = LogLimits {
    max_bytes: 5 * 1024 * 1024,
    keep_bytes: 1024 * 1024,
};

impl LogLimits {
    /// Cut an oversized log down to its newest whole lines.
    ///
    /// Returns whether the file was trimmed. A missing file is not an error.
    fn trim(self, path: &Path) -> io::Result<bool> {
        let len = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if len <= self.max_bytes {
            return Ok(false);
        }

        let content = fs::read(path)?;
        let keep = usize::try_from(self.keep_bytes).unwrap_or(usize::MAX);
        let tail = &content[content.len().saturating_sub(keep)..];
        let tail = match tail.iter().position(|&b| b == b'\n') {
            Some(newline) => &tail[newline + 1..],
            None => tail,
        };

        let mut trimmed = format!("# convsim log trimmed to {} bytes\n", tail.len()).into_bytes();
        trimmed.extend_from_slice(tail);
        fs::write(path, trimmed)?;
        Ok(true)
    }
}

/// Initialize logging to stderr and, optionally, an appended log file.
///
/// The filter comes from `RUST_LOG` when set, otherwise
/// `convsim={level},convsim_core=warn`. The log file is trimmed before it is
/// opened: past 5 MB only the newest 1 MB of lines is kept.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> color_eyre::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let trimmed = LOG_LIMITS.trim(path);
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true);
            Some((layer, trimmed))
        }
        None => None,
    };
    let (file_layer, trimmed) = file_layer.unzip();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("convsim={level},convsim_core=warn")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(file_layer)
        .try_init()?;

    match trimmed {
        Some(Ok(true)) => tracing::info!(log_file = ?log_file, "Trimmed oversized log file"),
        Some(Err(e)) => tracing::warn!(error = %e, "Failed to trim log file"),
        _ => {}
    }
    tracing::debug!(log_file = ?log_file, "Logging initialized");
    Ok(())
}
