use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter, e.g. `KEYSTRIDE_LOG=debug`
pub const LOG_ENV: &str = "KEYSTRIDE_LOG";

/// Send tracing output to `path`. The terminal belongs to the UI, so logs
/// never go to stdout or stderr.
pub fn init_file_logging(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .try_init()
        .map_err(|err| io::Error::other(format!("failed to init tracing: {err}")))
}
