use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber once per process.
///
/// With a path, events go to that file; without one, to stderr. The filter
/// comes from `RUST_LOG` and defaults to `info`. A failed call leaves nothing
/// installed, so it can be retried.
pub fn init_tracing(log_file: Option<&Path>) -> io::Result<()> {
    if INITIALISED.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            Registry::default().with(filter).with(fmt_layer).try_init()
        }
        None => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(io::stderr().is_terminal())
                .with_writer(io::stderr);
            Registry::default().with(filter).with(fmt_layer).try_init()
        }
    };

    if let Err(err) = installed {
        // Some other global subscriber won the race; ours is not needed.
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
    let _ = INITIALISED.set(());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_failed_init_can_be_retried() {
        let dir = tempdir().unwrap();
        let unwritable = dir.path().join("missing").join("life.log");
        assert!(init_tracing(Some(&unwritable)).is_err());
        assert!(INITIALISED.get().is_none());

        let path = dir.path().join("life.log");
        init_tracing(Some(&path)).unwrap();
        assert!(INITIALISED.get().is_some());
        assert!(path.exists());
    }
}
