//! Log output to `boardline.log`.
//!
//! The terminal belongs to the TUI, so records go to a file in the config
//! directory through a `tracing-subscriber` fmt layer. `log` records from this
//! crate and its dependencies are bridged in. Records from this crate pass at
//! info (debug when enabled in config); everything else, e.g. the HTTP stack,
//! only at warn.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_FILE: &str = "boardline.log";

/// Root of this crate's log targets (`module_path!` of every module starts with it).
fn crate_root() -> &'static str {
    module_path!().split("::").next().unwrap_or_default()
}

/// Which targets pass at which level.
fn targets(debug: bool) -> Targets {
    let own_level = if debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
    Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target(crate_root(), own_level)
}

fn subscriber(file: File, debug: bool) -> impl Subscriber + Send + Sync {
    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);
    tracing_subscriber::registry().with(layer).with(targets(debug))
}

/// Install the file logger. Failure to open the log file is reported but
/// never stops the program.
pub fn init(dir: &Path, debug: bool) {
    let opened = fs::create_dir_all(dir).and_then(|_| {
        OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE))
    });
    let file = match opened {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {}: {}", dir.join(LOG_FILE).display(), e);
            return;
        }
    };
    // Also installs the bridge for `log` records.
    if let Err(e) = subscriber(file, debug).try_init() {
        eprintln!("Logging disabled: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    fn own(module: &str) -> String {
        format!("{}::{}", crate_root(), module)
    }

    #[test]
    fn test_filtering_by_target() {
        let t = targets(false);
        assert!(t.would_enable(&own("view_model"), &Level::INFO));
        assert!(!t.would_enable(&own("view_model"), &Level::DEBUG));
        assert!(!t.would_enable("reqwest::connect", &Level::INFO));
        assert!(t.would_enable("reqwest::connect", &Level::WARN));
    }

    #[test]
    fn test_debug_level() {
        assert!(targets(true).would_enable(&own("timeline"), &Level::DEBUG));
        assert!(!targets(true).would_enable("hyper::proto", &Level::DEBUG));
    }

    #[test]
    fn test_records_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let file = OpenOptions::new().create(true).append(true).open(dir.path().join(LOG_FILE)).unwrap();

        tracing::subscriber::with_default(subscriber(file, false), || {
            tracing::info!("boards loaded");
            tracing::debug!("not at info");
            tracing::info!(target: "reqwest::blocking", "connection pooled");
            tracing::warn!(target: "reqwest::blocking", "request failed");
        });

        let text = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert!(text.contains("boards loaded"));
        assert!(!text.contains("not at info"));
        assert!(!text.contains("connection pooled"));
        assert!(text.contains("WARN"));
        assert!(text.contains("request failed"));
    }
}
