use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log targets of this workspace. `--log-level` applies to these, everything else stays at WARN.
///
/// `ocd_session` logs every telnet command as ` > cmd` and every reply as ` < resp` at DEBUG.
const TARGETS: [&str; 3] = ["ocd_harness", "ocd_session", "source_inspector"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[clap(rename_all = "UPPER")]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelFilter {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LevelFilter {
    fn as_directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Filter directives that set this level for the workspace targets.
    fn directives(self) -> String {
        let mut directives = String::from("warn");
        for target in TARGETS {
            directives.push_str(&format!(",{target}={}", self.as_directive()));
        }
        directives
    }
}

/// Flushes the JSON log file when dropped.
pub struct LogFile {
    _worker: WorkerGuard,
    path: PathBuf,
}

impl Drop for LogFile {
    fn drop(&mut self) {
        tracing::debug!("Log written to {}", self.path.display());
    }
}

fn stderr_filter(level: Option<LevelFilter>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(level.directives()),
        // RUST_LOG is only consulted when neither the command line nor the configuration set a level.
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LevelFilter::Warn.directives())),
    }
}

/// Installs the global subscriber.
///
/// Human readable messages go to stderr, filtered by `level`, or by `RUST_LOG` when `level` is
/// `None`. With a `log_file`, every event of the workspace targets is also written there as one
/// JSON object per line. Keep the returned [`LogFile`] alive until the program exits.
pub fn setup_logging(
    log_file: Option<&Path>,
    level: Option<LevelFilter>,
) -> anyhow::Result<Option<LogFile>> {
    let stderr = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter(level));

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(stderr).init();
        return Ok(None);
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let (writer, worker) = NonBlockingBuilder::default().lossy(false).finish(file);

    let json = tracing_subscriber::fmt::layer()
        .json()
        .with_line_number(true)
        .with_writer(writer)
        .with_filter(EnvFilter::new(LevelFilter::Trace.directives()));

    tracing_subscriber::registry().with(stderr).with(json).init();

    Ok(Some(LogFile {
        _worker: worker,
        path: path.to_path_buf(),
    }))
}

#[cfg(test)]
mod test {
    use clap::ValueEnum;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn level_applies_to_workspace_targets_only() {
        assert_eq!(
            LevelFilter::Debug.directives(),
            "warn,ocd_harness=debug,ocd_session=debug,source_inspector=debug"
        );
        assert_eq!(
            LevelFilter::Off.directives(),
            "warn,ocd_harness=off,ocd_session=off,source_inspector=off"
        );
    }

    #[test]
    fn every_level_builds_a_filter() {
        for level in LevelFilter::value_variants() {
            assert!(
                EnvFilter::try_new(level.directives()).is_ok(),
                "{level:?}"
            );
        }
    }

    #[test]
    fn debug_shows_session_traffic() {
        let filter = stderr_filter(Some(LevelFilter::Debug));
        assert_eq!(
            filter.max_level_hint(),
            Some(tracing::level_filters::LevelFilter::DEBUG)
        );

        let filter = stderr_filter(Some(LevelFilter::Info));
        assert_eq!(
            filter.max_level_hint(),
            Some(tracing::level_filters::LevelFilter::INFO)
        );
    }

    #[test]
    fn level_names_are_upper_case() {
        assert_eq!(
            LevelFilter::from_str("TRACE", false).unwrap(),
            LevelFilter::Trace
        );
        assert!(LevelFilter::from_str("trace", false).is_err());
    }
}
