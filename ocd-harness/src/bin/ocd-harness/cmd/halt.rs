use std::time::Duration;

use crate::config::Config;
use crate::util::cli;
use crate::util::common_options::ConnectionOptions;

const DEFAULT_HALT_TIMEOUT: Duration = Duration::from_secs(3);

/// Halt the core
///
/// Waits for OpenOCD to confirm for 3 seconds, or as long as `--timeout` says.
#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    common: ConnectionOptions,
}

impl Cmd {
    fn timeout(&self) -> Duration {
        self.common
            .timeout
            .map_or(DEFAULT_HALT_TIMEOUT, Duration::from_millis)
    }

    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let timeout = self.timeout();

        cli::with_session(&self.common, config, |session| {
            session.halt(timeout)?;
            Ok(())
        })
    }
}
