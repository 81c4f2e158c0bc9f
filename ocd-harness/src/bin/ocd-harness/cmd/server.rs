use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ocd_session::{OcdServer, ServerConfig};
use signal_hook::consts::signal;

use crate::config::Config;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run OpenOCD until it exits or is interrupted
///
/// OpenOCD is started from the `[server]` configuration. Ctrl+C or SIGTERM stop it gracefully,
/// then everything it printed is written to stdout.
#[derive(clap::Parser)]
#[clap(verbatim_doc_comment)]
pub struct Cmd {
    /// Do not print the output of OpenOCD when it stops.
    #[arg(long)]
    quiet: bool,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let exit = Arc::new(AtomicBool::new(false));
        let sigint = signal_hook::flag::register(signal::SIGINT, exit.clone())?;
        let sigterm = signal_hook::flag::register(signal::SIGTERM, exit.clone())?;

        let mut server = OcdServer::start(&ServerConfig::from(&config.server))
            .context("Failed to start OpenOCD.")?;
        println!(
            "OpenOCD is running with pid {}, press Ctrl+C to stop it.",
            server.id()
        );

        while !exit.load(Ordering::Relaxed) && server.is_running() {
            std::thread::sleep(POLL_INTERVAL);
        }
        let interrupted = exit.load(Ordering::Relaxed);

        let status = server.stop().context("Failed to stop OpenOCD.")?;
        if !self.quiet {
            print!("{}", server.output()?);
        }

        signal_hook::low_level::unregister(sigint);
        signal_hook::low_level::unregister(sigterm);

        match status {
            Some(status) if !interrupted && !status.success() => {
                anyhow::bail!("OpenOCD exited with {status}.")
            }
            Some(status) => tracing::info!("OpenOCD exited with {status}"),
            None => {}
        }

        Ok(())
    }
}
