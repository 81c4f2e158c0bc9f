mod cmd;
mod config;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{Config, Configs};
use crate::util::logging::{setup_logging, LevelFilter};

#[derive(clap::Parser)]
#[clap(
    name = "ocd-harness",
    about = "Hardware-in-the-loop checks through OpenOCD, and static checks on C sources",
    version
)]
struct Cli {
    /// Location for log file
    ///
    /// The file receives every event as JSON, regardless of `--log-level`.
    #[clap(long, global = true, help_heading = "LOG CONFIGURATION")]
    log_file: Option<PathBuf>,

    /// Level of the messages printed to stderr. Overrides the configuration and RUST_LOG.
    #[clap(long, global = true, value_enum, help_heading = "LOG CONFIGURATION")]
    log_level: Option<LevelFilter>,

    /// Additional configuration file, merged on top of OcdHarness.{toml,json,yaml}.
    #[clap(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

impl Cli {
    fn run(self, config: &Config) -> Result<()> {
        match self.subcommand {
            Subcommand::Server(cmd) => cmd.run(config),
            Subcommand::Halt(cmd) => cmd.run(config),
            Subcommand::Resume(cmd) => cmd.run(config),
            Subcommand::Reset(cmd) => cmd.run(config),
            Subcommand::Read(cmd) => cmd.run(config),
            Subcommand::Write(cmd) => cmd.run(config),
            Subcommand::ExpectBits(cmd) => cmd.run(config),
            Subcommand::Breakpoint(cmd) => cmd.run(config),
            Subcommand::Raw(cmd) => cmd.run(config),
            Subcommand::Inspect(cmd) => cmd.run(),
        }
    }
}

#[derive(clap::Subcommand)]
enum Subcommand {
    Server(cmd::server::Cmd),
    Halt(cmd::halt::Cmd),
    /// Let the halted core run again
    Resume(cmd::resume::Cmd),
    /// Reset the target and let it run, or keep it halted with `--halt`
    Reset(cmd::reset::Cmd),
    Read(cmd::read::Cmd),
    Write(cmd::write::Cmd),
    ExpectBits(cmd::expect_bits::Cmd),
    Breakpoint(cmd::breakpoint::Cmd),
    Raw(cmd::raw::Cmd),
    /// Static checks on a C source file
    Inspect(cmd::inspect::Cmd),
}

fn load_config(extra: Option<PathBuf>) -> Result<Config> {
    let conf_dir = std::env::current_dir().context("Unable to determine the working directory.")?;

    let mut configs = Configs::new(&conf_dir);
    if let Some(path) = extra {
        configs.merge(path)?;
    }

    configs.extract()
}

fn main() -> Result<()> {
    let matches = Cli::parse();

    let config = load_config(matches.config.clone()).context("Failed to load configuration.")?;

    let log_path = matches.log_file.clone();
    let _logger_guard = setup_logging(
        log_path.as_deref(),
        matches.log_level.or(config.general.log_level),
    )?;

    matches.run(&config)
}
