use ocd_session::RegisterAddress;

use crate::config::Config;
use crate::util::cli;
use crate::util::common_options::ConnectionOptions;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    common: ConnectionOptions,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(clap::Subcommand)]
/// Manage hardware breakpoints
enum Subcommand {
    /// Set a hardware breakpoint on a Thumb instruction
    Set {
        /// Address of the instruction.
        address: RegisterAddress,
    },
    /// Remove the breakpoint at an address
    Remove {
        /// Address the breakpoint was set on.
        address: RegisterAddress,
    },
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        cli::with_session(&self.common, config, |session| {
            match self.subcommand {
                Subcommand::Set { address } => session.set_breakpoint(address)?,
                Subcommand::Remove { address } => session.remove_breakpoint(address)?,
            }
            Ok(())
        })
    }
}
