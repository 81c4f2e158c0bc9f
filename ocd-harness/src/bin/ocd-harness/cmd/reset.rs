use crate::config::Config;
use crate::util::cli;
use crate::util::common_options::ConnectionOptions;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    common: ConnectionOptions,

    /// Keep the core halted at the reset vector instead of letting it run.
    #[arg(long)]
    halt: bool,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        cli::with_session(&self.common, config, |session| {
            if self.halt {
                session.reset_and_halt()?;
            } else {
                session.reset_and_run()?;
            }
            Ok(())
        })
    }
}
