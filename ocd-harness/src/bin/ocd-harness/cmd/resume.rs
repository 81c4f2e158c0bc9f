use crate::config::Config;
use crate::util::cli;
use crate::util::common_options::ConnectionOptions;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    common: ConnectionOptions,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        cli::with_session(&self.common, config, |session| {
            session.resume()?;
            Ok(())
        })
    }
}
