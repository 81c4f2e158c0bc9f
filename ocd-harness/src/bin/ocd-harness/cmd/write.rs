use ocd_session::RegisterAddress;

use crate::config::Config;
use crate::util::cli;
use crate::util::common_options::ConnectionOptions;

/// Write a 32-bit register
///
/// e.g. ocd-harness write 0x40310980 1
///      Writes 0x00000001 to the register at 0x40310980
#[derive(clap::Parser)]
#[clap(verbatim_doc_comment)]
pub struct Cmd {
    #[clap(flatten)]
    common: ConnectionOptions,

    /// Address of the register.
    address: RegisterAddress,

    /// Value to write, in decimal (16), hexadecimal (0x10) or octal (0o20) format.
    #[arg(value_parser = ocd_session::parse_u32)]
    value: u32,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        cli::with_session(&self.common, config, |session| {
            session.write_register(self.address, self.value)?;
            Ok(())
        })
    }
}
