use ocd_session::{BitField, RegisterAddress};

use crate::config::Config;
use crate::util::cli;
use crate::util::common_options::ConnectionOptions;

/// Check a bit field of a register
///
/// e.g. ocd-harness expect-bits 0x40310388 --lsb 0 --width 3 2
///      Fails unless bits 2..0 of the register at 0x40310388 read as 2
#[derive(clap::Parser)]
#[clap(verbatim_doc_comment)]
pub struct Cmd {
    #[clap(flatten)]
    common: ConnectionOptions,

    /// Address of the register.
    address: RegisterAddress,

    /// Least significant bit of the field.
    #[arg(long, value_parser = ocd_session::parse_u32)]
    lsb: u32,

    /// Width of the field in bits.
    #[arg(long, value_parser = ocd_session::parse_u32)]
    width: u32,

    /// The value the field must hold.
    #[arg(value_parser = ocd_session::parse_u64)]
    expected: u64,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let field = BitField::new(self.lsb, self.width);

        cli::with_session(&self.common, config, |session| {
            session.register_bits_should_equal(self.address, field, self.expected)?;
            Ok(())
        })?;

        tracing::info!("{} {field} is 0x{:X}", self.address, self.expected);
        Ok(())
    }
}
