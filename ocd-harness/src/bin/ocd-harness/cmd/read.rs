use ocd_session::{BitField, RegisterAddress};

use crate::config::Config;
use crate::util::cli;
use crate::util::common_options::ConnectionOptions;

/// Read a 32-bit register
///
/// e.g. ocd-harness read 0x40310388 --lsb 0 --width 3
///      Prints bits 2..0 of the register at 0x40310388
///
/// Addresses and bit positions can be given in decimal (16), hexadecimal (0x10) or octal (0o20).
#[derive(clap::Parser)]
#[clap(verbatim_doc_comment)]
pub struct Cmd {
    #[clap(flatten)]
    common: ConnectionOptions,

    /// Address of the register.
    address: RegisterAddress,

    /// Least significant bit of the field to print.
    #[arg(long, value_parser = ocd_session::parse_u32, requires = "width")]
    lsb: Option<u32>,

    /// Width in bits of the field to print.
    #[arg(long, value_parser = ocd_session::parse_u32, requires = "lsb")]
    width: Option<u32>,
}

impl Cmd {
    fn field(&self) -> Option<BitField> {
        Some(BitField::new(self.lsb?, self.width?))
    }

    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let field = self.field();

        let line = cli::with_session(&self.common, config, |session| {
            Ok(match field {
                Some(field) => {
                    let value = session.read_register_bits(self.address, field)?;
                    format!("{} {field}: 0x{value:X}", self.address)
                }
                None => {
                    let value = session.read_register(self.address)?;
                    format!("{}: 0x{value:08X}", self.address)
                }
            })
        })?;

        println!("{line}");
        Ok(())
    }
}
