use crate::config::Config;
use crate::util::cli;
use crate::util::common_options::ConnectionOptions;

/// Send a command to OpenOCD and print its response
///
/// e.g. ocd-harness raw flash banks
///
/// The response is printed without the echoed prompt. It is not interpreted in any way, so OpenOCD
/// reporting an error still exits successfully.
#[derive(clap::Parser)]
#[clap(verbatim_doc_comment)]
pub struct Cmd {
    #[clap(flatten)]
    common: ConnectionOptions,

    /// The command and its arguments.
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl Cmd {
    fn command_line(&self) -> String {
        self.command.join(" ")
    }

    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let timeout = self.common.connection_config(config).timeout;
        let command = self.command_line();

        let response = cli::with_session(&self.common, config, |session| {
            Ok(session.send_raw_with_timeout(&command, timeout)?)
        })?;

        println!("{response}");
        Ok(())
    }
}
