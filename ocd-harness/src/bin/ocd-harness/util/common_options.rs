use std::time::Duration;

use ocd_session::{parse_u64, ConnectionConfig};

use crate::config::Config;

/// Common options and logic when talking to OpenOCD.
///
/// Every value given here overrides the configuration.
#[derive(clap::Parser, Debug, Default)]
pub struct ConnectionOptions {
    /// Host running the OpenOCD telnet server.
    #[arg(long, help_heading = "CONNECTION CONFIGURATION")]
    pub host: Option<String>,
    /// Port of the OpenOCD telnet server.
    #[arg(long, help_heading = "CONNECTION CONFIGURATION")]
    pub port: Option<u16>,
    /// Timeout in milliseconds for connecting and for commands that wait on the target (`halt`, `raw`).
    #[arg(
        long,
        value_name = "MS",
        value_parser = parse_u64,
        help_heading = "CONNECTION CONFIGURATION"
    )]
    pub timeout: Option<u64>,
    /// Start OpenOCD as configured before running the command, and stop it afterwards.
    #[arg(long, help_heading = "CONNECTION CONFIGURATION")]
    pub spawn_server: bool,
}

impl ConnectionOptions {
    pub fn connection_config(&self, config: &Config) -> ConnectionConfig {
        let mut connection = ConnectionConfig::from(&config.connection);

        if let Some(host) = &self.host {
            connection.host.clone_from(host);
        }
        if let Some(port) = self.port {
            connection.port = port;
        }
        if let Some(timeout) = self.timeout {
            connection.timeout = Duration::from_millis(timeout);
        }

        connection
    }
}
