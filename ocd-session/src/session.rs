use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::connection::{clean_response, ConnectionConfig, TelnetConnection, PROMPT};
use crate::server::{OcdServer, ServerConfig};
use crate::{BitField, OcdError, RegisterAddress};

/// Timeout for commands which do not need anything special.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for `reset halt` and `reset run`.
pub const RESET_TIMEOUT: Duration = Duration::from_secs(5);

/// The `mdw` output looks like `0x40310388: 00000002 `.
fn memory_dump_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":\s+([0-9a-fA-F]{8})").expect("pattern is valid"))
}

/// A debugging session with one OpenOCD instance.
///
/// The session owns at most one server process and at most one telnet connection. Both are
/// created and released explicitly, nothing is ever connected implicitly. Whatever is still open
/// when the session is dropped is closed on a best-effort basis.
///
/// ```no_run
/// use ocd_session::{BitField, ConnectionConfig, Session};
///
/// # fn main() -> Result<(), ocd_session::OcdError> {
/// let mut session = Session::new();
/// session.open(&ConnectionConfig::default())?;
///
/// session.halt(std::time::Duration::from_secs(3))?;
/// let drive_mode = session.read_register_bits("0x40310388".parse()?, BitField::new(0, 3))?;
/// assert_eq!(drive_mode, 2);
/// session.resume()?;
///
/// session.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Session {
    server: Option<OcdServer>,
    connection: Option<TelnetConnection>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an OpenOCD server owned by this session.
    ///
    /// A server that is already owned by the session is stopped first.
    pub fn start_server(&mut self, config: &ServerConfig) -> Result<(), OcdError> {
        self.stop_server()?;
        self.server = Some(OcdServer::start(config)?);
        Ok(())
    }

    /// Stops the server started by [`start_server`](Self::start_server).
    ///
    /// Does nothing when no server is running. The handle is released even if stopping fails.
    pub fn stop_server(&mut self) -> Result<(), OcdError> {
        match self.server.take() {
            Some(mut server) => server.stop().map(|_| ()),
            None => Ok(()),
        }
    }

    /// Whether the owned server process is still alive.
    pub fn server_running(&mut self) -> bool {
        self.server.as_mut().is_some_and(OcdServer::is_running)
    }

    /// Output captured from the owned server, empty if there is none.
    pub fn server_output(&mut self) -> Result<String, OcdError> {
        match self.server.as_mut() {
            Some(server) => server.output(),
            None => Ok(String::new()),
        }
    }

    /// Opens the telnet connection and consumes the banner.
    ///
    /// Not seeing the prompt within the timeout is tolerated.
    pub fn open(&mut self, config: &ConnectionConfig) -> Result<(), OcdError> {
        self.close();

        let mut connection = TelnetConnection::connect(config)?;
        let banner = connection.read_until(PROMPT, config.timeout)?;
        if banner.ends_with(PROMPT) {
            tracing::debug!("Banner: {:?}", clean_response(&banner));
        } else {
            tracing::warn!(
                "No prompt from OpenOCD within {:?}, continuing anyway",
                config.timeout
            );
        }

        self.connection = Some(connection);
        Ok(())
    }

    /// Sends `exit` and drops the connection. Errors on the way out are ignored.
    pub fn close(&mut self) {
        if self.connection.is_none() {
            return;
        }

        if let Err(e) = self.command("exit", DEFAULT_COMMAND_TIMEOUT) {
            tracing::warn!("Ignoring error while sending exit: {e}");
        }

        if let Some(connection) = self.connection.take() {
            connection.shutdown();
            tracing::info!("Closed the OpenOCD connection");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn command(&mut self, command: &str, timeout: Duration) -> Result<String, OcdError> {
        let connection = self.connection.as_mut().ok_or(OcdError::NotConnected)?;

        tracing::debug!(" > {}", command);
        connection.write(format!("{command}\n").as_bytes())?;

        let raw = connection.read_until(PROMPT, timeout)?;
        let response = clean_response(&raw);
        tracing::debug!(" < {:?}", response);

        Ok(response)
    }

    /// Sends any command and returns what OpenOCD printed in response.
    pub fn send_raw(&mut self, command: &str) -> Result<String, OcdError> {
        self.command(command, DEFAULT_COMMAND_TIMEOUT)
    }

    /// Like [`send_raw`](Self::send_raw), with a custom timeout.
    pub fn send_raw_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<String, OcdError> {
        self.command(command, timeout)
    }

    pub fn halt(&mut self, timeout: Duration) -> Result<(), OcdError> {
        self.command("halt", timeout).map(|_| ())
    }

    pub fn resume(&mut self) -> Result<(), OcdError> {
        self.command("resume", DEFAULT_COMMAND_TIMEOUT).map(|_| ())
    }

    /// Resets the target and leaves it halted.
    pub fn reset_and_halt(&mut self) -> Result<(), OcdError> {
        self.command("reset halt", RESET_TIMEOUT).map(|_| ())
    }

    /// Resets the target and lets it run.
    pub fn reset_and_run(&mut self) -> Result<(), OcdError> {
        self.command("reset run", RESET_TIMEOUT).map(|_| ())
    }

    /// Reads a 32-bit memory mapped register.
    pub fn read_register(&mut self, address: RegisterAddress) -> Result<u32, OcdError> {
        let command = format!("mdw {address}");
        let response = self.command(&command, DEFAULT_COMMAND_TIMEOUT)?;

        let value = memory_dump_pattern()
            .captures(&response)
            .and_then(|captures| captures.get(1))
            .and_then(|digits| u32::from_str_radix(digits.as_str(), 16).ok());

        value.ok_or(OcdError::UnexpectedResponse { command, response })
    }

    /// Writes a 32-bit memory mapped register.
    pub fn write_register(&mut self, address: RegisterAddress, value: u32) -> Result<(), OcdError> {
        self.command(
            &format!("mww {address} 0x{value:08X}"),
            DEFAULT_COMMAND_TIMEOUT,
        )
        .map(|_| ())
    }

    /// Reads a register and extracts `field` from it.
    pub fn read_register_bits(
        &mut self,
        address: RegisterAddress,
        field: BitField,
    ) -> Result<u32, OcdError> {
        let raw = self.read_register(address)?;
        Ok(field.extract(raw))
    }

    /// Fails with [`OcdError::BitFieldMismatch`] unless `field` currently holds `expected`.
    pub fn register_bits_should_equal(
        &mut self,
        address: RegisterAddress,
        field: BitField,
        expected: u64,
    ) -> Result<(), OcdError> {
        let actual = self.read_register_bits(address, field)?;

        if u64::from(actual) != expected {
            return Err(OcdError::BitFieldMismatch {
                address,
                msb: field.msb(),
                lsb: field.lsb,
                expected,
                actual,
            });
        }

        Ok(())
    }

    /// Sets a hardware breakpoint on a 2 byte instruction.
    pub fn set_breakpoint(&mut self, address: RegisterAddress) -> Result<(), OcdError> {
        self.command(&format!("bp {address} 2 hw"), DEFAULT_COMMAND_TIMEOUT)
            .map(|_| ())
    }

    pub fn remove_breakpoint(&mut self, address: RegisterAddress) -> Result<(), OcdError> {
        self.command(&format!("rbp {address}"), DEFAULT_COMMAND_TIMEOUT)
            .map(|_| ())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();

        if let Err(e) = self.stop_server() {
            tracing::warn!("Failed to stop OpenOCD: {e}");
        }
    }
}
