use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::OcdError;

/// Every OpenOCD telnet response ends with this prompt.
pub const PROMPT: &[u8] = b"> ";

/// Lower bound for a single socket read, so a nearly expired deadline still gets one real read.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(100);

const RECEIVE_CHUNK_SIZE: usize = 4096;

/// Where to find the OpenOCD telnet server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Used both for connecting and for draining the banner.
    pub timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4444,
            timeout: Duration::from_secs(5),
        }
    }
}

impl ConnectionConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A line oriented connection to the OpenOCD telnet port.
///
/// Received bytes are kept in a buffer across calls, anything read past a prompt is handed out by
/// the next [`read_until`](Self::read_until).
#[derive(Debug)]
pub struct TelnetConnection {
    stream: TcpStream,
    buffer: Vec<u8>,
}

impl TelnetConnection {
    /// Connects to the first address `config.host` resolves to that accepts a connection.
    pub fn connect(config: &ConnectionConfig) -> Result<Self, OcdError> {
        let address = config.address();
        let candidates: Vec<SocketAddr> = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|source| OcdError::Resolve {
                address: address.clone(),
                source,
            })?
            .collect();

        let mut last_error = std::io::Error::new(
            ErrorKind::AddrNotAvailable,
            "host did not resolve to any address",
        );

        for candidate in candidates {
            tracing::debug!("Connecting to {candidate}");
            match TcpStream::connect_timeout(&candidate, config.timeout) {
                Ok(stream) => {
                    tracing::info!("Connected to OpenOCD at {candidate}");
                    return Ok(Self::from_stream(stream));
                }
                Err(e) => {
                    tracing::debug!("Connecting to {candidate} failed: {e}");
                    last_error = e;
                }
            }
        }

        Err(OcdError::Connect {
            address,
            source: last_error,
        })
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
        }
    }

    /// Sends `data` as is.
    pub fn write(&mut self, data: &[u8]) -> Result<(), OcdError> {
        self.stream.write_all(data)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Reads until `expected` has been received or `timeout` has passed.
    ///
    /// Returns everything up to and including `expected`. When the deadline passes or the peer
    /// closes the connection first, whatever has been received is returned instead, and the
    /// caller gets no error. Only genuine I/O failures are reported.
    pub fn read_until(&mut self, expected: &[u8], timeout: Duration) -> Result<Vec<u8>, OcdError> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; RECEIVE_CHUNK_SIZE];

        while find(&self.buffer, expected).is_none() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!("Timed out waiting for {:?}", String::from_utf8_lossy(expected));
                break;
            }

            self.stream
                .set_read_timeout(Some(remaining.max(MIN_READ_TIMEOUT)))?;

            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    tracing::debug!("Connection closed by OpenOCD");
                    break;
                }
                Ok(n) => {
                    tracing::trace!("recv: {:?}", String::from_utf8_lossy(&chunk[..n]));
                    self.buffer.extend_from_slice(&chunk[..n]);
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    tracing::debug!("Read timed out");
                    break;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let data = match find(&self.buffer, expected) {
            Some(index) => {
                let rest = self.buffer.split_off(index + expected.len());
                std::mem::replace(&mut self.buffer, rest)
            }
            None => std::mem::take(&mut self.buffer),
        };

        Ok(data)
    }

    /// Shuts the socket down. Failures are logged and otherwise ignored.
    pub fn shutdown(self) {
        if let Err(e) = self.stream.shutdown(std::net::Shutdown::Both) {
            tracing::debug!("Ignoring error while shutting down the connection: {e}");
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }

    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Turns a raw reply into the text OpenOCD printed for the command.
///
/// Trailing prompt characters and surrounding whitespace are removed.
pub fn clean_response(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['>', ' '])
        .trim()
        .to_string()
}
