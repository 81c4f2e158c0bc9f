use std::process::ExitStatus;

/// Errors reported by a [`Session`](crate::Session).
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum OcdError {
    /// Not connected to OpenOCD. Call `Session::open` first.
    NotConnected,

    /// Failed to launch `{executable}`.
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    /// OpenOCD failed to start ({status}). Output: {output}
    #[ignore_extra_doc_attributes]
    ///
    /// The server exited while the session was still waiting out the startup delay. `output`
    /// holds everything it wrote to stdout and stderr up to that point.
    Startup { status: ExitStatus, output: String },

    /// Could not resolve the address {address}.
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not connect to OpenOCD at {address}.
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected OpenOCD response for `{command}`: {response:?}
    UnexpectedResponse { command: String, response: String },

    /// Register {address} bits[{msb}:{lsb}]: expected 0x{expected:X}, got 0x{actual:X}
    BitFieldMismatch {
        address: crate::RegisterAddress,
        msb: u32,
        lsb: u32,
        expected: u64,
        actual: u32,
    },

    /// {text:?} is not a valid number.
    InvalidNumber {
        text: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// An I/O error occurred on the telnet connection.
    Io(#[from] std::io::Error),
}
