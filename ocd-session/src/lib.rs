//! # Driving OpenOCD from tests
//!
//! This crate controls a microcontroller through an [OpenOCD](https://openocd.org) server. It can
//! launch the server itself, talks to it over the telnet command port and offers the handful of
//! operations hardware-in-the-loop tests need: halting and resetting the core, reading and
//! writing memory mapped registers, checking bit fields and setting breakpoints.
//!
//! ## Checking a pin configuration
//!
//! ```no_run
//! use ocd_session::{BitField, ConnectionConfig, ServerConfig, Session};
//!
//! # fn main() -> Result<(), ocd_session::OcdError> {
//! let mut session = Session::new();
//! session.start_server(&ServerConfig::default())?;
//! session.open(&ConnectionConfig::default())?;
//!
//! session.reset_and_halt()?;
//! session.register_bits_should_equal("0x40310388".parse()?, BitField::new(0, 3), 2)?;
//!
//! session.close();
//! session.stop_server()?;
//! # Ok(())
//! # }
//! ```
//!
//! Transport timeouts are not errors. A command that does not see the prompt in time yields
//! whatever text arrived, and failures surface where that text is interpreted, e.g. as an
//! [`OcdError::UnexpectedResponse`] from [`Session::read_register`].

mod connection;
mod error;
mod register;
mod server;
mod session;

pub use crate::connection::{clean_response, ConnectionConfig, TelnetConnection, PROMPT};
pub use crate::error::OcdError;
pub use crate::register::{parse_u32, parse_u64, BitField, RegisterAddress};
pub use crate::server::{OcdServer, ServerConfig, STOP_TIMEOUT};
pub use crate::session::{Session, DEFAULT_COMMAND_TIMEOUT, RESET_TIMEOUT};
