//! TN3270R - a TN3270/TN3270E client library
//!
//! Connects to an IBM mainframe over Telnet, negotiates 3270 mode (and
//! TN3270E when the host offers it) and exchanges 3270 records. The 3270
//! data stream itself is passed through as opaque bytes.
//!
//! ```no_run
//! use std::time::Duration;
//! use tn3270r::{SessionConfig, Telnet};
//!
//! # fn main() -> Result<(), tn3270r::TN3270Error> {
//! let mut telnet = Telnet::open("mainframe.example.com", 23, SessionConfig::default())?;
//! for record in telnet.read_multiple(None, Some(Duration::from_secs(5)))? {
//!     println!("{} bytes", record.len());
//! }
//! telnet.close()?;
//! # Ok(())
//! # }
//! ```

/// PROTOCOL COMMON: Telnet codes, the IAC scanner and the transport seams
pub mod protocol_common;

/// LIB3270: TN3270E codes and 3270 record framing
pub mod lib3270;

pub mod config;
pub mod error;
pub mod network;
pub mod session;
pub mod telnet_negotiation;

pub use config::SessionConfig;
pub use error::{NegotiationError, TN3270Error, TN3270Result};
pub use network::{SystemClock, TcpTransport};
pub use protocol_common::traits::{Clock, Transport};
pub use session::Telnet;
