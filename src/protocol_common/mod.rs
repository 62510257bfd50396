//! Common Telnet protocol functionality for TN3270
//!
//! This module provides the Telnet layer that 3270 sessions are built on:
//!
//! - [`telnet_base`] - Telnet command/option codes, builders and IAC escaping
//! - [`scanner`] - Incremental splitting of the byte stream into records and commands
//! - [`traits`] - Transport and clock abstractions used by the session
//!
//! # Examples
//!
//! ```
//! use tn3270r::protocol_common::{TelnetEvent, TelnetScanner};
//!
//! let mut scanner = TelnetScanner::new();
//! scanner.feed(&[0x01, 0x02, 0xff, 0xef]);
//!
//! assert_eq!(scanner.next_event(), Some(TelnetEvent::Record(vec![0x01, 0x02])));
//! assert_eq!(scanner.next_event(), None);
//! ```

pub mod scanner;
pub mod telnet_base;
pub mod traits;

// Re-export commonly used items for convenience
pub use scanner::{TelnetEvent, TelnetScanner};
pub use telnet_base::{
    build_negotiation, build_subnegotiation, escape_iac, TelnetCommand, TelnetOption,
};
pub use traits::{Clock, Transport};
