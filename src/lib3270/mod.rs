//! IBM 3270 record layer (TN3270 / TN3270E)
//!
//! This module covers what a TN3270 client needs above raw Telnet: the
//! TN3270E subnegotiation codes and the framing of 3270 records, following
//! RFC 1576 (TN3270) and RFC 2355 (TN3270E).
//!
//! The 3270 data stream itself (commands, orders, fields) is treated as an
//! opaque byte sequence here.
//!
//! - [`codes`] - TN3270E subnegotiation codes, data types and functions
//! - [`record`] - TN3270E header and IAC EOR record framing
//!
//! # Example Usage
//!
//! ```rust
//! use tn3270r::lib3270::{frame_record, split_header};
//!
//! let wire = frame_record(&[0xf5, 0xc3], true);
//! assert_eq!(&wire[..5], &[0, 0, 0, 0, 0]);
//!
//! let (_, payload) = split_header(vec![0, 0, 0, 0, 0, 0xf5, 0xc3]).unwrap();
//! assert_eq!(payload, vec![0xf5, 0xc3]);
//! ```

pub mod codes;
pub mod record;

// Re-exports for easy access
pub use codes::{tn3270e_device_type, Tn3270eFunction};
pub use record::{frame_record, split_header, Tn3270eHeader};
