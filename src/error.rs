//! Error handling for TN3270R
//!
//! This module provides the structured error types returned by session
//! operations. Callers are expected to match on the variants: a failed
//! negotiation, a peer that closed the connection and a transport failure
//! are distinct outcomes.

use std::fmt;
use std::io;
use std::error::Error as StdError;

/// Top-level error type for TN3270R operations
#[derive(Debug)]
pub enum TN3270Error {
    /// The host never completed the option sequence required for 3270 mode
    NegotiationFailed(NegotiationError),
    /// The host closed the connection
    ConnectionClosed,
    /// Underlying transport failure, propagated unmodified
    Io(io::Error),
    /// Record level protocol violation
    Protocol(ProtocolError),
    /// Invalid configuration
    Config(ConfigError),
}

/// Reasons a Telnet negotiation did not reach 3270 mode
#[derive(Debug)]
pub enum NegotiationError {
    /// Negotiation did not complete within the allowed time
    Timeout { timeout_ms: u64 },
    /// The host sent data before 3270 mode was agreed
    UnexpectedData { length: usize },
    /// The host rejected the requested TN3270E device type
    DeviceTypeRejected { reason: u8, description: &'static str },
    /// A subnegotiation payload could not be interpreted
    MalformedSubnegotiation { option: u8, data: Vec<u8> },
}

/// Record level protocol errors
#[derive(Debug)]
pub enum ProtocolError {
    /// A TN3270E record was too short to carry its header
    TruncatedHeader { length: usize },
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid configuration parameter
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file error
    FileError { path: String, error: String },
}

impl fmt::Display for TN3270Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TN3270Error::NegotiationFailed(err) => {
                write!(f, "Unable to negotiate TN3270 mode: {err}")
            }
            TN3270Error::ConnectionClosed => write!(f, "Connection closed by host"),
            TN3270Error::Io(err) => write!(f, "I/O error: {err}"),
            TN3270Error::Protocol(err) => write!(f, "Protocol error: {err}"),
            TN3270Error::Config(err) => write!(f, "Configuration error: {err}"),
        }
    }
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::Timeout { timeout_ms } =>
                write!(f, "negotiation did not complete within {timeout_ms}ms"),
            NegotiationError::UnexpectedData { length } =>
                write!(f, "host sent {length} data bytes before 3270 mode was agreed"),
            NegotiationError::DeviceTypeRejected { reason, description } =>
                write!(f, "device type rejected by host (reason 0x{reason:02X}: {description})"),
            NegotiationError::MalformedSubnegotiation { option, data } =>
                write!(f, "malformed subnegotiation for option {option}: {data:02X?}"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::TruncatedHeader { length } =>
                write!(f, "TN3270E record of {length} bytes is shorter than its header"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } =>
                write!(f, "Invalid configuration parameter '{parameter}' = '{value}': {reason}"),
            ConfigError::FileError { path, error } =>
                write!(f, "Configuration file error '{path}': {error}"),
        }
    }
}

impl StdError for TN3270Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TN3270Error::NegotiationFailed(err) => Some(err),
            TN3270Error::ConnectionClosed => None,
            TN3270Error::Io(err) => Some(err),
            TN3270Error::Protocol(err) => Some(err),
            TN3270Error::Config(err) => Some(err),
        }
    }
}

impl StdError for NegotiationError {}
impl StdError for ProtocolError {}
impl StdError for ConfigError {}

impl From<NegotiationError> for TN3270Error {
    fn from(err: NegotiationError) -> Self {
        TN3270Error::NegotiationFailed(err)
    }
}

impl From<ProtocolError> for TN3270Error {
    fn from(err: ProtocolError) -> Self {
        TN3270Error::Protocol(err)
    }
}

impl From<ConfigError> for TN3270Error {
    fn from(err: ConfigError) -> Self {
        TN3270Error::Config(err)
    }
}

impl From<io::Error> for TN3270Error {
    fn from(err: io::Error) -> Self {
        TN3270Error::Io(err)
    }
}

/// Result type alias for TN3270R operations
pub type TN3270Result<T> = Result<T, TN3270Error>;

/// Specialized result types for different components
pub type NegotiationResult<T> = Result<T, NegotiationError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiation_failure_message() {
        let err = TN3270Error::from(NegotiationError::Timeout { timeout_ms: 5000 });
        let message = err.to_string();
        assert!(message.starts_with("Unable to negotiate TN3270 mode"));
        assert!(message.contains("5000ms"));
    }

    #[test]
    fn test_io_error_is_kept_as_source() {
        let err = TN3270Error::from(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        match &err {
            TN3270Error::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.source().is_some());
    }

    #[test]
    fn test_connection_closed_display() {
        assert_eq!(TN3270Error::ConnectionClosed.to_string(), "Connection closed by host");
    }

    #[test]
    fn test_rejected_device_type_display() {
        let err =
            NegotiationError::DeviceTypeRejected { reason: 0x01, description: "device in use" };
        assert_eq!(err.to_string(), "device type rejected by host (reason 0x01: device in use)");
    }
}
