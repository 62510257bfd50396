//! Active TN3270 session
//!
//! This module defines the `Telnet` session that owns one host connection:
//! it drives option negotiation until 3270 mode is reached, then reads and
//! writes 3270 records over the same byte stream.

use std::collections::VecDeque;
use std::time::Duration;

use crate::config::SessionConfig;
use crate::error::{NegotiationError, TN3270Error, TN3270Result};
use crate::lib3270::record::{frame_record, split_header};
use crate::network::{fill, Deadline, Fill, SystemClock, TcpTransport};
use crate::protocol_common::scanner::{TelnetEvent, TelnetScanner};
use crate::protocol_common::traits::{Clock, Transport};
use crate::telnet_negotiation::TelnetNegotiator;

/// A TN3270 session over a connected transport
///
/// The transport is shut down when the session is closed or dropped, on
/// every path including a failed negotiation.
pub struct Telnet<T: Transport, C: Clock = SystemClock> {
    config: SessionConfig,
    transport: T,
    clock: C,
    scanner: TelnetScanner,
    negotiator: TelnetNegotiator,
    /// Complete records not yet handed to the caller
    records: VecDeque<Vec<u8>>,
    buffer: Vec<u8>,
    eof: bool,
    closed: bool,
}

impl Telnet<TcpTransport> {
    /// Connect to `host:port` and negotiate 3270 mode
    pub fn open(host: &str, port: u16, config: SessionConfig) -> TN3270Result<Self> {
        config.validate()?;

        log::info!("Connecting to {host}:{port} as {}", config.terminal_type);
        let transport = TcpTransport::connect(host, port, config.connect_timeout())?;

        let mut telnet = Self::from_transport(config, transport, SystemClock);
        telnet.negotiate()?;
        Ok(telnet)
    }
}

impl<T: Transport, C: Clock> Telnet<T, C> {
    /// Wrap an already connected transport; nothing is exchanged yet
    pub fn from_transport(config: SessionConfig, transport: T, clock: C) -> Self {
        let negotiator = TelnetNegotiator::new(&config);
        let buffer = vec![0; config.read_buffer_size.max(1)];

        Self {
            config,
            transport,
            clock,
            scanner: TelnetScanner::new(),
            negotiator,
            records: VecDeque::new(),
            buffer,
            eof: false,
            closed: false,
        }
    }

    /// Answer the host's option requests until 3270 mode is reached
    ///
    /// Fails when the negotiation timeout elapses, when the host sends data
    /// before agreeing to 3270 mode, or when a subnegotiation is rejected or
    /// malformed. Input that follows the final negotiation event is kept for
    /// [`read_multiple`](Self::read_multiple).
    pub fn negotiate(&mut self) -> TN3270Result<()> {
        let timeout = self.config.negotiation_timeout();
        let deadline = Deadline::new(self.clock.now(), Some(timeout));

        loop {
            while !self.negotiator.is_tn3270_negotiated() {
                let Some(event) = self.scanner.next_event() else {
                    break;
                };

                if let TelnetEvent::Record(data) = &event {
                    return Err(NegotiationError::UnexpectedData { length: data.len() }.into());
                }
                if self.scanner.has_partial_record() {
                    return Err(self.unexpected_data());
                }
                self.dispatch(&event)?;
            }

            if self.negotiator.is_tn3270_negotiated() {
                log::info!(
                    "TN3270 mode negotiated (TN3270E: {}, device type: {}, device name: {})",
                    self.negotiator.is_tn3270e_negotiated(),
                    self.negotiator.device_type().unwrap_or("-"),
                    self.negotiator.device_name().unwrap_or("-"),
                );
                return Ok(());
            }

            if self.scanner.has_partial_record() {
                return Err(self.unexpected_data());
            }

            match fill(&mut self.transport, &self.clock, &deadline, &mut self.buffer) {
                Ok(Fill::Data(n)) => self.scanner.feed(&self.buffer[..n]),
                Ok(Fill::TimedOut) => {
                    log::warn!("Negotiation timed out after {}ms", timeout.as_millis());
                    return Err(NegotiationError::Timeout {
                        timeout_ms: self.config.negotiation_timeout_ms,
                    }
                    .into());
                }
                Err(e) => return Err(self.note_failure(e)),
            }
        }
    }

    /// Receive complete 3270 records
    ///
    /// Waits until at least one record is complete, then returns every
    /// record already complete, at most `limit`. A timeout returns whatever
    /// was collected, possibly nothing; `None` waits indefinitely. When the
    /// host closes the connection the call fails with
    /// [`TN3270Error::ConnectionClosed`] and partial data is discarded.
    pub fn read_multiple(
        &mut self,
        limit: Option<usize>,
        timeout: Option<Duration>,
    ) -> TN3270Result<Vec<Vec<u8>>> {
        if self.eof {
            return Err(TN3270Error::ConnectionClosed);
        }

        let deadline = Deadline::new(self.clock.now(), timeout);

        loop {
            self.collect_records()?;
            if !self.records.is_empty() || limit == Some(0) {
                break;
            }

            match fill(&mut self.transport, &self.clock, &deadline, &mut self.buffer) {
                Ok(Fill::Data(n)) => self.scanner.feed(&self.buffer[..n]),
                Ok(Fill::TimedOut) => break,
                Err(e) => return Err(self.note_failure(e)),
            }
        }

        let count = limit.map_or(self.records.len(), |limit| limit.min(self.records.len()));
        Ok(self.records.drain(..count).collect())
    }

    /// Send one 3270 record
    pub fn write(&mut self, record: &[u8]) -> TN3270Result<()> {
        let framed = frame_record(record, self.negotiator.is_tn3270e_negotiated());
        log::trace!("Sending record: {framed:02x?}");
        self.transport.send(&framed)?;
        Ok(())
    }

    /// Shut the connection down
    pub fn close(mut self) -> TN3270Result<()> {
        self.closed = true;
        self.transport.shutdown()?;
        Ok(())
    }

    pub fn is_tn3270_negotiated(&self) -> bool {
        self.negotiator.is_tn3270_negotiated()
    }

    pub fn is_tn3270e_negotiated(&self) -> bool {
        self.negotiator.is_tn3270e_negotiated()
    }

    pub fn device_type(&self) -> Option<&str> {
        self.negotiator.device_type()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.negotiator.device_name()
    }

    /// True once the host has closed the connection
    pub fn eof(&self) -> bool {
        self.eof
    }

    pub fn negotiator(&self) -> &TelnetNegotiator {
        &self.negotiator
    }

    /// Move every complete record out of the scanner
    fn collect_records(&mut self) -> TN3270Result<()> {
        while let Some(event) = self.scanner.next_event() {
            match event {
                TelnetEvent::Record(data) => {
                    let record = if self.negotiator.is_tn3270e_negotiated() {
                        let (header, payload) = split_header(data)?;
                        log::trace!("TN3270E header {header:?}");
                        payload
                    } else {
                        data
                    };
                    self.records.push_back(record);
                }
                // Hosts may renegotiate mid-session
                other => self.dispatch(&other)?,
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &TelnetEvent) -> TN3270Result<()> {
        for reply in self.negotiator.handle_event(event)? {
            self.transport.send(&reply)?;
        }
        Ok(())
    }

    fn unexpected_data(&self) -> TN3270Error {
        let length = self.scanner.partial_record_len();
        log::warn!("Host sent {length} data bytes before TN3270 mode was negotiated");
        NegotiationError::UnexpectedData { length }.into()
    }

    fn note_failure(&mut self, error: TN3270Error) -> TN3270Error {
        if matches!(error, TN3270Error::ConnectionClosed) {
            log::info!("Connection closed by host");
            self.eof = true;
            self.scanner.reset();
            self.records.clear();
        }
        error
    }
}

impl<T: Transport, C: Clock> Drop for Telnet<T, C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.transport.shutdown() {
            log::debug!("Error shutting down transport: {e}");
        }
    }
}
