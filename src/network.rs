//! Network module for TN3270 host connections
//!
//! This module provides the TCP transport used by a session together with
//! the deadline bookkeeping shared by negotiation and record reads. The
//! socket is non-blocking and driven through a `mio::Poll`, so every wait is
//! bounded by the time left on the caller's deadline.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, ToSocketAddrs};
use std::time::{Duration, Instant};

use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token};

use crate::error::{TN3270Error, TN3270Result};
use crate::protocol_common::traits::{Clock, Transport};

const SOCKET: Token = Token(0);

/// Wall clock used outside of tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A TCP connection to a TN3270 host
pub struct TcpTransport {
    stream: TcpStream,
    poll: Poll,
    events: Events,
    /// Readiness seen but not yet drained (mio readiness is edge triggered)
    readable: bool,
    writable: bool,
}

impl TcpTransport {
    /// Connect to `host:port`, trying each resolved address in turn
    pub fn connect(host: &str, port: u16, timeout: Duration) -> io::Result<Self> {
        let address = format!("{host}:{port}");
        let mut last_error = None;

        for addr in address.to_socket_addrs()? {
            match std::net::TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    log::info!("Connected to {addr}");
                    return Self::from_std(stream);
                }
                Err(e) => {
                    log::debug!("Connection to {addr} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            io::Error::new(ErrorKind::AddrNotAvailable, "No socket addresses resolved")
        }))
    }

    /// Take over an already connected standard library stream
    pub fn from_std(stream: std::net::TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;

        let mut stream = TcpStream::from_std(stream);
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut stream, SOCKET, Interest::READABLE | Interest::WRITABLE)?;

        Ok(Self {
            stream,
            poll,
            events: Events::with_capacity(8),
            readable: false,
            writable: false,
        })
    }

    /// Poll once and record any readiness reported for the socket
    fn poll_events(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e),
        }

        for event in self.events.iter() {
            if event.token() != SOCKET {
                continue;
            }
            // Closed and errored sockets are readable: the next read reports it
            if event.is_readable() || event.is_read_closed() || event.is_error() {
                self.readable = true;
            }
            if event.is_writable() || event.is_write_closed() {
                self.writable = true;
            }
        }
        Ok(())
    }

    fn wait_writable(&mut self) -> io::Result<()> {
        while !self.writable {
            self.poll_events(None)?;
        }
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn wait_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            if self.readable {
                return Ok(true);
            }

            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            self.poll_events(remaining)?;

            if self.readable {
                return Ok(true);
            }
            if matches!(deadline, Some(d) if Instant::now() >= d) {
                return Ok(false);
            }
        }
    }

    fn receive(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        match self.stream.read(buffer) {
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                self.readable = false;
                Err(e)
            }
            result => result,
        }
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let mut written = 0;

        while written < data.len() {
            match self.stream.write(&data[written..]) {
                Ok(0) => {
                    let message = "Connection refused further data";
                    return Err(io::Error::new(ErrorKind::WriteZero, message));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    self.writable = false;
                    self.wait_writable()?;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        self.stream.flush()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        // Best effort: deregistering a socket the peer already closed may fail
        let _ = self.poll.registry().deregister(&mut self.stream);

        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            result => result,
        }
    }
}

/// A cumulative time budget measured from a fixed start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// `None` means no limit
    pub fn new(start: Instant, budget: Option<Duration>) -> Self {
        Self { start, budget }
    }

    /// Time left at `now`, `None` when unbounded
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.budget
            .map(|budget| budget.saturating_sub(now.saturating_duration_since(self.start)))
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.remaining(now) == Some(Duration::ZERO)
    }
}

/// Outcome of waiting for input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// This many bytes were read into the buffer
    Data(usize),
    /// The deadline passed with nothing to read
    TimedOut,
}

/// Wait for input within `deadline` and read one chunk into `buffer`
///
/// Spurious wakeups are retried with whatever time is left. A zero length
/// read means the host closed the connection.
pub fn fill<T, C>(
    transport: &mut T,
    clock: &C,
    deadline: &Deadline,
    buffer: &mut [u8],
) -> TN3270Result<Fill>
where
    T: Transport + ?Sized,
    C: Clock + ?Sized,
{
    loop {
        let remaining = deadline.remaining(clock.now());

        if !transport.wait_readable(remaining)? {
            return Ok(Fill::TimedOut);
        }

        match transport.receive(buffer) {
            Ok(0) => return Err(TN3270Error::ConnectionClosed),
            Ok(n) => {
                log::trace!("Received {n} bytes: {:02x?}", &buffer[..n]);
                return Ok(Fill::Data(n));
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                log::trace!("Spurious wakeup, waiting again");
            }
            Err(e) => return Err(TN3270Error::Io(e)),
        }
    }
}
