//! Seams between the TN3270 session logic and the outside world
//!
//! The session never touches a socket or the system clock directly. It goes
//! through these traits, which lets the same negotiation and record code run
//! over a real TCP connection or over a scripted byte stream in tests.

use std::io;
use std::time::{Duration, Instant};

/// A connected, full-duplex byte stream with readiness notification
///
/// Implementations must report readiness and perform reads separately: the
/// session waits for readability with a bounded timeout and only then issues
/// a single read.
pub trait Transport {
    /// Wait until the stream is readable
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time to wait, `None` waits indefinitely
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the stream is ready, `Ok(false)` if the timeout elapsed
    fn wait_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool>;

    /// Read whatever bytes are available into `buffer`
    ///
    /// A return of `Ok(0)` means the peer closed the connection. An error of
    /// kind `WouldBlock` means the readiness report was spurious.
    fn receive(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Send all of `data` as one unit
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Shut the connection down
    fn shutdown(&mut self) -> io::Result<()>;
}

/// Monotonic time source used to enforce cumulative deadlines
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn wait_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        (**self).wait_readable(timeout)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        (**self).receive(buffer)
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).send(data)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        (**self).shutdown()
    }
}
