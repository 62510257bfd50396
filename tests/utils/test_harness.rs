#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tn3270r::{Clock, SessionConfig, Telnet, Transport};

/// What the scripted host does on the next readiness wait
#[derive(Debug, Clone)]
pub enum Step {
    /// Socket becomes readable and the read returns these bytes
    Ready(Vec<u8>),
    /// The wait times out with nothing to read
    Idle,
    /// Socket reports readable but the read would block
    Spurious,
    /// Socket becomes readable and the read returns end of stream
    Closed,
}

/// Everything the session did to the transport
#[derive(Debug, Default)]
pub struct WireLog {
    pub sent: Vec<Vec<u8>>,
    pub waits: Vec<Option<Duration>>,
    pub shutdowns: usize,
}

/// A transport that replays a fixed script of host behaviour
///
/// Once the script is exhausted every wait times out.
pub struct ScriptedTransport {
    steps: VecDeque<Step>,
    pending: Option<Step>,
    log: Rc<RefCell<WireLog>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> (Self, Rc<RefCell<WireLog>>) {
        let log = Rc::new(RefCell::new(WireLog::default()));
        let transport = Self {
            steps: steps.into(),
            pending: None,
            log: Rc::clone(&log),
        };
        (transport, log)
    }
}

impl Transport for ScriptedTransport {
    fn wait_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        self.log.borrow_mut().waits.push(timeout);
        match self.steps.pop_front() {
            None | Some(Step::Idle) => Ok(false),
            Some(step) => {
                self.pending = Some(step);
                Ok(true)
            }
        }
    }

    fn receive(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        match self.pending.take() {
            Some(Step::Ready(data)) => {
                assert!(data.len() <= buffer.len(), "scripted chunk larger than read buffer");
                buffer[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            Some(Step::Closed) => Ok(0),
            _ => Err(io::Error::from(io::ErrorKind::WouldBlock)),
        }
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.log.borrow_mut().sent.push(data.to_vec());
        Ok(())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.log.borrow_mut().shutdowns += 1;
        Ok(())
    }
}

/// A clock that returns scripted offsets from a fixed base
///
/// Each call to `now` consumes one offset; the last one repeats forever.
pub struct MockClock {
    base: Instant,
    offsets: RefCell<VecDeque<Duration>>,
    last: Cell<Duration>,
}

impl MockClock {
    pub fn stopped() -> Self {
        Self::with_offsets(&[])
    }

    pub fn with_offsets(offsets: &[Duration]) -> Self {
        Self {
            base: Instant::now(),
            offsets: RefCell::new(offsets.iter().copied().collect()),
            last: Cell::new(Duration::ZERO),
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        if let Some(offset) = self.offsets.borrow_mut().pop_front() {
            self.last.set(offset);
        }
        self.base + self.last.get()
    }
}

pub type TestSession = Telnet<ScriptedTransport, MockClock>;

/// A session over a scripted host with a stopped clock
pub fn scripted_session(
    config: SessionConfig,
    steps: Vec<Step>,
) -> (TestSession, Rc<RefCell<WireLog>>) {
    scripted_session_with_clock(config, steps, MockClock::stopped())
}

pub fn scripted_session_with_clock(
    config: SessionConfig,
    steps: Vec<Step>,
    clock: MockClock,
) -> (TestSession, Rc<RefCell<WireLog>>) {
    let (transport, log) = ScriptedTransport::new(steps);
    (Telnet::from_transport(config, transport, clock), log)
}

pub fn ready(bytes: &[u8]) -> Step {
    Step::Ready(bytes.to_vec())
}

/// `IAC SB <option> <payload> IAC SE` without escaping
pub fn sb(option: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0xff, 0xfa, option];
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&[0xff, 0xf0]);
    bytes
}

/// Host side of a plain TN3270 negotiation
pub fn basic_host_steps() -> Vec<Step> {
    vec![
        ready(&[0xff, 0xfd, 0x18]),
        ready(&sb(0x18, &[0x01])),
        ready(&[0xff, 0xfd, 0x19]),
        ready(&[0xff, 0xfb, 0x19]),
        ready(&[0xff, 0xfd, 0x00]),
        ready(&[0xff, 0xfb, 0x00]),
    ]
}

/// Client replies expected for `basic_host_steps`
pub fn basic_client_replies(terminal_type: &str) -> Vec<Vec<u8>> {
    let mut is = vec![0x00];
    is.extend_from_slice(terminal_type.as_bytes());

    vec![
        vec![0xff, 0xfb, 0x18],
        sb(0x18, &is),
        vec![0xff, 0xfb, 0x19],
        vec![0xff, 0xfd, 0x19],
        vec![0xff, 0xfb, 0x00],
        vec![0xff, 0xfd, 0x00],
    ]
}

/// `DEVICE-TYPE IS <device_type> CONNECT <device_name>`
pub fn device_type_is(device_type: &str, device_name: &str) -> Vec<u8> {
    let mut payload = vec![0x02, 0x04];
    payload.extend_from_slice(device_type.as_bytes());
    payload.push(0x01);
    payload.extend_from_slice(device_name.as_bytes());
    sb(0x28, &payload)
}

/// Host side of a TN3270E negotiation ending in FUNCTIONS IS (none)
pub fn tn3270e_host_steps() -> Vec<Step> {
    vec![
        ready(&[0xff, 0xfd, 0x28]),
        ready(&sb(0x28, &[0x08, 0x02])),
        ready(&device_type_is("IBM-3278-2-E", "TCP00034")),
        ready(&sb(0x28, &[0x03, 0x04])),
    ]
}

/// A session that has completed TN3270E negotiation, followed by `steps`
pub fn negotiated_tn3270e(steps: Vec<Step>) -> (TestSession, Rc<RefCell<WireLog>>) {
    let mut script = tn3270e_host_steps();
    script.extend(steps);
    let (mut telnet, log) = scripted_session(SessionConfig::default(), script);
    telnet.negotiate().expect("TN3270E negotiation should succeed");
    (telnet, log)
}

/// A session that has completed basic TN3270 negotiation, followed by `steps`
pub fn negotiated_tn3270(steps: Vec<Step>) -> (TestSession, Rc<RefCell<WireLog>>) {
    let mut script = basic_host_steps();
    script.extend(steps);
    let config = SessionConfig::default().with_tn3270e(false);
    let (mut telnet, log) = scripted_session(config, script);
    telnet.negotiate().expect("TN3270 negotiation should succeed");
    (telnet, log)
}
