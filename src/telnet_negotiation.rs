//! Telnet Option Negotiation for TN3270 and TN3270E
//!
//! This module decides how to answer every option request the host sends
//! while a session moves into 3270 mode (RFC 1576) and, when enabled, into
//! TN3270E mode (RFC 2355). It is purely reactive: each incoming event is
//! mapped to the commands that must be sent back, in order, and the option
//! state is updated. No I/O happens here.

use std::collections::HashMap;

use crate::config::SessionConfig;
use crate::error::{NegotiationError, NegotiationResult};
use crate::lib3270::codes::{
    reason_description, tn3270e_device_type, REASON_UNKNOWN_ERROR, TN3270E_CONNECT,
    TN3270E_DEVICE_TYPE, TN3270E_FUNCTIONS, TN3270E_IS, TN3270E_REASON, TN3270E_REJECT,
    TN3270E_REQUEST, TN3270E_SEND,
};
use crate::protocol_common::scanner::TelnetEvent;
use crate::protocol_common::telnet_base::{
    build_negotiation, build_subnegotiation, TelnetCommand, TelnetOption, TERMINAL_TYPE_IS,
    TERMINAL_TYPE_SEND,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegotiationState {
    /// Nothing has been exchanged for this direction
    #[default]
    NotRequested,
    /// An offer was sent, no answer yet
    Requested,
    /// Both sides agree the option is on
    Agreed,
    /// One side declined the option
    Refused,
}

/// Negotiation state of one option in both directions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionState {
    /// Whether we perform the option (our WILL, answered by DO/DONT)
    pub local: NegotiationState,
    /// Whether the host performs the option (their WILL, answered by DO/DONT)
    pub remote: NegotiationState,
}

impl OptionState {
    /// Check if the option is agreed in both directions
    pub fn is_enabled(&self) -> bool {
        self.local == NegotiationState::Agreed && self.remote == NegotiationState::Agreed
    }
}

/// Progress through the TN3270E subnegotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tn3270ePhase {
    /// TN3270E has not been accepted
    Inactive,
    /// TN3270E accepted, waiting for SEND DEVICE-TYPE
    Accepted,
    /// DEVICE-TYPE REQUEST sent, waiting for IS or REJECT
    DeviceTypeRequested,
    /// FUNCTIONS REQUEST sent, waiting for IS or a counter REQUEST
    FunctionsRequested,
    /// DEVICE-TYPE and FUNCTIONS both complete
    Negotiated,
}

#[derive(Debug)]
pub struct TelnetNegotiator {
    /// Terminal type announced in TERMINAL-TYPE IS
    terminal_type: String,

    /// Whether TN3270E may be accepted
    tn3270e_enabled: bool,

    /// LU requested with CONNECT in DEVICE-TYPE REQUEST
    lu_name: Option<String>,

    /// Function codes sent in our FUNCTIONS REQUEST
    requested_functions: Vec<u8>,

    /// Current state of each tracked option
    options: HashMap<TelnetOption, OptionState>,

    /// TERMINAL-TYPE IS has been sent
    terminal_type_sent: bool,

    tn3270e_phase: Tn3270ePhase,

    /// Device type confirmed by the host
    device_type: Option<String>,

    /// Device (LU) name assigned by the host
    device_name: Option<String>,

    /// Functions in effect once TN3270E is negotiated
    functions: Vec<u8>,
}

impl TelnetNegotiator {
    pub fn new(config: &SessionConfig) -> Self {
        let options = TelnetOption::ALL
            .iter()
            .map(|&option| (option, OptionState::default()))
            .collect();

        Self {
            terminal_type: config.terminal_type.clone(),
            tn3270e_enabled: config.tn3270e_enabled,
            lu_name: config.lu_name.clone(),
            requested_functions: config.functions.iter().map(|&f| f as u8).collect(),
            options,
            terminal_type_sent: false,
            tn3270e_phase: Tn3270ePhase::Inactive,
            device_type: None,
            device_name: None,
            functions: Vec::new(),
        }
    }

    /// Process one event from the host and return the replies to send
    ///
    /// Each returned buffer is a complete Telnet sequence and must be sent on
    /// its own, in order, before the next event is processed.
    pub fn handle_event(&mut self, event: &TelnetEvent) -> NegotiationResult<Vec<Vec<u8>>> {
        match event {
            TelnetEvent::Negotiation { command, option } => {
                Ok(self.handle_negotiation(*command, *option))
            }
            TelnetEvent::Subnegotiation { option, payload } => {
                self.handle_subnegotiation(*option, payload)
            }
            TelnetEvent::MalformedSubnegotiation { option, data } => {
                Err(NegotiationError::MalformedSubnegotiation {
                    option: *option,
                    data: data.clone(),
                })
            }
            TelnetEvent::Command(command) => {
                log::debug!("Ignoring telnet command {command:?}");
                Ok(Vec::new())
            }
            TelnetEvent::Record(_) => Ok(Vec::new()),
        }
    }

    /// 3270 mode is reached: BINARY, EOR and TERMINAL-TYPE agreed, or TN3270E negotiated
    pub fn is_tn3270_negotiated(&self) -> bool {
        if self.is_tn3270e_negotiated() {
            return true;
        }

        let binary = self.option_state(TelnetOption::Binary);
        let eor = self.option_state(TelnetOption::EndOfRecord);
        let terminal_type = self.option_state(TelnetOption::TerminalType);

        binary.is_enabled()
            && eor.is_enabled()
            && terminal_type.local == NegotiationState::Agreed
            && self.terminal_type_sent
    }

    pub fn is_tn3270e_negotiated(&self) -> bool {
        self.tn3270e_phase == Tn3270ePhase::Negotiated
    }

    pub fn option_state(&self, option: TelnetOption) -> OptionState {
        self.options.get(&option).copied().unwrap_or_default()
    }

    pub fn tn3270e_phase(&self) -> Tn3270ePhase {
        self.tn3270e_phase
    }

    pub fn device_type(&self) -> Option<&str> {
        self.device_type.as_deref()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    /// TN3270E function codes agreed with the host
    pub fn functions(&self) -> &[u8] {
        &self.functions
    }

    fn state_mut(&mut self, option: TelnetOption) -> &mut OptionState {
        self.options.entry(option).or_default()
    }

    fn handle_negotiation(&mut self, command: TelnetCommand, code: u8) -> Vec<Vec<u8>> {
        log::debug!("Received {command:?} {code}");

        let Some(option) = TelnetOption::from_u8(code) else {
            // Courtesy refusal so the host does not wait on us
            return match command {
                TelnetCommand::DO => vec![self.send(TelnetCommand::WONT, code)],
                TelnetCommand::WILL => vec![self.send(TelnetCommand::DONT, code)],
                _ => Vec::new(),
            };
        };

        match command {
            TelnetCommand::DO => self.handle_do_command(option),
            TelnetCommand::DONT => self.handle_dont_command(option),
            TelnetCommand::WILL => self.handle_will_command(option),
            TelnetCommand::WONT => self.handle_wont_command(option),
            _ => Vec::new(),
        }
    }

    /// Options we are willing to perform ourselves
    fn supports_local(&self, option: TelnetOption) -> bool {
        match option {
            TelnetOption::Binary | TelnetOption::EndOfRecord | TelnetOption::TerminalType => true,
            TelnetOption::TN3270E => self.tn3270e_enabled,
        }
    }

    /// Options we are willing to let the host perform
    fn supports_remote(&self, option: TelnetOption) -> bool {
        match option {
            TelnetOption::Binary | TelnetOption::EndOfRecord => true,
            TelnetOption::TerminalType => false,
            TelnetOption::TN3270E => self.tn3270e_enabled,
        }
    }

    /// Handle incoming DO command
    fn handle_do_command(&mut self, option: TelnetOption) -> Vec<Vec<u8>> {
        if self.option_state(option).local == NegotiationState::Agreed {
            // Already in effect, acknowledging again would loop
            return Vec::new();
        }

        if self.supports_local(option) {
            self.state_mut(option).local = NegotiationState::Agreed;
            if option == TelnetOption::TN3270E {
                self.enter_tn3270e();
            }
            vec![self.send(TelnetCommand::WILL, option as u8)]
        } else {
            self.state_mut(option).local = NegotiationState::Refused;
            vec![self.send(TelnetCommand::WONT, option as u8)]
        }
    }

    /// Handle incoming DONT command
    fn handle_dont_command(&mut self, option: TelnetOption) -> Vec<Vec<u8>> {
        let previous = self.option_state(option).local;
        self.state_mut(option).local = NegotiationState::Refused;

        if option == TelnetOption::TN3270E {
            self.leave_tn3270e();
        }

        if previous == NegotiationState::Agreed {
            vec![self.send(TelnetCommand::WONT, option as u8)]
        } else {
            Vec::new()
        }
    }

    /// Handle incoming WILL command
    fn handle_will_command(&mut self, option: TelnetOption) -> Vec<Vec<u8>> {
        if self.option_state(option).remote == NegotiationState::Agreed {
            return Vec::new();
        }

        if self.supports_remote(option) {
            self.state_mut(option).remote = NegotiationState::Agreed;
            if option == TelnetOption::TN3270E {
                self.enter_tn3270e();
            }
            vec![self.send(TelnetCommand::DO, option as u8)]
        } else {
            self.state_mut(option).remote = NegotiationState::Refused;
            vec![self.send(TelnetCommand::DONT, option as u8)]
        }
    }

    /// Handle incoming WONT command
    fn handle_wont_command(&mut self, option: TelnetOption) -> Vec<Vec<u8>> {
        let previous = self.option_state(option).remote;
        self.state_mut(option).remote = NegotiationState::Refused;

        if option == TelnetOption::TN3270E
            && self.option_state(option).local != NegotiationState::Agreed
        {
            self.leave_tn3270e();
        }

        if previous == NegotiationState::Agreed {
            vec![self.send(TelnetCommand::DONT, option as u8)]
        } else {
            Vec::new()
        }
    }

    fn enter_tn3270e(&mut self) {
        if self.tn3270e_phase == Tn3270ePhase::Inactive {
            log::info!("TN3270E accepted, waiting for device type negotiation");
            self.tn3270e_phase = Tn3270ePhase::Accepted;
        }
    }

    fn leave_tn3270e(&mut self) {
        if self.tn3270e_phase != Tn3270ePhase::Inactive {
            log::info!("Host withdrew TN3270E, continuing with basic TN3270");
        }
        self.tn3270e_phase = Tn3270ePhase::Inactive;
        self.device_type = None;
        self.device_name = None;
        self.functions.clear();
    }

    /// Handle subnegotiation (terminal type or TN3270E)
    fn handle_subnegotiation(
        &mut self,
        code: u8,
        payload: &[u8],
    ) -> NegotiationResult<Vec<Vec<u8>>> {
        log::debug!("Received subnegotiation for option {code}: {payload:02x?}");

        match TelnetOption::from_u8(code) {
            Some(TelnetOption::TerminalType) => self.handle_terminal_type(payload),
            Some(TelnetOption::TN3270E) => self.handle_tn3270e(payload),
            _ => {
                log::warn!("Ignoring subnegotiation for unsupported option {code}");
                Ok(Vec::new())
            }
        }
    }

    fn handle_terminal_type(&mut self, payload: &[u8]) -> NegotiationResult<Vec<Vec<u8>>> {
        if payload != [TERMINAL_TYPE_SEND] {
            return Err(malformed(TelnetOption::TerminalType, payload));
        }

        let mut data = Vec::with_capacity(self.terminal_type.len() + 1);
        data.push(TERMINAL_TYPE_IS);
        data.extend_from_slice(self.terminal_type.as_bytes());

        self.terminal_type_sent = true;
        log::debug!("Sending terminal type {}", self.terminal_type);
        Ok(vec![build_subnegotiation(TelnetOption::TerminalType as u8, &data)])
    }

    fn handle_tn3270e(&mut self, payload: &[u8]) -> NegotiationResult<Vec<Vec<u8>>> {
        if self.tn3270e_phase == Tn3270ePhase::Inactive {
            log::warn!("Ignoring TN3270E subnegotiation while TN3270E is not accepted");
            return Ok(Vec::new());
        }

        match payload {
            [TN3270E_SEND, TN3270E_DEVICE_TYPE, ..] => {
                self.tn3270e_phase = Tn3270ePhase::DeviceTypeRequested;
                Ok(vec![self.device_type_request()])
            }
            [TN3270E_DEVICE_TYPE, TN3270E_IS, rest @ ..] => {
                let (device_type, device_name) = parse_device_type_is(rest)
                    .ok_or_else(|| malformed(TelnetOption::TN3270E, payload))?;

                log::info!(
                    "Host confirmed device type {device_type} (device name {})",
                    device_name.as_deref().unwrap_or("<none>")
                );
                self.device_type = Some(device_type);
                self.device_name = device_name;

                self.tn3270e_phase = Tn3270ePhase::FunctionsRequested;
                Ok(vec![self.functions_message(TN3270E_REQUEST, &self.requested_functions)])
            }
            [TN3270E_DEVICE_TYPE, TN3270E_REJECT, rest @ ..] => {
                let reason = match rest {
                    [TN3270E_REASON, code, ..] => *code,
                    _ => REASON_UNKNOWN_ERROR,
                };
                Err(NegotiationError::DeviceTypeRejected {
                    reason,
                    description: reason_description(reason),
                })
            }
            [TN3270E_FUNCTIONS, verb @ (TN3270E_REQUEST | TN3270E_IS), functions @ ..]
                if self.device_type.is_some() =>
            {
                let replies = if *verb == TN3270E_REQUEST {
                    // Accept whatever the host asks for
                    vec![self.functions_message(TN3270E_IS, functions)]
                } else {
                    Vec::new()
                };

                self.functions = functions.to_vec();
                self.tn3270e_phase = Tn3270ePhase::Negotiated;
                log::info!("TN3270E negotiated with functions {:02x?}", self.functions);
                Ok(replies)
            }
            _ => Err(malformed(TelnetOption::TN3270E, payload)),
        }
    }

    fn device_type_request(&self) -> Vec<u8> {
        let device_type = tn3270e_device_type(&self.terminal_type);
        log::debug!("Requesting TN3270E device type {device_type}");

        let mut data = vec![TN3270E_DEVICE_TYPE, TN3270E_REQUEST];
        data.extend_from_slice(device_type.as_bytes());
        if let Some(lu_name) = &self.lu_name {
            data.push(TN3270E_CONNECT);
            data.extend_from_slice(lu_name.as_bytes());
        }
        build_subnegotiation(TelnetOption::TN3270E as u8, &data)
    }

    fn functions_message(&self, verb: u8, functions: &[u8]) -> Vec<u8> {
        let mut data = vec![TN3270E_FUNCTIONS, verb];
        data.extend_from_slice(functions);
        build_subnegotiation(TelnetOption::TN3270E as u8, &data)
    }

    fn send(&self, command: TelnetCommand, option: u8) -> Vec<u8> {
        log::debug!("Sending {command:?} {option}");
        build_negotiation(command, option)
    }
}

/// Split `<device-type> [CONNECT <device-name>]`
fn parse_device_type_is(data: &[u8]) -> Option<(String, Option<String>)> {
    let (type_bytes, name_bytes) = match data.iter().position(|&b| b == TN3270E_CONNECT) {
        Some(index) => (&data[..index], Some(&data[index + 1..])),
        None => (data, None),
    };

    if type_bytes.is_empty() || !type_bytes.is_ascii() {
        return None;
    }
    let device_type = String::from_utf8(type_bytes.to_vec()).ok()?;

    let device_name = match name_bytes {
        Some(bytes) if !bytes.is_empty() && bytes.is_ascii() => {
            Some(String::from_utf8(bytes.to_vec()).ok()?)
        }
        Some(_) => return None,
        None => None,
    };

    Some((device_type, device_name))
}

fn malformed(option: TelnetOption, payload: &[u8]) -> NegotiationError {
    NegotiationError::MalformedSubnegotiation {
        option: option as u8,
        data: payload.to_vec(),
    }
}
