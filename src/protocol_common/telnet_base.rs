//! Common Telnet protocol functionality for TN3270 sessions
//!
//! This module provides the Telnet command and option codes used to reach
//! 3270 mode, plus the builders for negotiation and subnegotiation sequences
//! and the IAC escaping applied to binary payloads.

/// Telnet command codes (RFC 854, RFC 885)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelnetCommand {
    /// Interpret As Command - 255 (0xFF)
    IAC = 255,
    /// Don't - 254 (0xFE)
    DONT = 254,
    /// Do - 253 (0xFD)
    DO = 253,
    /// Won't - 252 (0xFC)
    WONT = 252,
    /// Will - 251 (0xFB)
    WILL = 251,
    /// Subnegotiation Begin - 250 (0xFA)
    SB = 250,
    /// Go Ahead - 249 (0xF9)
    GA = 249,
    /// Erase Line - 248 (0xF8)
    EL = 248,
    /// Erase Character - 247 (0xF7)
    EC = 247,
    /// Are You There - 246 (0xF6)
    AYT = 246,
    /// Abort Output - 245 (0xF5)
    AO = 245,
    /// Interrupt Process - 244 (0xF4)
    IP = 244,
    /// Break - 243 (0xF3)
    BRK = 243,
    /// Data Mark - 242 (0xF2)
    DM = 242,
    /// No Operation - 241 (0xF1)
    NOP = 241,
    /// Subnegotiation End - 240 (0xF0)
    SE = 240,
    /// End Of Record - 239 (0xEF), the 3270 record terminator
    EOR = 239,
}

impl TelnetCommand {
    /// Convert a byte to a TelnetCommand
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            255 => Some(TelnetCommand::IAC),
            254 => Some(TelnetCommand::DONT),
            253 => Some(TelnetCommand::DO),
            252 => Some(TelnetCommand::WONT),
            251 => Some(TelnetCommand::WILL),
            250 => Some(TelnetCommand::SB),
            249 => Some(TelnetCommand::GA),
            248 => Some(TelnetCommand::EL),
            247 => Some(TelnetCommand::EC),
            246 => Some(TelnetCommand::AYT),
            245 => Some(TelnetCommand::AO),
            244 => Some(TelnetCommand::IP),
            243 => Some(TelnetCommand::BRK),
            242 => Some(TelnetCommand::DM),
            241 => Some(TelnetCommand::NOP),
            240 => Some(TelnetCommand::SE),
            239 => Some(TelnetCommand::EOR),
            _ => None,
        }
    }

    /// Check if this command is one of the option negotiation verbs
    pub fn is_negotiation(self) -> bool {
        matches!(
            self,
            TelnetCommand::WILL | TelnetCommand::WONT | TelnetCommand::DO | TelnetCommand::DONT
        )
    }
}

/// Telnet options that make up 3270 mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelnetOption {
    /// Binary Transmission - 0 (RFC 856)
    Binary = 0,
    /// Terminal Type - 24 (RFC 1091)
    TerminalType = 24,
    /// End of Record - 25 (RFC 885)
    EndOfRecord = 25,
    /// TN3270 Enhancements - 40 (RFC 2355)
    TN3270E = 40,
}

impl TelnetOption {
    /// All options tracked by the negotiator
    pub const ALL: [TelnetOption; 4] = [
        TelnetOption::Binary,
        TelnetOption::TerminalType,
        TelnetOption::EndOfRecord,
        TelnetOption::TN3270E,
    ];

    /// Convert a byte to a TelnetOption
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TelnetOption::Binary),
            24 => Some(TelnetOption::TerminalType),
            25 => Some(TelnetOption::EndOfRecord),
            40 => Some(TelnetOption::TN3270E),
            _ => None,
        }
    }

    /// Get the option name as a string
    pub fn name(&self) -> &str {
        match self {
            TelnetOption::Binary => "Binary",
            TelnetOption::TerminalType => "Terminal Type",
            TelnetOption::EndOfRecord => "End of Record",
            TelnetOption::TN3270E => "TN3270E",
        }
    }
}

/// TERMINAL-TYPE subnegotiation: IS (RFC 1091)
pub const TERMINAL_TYPE_IS: u8 = 0x00;
/// TERMINAL-TYPE subnegotiation: SEND (RFC 1091)
pub const TERMINAL_TYPE_SEND: u8 = 0x01;

/// Build a telnet negotiation sequence
///
/// # Arguments
///
/// * `command` - The telnet command (WILL, WONT, DO, DONT)
/// * `option` - The option code
///
/// # Examples
///
/// ```
/// use tn3270r::protocol_common::telnet_base::{build_negotiation, TelnetCommand};
///
/// // Build "IAC WILL BINARY"
/// let seq = build_negotiation(TelnetCommand::WILL, 0);
/// assert_eq!(seq, vec![255, 251, 0]);
/// ```
pub fn build_negotiation(command: TelnetCommand, option: u8) -> Vec<u8> {
    vec![TelnetCommand::IAC as u8, command as u8, option]
}

/// Build a telnet subnegotiation sequence
///
/// Any IAC byte inside `data` is doubled.
///
/// # Examples
///
/// ```
/// use tn3270r::protocol_common::telnet_base::build_subnegotiation;
///
/// // Build "IAC SB TERMINAL-TYPE IS IBM-3278-2 IAC SE"
/// let seq = build_subnegotiation(24, b"\x00IBM-3278-2");
/// assert_eq!(&seq[..3], &[255, 250, 24]);
/// assert_eq!(&seq[seq.len() - 2..], &[255, 240]);
/// ```
pub fn build_subnegotiation(option: u8, data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() + 5);
    result.extend_from_slice(&[TelnetCommand::IAC as u8, TelnetCommand::SB as u8, option]);
    escape_iac_into(data, &mut result);
    result.push(TelnetCommand::IAC as u8);
    result.push(TelnetCommand::SE as u8);
    result
}

/// Append `data` to `out`, doubling every IAC byte
pub fn escape_iac_into(data: &[u8], out: &mut Vec<u8>) {
    for &byte in data {
        out.push(byte);
        if byte == TelnetCommand::IAC as u8 {
            out.push(TelnetCommand::IAC as u8);
        }
    }
}

/// Return a copy of `data` with every IAC byte doubled
pub fn escape_iac(data: &[u8]) -> Vec<u8> {
    let extra = data.iter().filter(|&&b| b == TelnetCommand::IAC as u8).count();
    let mut out = Vec::with_capacity(data.len() + extra);
    escape_iac_into(data, &mut out);
    out
}
