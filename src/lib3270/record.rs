//! 3270 record framing
//!
//! Outbound records are optionally prefixed with a TN3270E header, have every
//! 0xFF byte doubled and are terminated with IAC EOR. Inbound records arrive
//! already de-escaped from the scanner and only need their TN3270E header
//! removed.

use super::codes::{DATA_TYPE_3270_DATA, TN3270E_HEADER_LEN};
use crate::error::ProtocolError;
use crate::protocol_common::telnet_base::{escape_iac_into, TelnetCommand};

/// The 5 byte header carried by every record once TN3270E is negotiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tn3270eHeader {
    pub data_type: u8,
    pub request_flag: u8,
    pub response_flag: u8,
    pub seq_number: u16,
}

impl Tn3270eHeader {
    /// Header used for every outbound record: 3270-DATA, no flags, sequence 0
    pub fn data() -> Self {
        Self {
            data_type: DATA_TYPE_3270_DATA,
            ..Self::default()
        }
    }

    pub fn to_bytes(&self) -> [u8; TN3270E_HEADER_LEN] {
        let seq = self.seq_number.to_be_bytes();
        [self.data_type, self.request_flag, self.response_flag, seq[0], seq[1]]
    }

    /// Parse the header at the start of `record`
    pub fn parse(record: &[u8]) -> Result<Self, ProtocolError> {
        if record.len() < TN3270E_HEADER_LEN {
            return Err(ProtocolError::TruncatedHeader { length: record.len() });
        }

        Ok(Self {
            data_type: record[0],
            request_flag: record[1],
            response_flag: record[2],
            seq_number: u16::from_be_bytes([record[3], record[4]]),
        })
    }
}

/// Build the exact bytes sent on the wire for one outbound record
///
/// # Examples
///
/// ```
/// use tn3270r::lib3270::record::frame_record;
///
/// let framed = frame_record(&[0x01, 0xff, 0x02], false);
/// assert_eq!(framed, vec![0x01, 0xff, 0xff, 0x02, 0xff, 0xef]);
/// ```
pub fn frame_record(payload: &[u8], tn3270e: bool) -> Vec<u8> {
    let mut framed = Vec::with_capacity(payload.len() + TN3270E_HEADER_LEN + 2);

    if tn3270e {
        escape_iac_into(&Tn3270eHeader::data().to_bytes(), &mut framed);
    }

    escape_iac_into(payload, &mut framed);
    framed.push(TelnetCommand::IAC as u8);
    framed.push(TelnetCommand::EOR as u8);
    framed
}

/// Remove the TN3270E header from an inbound record
///
/// Returns the parsed header along with the remaining 3270 payload.
pub fn split_header(mut record: Vec<u8>) -> Result<(Tn3270eHeader, Vec<u8>), ProtocolError> {
    let header = Tn3270eHeader::parse(&record)?;
    record.drain(..TN3270E_HEADER_LEN);
    Ok((header, record))
}
