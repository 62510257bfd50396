//! Incremental Telnet stream scanner
//!
//! Splits the raw byte stream received from the host into completed data
//! records (terminated by IAC EOR) and Telnet command events. Input may be
//! fed in arbitrary chunks; any incomplete trailing sequence (a lone IAC, an
//! unterminated IAC SB ...) is retained until the next chunk arrives, so the
//! events produced never depend on how the transport split the bytes.

use super::telnet_base::TelnetCommand;

const IAC: u8 = TelnetCommand::IAC as u8;
const SE: u8 = TelnetCommand::SE as u8;

/// A unit of meaning recognized in the Telnet byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetEvent {
    /// IAC WILL/WONT/DO/DONT <option>
    Negotiation { command: TelnetCommand, option: u8 },
    /// IAC SB <option> <payload> IAC SE, payload already de-escaped
    Subnegotiation { option: u8, payload: Vec<u8> },
    /// IAC SB abandoned at an IAC that is neither IAC IAC nor IAC SE
    ///
    /// `data` holds the bytes read after the option code, up to and
    /// including the offending command.
    MalformedSubnegotiation { option: u8, data: Vec<u8> },
    /// Any other two byte command (NOP, GA, AYT, ...)
    Command(TelnetCommand),
    /// Data accumulated up to an IAC EOR, with IAC IAC collapsed to 0xFF
    Record(Vec<u8>),
}

/// Stateful scanner over a chunked Telnet byte stream
#[derive(Debug, Default)]
pub struct TelnetScanner {
    /// Raw bytes not yet consumed
    input: Vec<u8>,
    /// Read position within `input`
    position: usize,
    /// Data bytes of the record currently being assembled
    record: Vec<u8>,
}

impl TelnetScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw bytes read from the transport
    pub fn feed(&mut self, data: &[u8]) {
        if self.position > 0 {
            self.input.drain(..self.position);
            self.position = 0;
        }
        self.input.extend_from_slice(data);
    }

    /// Consume input up to and including the next complete event
    ///
    /// Returns `None` once the remaining input holds no complete event.
    /// Data bytes seen on the way are added to the record in progress.
    pub fn next_event(&mut self) -> Option<TelnetEvent> {
        loop {
            let remaining = &self.input[self.position..];
            if remaining.is_empty() {
                return None;
            }

            if remaining[0] != IAC {
                let run = remaining
                    .iter()
                    .position(|&b| b == IAC)
                    .unwrap_or(remaining.len());
                self.record.extend_from_slice(&remaining[..run]);
                self.position += run;
                continue;
            }

            // Lone trailing IAC, wait for more input
            let Some(&code) = remaining.get(1) else {
                return None;
            };

            match TelnetCommand::from_u8(code) {
                Some(TelnetCommand::IAC) => {
                    self.record.push(IAC);
                    self.position += 2;
                }
                Some(TelnetCommand::EOR) => {
                    self.position += 2;
                    return Some(TelnetEvent::Record(std::mem::take(&mut self.record)));
                }
                Some(TelnetCommand::SB) => {
                    let (consumed, event) = parse_subnegotiation(&remaining[2..])?;
                    self.position += 2 + consumed;
                    return Some(event);
                }
                Some(command) if command.is_negotiation() => {
                    let &option = remaining.get(2)?;
                    self.position += 3;
                    return Some(TelnetEvent::Negotiation { command, option });
                }
                Some(TelnetCommand::SE) => {
                    log::warn!("Ignoring IAC SE outside of a subnegotiation");
                    self.position += 2;
                }
                Some(command) => {
                    self.position += 2;
                    return Some(TelnetEvent::Command(command));
                }
                None => {
                    log::debug!("Ignoring unknown telnet command 0x{code:02x}");
                    self.position += 2;
                }
            }
        }
    }

    /// True when data bytes have been seen that are not yet part of a record
    pub fn has_partial_record(&self) -> bool {
        !self.record.is_empty()
    }

    pub fn partial_record_len(&self) -> usize {
        self.record.len()
    }

    /// Number of raw bytes held back waiting for the rest of a sequence
    pub fn pending_len(&self) -> usize {
        self.input.len() - self.position
    }

    /// Discard all buffered input and any partial record
    pub fn reset(&mut self) {
        self.input.clear();
        self.position = 0;
        self.record.clear();
    }
}

/// Parse the bytes following IAC SB
///
/// Returns the number of bytes consumed and the resulting event, or `None`
/// when more input is needed to decide. A subnegotiation ends at IAC SE;
/// any other command inside it ends it as malformed.
fn parse_subnegotiation(data: &[u8]) -> Option<(usize, TelnetEvent)> {
    let (&option, body) = data.split_first()?;

    if option == IAC {
        let &next = body.first()?;
        log::warn!("Subnegotiation without an option code (IAC 0x{next:02x})");
        let event = TelnetEvent::MalformedSubnegotiation { option, data: vec![next] };
        return Some((2, event));
    }

    let mut payload = Vec::new();
    let mut i = 0;

    while i < body.len() {
        let byte = body[i];
        if byte != IAC {
            payload.push(byte);
            i += 1;
            continue;
        }

        let next = *body.get(i + 1)?;
        match next {
            SE => return Some((1 + i + 2, TelnetEvent::Subnegotiation { option, payload })),
            // IAC IAC carries a literal 0xFF
            IAC => payload.push(IAC),
            _ => {
                log::warn!("Unexpected IAC 0x{next:02x} inside subnegotiation for option {option}");
                payload.extend_from_slice(&[IAC, next]);
                let event = TelnetEvent::MalformedSubnegotiation { option, data: payload };
                return Some((1 + i + 2, event));
            }
        }
        i += 2;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scanner: &mut TelnetScanner) -> Vec<TelnetEvent> {
        std::iter::from_fn(|| scanner.next_event()).collect()
    }

    #[test]
    fn test_multiple_records_in_one_chunk() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0x01, 0x02, 0x03, 0xff, 0xef, 0x04, 0x05, 0x06, 0xff, 0xef]);

        assert_eq!(
            drain(&mut scanner),
            vec![
                TelnetEvent::Record(vec![0x01, 0x02, 0x03]),
                TelnetEvent::Record(vec![0x04, 0x05, 0x06]),
            ]
        );
        assert!(!scanner.has_partial_record());
    }

    #[test]
    fn test_record_spanning_chunks() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0x01, 0x02, 0x03]);
        assert_eq!(scanner.next_event(), None);
        assert!(scanner.has_partial_record());

        scanner.feed(&[0x04, 0x05, 0x06, 0xff, 0xef]);
        assert_eq!(
            scanner.next_event(),
            Some(TelnetEvent::Record(vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06]))
        );
    }

    #[test]
    fn test_escaped_iac_in_record() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0x01, 0xff, 0xff, 0x02, 0xff, 0xef]);
        assert_eq!(scanner.next_event(), Some(TelnetEvent::Record(vec![0x01, 0xff, 0x02])));
    }

    #[test]
    fn test_trailing_iac_is_retained() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0x01, 0xff]);
        assert_eq!(scanner.next_event(), None);
        assert_eq!(scanner.pending_len(), 1);

        scanner.feed(&[0xef]);
        assert_eq!(scanner.next_event(), Some(TelnetEvent::Record(vec![0x01])));
        assert_eq!(scanner.pending_len(), 0);
    }

    #[test]
    fn test_negotiation_split_before_option() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0xff, 0xfd]);
        assert_eq!(scanner.next_event(), None);

        scanner.feed(&[0x18]);
        assert_eq!(
            scanner.next_event(),
            Some(TelnetEvent::Negotiation { command: TelnetCommand::DO, option: 0x18 })
        );
    }

    #[test]
    fn test_subnegotiation_across_chunks() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0xff, 0xfa, 0x28, 0x02, 0x04, b'I']);
        assert_eq!(scanner.next_event(), None);
        scanner.feed(&[b'B', b'M', 0xff]);
        assert_eq!(scanner.next_event(), None);
        scanner.feed(&[0xf0]);

        assert_eq!(
            scanner.next_event(),
            Some(TelnetEvent::Subnegotiation {
                option: 0x28,
                payload: vec![0x02, 0x04, b'I', b'B', b'M'],
            })
        );
    }

    #[test]
    fn test_subnegotiation_payload_is_unescaped() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0xff, 0xfa, 0x18, 0x00, 0xff, 0xff, 0x41, 0xff, 0xf0]);
        assert_eq!(
            scanner.next_event(),
            Some(TelnetEvent::Subnegotiation { option: 0x18, payload: vec![0x00, 0xff, 0x41] })
        );
    }

    #[test]
    fn test_simple_commands_do_not_disturb_records() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0x01, 0xff, 0xf1, 0x02, 0xff, 0xf9, 0xff, 0xef]);

        assert_eq!(
            drain(&mut scanner),
            vec![
                TelnetEvent::Command(TelnetCommand::NOP),
                TelnetEvent::Command(TelnetCommand::GA),
                TelnetEvent::Record(vec![0x01, 0x02]),
            ]
        );
    }

    #[test]
    fn test_empty_chunk_yields_nothing() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[]);
        assert_eq!(scanner.next_event(), None);
        assert!(!scanner.has_partial_record());
    }

    #[test]
    fn test_events_interleaved_with_data_keep_order() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0xff, 0xfb, 0x19, 0x0a, 0xff, 0xef, 0xff, 0xfd, 0x00]);

        assert_eq!(
            drain(&mut scanner),
            vec![
                TelnetEvent::Negotiation { command: TelnetCommand::WILL, option: 0x19 },
                TelnetEvent::Record(vec![0x0a]),
                TelnetEvent::Negotiation { command: TelnetCommand::DO, option: 0x00 },
            ]
        );
    }

    #[test]
    fn test_reset_discards_state() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0x01, 0x02, 0xff]);
        assert_eq!(scanner.next_event(), None);

        scanner.reset();
        assert!(!scanner.has_partial_record());
        assert_eq!(scanner.pending_len(), 0);
    }

    #[test]
    fn test_stray_command_inside_subnegotiation_is_malformed() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0xff, 0xfa, 0x18, 0x01, 0xff, 0xf1, 0xff, 0xf0, 0x05, 0xff, 0xef]);

        assert_eq!(
            drain(&mut scanner),
            vec![
                TelnetEvent::MalformedSubnegotiation { option: 0x18, data: vec![0x01, 0xff, 0xf1] },
                TelnetEvent::Record(vec![0x05]),
            ]
        );
        assert_eq!(scanner.pending_len(), 0);
    }

    #[test]
    fn test_subnegotiation_without_option_does_not_swallow_records() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0xff, 0xfa, 0xff, 0xf0, 0x01, 0xff, 0xef]);

        assert_eq!(
            drain(&mut scanner),
            vec![
                TelnetEvent::MalformedSubnegotiation { option: 0xff, data: vec![0xf0] },
                TelnetEvent::Record(vec![0x01]),
            ]
        );
        assert_eq!(scanner.pending_len(), 0);
    }

    #[test]
    fn test_malformed_subnegotiation_waits_for_deciding_byte() {
        let mut scanner = TelnetScanner::new();
        scanner.feed(&[0xff, 0xfa, 0x18, 0x01, 0xff]);
        assert_eq!(scanner.next_event(), None);

        scanner.feed(&[0xf1]);
        assert!(matches!(
            scanner.next_event(),
            Some(TelnetEvent::MalformedSubnegotiation { option: 0x18, .. })
        ));
    }
}
